use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::loc::Loc;

/// An in-memory compilation unit: a name for diagnostics and an immutable
/// body. Loading from disk is the caller's concern.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub body: String,
}

impl Source {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// A source plus its lazily computed line-start table. The table is keyed to
/// this value, not to the body content, so concurrent use needs no locking
/// beyond the one-time initialization.
#[derive(Debug)]
pub struct SourceInfo {
    source: Source,
    line_starts: OnceLock<Vec<u32>>,
}

/// 1-based line and column. Columns count grapheme clusters, and a CRLF pair
/// counts as a single column step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineColumnRange {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl SourceInfo {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            line_starts: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    fn line_starts(&self) -> &[u32] {
        self.line_starts
            .get_or_init(|| line_starts_for(&self.source.body))
    }

    pub fn line_column_at(&self, loc: Loc) -> LineColumnRange {
        LineColumnRange {
            start: self.position_at(loc.start),
            end: self.position_at(loc.end()),
        }
    }

    fn position_at(&self, offset: u32) -> LineColumn {
        let body = &self.source.body;
        let starts = self.line_starts();
        let line_index = match starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let line_start = starts[line_index] as usize;
        let prefix = &body[line_start..offset as usize];
        let mut column = prefix.graphemes(true).count() as u32 + 1;
        // A CRLF break reads as one column: the offset of its '\n' maps onto
        // the '\r' position.
        if body[offset as usize..].starts_with('\n') && prefix.ends_with('\r') {
            column -= 1;
        }
        LineColumn {
            line: line_index as u32 + 1,
            column,
        }
    }
}

fn line_starts_for(body: &str) -> Vec<u32> {
    let mut starts = vec![0];
    for (offset, byte) in body.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(offset as u32 + 1);
        }
    }
    starts
}

impl fmt::Display for LineColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (self.start, self.end);
        if start.line == end.line {
            if end.column <= start.column + 1 {
                write!(f, "{}:{}", start.line, start.column)
            } else {
                write!(f, "{}:{}-{}", start.line, start.column, end.column)
            }
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                start.line, start.column, end.line, end.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(body: &str) -> SourceInfo {
        SourceInfo::new(Source::new("test.weald", body))
    }

    #[test]
    fn columns_count_grapheme_clusters() {
        // "e" + combining acute is one cluster, as is the flag emoji pair.
        let info = info("e\u{301}\u{1F1E6}\u{1F1F6}x");
        let range = info.line_column_at(Loc::at(11));
        assert_eq!(range.start, LineColumn { line: 1, column: 3 });
    }

    #[test]
    fn lines_split_after_every_line_feed() {
        let info = info("ab\ncd\nef");
        assert_eq!(
            info.line_column_at(Loc::at(6)).start,
            LineColumn { line: 3, column: 1 }
        );
    }

    #[test]
    fn crlf_counts_as_a_single_column() {
        let info = info("ab\r\ncd");
        let at_lf = info.line_column_at(Loc::at(3)).start;
        let at_cr = info.line_column_at(Loc::at(2)).start;
        assert_eq!(at_lf, at_cr);
        assert_eq!(
            info.line_column_at(Loc::at(4)).start,
            LineColumn { line: 2, column: 1 }
        );
    }

    #[test]
    fn range_display_collapses_single_positions() {
        let info = info("hello\nworld");
        assert_eq!(info.line_column_at(Loc::new(0, 1)).to_string(), "1:1");
        assert_eq!(info.line_column_at(Loc::new(0, 4)).to_string(), "1:1-5");
        assert_eq!(info.line_column_at(Loc::new(2, 7)).to_string(), "1:3-2:4");
        assert_eq!(info.line_column_at(Loc::at(1)).to_string(), "1:2");
    }
}
