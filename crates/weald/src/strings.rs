//! Escape scanning shared by the lexer (which validates and reports) and the
//! parser (which interprets leniently), plus block-string indent stripping.

use crate::runes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escape {
    /// A well-formed escape denoting this rune.
    Rune(char),
    /// A backslash-newline continuation; the break and the following
    /// indentation are elided from the interpreted text.
    LineJoin,
    /// The body ends directly after the backslash; the enclosing string is
    /// unterminated and reported as such, not as a bad escape.
    Eof,
    Invalid { message: String },
}

#[derive(Debug)]
pub struct ScannedEscape {
    pub escape: Escape,
    /// Bytes consumed from the backslash onward, always a rune boundary.
    pub len: usize,
}

/// Scan one escape sequence. `rest` must start at the backslash.
pub fn scan_escape(rest: &str) -> ScannedEscape {
    debug_assert!(rest.starts_with('\\'));
    let Some(intro) = rest[1..].chars().next() else {
        return ScannedEscape {
            escape: Escape::Eof,
            len: 1,
        };
    };
    match intro {
        '"' => rune('"'),
        '\\' => rune('\\'),
        'e' => rune('\u{1B}'),
        'n' => rune('\n'),
        'r' => rune('\r'),
        't' => rune('\t'),
        'x' => scan_fixed_hex(rest, 2, "'\\x' needs exactly two hex digits"),
        'u' => {
            if rest[2..].starts_with('{') {
                scan_braced_hex(rest)
            } else {
                scan_fixed_hex(rest, 4, "'\\u' needs exactly four hex digits")
            }
        }
        _ if runes::is_newline(intro) => {
            let mut len = 1 + intro.len_utf8();
            for rune in rest[len..].chars() {
                if !runes::is_ignorable(rune) {
                    break;
                }
                len += rune.len_utf8();
            }
            ScannedEscape {
                escape: Escape::LineJoin,
                len,
            }
        }
        _ => ScannedEscape {
            escape: Escape::Invalid {
                message: format!("unknown escape '\\{intro}'"),
            },
            len: 1 + intro.len_utf8(),
        },
    }
}

fn rune(decoded: char) -> ScannedEscape {
    ScannedEscape {
        escape: Escape::Rune(decoded),
        len: 2,
    }
}

/// `\xHH` and `\uHHHH`: exactly `want` hex digits after the two-byte intro.
fn scan_fixed_hex(rest: &str, want: usize, short_message: &str) -> ScannedEscape {
    let mut value: u32 = 0;
    let mut got = 0;
    for rune in rest[2..].chars().take(want) {
        let Some(digit) = rune.to_digit(16) else {
            break;
        };
        value = value * 16 + digit;
        got += 1;
    }
    if got < want {
        return ScannedEscape {
            escape: Escape::Invalid {
                message: short_message.to_string(),
            },
            len: 2 + got,
        };
    }
    decoded_rune(value, 2 + want)
}

/// `\u{H...H}` with one to six hex digits.
fn scan_braced_hex(rest: &str) -> ScannedEscape {
    let mut value: u32 = 0;
    let mut digits = 0;
    let mut len = 3;
    let mut closed = false;
    for rune in rest[3..].chars() {
        if rune == '}' {
            len += 1;
            closed = true;
            break;
        }
        let Some(digit) = rune.to_digit(16) else {
            break;
        };
        value = value.saturating_mul(16).saturating_add(digit);
        digits += 1;
        len += 1;
    }
    if !closed {
        return ScannedEscape {
            escape: Escape::Invalid {
                message: "unclosed '\\u{...}' escape".to_string(),
            },
            len,
        };
    }
    if digits == 0 || digits > 6 {
        return ScannedEscape {
            escape: Escape::Invalid {
                message: "'\\u{...}' needs one to six hex digits".to_string(),
            },
            len,
        };
    }
    decoded_rune(value, len)
}

fn decoded_rune(value: u32, len: usize) -> ScannedEscape {
    match char::from_u32(value) {
        Some(decoded) => ScannedEscape {
            escape: Escape::Rune(decoded),
            len,
        },
        None => ScannedEscape {
            escape: Escape::Invalid {
                message: "escape does not denote a valid rune".to_string(),
            },
            len,
        },
    }
}

/// Interpret the body of a standard line string. Bad escapes pass through
/// verbatim; the lexer has already reported them.
pub fn interpret_line(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let scanned = scan_escape(&rest[at..]);
        match scanned.escape {
            Escape::Rune(decoded) => out.push(decoded),
            Escape::LineJoin => {}
            Escape::Eof | Escape::Invalid { .. } => out.push_str(&rest[at..at + scanned.len]),
        }
        rest = &rest[at + scanned.len..];
    }
    out.push_str(rest);
    out
}

/// Interpret the body of a standard block string: strip the common indent,
/// then decode escapes.
pub fn interpret_block(content: &str) -> String {
    interpret_line(&strip_block_indent(content))
}

/// Remove the longest common whitespace prefix of the non-blank lines.
/// A whitespace-only opening line and the whitespace-only line holding the
/// closing delimiter contribute no text; a single-line body is kept as-is.
pub fn strip_block_indent(content: &str) -> String {
    if !content.contains('\n') {
        return content.to_string();
    }
    let mut lines: Vec<&str> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    if lines.first().is_some_and(|line| is_blank(line)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }
    let mut indent: Option<&str> = None;
    for line in &lines {
        if is_blank(line) {
            continue;
        }
        let prefix = leading_whitespace(line);
        indent = Some(match indent {
            None => prefix,
            Some(acc) => common_prefix(acc, prefix),
        });
    }
    let indent = indent.unwrap_or("");
    let stripped: Vec<&str> = lines
        .iter()
        .map(|line| {
            if is_blank(line) {
                ""
            } else {
                line.strip_prefix(indent).unwrap_or(line)
            }
        })
        .collect();
    stripped.join("\n")
}

fn is_blank(line: &str) -> bool {
    line.chars().all(runes::is_whitespace)
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches(runes::is_whitespace);
    &line[..line.len() - trimmed.len()]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for (ka, kb) in a.chars().zip(b.chars()) {
        if ka != kb {
            break;
        }
        end += ka.len_utf8();
    }
    &a[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_escapes_decode() {
        assert_eq!(interpret_line(r#"a\nb\tc\\d\"e"#), "a\nb\tc\\d\"e");
        assert_eq!(interpret_line(r"\e[0m"), "\u{1B}[0m");
    }

    #[test]
    fn hex_and_rune_escapes_decode() {
        assert_eq!(interpret_line(r"\x41B\u{1F600}"), "AB\u{1F600}");
    }

    #[test]
    fn line_continuation_elides_break_and_indent() {
        assert_eq!(interpret_line("ab\\\n   cd"), "abcd");
        assert_eq!(interpret_line("ab\\\r\n\n  cd"), "abcd");
    }

    #[test]
    fn bad_escapes_pass_through_verbatim() {
        assert_eq!(interpret_line(r"a\qb"), r"a\qb");
        assert_eq!(interpret_line(r"\x4"), r"\x4");
    }

    #[test]
    fn scan_reports_surrogate_values() {
        let scanned = scan_escape(r"\uD800x");
        assert!(matches!(scanned.escape, Escape::Invalid { .. }));
        assert_eq!(scanned.len, 6);
    }

    #[test]
    fn scan_reports_unclosed_braced_escape() {
        let scanned = scan_escape(r"\u{41 ");
        assert!(matches!(scanned.escape, Escape::Invalid { .. }));
        assert_eq!(scanned.len, 5);
    }

    #[test]
    fn block_indent_is_the_common_whitespace_prefix() {
        let content = "\n    one\n      two\n    three\n  ";
        assert_eq!(strip_block_indent(content), "one\n  two\nthree");
    }

    #[test]
    fn block_indent_keeps_blank_lines_empty() {
        let content = "\n  a\n\n  b\n";
        assert_eq!(strip_block_indent(content), "a\n\nb");
    }

    #[test]
    fn block_indent_with_mixed_tabs_keeps_the_exact_common_prefix() {
        let content = "\n\t  a\n\t b\n";
        assert_eq!(strip_block_indent(content), " a\nb");
    }

    #[test]
    fn single_line_block_content_is_unchanged() {
        assert_eq!(strip_block_indent("  padded  "), "  padded  ");
    }
}
