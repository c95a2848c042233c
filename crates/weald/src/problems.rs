use serde::Serialize;

use crate::loc::Loc;
use crate::source::SourceInfo;

/// A machine-readable diagnostic pinned to a span of the source body. Ids are
/// stable, slash-delimited category paths such as `syntax/expected-end`.
/// Buffers of problems preserve insertion order; duplicates at the same
/// location are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub id: String,
    pub message: String,
    pub loc: Loc,
}

impl Problem {
    pub fn new(id: &str, message: impl Into<String>, loc: Loc) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            loc,
        }
    }

    /// The leading id segment, e.g. `syntax`.
    pub fn category(&self) -> &str {
        self.id.split('/').next().unwrap_or(&self.id)
    }
}

pub fn render_problem(info: &SourceInfo, problem: &Problem) -> String {
    format!(
        "error[{}] {}:{} {}",
        problem.id,
        info.source().name,
        info.line_column_at(problem.loc),
        problem.message
    )
}

pub fn render_problems(info: &SourceInfo, problems: &[Problem]) -> String {
    let mut output = String::new();
    for (index, problem) in problems.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&render_problem(info, problem));
    }
    output
}
