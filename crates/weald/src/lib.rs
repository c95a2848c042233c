//! Front-end of the Weald language: a Unicode-aware lexer and an
//! error-tolerant Pratt parser. Both stages are total: every source body
//! yields a complete token sequence (terminated by `End`), a complete AST
//! (with explicit `Missing` nodes), and a machine-readable problem list
//! pinned to byte offsets.

pub mod ast;
pub mod cursor;
pub mod lexer;
pub mod loc;
pub mod parser;
pub mod problems;
pub mod runes;
pub mod source;
pub mod strings;
pub mod syntax;
pub mod token;

pub use ast::{expr_loc, stmt_loc, Arguments, Expr, Name, Script, Stmt, Stmts};
pub use lexer::tokenise;
pub use loc::Loc;
pub use parser::parse;
pub use problems::{render_problem, render_problems, Problem};
pub use source::{LineColumn, LineColumnRange, Source, SourceInfo};
pub use token::{Token, TokenTag};

/// Run both stages over a source, concatenating the problem lists in stage
/// order.
pub fn parse_source(source: &Source) -> (Script, Vec<Problem>) {
    let (tokens, mut problems) = tokenise(source);
    let (script, parse_problems) = parse(&tokens);
    problems.extend(parse_problems);
    (script, problems)
}
