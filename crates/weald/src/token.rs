use serde::Serialize;

use crate::loc::Loc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenTag {
    /// Malformed input; the token text carries a human-readable message.
    Invalid,
    /// Terminates every token sequence, exactly once.
    End,
    /// At most one between successive non-newline tokens, never first.
    Newline,
    Name,
    Integer,
    Float,
    String,
    KwDiscard,
    KwElse,
    KwFalse,
    KwIf,
    KwLet,
    KwTrue,
    PParenOpen,
    PParenClose,
    PBracketOpen,
    PBracketClose,
    PBraceOpen,
    PBraceClose,
    PStar,
    PBackslash,
    PAnd,
    PAndAnd,
    PPercent,
    PCaret,
    POr,
    POrOr,
    PPlus,
    PMinus,
    PComma,
    PColon,
    PQuestion,
    PDot,
    PSlash,
    PLess,
    PLessEqual,
    PEqual,
    PEqualEqual,
    PBang,
    PBangEqual,
    PGreaterEqual,
    PGreater,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub tag: TokenTag,
    /// Present only for `Invalid` (message), `Name` (normalized), `Integer`
    /// and `Float` (literal text including sign and prefix), and `String`
    /// (literal text including delimiters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub loc: Loc,
}

impl Token {
    pub fn new(tag: TokenTag, loc: Loc) -> Self {
        Self {
            tag,
            text: None,
            loc,
        }
    }

    pub fn with_text(tag: TokenTag, text: impl Into<String>, loc: Loc) -> Self {
        Self {
            tag,
            text: Some(text.into()),
            loc,
        }
    }
}
