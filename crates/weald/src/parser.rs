use crate::ast::{expr_loc, stmt_loc, Arguments, Expr, Name, Script, Stmt, Stmts};
use crate::loc::Loc;
use crate::problems::Problem;
use crate::strings;
use crate::syntax;
use crate::token::{Token, TokenTag};

/// A problem id and message reported when a required expression is absent,
/// threaded down to the prefix parser so the diagnostic names its context.
type Fallback = (&'static str, &'static str);

/// Parse a token sequence into a script. The sequence must be terminated by
/// `End` (as produced by the lexer); anything else is a programmer error.
/// The returned script is total: wherever material could not be parsed, a
/// `Missing` node with a zero-length location stands in.
pub fn parse(tokens: &[Token]) -> (Script, Vec<Problem>) {
    assert!(
        tokens.last().is_some_and(|token| token.tag == TokenTag::End),
        "parser input must be a token sequence terminated by End"
    );
    let mut parser = Parser::new(tokens);
    let script = parser.parse_script();
    (script, parser.problems)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// A `Newline` token sat immediately before the current token.
    newline_before: bool,
    problems: Vec<Problem>,
    /// Token tags that terminate inner statement loops so the opener's
    /// parser gets to consume its closer.
    breakpoints: Vec<TokenTag>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let mut parser = Self {
            tokens,
            pos: 0,
            newline_before: false,
            problems: Vec::new(),
            breakpoints: Vec::with_capacity(8),
        };
        parser.sync();
        parser
    }

    /// Position on the next non-newline token, remembering whether one was
    /// skipped.
    fn sync(&mut self) {
        self.newline_before = false;
        while self.tokens[self.pos].tag == TokenTag::Newline {
            self.newline_before = true;
            self.pos += 1;
        }
    }

    fn current(&self) -> &'a Token {
        &self.tokens[self.pos]
    }

    fn tag(&self) -> TokenTag {
        self.current().tag
    }

    fn advance(&mut self) -> &'a Token {
        let token = &self.tokens[self.pos];
        if token.tag != TokenTag::End {
            self.pos += 1;
            self.sync();
        }
        token
    }

    fn check(&self, tag: TokenTag) -> bool {
        self.tag() == tag
    }

    fn consume(&mut self, tag: TokenTag) -> Option<&'a Token> {
        if self.check(tag) {
            return Some(self.advance());
        }
        None
    }

    /// A zero-length location at the current token, for "here" diagnostics
    /// and `Missing` nodes.
    fn here_loc(&self) -> Loc {
        Loc::at(self.current().loc.start)
    }

    fn report(&mut self, id: &str, message: impl Into<String>, loc: Loc) {
        self.problems.push(Problem::new(id, message, loc));
    }

    fn with_breakpoint<T>(&mut self, tag: TokenTag, f: impl FnOnce(&mut Self) -> T) -> T {
        self.breakpoints.push(tag);
        let value = f(self);
        self.breakpoints.pop();
        value
    }

    fn at_breakpoint(&self) -> bool {
        self.breakpoints.last().is_some_and(|tag| self.check(*tag))
    }

    /// Newlines separate statements everywhere except inside a group, where
    /// they are insignificant.
    fn newlines_break(&self) -> bool {
        !matches!(self.breakpoints.last(), Some(TokenTag::PParenClose))
    }

    fn parse_script(&mut self) -> Script {
        let stmts = self.with_breakpoint(TokenTag::End, |p| p.parse_stmts());
        if !self.check(TokenTag::End) && self.problems.is_empty() {
            let blurb = token_blurb(self.current());
            self.report(
                "syntax/expected-end",
                format!("expected the end of the script, found {blurb}"),
                self.here_loc(),
            );
        }
        let end = self.tokens[self.tokens.len() - 1].loc;
        Script {
            stmts,
            loc: Loc::from_range(0, end.end()),
        }
    }

    fn parse_stmts(&mut self) -> Stmts {
        let start = self.here_loc();
        let mut items: Vec<Stmt> = Vec::new();
        loop {
            if self.check(TokenTag::End) || self.at_breakpoint() {
                break;
            }
            if !items.is_empty() && !self.newline_before {
                break;
            }
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => items.push(stmt),
                None => {
                    // the fallback diagnostic fired; skip the offender
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        let loc = match (items.first(), items.last()) {
            (Some(first), Some(last)) => stmt_loc(first).to(stmt_loc(last)),
            _ => start,
        };
        Stmts { items, loc }
    }

    /// `None` means the current token starts no statement at all; nothing
    /// was consumed and the caller decides how to resynchronize.
    fn parse_statement(&mut self) -> Option<Stmt> {
        if self.check(TokenTag::KwLet) {
            return Some(self.parse_let());
        }
        let before = self.pos;
        let expr = self.parse_expression(("syntax/expected-stmt", "expected a statement"));
        if self.pos == before && matches!(expr, Expr::Missing { .. }) {
            return None;
        }
        Some(Stmt::Expr { expr })
    }

    fn parse_let(&mut self) -> Stmt {
        let kw_let = self.advance().loc;
        let name = match self.consume(TokenTag::Name) {
            Some(token) => Name {
                text: token.text.clone().unwrap_or_default(),
                loc: token.loc,
            },
            None => {
                let loc = self.here_loc();
                self.report("syntax/expected-let-name", "expected a name after 'let'", loc);
                Name {
                    text: String::new(),
                    loc,
                }
            }
        };
        let eq = match self.consume(TokenTag::PEqual) {
            Some(token) => token.loc,
            None => {
                let loc = self.here_loc();
                self.report(
                    "syntax/expected-let-eq",
                    "expected '=' after the declared name",
                    loc,
                );
                loc
            }
        };
        let value =
            self.parse_expression(("syntax/expected-let-expr", "expected an expression after '='"));
        let loc = kw_let.to(expr_loc(&value));
        Stmt::VariableDecl {
            kw_let,
            name,
            eq,
            value,
            loc,
        }
    }

    fn parse_expression(&mut self, fallback: Fallback) -> Expr {
        self.parse_binary(syntax::LEVEL_LOGIC, None, fallback)
    }

    /// Precedence climbing. `prev` is the operator whose right operand this
    /// call parses; together with the in-loop previous operator it drives
    /// the ambiguity checks on the two sensitive levels.
    fn parse_binary(
        &mut self,
        min_level: u8,
        prev: Option<(TokenTag, Loc, u8)>,
        fallback: Fallback,
    ) -> Expr {
        let mut lhs = self.parse_unary(fallback);
        let mut prev = prev;
        loop {
            if self.newline_before && self.newlines_break() {
                break;
            }
            let Some(op) = syntax::binary_op(self.tag()) else {
                break;
            };
            if op.level < min_level {
                break;
            }
            let op_loc = self.current().loc;
            if let Some((prev_tag, prev_loc, prev_level)) = prev {
                let ambiguous = op.level == prev_level
                    && (op.level == syntax::LEVEL_CMP
                        || (op.level == syntax::LEVEL_LOGIC && op.tag != prev_tag));
                if ambiguous {
                    let message = if op.level == syntax::LEVEL_CMP {
                        "chained comparison operators are ambiguous; parenthesize one side"
                    } else {
                        "mixing '&&' and '||' without parentheses is ambiguous"
                    };
                    self.report("syntax/ambiguous-expr", message, prev_loc.to(op_loc));
                }
            }
            self.advance();
            let next_min = if op.right_assoc { op.level } else { op.level + 1 };
            let rhs = self.parse_binary(
                next_min,
                Some((op.tag, op_loc, op.level)),
                ("syntax/expected-expr", "expected an expression after the operator"),
            );
            let loc = expr_loc(&lhs).to(expr_loc(&rhs));
            lhs = match op.tag {
                TokenTag::PAndAnd => Expr::And {
                    left: Box::new(lhs),
                    op: op_loc,
                    right: Box::new(rhs),
                    loc,
                },
                TokenTag::POrOr => Expr::Or {
                    left: Box::new(lhs),
                    op: op_loc,
                    right: Box::new(rhs),
                    loc,
                },
                _ => {
                    let arguments = Arguments {
                        loc: expr_loc(&rhs),
                        items: vec![rhs],
                    };
                    Expr::Call {
                        receiver: Box::new(lhs),
                        function: Name {
                            text: op.symbol.to_string(),
                            loc: op_loc,
                        },
                        arguments: Some(arguments),
                        loc,
                    }
                }
            };
            prev = Some((op.tag, op_loc, op.level));
        }
        lhs
    }

    fn parse_unary(&mut self, fallback: Fallback) -> Expr {
        if let Some(symbol) = syntax::unary_op(self.tag()) {
            let op_loc = self.current().loc;
            self.advance();
            let operand = self.parse_unary((
                "syntax/expected-expr",
                "expected an expression after the unary operator",
            ));
            let loc = op_loc.to(expr_loc(&operand));
            return Expr::Call {
                receiver: Box::new(operand),
                function: Name {
                    text: symbol.to_string(),
                    loc: op_loc,
                },
                arguments: None,
                loc,
            };
        }
        self.parse_postfix(fallback)
    }

    /// `receiver.name` and `receiver.name(arguments)` chains.
    fn parse_postfix(&mut self, fallback: Fallback) -> Expr {
        let mut expr = self.parse_prefix(fallback);
        loop {
            if self.newline_before && self.newlines_break() {
                break;
            }
            if !self.check(TokenTag::PDot) {
                break;
            }
            self.advance();
            let function = match self.consume(TokenTag::Name) {
                Some(token) => Name {
                    text: token.text.clone().unwrap_or_default(),
                    loc: token.loc,
                },
                None => {
                    let loc = self.here_loc();
                    self.report("syntax/expected-member", "expected a name after '.'", loc);
                    Name {
                        text: String::new(),
                        loc,
                    }
                }
            };
            let arguments = if self.check(TokenTag::PParenOpen) {
                Some(self.parse_arguments())
            } else {
                None
            };
            let end = arguments
                .as_ref()
                .map(|arguments| arguments.loc)
                .unwrap_or(function.loc);
            let loc = expr_loc(&expr).to(end);
            expr = Expr::Call {
                receiver: Box::new(expr),
                function,
                arguments,
                loc,
            };
        }
        expr
    }

    fn parse_arguments(&mut self) -> Arguments {
        let opening = self.advance().loc;
        let mut items = Vec::new();
        self.with_breakpoint(TokenTag::PParenClose, |p| loop {
            if p.check(TokenTag::PParenClose) || p.check(TokenTag::End) {
                break;
            }
            let before = p.pos;
            let expr =
                p.parse_expression(("syntax/expected-expr", "expected an argument expression"));
            if p.pos == before && matches!(expr, Expr::Missing { .. }) {
                p.advance();
                continue;
            }
            items.push(expr);
            if p.consume(TokenTag::PComma).is_none() {
                break;
            }
        });
        let closing = match self.consume(TokenTag::PParenClose) {
            Some(token) => token.loc,
            None => {
                let loc = self.here_loc();
                self.report(
                    "syntax/unclosed-arguments",
                    "expected ')' to close the argument list",
                    loc,
                );
                loc
            }
        };
        Arguments {
            items,
            loc: opening.to(closing),
        }
    }

    fn parse_prefix(&mut self, fallback: Fallback) -> Expr {
        match self.tag() {
            TokenTag::Name => {
                let token = self.advance();
                Expr::VariableRead {
                    name: Name {
                        text: token.text.clone().unwrap_or_default(),
                        loc: token.loc,
                    },
                }
            }
            TokenTag::KwTrue => Expr::True {
                loc: self.advance().loc,
            },
            TokenTag::KwFalse => Expr::False {
                loc: self.advance().loc,
            },
            TokenTag::Integer => self.parse_int(),
            TokenTag::Float => self.parse_float(),
            TokenTag::String => self.parse_string(),
            TokenTag::PParenOpen => self.parse_group(),
            TokenTag::PBraceOpen => self.parse_block(),
            TokenTag::KwIf => self.parse_if(),
            TokenTag::Invalid => {
                // the lexer already reported this span
                let loc = self.advance().loc;
                Expr::Missing {
                    loc: Loc::at(loc.start),
                }
            }
            _ => {
                let (id, message) = fallback;
                let loc = self.here_loc();
                self.report(id, message, loc);
                Expr::Missing { loc }
            }
        }
    }

    fn parse_group(&mut self) -> Expr {
        let opening = self.advance().loc;
        let body = self.with_breakpoint(TokenTag::PParenClose, |p| {
            p.parse_expression((
                "syntax/expected-expr-in-group",
                "expected an expression after '('",
            ))
        });
        let closing = match self.consume(TokenTag::PParenClose) {
            Some(token) => token.loc,
            None => {
                let loc = self.here_loc();
                self.report("syntax/unclosed-group", "expected ')' to close the group", loc);
                loc
            }
        };
        Expr::Group {
            opening,
            body: Box::new(body),
            closing,
            loc: opening.to(closing),
        }
    }

    fn parse_block(&mut self) -> Expr {
        let opening = self.advance().loc;
        let stmts = self.with_breakpoint(TokenTag::PBraceClose, |p| p.parse_stmts());
        let closing = match self.consume(TokenTag::PBraceClose) {
            Some(token) => token.loc,
            None => {
                let loc = self.here_loc();
                self.report("syntax/unclosed-block", "expected '}' to close the block", loc);
                loc
            }
        };
        Expr::Block {
            opening,
            stmts,
            closing,
            loc: opening.to(closing),
        }
    }

    fn parse_if(&mut self) -> Expr {
        let kw_if = self.advance().loc;
        let predicate =
            self.parse_expression(("syntax/expected-predicate", "expected a predicate after 'if'"));
        if let Some(question) = self.consume(TokenTag::PQuestion) {
            let then_branch = self.parse_expression((
                "syntax/expected-expr-in-ternary-then",
                "expected an expression after '?'",
            ));
            self.check_ternary_branch(&then_branch);
            let else_branch = if self.consume(TokenTag::PColon).is_some() {
                let branch = self.parse_expression((
                    "syntax/expected-expr-in-ternary-else",
                    "expected an expression after ':'",
                ));
                self.check_ternary_branch(&branch);
                branch
            } else {
                let loc = self.here_loc();
                self.report(
                    "syntax/expected-ternary-else",
                    "expected ':' followed by the else branch",
                    loc,
                );
                Expr::Missing { loc }
            };
            let loc = kw_if.to(expr_loc(&else_branch));
            return Expr::If {
                kw_if,
                predicate: Box::new(predicate),
                ternary_then: Some(question.loc),
                then_branch: Box::new(then_branch),
                else_branch: Some(Box::new(else_branch)),
                loc,
            };
        }
        let then_branch = if self.check(TokenTag::PBraceOpen) {
            self.parse_block()
        } else {
            let loc = self.here_loc();
            self.report("syntax/expected-if-body", "expected '{' to open the if body", loc);
            Expr::Missing { loc }
        };
        let else_branch = if self.check(TokenTag::KwElse) {
            Some(Box::new(self.parse_else()))
        } else {
            None
        };
        let end = else_branch
            .as_deref()
            .map(expr_loc)
            .unwrap_or_else(|| expr_loc(&then_branch));
        Expr::If {
            kw_if,
            predicate: Box::new(predicate),
            ternary_then: None,
            then_branch: Box::new(then_branch),
            else_branch,
            loc: kw_if.to(end),
        }
    }

    fn parse_else(&mut self) -> Expr {
        let kw_else = self.advance().loc;
        let body = if self.check(TokenTag::PBraceOpen) {
            self.parse_block()
        } else if self.check(TokenTag::KwIf) {
            self.parse_if()
        } else {
            let loc = self.here_loc();
            self.report(
                "syntax/expected-else-body",
                "expected '{' or 'if' after 'else'",
                loc,
            );
            Expr::Missing { loc }
        };
        let loc = kw_else.to(expr_loc(&body));
        Expr::Else {
            kw_else,
            body: Box::new(body),
            loc,
        }
    }

    /// Ternary branches must stay expression-shaped; blocks and block-ifs
    /// belong to the statement form.
    fn check_ternary_branch(&mut self, branch: &Expr) {
        if matches!(branch, Expr::Block { .. } | Expr::If { .. }) {
            self.report(
                "syntax/block-in-ternary",
                "a ternary branch may not contain a block; use the block form of 'if'",
                expr_loc(branch),
            );
        }
    }

    fn parse_int(&mut self) -> Expr {
        let token = self.advance();
        match integer_value(token.text.as_deref().unwrap_or_default()) {
            Some(value) => Expr::Int {
                value,
                loc: token.loc,
            },
            None => {
                self.report(
                    "syntax/invalid-int",
                    "integer literal does not fit in a signed 128-bit integer",
                    token.loc,
                );
                Expr::Missing {
                    loc: Loc::at(token.loc.start),
                }
            }
        }
    }

    fn parse_float(&mut self) -> Expr {
        let token = self.advance();
        let text = token.text.as_deref().unwrap_or_default();
        let cleaned: String = text.chars().filter(|rune| *rune != '_').collect();
        match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => Expr::Float {
                value,
                loc: token.loc,
            },
            _ => {
                self.report(
                    "syntax/invalid-float",
                    "floating-point literal is not a finite number",
                    token.loc,
                );
                Expr::Missing {
                    loc: Loc::at(token.loc.start),
                }
            }
        }
    }

    fn parse_string(&mut self) -> Expr {
        let token = self.advance();
        let text = token.text.as_deref().unwrap_or_default();
        let loc = token.loc;
        let (delimiter, raw, block) = string_shape(text);
        let body = &text[delimiter..text.len() - delimiter];
        let delimiter = delimiter as u32;
        let opening = Loc::new(loc.start, delimiter);
        let closing = Loc::new(loc.end() - delimiter, delimiter);
        let interpreted = match (raw, block) {
            (true, false) => body.to_string(),
            (true, true) => strings::strip_block_indent(body),
            (false, false) => strings::interpret_line(body),
            (false, true) => strings::interpret_block(body),
        };
        Expr::String {
            opening,
            content: Loc::from_range(opening.end(), closing.start),
            closing,
            interpreted,
            loc,
        }
    }
}

/// Delimiter length, rawness, and shape of a string literal's text.
fn string_shape(text: &str) -> (usize, bool, bool) {
    if text.starts_with("\"\"\"") {
        (3, false, true)
    } else if text.starts_with('"') {
        (1, false, false)
    } else if text.starts_with("```") {
        (3, true, true)
    } else {
        (1, true, false)
    }
}

/// Checked accumulation into a signed 128-bit value; the sign applies after
/// the magnitude, so `-(2^127)` overflows by design.
fn integer_value(text: &str) -> Option<i128> {
    let mut rest = text;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    let radix: i128 = if let Some(stripped) = rest.strip_prefix("0x") {
        rest = stripped;
        16
    } else if let Some(stripped) = rest.strip_prefix("0b") {
        rest = stripped;
        2
    } else {
        10
    };
    let mut value: i128 = 0;
    let mut digits = 0;
    for rune in rest.chars() {
        if rune == '_' {
            continue;
        }
        let digit = rune.to_digit(radix as u32)? as i128;
        value = value.checked_mul(radix)?.checked_add(digit)?;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn token_blurb(token: &Token) -> String {
    if let Some(lexeme) = syntax::tag_lexeme(token.tag) {
        return format!("'{lexeme}'");
    }
    match token.tag {
        TokenTag::Name => format!("the name '{}'", token.text.as_deref().unwrap_or_default()),
        TokenTag::Integer | TokenTag::Float => {
            format!("the literal '{}'", token.text.as_deref().unwrap_or_default())
        }
        TokenTag::String => "a string literal".to_string(),
        TokenTag::Invalid => "invalid input".to_string(),
        _ => "this token".to_string(),
    }
}
