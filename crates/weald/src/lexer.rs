use unicode_normalization::UnicodeNormalization;

use crate::cursor::{Cursor, Mark, Scan};
use crate::loc::Loc;
use crate::problems::Problem;
use crate::runes;
use crate::source::Source;
use crate::strings::{self, Escape};
use crate::syntax;
use crate::token::{Token, TokenTag};

/// Convert a source body into a complete token sequence plus the lexical
/// problems found along the way. The sequence always ends with exactly one
/// `End` token, and carries at most one `Newline` between non-newline tokens.
pub fn tokenise(source: &Source) -> (Vec<Token>, Vec<Problem>) {
    let mut lexer = Lexer {
        cursor: Cursor::new(&source.body),
        tokens: Vec::new(),
        problems: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.problems)
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    problems: Vec<Problem>,
}

impl Lexer<'_> {
    fn run(&mut self) {
        self.cursor.match_char('\u{FEFF}');
        if self.cursor.check_str("#!") {
            self.skip_line();
        }
        loop {
            self.skip_ignorable();
            if self.cursor.is_empty() {
                break;
            }
            self.next_token();
        }
        self.tokens.push(Token::new(TokenTag::End, self.cursor.locate()));
    }

    fn report(&mut self, id: &str, message: impl Into<String>, loc: Loc) {
        self.problems.push(Problem::new(id, message, loc));
    }

    /// Emit an `Invalid` token and its paired problem.
    fn push_invalid(&mut self, message: String, loc: Loc) {
        self.report("syntax/invalid-token", message.clone(), loc);
        self.tokens.push(Token::with_text(TokenTag::Invalid, message, loc));
    }

    /// Consume to the end of the current line, reporting forbidden runes.
    /// The newline itself is left for the ignorable run.
    fn skip_line(&mut self) {
        loop {
            let problems = &mut self.problems;
            let scan = self.cursor.next_until(runes::is_newline, |rune, loc| {
                problems.push(forbidden_problem(rune, loc));
            });
            match scan {
                Scan::Forbidden => {
                    self.cursor.next();
                }
                Scan::Matched | Scan::Empty => break,
            }
        }
    }

    /// Greedily consume whitespace, line comments, and newline runs. If the
    /// run contained a newline, emit a single `Newline` token spanning it,
    /// unless it would be the first token.
    fn skip_ignorable(&mut self) {
        let mark = self.cursor.mark();
        let mut saw_newline = false;
        loop {
            if self.cursor.match_pred(runes::is_whitespace) {
                continue;
            }
            if self.cursor.check(runes::is_newline) {
                saw_newline = true;
                self.cursor.next();
                continue;
            }
            if self.cursor.check_str("--") {
                self.skip_line();
                continue;
            }
            break;
        }
        if saw_newline && !self.tokens.is_empty() {
            self.tokens
                .push(Token::new(TokenTag::Newline, self.cursor.locate_from(mark)));
        }
    }

    fn next_token(&mut self) {
        let Some(rune) = self.cursor.peek() else {
            return;
        };
        if runes::is_decimal_digit(rune)
            || (runes::is_sign(rune) && self.cursor.check_next(runes::is_decimal_digit))
        {
            self.scan_number();
        } else if runes::is_name_start(rune) {
            self.scan_name();
        } else if rune == '"' {
            self.scan_standard_string();
        } else if rune == '`' {
            self.scan_raw_string();
        } else if runes::is_punctuation(rune) {
            self.scan_punctuation();
        } else {
            self.scan_invalid();
        }
    }

    /// Scan one digit group. Underscores are allowed only between digits;
    /// every `_` not followed by a digit is reported once. Returns the digit
    /// count.
    fn scan_digits(&mut self, digit: fn(char) -> bool) -> usize {
        let mut count = 0;
        loop {
            if self.cursor.match_pred(digit) {
                count += 1;
                continue;
            }
            if self.cursor.check_char('_') {
                let underscore = self.cursor.mark();
                self.cursor.next();
                if !self.cursor.check(digit) {
                    self.report(
                        "syntax/invalid-number",
                        "a '_' in a number must sit between digits",
                        self.cursor.locate_from(underscore),
                    );
                }
                continue;
            }
            return count;
        }
    }

    fn scan_number(&mut self) {
        let mark = self.cursor.mark();
        self.cursor.match_pred(runes::is_sign);
        let mut is_float = false;
        let mut prefix = None;
        let digits = if self.cursor.match_str("0x") {
            prefix = Some("0x");
            self.scan_digits(runes::is_hex_digit)
        } else if self.cursor.match_str("0b") {
            prefix = Some("0b");
            self.scan_digits(runes::is_binary_digit)
        } else {
            let mut digits = self.scan_digits(runes::is_decimal_digit);
            if self.cursor.check_char('.') && self.cursor.check_next(runes::is_decimal_digit) {
                self.cursor.next();
                digits += self.scan_digits(runes::is_decimal_digit);
                is_float = true;
            }
            let before_exponent = self.cursor.mark();
            if self.cursor.match_char('e') {
                self.cursor.match_pred(runes::is_sign);
                if self.cursor.check(runes::is_decimal_digit) {
                    digits += self.scan_digits(runes::is_decimal_digit);
                    is_float = true;
                } else {
                    self.cursor.rewind(before_exponent);
                }
            }
            digits
        };
        if self.cursor.check(runes::is_name_char) {
            let offender = self.cursor.peek().unwrap();
            self.cursor.next_while(runes::is_name_char);
            self.push_invalid(number_suffix_message(offender), self.cursor.locate_from(mark));
            return;
        }
        if digits == 0 {
            if let Some(prefix) = prefix {
                self.push_invalid(
                    format!("missing digits after '{prefix}'"),
                    self.cursor.locate_from(mark),
                );
                return;
            }
        }
        let tag = if is_float { TokenTag::Float } else { TokenTag::Integer };
        let text = self.cursor.text_from(mark).to_string();
        self.tokens
            .push(Token::with_text(tag, text, self.cursor.locate_from(mark)));
    }

    fn scan_name(&mut self) {
        let mark = self.cursor.mark();
        // The dispatcher vetted the start rune.
        self.cursor.next();
        self.cursor.next_while(runes::is_name_continue);
        while self.cursor.check(runes::is_name_medial) {
            if self.cursor.check_next(runes::is_name_continue) {
                self.cursor.next();
                self.cursor.next_while(runes::is_name_continue);
            } else {
                let hyphen = self.cursor.mark();
                self.cursor.next();
                self.report(
                    "syntax/invalid-name",
                    "a '-' in a name must be followed by more name characters",
                    self.cursor.locate_from(hyphen),
                );
                break;
            }
        }
        if self.cursor.match_pred(runes::is_name_final) && self.cursor.check(runes::is_name_char) {
            let trail = self.cursor.mark();
            self.cursor.next_while(runes::is_name_char);
            self.report(
                "syntax/invalid-name",
                "trailing characters after a name-final '?' or '!'",
                self.cursor.locate_from(trail),
            );
        }
        if self.cursor.check(runes::is_bidi_mark) && self.cursor.check_next(runes::is_name_char) {
            let start = self.cursor.offset();
            let length = self.cursor.peek().map_or(0, |rune| rune.len_utf8() as u32);
            self.report(
                "syntax/invalid-name",
                "bidirectional mark embedded in a name",
                Loc::new(start, length),
            );
        }
        let loc = self.cursor.locate_from(mark);
        let text: String = self.cursor.text_from(mark).nfc().collect();
        match syntax::keyword_tag(&text) {
            Some(tag) => self.tokens.push(Token::new(tag, loc)),
            None => self.tokens.push(Token::with_text(TokenTag::Name, text, loc)),
        }
    }

    fn scan_standard_string(&mut self) {
        let mark = self.cursor.mark();
        if self.cursor.match_seq(3, |rune| rune == '"') {
            self.scan_block_string(mark);
            return;
        }
        self.cursor.next();
        loop {
            let problems = &mut self.problems;
            let scan = self.cursor.next_until(
                |rune| rune == '"' || rune == '\\' || runes::is_newline(rune),
                |rune, loc| problems.push(forbidden_problem(rune, loc)),
            );
            match scan {
                Scan::Forbidden => {
                    self.cursor.next();
                }
                Scan::Empty => {
                    self.push_invalid(
                        "unclosed string literal".to_string(),
                        self.cursor.locate_from(mark),
                    );
                    return;
                }
                Scan::Matched => {
                    if self.cursor.match_char('"') {
                        let text = self.cursor.text_from(mark).to_string();
                        self.tokens.push(Token::with_text(
                            TokenTag::String,
                            text,
                            self.cursor.locate_from(mark),
                        ));
                        return;
                    }
                    if self.cursor.check(runes::is_newline) {
                        self.push_invalid(
                            "newline in string literal; close the string or escape the newline"
                                .to_string(),
                            self.cursor.locate_from(mark),
                        );
                        return;
                    }
                    self.scan_escape_in_string();
                }
            }
        }
    }

    /// The body of a `"""` string ends at the next `"""` not preceded by a
    /// backslash; newlines are content.
    fn scan_block_string(&mut self, mark: Mark) {
        loop {
            let problems = &mut self.problems;
            let scan = self.cursor.next_until(
                |rune| rune == '"' || rune == '\\',
                |rune, loc| problems.push(forbidden_problem(rune, loc)),
            );
            match scan {
                Scan::Forbidden => {
                    self.cursor.next();
                }
                Scan::Empty => {
                    self.push_invalid(
                        "unclosed string literal".to_string(),
                        self.cursor.locate_from(mark),
                    );
                    return;
                }
                Scan::Matched => {
                    if self.cursor.check_char('\\') {
                        self.scan_escape_in_string();
                        continue;
                    }
                    if self.cursor.match_seq(3, |rune| rune == '"') {
                        let text = self.cursor.text_from(mark).to_string();
                        self.tokens.push(Token::with_text(
                            TokenTag::String,
                            text,
                            self.cursor.locate_from(mark),
                        ));
                        return;
                    }
                    // a lone quote is content
                    self.cursor.next();
                }
            }
        }
    }

    fn scan_raw_string(&mut self) {
        let mark = self.cursor.mark();
        if self.cursor.match_seq(3, |rune| rune == '`') {
            loop {
                let problems = &mut self.problems;
                let scan = self.cursor.next_until(
                    |rune| rune == '`',
                    |rune, loc| problems.push(forbidden_problem(rune, loc)),
                );
                match scan {
                    Scan::Forbidden => {
                        self.cursor.next();
                    }
                    Scan::Empty => {
                        self.push_invalid(
                            "unclosed string literal".to_string(),
                            self.cursor.locate_from(mark),
                        );
                        return;
                    }
                    Scan::Matched => {
                        if self.cursor.match_seq(3, |rune| rune == '`') {
                            let text = self.cursor.text_from(mark).to_string();
                            self.tokens.push(Token::with_text(
                                TokenTag::String,
                                text,
                                self.cursor.locate_from(mark),
                            ));
                            return;
                        }
                        self.cursor.next();
                    }
                }
            }
        }
        self.cursor.next();
        loop {
            let problems = &mut self.problems;
            let scan = self.cursor.next_until(
                |rune| rune == '`' || runes::is_newline(rune),
                |rune, loc| problems.push(forbidden_problem(rune, loc)),
            );
            match scan {
                Scan::Forbidden => {
                    self.cursor.next();
                }
                Scan::Empty => {
                    self.push_invalid(
                        "unclosed string literal".to_string(),
                        self.cursor.locate_from(mark),
                    );
                    return;
                }
                Scan::Matched => {
                    if self.cursor.match_char('`') {
                        let text = self.cursor.text_from(mark).to_string();
                        self.tokens.push(Token::with_text(
                            TokenTag::String,
                            text,
                            self.cursor.locate_from(mark),
                        ));
                        return;
                    }
                    self.push_invalid(
                        "newline in string literal; close the string before the line break"
                            .to_string(),
                        self.cursor.locate_from(mark),
                    );
                    return;
                }
            }
        }
    }

    /// Validate and consume one escape sequence; the string keeps lexing
    /// past a bad one.
    fn scan_escape_in_string(&mut self) {
        let mark = self.cursor.mark();
        let scanned = strings::scan_escape(self.cursor.rest());
        self.cursor.advance(scanned.len);
        if let Escape::Invalid { message } = scanned.escape {
            self.report("syntax/invalid-escape", message, self.cursor.locate_from(mark));
        }
    }

    fn scan_punctuation(&mut self) {
        let mark = self.cursor.mark();
        for (symbol, tag) in syntax::PUNCT_2 {
            if self.cursor.match_str(symbol) {
                self.tokens
                    .push(Token::new(*tag, self.cursor.locate_from(mark)));
                return;
            }
        }
        let rune = self.cursor.peek().unwrap_or_default();
        if let Some(tag) = syntax::punct_1_tag(rune) {
            self.cursor.next();
            self.tokens
                .push(Token::new(tag, self.cursor.locate_from(mark)));
            return;
        }
        self.cursor.next();
        let message = if rune == '&' {
            "a lone '&' is not a token; logical and is '&&'".to_string()
        } else {
            format!("unexpected character '{rune}'")
        };
        self.push_invalid(message, self.cursor.locate_from(mark));
    }

    fn scan_invalid(&mut self) {
        let mark = self.cursor.mark();
        let rune = self.cursor.next().unwrap_or_default();
        self.push_invalid(invalid_rune_message(rune), self.cursor.locate_from(mark));
    }
}

fn forbidden_problem(rune: char, loc: Loc) -> Problem {
    Problem::new("syntax/invalid-token", invalid_rune_message(rune), loc)
}

fn invalid_rune_message(rune: char) -> String {
    if matches!(rune, '\u{0085}' | '\u{2028}' | '\u{2029}') {
        return format!("unsupported line separator U+{:04X}; use a line feed", rune as u32);
    }
    if matches!(rune, '\u{000B}' | '\u{000C}') || runes::is_space_separator(rune) {
        return format!("unsupported whitespace character U+{:04X}; use a space", rune as u32);
    }
    if rune.is_control() {
        return format!("unsupported control character U+{:04X}", rune as u32);
    }
    format!("unexpected character '{rune}'")
}

fn number_suffix_message(offender: char) -> String {
    match offender {
        'X' => "invalid number: use '0x' for hexadecimal".to_string(),
        'B' => "invalid number: use '0b' for binary".to_string(),
        '-' => "invalid number: insert a space before '-' to subtract".to_string(),
        'e' => "invalid number: missing digits in the exponent".to_string(),
        'E' => "invalid number: use a lowercase 'e' for the exponent".to_string(),
        _ => format!("invalid number: name character '{offender}' directly after a number"),
    }
}
