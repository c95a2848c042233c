//! Character-level predicates shared by the cursor, lexer, and string
//! interpretation.

/// Horizontal whitespace: space, tab, and the bidirectional marks.
pub fn is_whitespace(rune: char) -> bool {
    matches!(rune, ' ' | '\t' | '\u{200E}' | '\u{200F}')
}

pub fn is_newline(rune: char) -> bool {
    matches!(rune, '\n' | '\r')
}

pub fn is_ignorable(rune: char) -> bool {
    is_whitespace(rune) || is_newline(rune)
}

/// Runes that may not appear in source text outside escape sequences:
/// control characters that are not ignorable, plus the Unicode line and
/// paragraph separators. (Unpaired surrogates belong here too, but cannot
/// occur in a Rust string.)
pub fn is_forbidden(rune: char) -> bool {
    (rune.is_control() && !is_ignorable(rune)) || matches!(rune, '\u{2028}' | '\u{2029}')
}

pub fn is_bidi_mark(rune: char) -> bool {
    matches!(rune, '\u{200E}' | '\u{200F}')
}

/// Unicode space separators other than the plain space.
pub fn is_space_separator(rune: char) -> bool {
    matches!(
        rune,
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
    )
}

pub fn is_punctuation(rune: char) -> bool {
    matches!(
        rune,
        '!' | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '*'
            | '\\'
            | '&'
            | '#'
            | '%'
            | '`'
            | '^'
            | '|'
            | '~'
            | '$'
            | '+'
            | '-'
            | ','
            | ';'
            | ':'
            | '?'
            | '.'
            | '@'
            | '/'
            | '<'
            | '='
            | '>'
    )
}

pub fn is_name_start(rune: char) -> bool {
    rune == '_' || unicode_ident::is_xid_start(rune)
}

pub fn is_name_continue(rune: char) -> bool {
    unicode_ident::is_xid_continue(rune)
}

pub fn is_name_medial(rune: char) -> bool {
    rune == '-'
}

pub fn is_name_final(rune: char) -> bool {
    rune == '?' || rune == '!'
}

pub fn is_name_char(rune: char) -> bool {
    is_name_continue(rune) || is_name_medial(rune) || is_name_final(rune)
}

pub fn is_decimal_digit(rune: char) -> bool {
    rune.is_ascii_digit()
}

pub fn is_hex_digit(rune: char) -> bool {
    rune.is_ascii_hexdigit()
}

pub fn is_binary_digit(rune: char) -> bool {
    rune == '0' || rune == '1'
}

pub fn is_sign(rune: char) -> bool {
    rune == '+' || rune == '-'
}

pub fn is_number_start(rune: char) -> bool {
    is_sign(rune) || is_decimal_digit(rune)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidi_marks_are_whitespace_but_not_forbidden() {
        assert!(is_whitespace('\u{200E}'));
        assert!(!is_forbidden('\u{200F}'));
    }

    #[test]
    fn line_and_paragraph_separators_are_forbidden() {
        assert!(is_forbidden('\u{2028}'));
        assert!(is_forbidden('\u{2029}'));
        assert!(is_forbidden('\u{0085}'));
        assert!(is_forbidden('\u{000B}'));
        assert!(!is_forbidden('\n'));
        assert!(!is_forbidden('\t'));
    }

    #[test]
    fn name_classes_cover_the_identifier_grammar() {
        assert!(is_name_start('_'));
        assert!(is_name_start('å'));
        assert!(!is_name_start('1'));
        assert!(is_name_continue('1'));
        assert!(is_name_medial('-'));
        assert!(is_name_final('?'));
        assert!(is_name_final('!'));
        assert!(is_name_char('x') && is_name_char('-') && is_name_char('!'));
        assert!(!is_name_char(' '));
    }

    #[test]
    fn digit_families_are_disjoint_where_expected() {
        assert!(is_hex_digit('F') && !is_decimal_digit('F'));
        assert!(is_binary_digit('1') && !is_binary_digit('2'));
        assert!(is_number_start('-') && is_number_start('7'));
    }
}
