#![no_main]

use libfuzzer_sys::fuzz_target;
use weald::{tokenise, Source, TokenTag};

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let body = String::from_utf8_lossy(data);
    let source = Source::new("fuzz.weald", body.into_owned());
    let (tokens, problems) = tokenise(&source);

    // Exactly one End, and it comes last.
    let ends = tokens.iter().filter(|t| t.tag == TokenTag::End).count();
    assert_eq!(ends, 1);
    assert_eq!(tokens.last().map(|t| t.tag), Some(TokenTag::End));

    // No leading or doubled newline tokens, and every span stays in bounds.
    let mut previous: Option<TokenTag> = None;
    for token in &tokens {
        if token.tag == TokenTag::Newline {
            assert!(previous.is_some());
            assert_ne!(previous, Some(TokenTag::Newline));
        }
        assert!((token.loc.end() as usize) <= source.body.len());
        previous = Some(token.tag);
    }
    for problem in &problems {
        assert!((problem.loc.end() as usize) <= source.body.len());
    }
});
