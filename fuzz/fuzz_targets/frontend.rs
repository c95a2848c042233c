#![no_main]

use libfuzzer_sys::fuzz_target;
use weald::{parse, tokenise, Source};

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let body = String::from_utf8_lossy(data);
    let source = Source::new("fuzz.weald", body.into_owned());
    let (tokens, _) = tokenise(&source);

    // The parser is total over every lexer output.
    let (script, problems) = parse(&tokens);
    assert!(script.loc.end() as usize <= source.body.len());
    for problem in &problems {
        assert!((problem.loc.end() as usize) <= source.body.len());
    }
});
