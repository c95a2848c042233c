use weald::{
    expr_loc, parse, parse_source, render_problems, tokenise, Expr, Loc, Problem, Source,
    SourceInfo, Stmt, Token, TokenTag,
};

fn source(body: &str) -> Source {
    Source::new("scenario.weald", body)
}

fn problem_ids(problems: &[Problem]) -> Vec<&str> {
    problems.iter().map(|problem| problem.id.as_str()).collect()
}

fn tags(tokens: &[Token]) -> Vec<TokenTag> {
    tokens.iter().map(|token| token.tag).collect()
}

#[test]
fn empty_source_is_a_clean_empty_script() {
    let src = source("");
    let (tokens, lex_problems) = tokenise(&src);
    assert_eq!(tags(&tokens), vec![TokenTag::End]);
    assert_eq!(tokens[0].loc, Loc::at(0));
    assert!(lex_problems.is_empty());

    let (script, problems) = parse_source(&src);
    assert!(script.stmts.items.is_empty());
    assert!(problems.is_empty());
}

#[test]
fn declaration_with_addition_round_trips() {
    let src = source("let x = 1 + 2");
    let (tokens, lex_problems) = tokenise(&src);
    assert!(lex_problems.is_empty());
    assert_eq!(
        tags(&tokens),
        vec![
            TokenTag::KwLet,
            TokenTag::Name,
            TokenTag::PEqual,
            TokenTag::Integer,
            TokenTag::PPlus,
            TokenTag::Integer,
            TokenTag::End
        ]
    );

    let (script, problems) = parse_source(&src);
    assert!(problems.is_empty());
    let Stmt::VariableDecl { name, value, .. } = &script.stmts.items[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(name.text, "x");
    let Expr::Call {
        receiver,
        function,
        arguments,
        ..
    } = value
    else {
        panic!("expected a desugared call");
    };
    assert!(matches!(**receiver, Expr::Int { value: 1, .. }));
    assert_eq!(function.text, "+");
    assert!(matches!(
        arguments.as_ref().unwrap().items[..],
        [Expr::Int { value: 2, .. }]
    ));
}

#[test]
fn ambiguous_comparison_chain_still_associates_left() {
    let (script, problems) = parse_source(&source("1 == 2 != 3"));
    assert_eq!(problem_ids(&problems), vec!["syntax/ambiguous-expr"]);
    let Stmt::Expr { expr } = &script.stmts.items[0] else {
        panic!("expected an expression statement");
    };
    let Expr::Call {
        receiver,
        function,
        arguments,
        ..
    } = expr
    else {
        panic!("expected the outer '!=' call");
    };
    assert_eq!(function.text, "!=");
    assert!(matches!(
        arguments.as_ref().unwrap().items[..],
        [Expr::Int { value: 3, .. }]
    ));
    let Expr::Call { function, .. } = &**receiver else {
        panic!("expected the inner '==' call");
    };
    assert_eq!(function.text, "==");
}

#[test]
fn ternary_with_a_block_branch_reports_on_the_branch() {
    let (script, problems) = parse_source(&source("if true ? {} : 1"));
    assert_eq!(problem_ids(&problems), vec!["syntax/block-in-ternary"]);
    assert_eq!(problems[0].loc, Loc::new(10, 2));
    let Stmt::Expr { expr } = &script.stmts.items[0] else {
        panic!("expected an expression statement");
    };
    let Expr::If { ternary_then, .. } = expr else {
        panic!("expected an if");
    };
    assert!(ternary_then.is_some());
}

#[test]
fn unterminated_string_reports_once_across_both_stages() {
    let src = source("\"foo\\");
    let (tokens, lex_problems) = tokenise(&src);
    assert_eq!(tags(&tokens), vec![TokenTag::Invalid, TokenTag::End]);
    assert_eq!(tokens[0].text.as_deref(), Some("unclosed string literal"));
    assert_eq!(problem_ids(&lex_problems), vec!["syntax/invalid-token"]);

    let (script, parse_problems) = parse(&tokens);
    assert!(parse_problems.is_empty());
    let Stmt::Expr { expr } = &script.stmts.items[0] else {
        panic!("expected an expression statement");
    };
    assert!(matches!(expr, Expr::Missing { .. }));
}

#[test]
fn radix_literals_evaluate_through_the_pipeline() {
    let src = source("0xFFF_FF + 0b10_01");
    let (tokens, lex_problems) = tokenise(&src);
    assert!(lex_problems.is_empty());
    assert_eq!(
        tags(&tokens),
        vec![TokenTag::Integer, TokenTag::PPlus, TokenTag::Integer, TokenTag::End]
    );

    let (script, problems) = parse_source(&src);
    assert!(problems.is_empty());
    let Stmt::Expr { expr } = &script.stmts.items[0] else {
        panic!("expected an expression statement");
    };
    let Expr::Call {
        receiver, arguments, ..
    } = expr
    else {
        panic!("expected a call");
    };
    assert!(matches!(**receiver, Expr::Int { value: 0xF_FFFF, .. }));
    assert!(matches!(
        arguments.as_ref().unwrap().items[..],
        [Expr::Int { value: 9, .. }]
    ));
}

#[test]
fn integer_one_above_i128_max_is_a_parser_problem() {
    let src = source("170_141_183_460_469_231_731_687_303_715_884_105_728");
    let (tokens, lex_problems) = tokenise(&src);
    assert_eq!(tags(&tokens), vec![TokenTag::Integer, TokenTag::End]);
    assert!(lex_problems.is_empty());

    let (script, problems) = parse(&tokens);
    assert_eq!(problem_ids(&problems), vec!["syntax/invalid-int"]);
    let Stmt::Expr { expr } = &script.stmts.items[0] else {
        panic!("expected an expression statement");
    };
    assert!(matches!(expr, Expr::Missing { .. }));
}

#[test]
fn token_slices_reproduce_the_non_ignorable_content() {
    let body = "let total = (base + 0x10) -- sum\nshow(total)";
    let src = source(body);
    let (tokens, _) = tokenise(&src);
    let mut rebuilt = String::new();
    for token in &tokens {
        if matches!(token.tag, TokenTag::Newline | TokenTag::End) {
            continue;
        }
        let start = token.loc.start as usize;
        let end = token.loc.end() as usize;
        assert!(end <= body.len());
        rebuilt.push_str(&body[start..end]);
    }
    let expected: String = body
        .replace("-- sum", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("");
    assert_eq!(rebuilt, expected);
}

#[test]
fn every_ast_location_lies_on_token_boundaries() {
    let body = "let x = if ready ? a.go(1) : -2\n{ x }";
    let src = source(body);
    let (tokens, _) = tokenise(&src);
    let (script, _) = parse(&tokens);
    let mut boundaries: Vec<u32> = Vec::new();
    for token in &tokens {
        boundaries.push(token.loc.start);
        boundaries.push(token.loc.end());
    }
    let mut stack: Vec<&Expr> = Vec::new();
    for stmt in &script.stmts.items {
        match stmt {
            Stmt::Expr { expr } => stack.push(expr),
            Stmt::VariableDecl { value, .. } => stack.push(value),
        }
    }
    while let Some(expr) = stack.pop() {
        let loc = expr_loc(expr);
        assert!(boundaries.contains(&loc.start), "start of {expr:?}");
        assert!(boundaries.contains(&loc.end()), "end of {expr:?}");
        match expr {
            Expr::Group { body, .. } | Expr::Else { body, .. } => stack.push(body),
            Expr::Block { stmts, .. } => {
                for stmt in &stmts.items {
                    match stmt {
                        Stmt::Expr { expr } => stack.push(expr),
                        Stmt::VariableDecl { value, .. } => stack.push(value),
                    }
                }
            }
            Expr::If {
                predicate,
                then_branch,
                else_branch,
                ..
            } => {
                stack.push(predicate);
                stack.push(then_branch);
                if let Some(else_branch) = else_branch {
                    stack.push(else_branch);
                }
            }
            Expr::And { left, right, .. } | Expr::Or { left, right, .. } => {
                stack.push(left);
                stack.push(right);
            }
            Expr::Call {
                receiver, arguments, ..
            } => {
                stack.push(receiver);
                if let Some(arguments) = arguments {
                    for item in &arguments.items {
                        stack.push(item);
                    }
                }
            }
            _ => {}
        }
    }
}

#[test]
fn the_front_end_is_deterministic() {
    let body = "let a = \"x\\qy\"\nif a ? 1 : { 2 }\n0xZ &";
    let src = source(body);
    let (first_tokens, first_problems) = tokenise(&src);
    let (second_tokens, second_problems) = tokenise(&src);
    assert_eq!(first_tokens, second_tokens);
    assert_eq!(first_problems, second_problems);

    let (_, first_parse) = parse(&first_tokens);
    let (_, second_parse) = parse(&second_tokens);
    assert_eq!(first_parse, second_parse);
}

#[test]
fn tokens_and_problems_serialize_for_tooling() {
    let (tokens, _) = tokenise(&source("let x = 1"));
    let json = serde_json::to_value(&tokens).expect("serialize tokens");
    let first = json.as_array().expect("token array").first().expect("a token");
    assert_eq!(first["tag"], "KwLet");
    assert_eq!(first["loc"]["start"], 0);
    assert!(first.get("text").is_none());

    let problem = Problem::new("syntax/expected-end", "boom", Loc::new(1, 2));
    let json = serde_json::to_value(&problem).expect("serialize problem");
    assert_eq!(json["id"], "syntax/expected-end");
    assert_eq!(json["loc"]["length"], 2);
}

#[test]
fn problems_render_with_grapheme_aware_columns() {
    let src = source("let na\u{0308}ive = \u{2028}");
    let (_, problems) = parse_source(&src);
    let info = SourceInfo::new(src);
    let rendered = render_problems(&info, &problems);
    assert!(rendered.contains("error[syntax/invalid-token]"));
    // the combining diaeresis does not widen the column count
    assert!(rendered.contains("scenario.weald:1:13"), "got: {rendered}");
}
