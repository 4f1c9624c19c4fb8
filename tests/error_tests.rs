mod common;

use common::*;
use gparse::parser::{parse_groovy_with_config, ParseError};
use gparse::{Error, ParserConfig};

fn parse_error(source: &str) -> ParseError {
    init_logger();
    match gparse::parse_groovy(source) {
        Ok(unit) => panic!("expected {:?} to fail, got {:?}", source, unit),
        Err(err) => err
            .as_parse_error()
            .cloned()
            .unwrap_or_else(|| panic!("expected a parse error, got {}", err)),
    }
}

fn invalid_kind(source: &str) -> String {
    match parse_error(source) {
        ParseError::InvalidDeclarationContext { decl_kind, .. } => decl_kind,
        other => panic!("expected invalid declaration for {:?}, got {:?}", source, other),
    }
}

#[test]
fn declarations_in_the_wrong_shape() {
    assert_eq!(invalid_kind("(a, 1 + 2) = x"), "multiple assignment");
    assert_eq!(invalid_kind("enum E extends F {}"), "enum");
    assert_eq!(invalid_kind("@interface A extends B {}"), "@interface");
    assert_eq!(invalid_kind("class A extends B, C {}"), "class");
    assert_eq!(invalid_kind("interface I implements J {}"), "interface");
    assert_eq!(invalid_kind("def f(String... a, int b) {}"), "parameter");
    assert_eq!(invalid_kind("class A {\n    foo() {}\n}"), "method");
}

#[test]
fn malformed_array_creators() {
    assert_eq!(invalid_kind("x = new int[]"), "array creator");
    assert_eq!(invalid_kind("x = new int[2] {1, 2}"), "array creator");
}

#[test]
fn unexpected_tokens() {
    for source in ["x = a, b", "a = 1 b = 2", "x = )", "class {}", "if a) {}"] {
        assert!(
            matches!(parse_error(source), ParseError::UnexpectedToken { .. }),
            "{:?} should report an unexpected token",
            source
        );
    }
}

#[test]
fn error_location_points_at_the_offending_line() {
    let err = parse_error("x = 1\ny = 2\nz = )");
    assert_eq!(err.location().line, 3);
    assert_eq!(err.location().column, 5);
}

#[test]
fn long_cast_exhausts_the_lookahead() {
    let config = ParserConfig::default().with_max_lookahead(8);
    let err = parse_groovy_with_config("x = (Map<A, B, C, D, E, F, G, H>) y", config).unwrap_err();
    assert!(matches!(
        err.as_parse_error(),
        Some(ParseError::AmbiguousConstruct { construct, .. }) if construct == "cast"
    ));

    let err = parse_groovy_with_config("Map<A, B, C, D, E, F, G, H> m = [:]", config).unwrap_err();
    assert!(matches!(
        err.as_parse_error(),
        Some(ParseError::AmbiguousConstruct { construct, .. }) if construct == "generic type"
    ));
}

#[test]
fn default_lookahead_handles_the_same_sources() {
    unit("x = (Map<A, B, C, D, E, F, G, H>) y");
    unit("Map<A, B, C, D, E, F, G, H> m = [:]");
}

#[test]
fn deep_nesting_is_rejected() {
    let source = format!("x = {}1{}", "(".repeat(200), ")".repeat(200));
    let err = parse_groovy_with_config(&source, ParserConfig::default().with_max_depth(32)).unwrap_err();
    assert!(matches!(err.as_parse_error(), Some(ParseError::NestingTooDeep { limit: 32, .. })));
}

fn assert_too_deep(source: &str) {
    let err = parse_groovy_with_config(source, ParserConfig::default()).unwrap_err();
    assert!(
        matches!(err.as_parse_error(), Some(ParseError::NestingTooDeep { .. })),
        "expected a nesting error, got {}",
        err
    );
}

#[test]
fn deep_prefix_operators_are_rejected() {
    assert_too_deep(&format!("x = {}a", "!".repeat(100_000)));
    assert_too_deep(&format!("x = {}a", "~".repeat(100_000)));
    assert_too_deep(&format!("x = {}a", "-".repeat(100_000)));
}

#[test]
fn deep_casts_are_rejected() {
    assert_too_deep(&format!("x = {}a", "(int) ".repeat(20_000)));
    assert_too_deep(&format!("x = (int) {}a", "- ".repeat(100_000)));
}

#[test]
fn deep_type_arguments_are_rejected() {
    let depth = 50_000;
    assert_too_deep(&format!("x = y as {}String{}", "List<".repeat(depth), ">".repeat(depth)));
}

#[test]
fn deep_array_initializers_and_annotations_are_rejected() {
    assert_too_deep(&format!("x = new int[][] {}1{}", "{".repeat(20_000), "}".repeat(20_000)));
    assert_too_deep(&format!(
        "class C {{\n    @A({}1{}) int x\n}}",
        "@A(".repeat(20_000),
        ")".repeat(20_000)
    ));
}

#[test]
fn moderate_nesting_stays_within_the_default_limit() {
    unit(&format!("x = {}a", "!".repeat(40)));
    unit(&format!("x = y as {}String{}", "List<".repeat(40), ">".repeat(40)));
}

#[test]
fn unbounded_lookahead_does_not_overflow() {
    let config = ParserConfig::default().with_max_lookahead(usize::MAX);
    for source in [
        "x = (Map<A, B>) y",
        "Map<A, B> m = [:]",
        "(a, b) = pair()",
        "class A {\n    int x = 1\n    <T> T foo() { null }\n}",
        "@Grab('x') def m() {}",
        "foo bar, baz",
    ] {
        parse_groovy_with_config(source, config).unwrap_or_else(|e| panic!("{:?} failed: {}", source, e));
    }
}

#[test]
fn lexical_errors() {
    assert!(matches!(parse_error("x = 'open"), ParseError::LexicalError { .. }));
    assert!(matches!(parse_error("x = 1\n#!/bin/sh"), ParseError::LexicalError { .. }));
    assert!(matches!(parse_error(r#"x = "${a""#), ParseError::LexicalError { .. }));
    assert!(matches!(parse_error("x = /open"), ParseError::LexicalError { .. }));
    assert!(matches!(parse_error("x = $/open/"), ParseError::LexicalError { .. }));
}

#[test]
fn bad_configuration() {
    let err = ParserConfig::from_lookup(|key| (key == "GPARSE_MAX_DEPTH").then(|| "lots".to_string())).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.as_parse_error().is_none());
    assert!(err.to_string().contains("GPARSE_MAX_DEPTH"));
}
