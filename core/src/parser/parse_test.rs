use super::*;
use pretty_assertions::assert_eq;

fn statements(source: &str) -> Vec<Statement> {
    parse(source)
        .unwrap_or_else(|e| panic!("Parsing failed: {}\n{}", source, e))
        .statements
}

#[test]
fn test_number_literal_keeps_text() {
    let expr = parse_expression("0.10").unwrap();
    assert_eq!(expr.kind, ExprKind::Number("0.10".to_string()));
    assert_eq!(expr.span, Span(0..4));
}

#[test]
fn test_spans_cover_operands() {
    let expr = parse_expression("a + bc * 2").unwrap();
    assert_eq!(expr.span, Span(0..10));
    match expr.kind {
        ExprKind::Binary { op, left, right } => {
            assert_eq!(op, BinaryOp::Add);
            assert_eq!(left.span, Span(0..1));
            assert_eq!(right.span, Span(4..10));
        }
        other => panic!("expected a binary expression, got {:?}", other),
    }
}

#[test]
fn test_unary_span_includes_operator() {
    let expr = parse_expression("  -x").unwrap();
    assert_eq!(expr.span, Span(2..4));
}

#[test]
fn test_call_arguments() {
    let expr = parse_expression("hypot(3, 4)").unwrap();
    match expr.kind {
        ExprKind::Call {
            name,
            name_span,
            args,
        } => {
            assert_eq!(name, "hypot");
            assert_eq!(name_span, Span(0..5));
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected a call, got {:?}", other),
    }
    let empty = parse_expression("now()").unwrap();
    assert!(matches!(empty.kind, ExprKind::Call { ref args, .. } if args.is_empty()));
}

#[test]
fn test_statement_sequence() {
    let parsed = statements("x := 2; y := x * 3; x + y;");
    assert_eq!(parsed.len(), 3);
    match &parsed[0] {
        Statement::Assign {
            name, name_span, ..
        } => {
            assert_eq!(name, "x");
            assert_eq!(name_span, &Span(0..1));
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
    assert!(matches!(parsed[2], Statement::Expr(_)));
}

#[test]
fn test_identifier_prefix_is_not_assignment() {
    let parsed = statements("x + 1");
    assert!(matches!(parsed[0], Statement::Expr(_)));
}

#[test]
fn test_syntax_errors() {
    for source in ["", "1 +", "(1", "1 2", "f(1,)", "x :=", ";", "1 ;; 2", "2x", "a = 1"] {
        let err = parse(source).expect_err(source);
        assert_eq!(err.source, source);
        assert!(
            matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }),
            "unexpected error kind for '{}': {:?}",
            source,
            err.kind
        );
    }
}

#[test]
fn test_error_reports_position() {
    let err = parse("1 + * 2").unwrap_err();
    assert_eq!(err.span.0.start, 4);
    match err.kind {
        ParseErrorKind::UnexpectedToken { found, .. } => assert_eq!(found, "'*'"),
        other => panic!("expected UnexpectedToken, got {:?}", other),
    }
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    assert!(parse_with_max_depth(&deep, 10).is_ok());
    let err = parse_with_max_depth(&deep, 9).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::MaxDepthExceeded {
            depth: 10,
            max_depth: 9
        }
    );

    let signs = format!("{}1", "- ".repeat(20));
    assert!(matches!(
        parse_with_max_depth(&signs, 8).unwrap_err().kind,
        ParseErrorKind::MaxDepthExceeded { .. }
    ));
    // Signs separated by operands do not accumulate.
    assert!(parse_with_max_depth("1 - 2 - 3 - 4 - 5", 2).is_ok());
}

#[test]
fn test_parse_expression_rejects_statements() {
    assert!(parse_expression("x := 1").is_err());
    assert!(parse_expression("1; 2").is_err());
    assert!(parse_expression("1;").is_ok());
}
