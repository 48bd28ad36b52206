use qcalc::{ErrorKind, render_error_to_string_no_color};

mod cases;

test_case! {
    name: division_by_zero,
    input: "1 / 0",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: remainder_by_zero,
    input: "5 % (2 - 2)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: square_root_of_negative,
    input: "sqrt(-4)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: log_of_zero,
    input: "ln(0)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: negative_base_fractional_exponent,
    input: "(-8) ^ 0.5",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: asin_out_of_range,
    input: "asin(2)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: tangent_at_a_pole,
    input: "tan(pi / 2)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: power_too_large,
    input: "10 ^ (10 ^ 30)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: power_too_large_for_an_integer_exponent,
    input: "2 ^ 100000000",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: exponential_too_large,
    input: "exp(10 ^ 30)",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: remainder_of_an_overflowing_power,
    input: "(2 ^ (2 ^ 40)) % 3",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: product_too_large,
    input: "2 ^ 1000000 * 2 ^ 1000000",
    output: Err(ErrorKind::Domain),
}

test_case! {
    name: exponential_underflows_to_zero,
    input: "exp(-(10 ^ 30))",
    output: Ok("0"),
}

test_case! {
    name: remainder_of_a_large_power,
    input: "2 ^ 300000 % 3",
    output: Ok("1"),
}

test_case! {
    name: dangling_operator,
    input: "1 +",
    output: Err(ErrorKind::Parse),
}

test_case! {
    name: unbalanced_parentheses,
    input: "(1 + 2",
    output: Err(ErrorKind::Parse),
}

test_case! {
    name: empty_input,
    input: "",
    output: Err(ErrorKind::Parse),
}

test_case! {
    name: builtin_arity,
    input: "pow(2)",
    output: Err(ErrorKind::Arity),
}

test_case! {
    name: variadic_needs_an_argument,
    input: "max()",
    output: Err(ErrorKind::Arity),
}

#[test]
fn rendered_error_points_at_the_operator() {
    let source = "1 + * 2";
    let err = cases::calculator().evaluate(source).unwrap_err();
    let output = render_error_to_string_no_color(source, &err);
    assert!(output.contains("Expected"));
    assert!(output.contains("found '*'"));
    assert!(output.contains(source));
}

#[test]
fn error_inside_function_reports_the_call() {
    let mut calc = cases::calculator();
    calc.define_function("inv", &["a"], "1 / a").unwrap();
    let source = "2 + inv(0)";
    let err = calc.evaluate(source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
    assert_eq!(err.to_string(), "in function 'inv': division by zero");
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.span.0, 4..10);
}

#[test]
fn overflow_names_the_operation() {
    let err = cases::calculator().evaluate("exp(10 ^ 30)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
    assert_eq!(err.to_string(), "result of exp is too large");
}
