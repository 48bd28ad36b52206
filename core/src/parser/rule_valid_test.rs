// Tests with valid expressions for each rule in the parser.

use crate::parser::{ExpressionParser, Rule};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target: Rule) -> bool {
    if pair.as_rule() == target {
        return true;
    }
    for inner in pair.into_inner() {
        if contains_rule(inner, target) {
            return true;
        }
    }
    false
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                let inputs = vec![$($expr),*];
                for input in inputs {
                    let result = ExpressionParser::parse(Rule::main, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    number => ["42", "3.14", "2.", ".5", "6.022e23", "1.6E-19", "1e+3"],
    ident => ["foo", "_bar123", "x2"],
    call => ["foo()", "foo(1)", "max(1, 2, 3)", "f(g(x))"],
    grouped => ["(1)", "(a + b) * c", "((x))"],
    assignment => ["x := 1", "rate := 0.5 * base", "a := 1; a + 1"],
    add => ["1 + 2", "a * (b + c)"],
    sub => ["1 - 2", "f(x - 1)"],
    mul => ["1 * 2", "a * ( b + c )"],
    div => ["1 / 2", "a / b / c"],
    rem => ["7 % 3", "x % 2 + 1"],
    pow => ["2 ^ 3", "a ^ b"],
    neg => ["- 1", "-a", "2 * -x"],
    pos => ["+1", "a - +b"],
}
