use crate::parser::ast::{Expr, ExprKind, Program, Statement};
use crate::parser::error::{ParseError, ParseErrorKind, convert_pest_error};
use crate::parser::syntax::{BinaryOp, Span, UnaryOp};
use lazy_static::lazy_static;
use pest::Parser;
use pest::error::{Error as PestError, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // Additive
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        // Multiplicative
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        // Sign
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
        // Exponentiation binds tighter than sign: -2^2 is -(2^2)
        .op(Op::infix(Rule::pow, Assoc::Right));
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// Default limit for nested parentheses and runs of sign operators.
pub const DEFAULT_MAX_DEPTH: usize = 256;

pub fn parse(source: &str) -> Result<Program, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Program, ParseError> {
    check_nesting(source, max_depth)?;

    let mut pairs =
        ExpressionParser::parse(Rule::main, source).map_err(|e| convert_pest_error(e, source))?;
    let main = pairs.next().ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::Other {
                message: "empty parse tree".to_string(),
            },
            source.to_string(),
            Span::new(0, source.len()),
        )
    })?;

    let statements = main
        .into_inner()
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(parse_statement)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| convert_pest_error(e, source))?;

    Ok(Program { statements })
}

/// Parses a single expression such as a function body. Assignments and
/// statement sequences are rejected.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut program = parse(source)?;
    match (program.statements.pop(), program.statements.is_empty()) {
        (Some(Statement::Expr(expr)), true) => Ok(expr),
        (Some(statement), _) => Err(ParseError::new(
            ParseErrorKind::Other {
                message: "expected a single expression".to_string(),
            },
            source.to_string(),
            statement.span(),
        )),
        (None, _) => Err(ParseError::new(
            ParseErrorKind::Other {
                message: "expected an expression".to_string(),
            },
            source.to_string(),
            Span::new(0, source.len()),
        )),
    }
}

/// Rejects inputs that would recurse too deeply in the parser before pest
/// sees them.
fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let exceeded = |depth: usize, offset: usize| {
        ParseError::new(
            ParseErrorKind::MaxDepthExceeded { depth, max_depth },
            source.to_string(),
            Span::new(offset, offset + 1),
        )
    };

    let mut depth = 0usize;
    let mut signs = 0usize;
    for (offset, c) in source.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > max_depth {
                    return Err(exceeded(depth, offset));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            '+' | '-' => {
                signs += 1;
                if signs > max_depth {
                    return Err(exceeded(signs, offset));
                }
                continue;
            }
            c if c.is_whitespace() => continue,
            _ => {}
        }
        signs = 0;
    }
    Ok(())
}

fn custom_error(message: impl Into<String>, span: pest::Span<'_>) -> PestError<Rule> {
    PestError::new_from_span(
        ErrorVariant::CustomError {
            message: message.into(),
        },
        span,
    )
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, span: pest::Span<'i>) -> Result<Pair<'i, Rule>, PestError<Rule>> {
    pairs
        .next()
        .ok_or_else(|| custom_error("missing expected pair in rule", span))
}

fn parse_statement(pair: Pair<Rule>) -> Result<Statement, PestError<Rule>> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::assignment => {
            let mut inner = pair.into_inner();
            let name = next_pair(&mut inner, span)?;
            let value = parse_expr(next_pair(&mut inner, span)?)?;
            Ok(Statement::Assign {
                name: name.as_str().to_string(),
                name_span: name.as_span().into(),
                value,
            })
        }
        Rule::expression => Ok(Statement::Expr(parse_expr(pair)?)),
        rule => Err(custom_error(format!("unexpected statement {:?}", rule), span)),
    }
}

pub fn parse_expr(pair: Pair<Rule>) -> Result<Expr, PestError<Rule>> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::expression => PRATT_PARSER
            .map_primary(parse_expr)
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                let unary = match op.as_rule() {
                    Rule::neg => UnaryOp::Neg,
                    Rule::pos => UnaryOp::Plus,
                    rule => {
                        return Err(custom_error(
                            format!("unexpected prefix operator {:?}", rule),
                            op.as_span(),
                        ));
                    }
                };
                let span = Span::new(op.as_span().start(), rhs.span.0.end);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: unary,
                        operand: Box::new(rhs),
                    },
                    span,
                ))
            })
            .map_infix(|lhs, op, rhs| {
                let (lhs, rhs) = (lhs?, rhs?);
                let binary = match op.as_rule() {
                    Rule::add => BinaryOp::Add,
                    Rule::sub => BinaryOp::Sub,
                    Rule::mul => BinaryOp::Mul,
                    Rule::div => BinaryOp::Div,
                    Rule::rem => BinaryOp::Rem,
                    Rule::pow => BinaryOp::Pow,
                    rule => {
                        return Err(custom_error(
                            format!("unexpected infix operator {:?}", rule),
                            op.as_span(),
                        ));
                    }
                };
                let span = Span::combine(&lhs.span, &rhs.span);
                Ok(Expr::new(
                    ExprKind::Binary {
                        op: binary,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    },
                    span,
                ))
            })
            .parse(pair.into_inner()),
        Rule::grouped => parse_expr(next_pair(&mut pair.into_inner(), span)?),
        Rule::number => Ok(Expr::new(
            ExprKind::Number(pair.as_str().to_string()),
            span.into(),
        )),
        Rule::ident => Ok(Expr::new(
            ExprKind::Ident(pair.as_str().to_string()),
            span.into(),
        )),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = next_pair(&mut inner, span)?;
            let args = inner.map(parse_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::new(
                ExprKind::Call {
                    name: name.as_str().to_string(),
                    name_span: name.as_span().into(),
                    args,
                },
                span.into(),
            ))
        }
        rule => Err(custom_error(format!("unexpected rule {:?}", rule), span)),
    }
}
