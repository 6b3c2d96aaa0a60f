//! Whitelisted arithmetic evaluation
//!
//! Messages are reduced to digits, `+ - * / %`, parentheses and the decimal
//! point before anything is parsed, so letters never reach the evaluator.
//! The expression is parsed with nom into a small AST and evaluated with
//! explicit division-by-zero checks.

use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Longest sanitised expression accepted
const MAX_EXPRESSION_LEN: usize = 200;

/// Explicit commands; the rest of the message is sanitised
static COMMAND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:calculate|calc|compute|计算)\s*[:：]?\s*(.+)$").unwrap()
});

/// Questions only count when what follows is already arithmetic
static QUESTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:what\s+is|what's)\s*[:：]?\s*(.+)$").unwrap());

static BARE_EXPRESSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s.+\-*/%()x×÷=?]+$").unwrap());

/// A binary operator with an operand on each side, after sanitising
static BINARY_OPERATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d)][+\-*/%]+[\d(.]").unwrap());

static DATE_LIKE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{1,2}-\d{1,2})\s*\??\s*$").unwrap()
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("Empty expression")]
    Empty,

    #[error("Expression too long")]
    TooLong,

    #[error("Could not parse expression")]
    Syntax,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary(Box<Expr>, Op, Box<Expr>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    /// Expression part of a calculator request, if the message is one
    ///
    /// `calculate|calc|compute` sanitise whatever follows them. `what is …`
    /// and bare messages must already be pure arithmetic. Dates never count.
    pub fn extract_expression(&self, message: &str) -> Option<String> {
        let candidate = if let Some(c) = COMMAND_PATTERN.captures(message) {
            c.get(1)?.as_str()
        } else if let Some(c) = QUESTION_PATTERN.captures(message) {
            let rest = c.get(1)?.as_str();
            if !BARE_EXPRESSION_PATTERN.is_match(rest) {
                return None;
            }
            rest
        } else if BARE_EXPRESSION_PATTERN.is_match(message) {
            message
        } else {
            return None;
        };
        if DATE_LIKE_PATTERN.is_match(candidate) {
            return None;
        }

        let sanitized = sanitize(candidate);
        BINARY_OPERATION_PATTERN
            .is_match(&sanitized)
            .then_some(sanitized)
    }

    pub fn evaluate(&self, expression: &str) -> Result<f64, CalculatorError> {
        let sanitized = sanitize(expression);
        if sanitized.is_empty() {
            return Err(CalculatorError::Empty);
        }
        if sanitized.len() > MAX_EXPRESSION_LEN {
            return Err(CalculatorError::TooLong);
        }

        let ast = match all_consuming(expr)(sanitized.as_str()) {
            Ok((_, ast)) => ast,
            Err(_) => return Err(CalculatorError::Syntax),
        };
        let value = eval(&ast)?;
        if !value.is_finite() {
            return Err(CalculatorError::NotFinite);
        }
        Ok(value)
    }
}

/// Keep only the arithmetic whitelist; common multiplication/division glyphs
/// are mapped to their ASCII operators first
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'x' | 'X' | '×' => '*',
            '÷' => '/',
            other => other,
        })
        .filter(|c| c.is_ascii_digit() || "+-*/%().".contains(*c))
        .collect()
}

/// Integers print without decimals, everything else with at most four
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.4}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn eval(ast: &Expr) -> Result<f64, CalculatorError> {
    match ast {
        Expr::Number(n) => Ok(*n),
        Expr::Neg(inner) => Ok(-eval(inner)?),
        Expr::Binary(lhs, op, rhs) => {
            let (a, b) = (eval(lhs)?, eval(rhs)?);
            match op {
                Op::Add => Ok(a + b),
                Op::Sub => Ok(a - b),
                Op::Mul => Ok(a * b),
                Op::Div | Op::Rem if b == 0.0 => Err(CalculatorError::DivisionByZero),
                Op::Div => Ok(a / b),
                Op::Rem => Ok(a % b),
            }
        }
    }
}

fn number(input: &str) -> IResult<&str, Expr> {
    map_res(recognize(pair(digit1, opt(pair(char('.'), digit1)))), |s: &str| {
        s.parse::<f64>().map(Expr::Number)
    })(input)
}

fn factor(input: &str) -> IResult<&str, Expr> {
    delimited(
        multispace0,
        alt((
            number,
            map(preceded(char('-'), factor), |e| Expr::Neg(Box::new(e))),
            preceded(char('+'), factor),
            delimited(char('('), expr, char(')')),
        )),
        multispace0,
    )(input)
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = factor(input)?;
    fold_many0(
        pair(alt((char('*'), char('/'), char('%'))), factor),
        move || first.clone(),
        |acc, (op, rhs)| {
            let op = match op {
                '*' => Op::Mul,
                '/' => Op::Div,
                _ => Op::Rem,
            };
            Expr::Binary(Box::new(acc), op, Box::new(rhs))
        },
    )(input)
}

fn expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    fold_many0(
        pair(alt((char('+'), char('-'))), term),
        move || first.clone(),
        |acc, (op, rhs)| {
            let op = if op == '+' { Op::Add } else { Op::Sub };
            Expr::Binary(Box::new(acc), op, Box::new(rhs))
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let calc = Calculator::new();
        assert_eq!(calc.evaluate("2+2*3").unwrap(), 8.0);
        assert_eq!(calc.evaluate("(2+2)*3").unwrap(), 12.0);
        assert_eq!(calc.evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(calc.evaluate("-3 * -2").unwrap(), 6.0);
        assert_eq!(calc.evaluate("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn test_extract_expression() {
        let calc = Calculator::new();
        assert_eq!(calc.extract_expression("calculate 2+2*3").as_deref(), Some("2+2*3"));
        assert_eq!(calc.extract_expression("what is 12 x 3?").as_deref(), Some("12*3"));
        assert_eq!(calc.extract_expression("15 / 3").as_deref(), Some("15/3"));
        assert!(calc.extract_expression("what is the DBS limit").is_none());
        assert!(calc.extract_expression("show issue 12").is_none());
        assert!(calc.extract_expression("3/5/2024").is_none());
        assert!(calc.extract_expression("what's my c-op 12").is_none());
    }

    #[test]
    fn test_questions_with_dates_are_not_arithmetic() {
        let calc = Calculator::new();
        assert!(calc.extract_expression("what is the daily report for 3/15/2024").is_none());
        assert!(calc
            .extract_expression("what is the status of bank issues on 2024-03-05")
            .is_none());
        assert!(calc.extract_expression("what's 3/15/2024?").is_none());
        assert!(calc.extract_expression("calculate 2024-03-05").is_none());
        assert_eq!(calc.extract_expression("what's 7 - 2").as_deref(), Some("7-2"));
    }

    #[test]
    fn test_letters_are_stripped_before_parsing() {
        let calc = Calculator::new();
        let expression = calc.extract_expression("calculate 2+alert(1)").unwrap();
        assert_eq!(expression, "2+(1)");
        assert_eq!(calc.evaluate(&expression).unwrap(), 3.0);
    }

    #[test]
    fn test_errors() {
        let calc = Calculator::new();
        assert_eq!(calc.evaluate("5/0"), Err(CalculatorError::DivisionByZero));
        assert_eq!(calc.evaluate("2+"), Err(CalculatorError::Syntax));
        assert_eq!(calc.evaluate("abc"), Err(CalculatorError::Empty));
        assert_eq!(calc.evaluate(&"1+".repeat(150)), Err(CalculatorError::TooLong));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333");
        assert_eq!(format_number(-4.0), "-4");
    }
}
