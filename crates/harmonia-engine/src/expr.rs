//! Translation of scalar expressions into polars expressions.
//!
//! Supported forms, lowest precedence first:
//!
//! | Form | Example |
//! |------|---------|
//! | `or`, `and`, `not` | `not isnull(A) and B > 2` |
//! | comparison | `=`, `<>`, `<`, `>`, `<=`, `>=` |
//! | additive | `+`, `-`, `\|\|` (string concatenation) |
//! | multiplicative | `*`, `/` |
//! | conditional | `if A = "1" then "x" else ""` |
//! | functions | `cast(A, number)`, `isnull`, `nvl`, `upper`, `lower`, `trim`, `length` |
//!
//! Column references may contain dots (`G1.PRENOM`). String literals use
//! double quotes; a doubled quote inside a literal stands for one quote.
//! Keywords are case-insensitive.

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::{
    alpha1, alphanumeric1, char, digit1, multispace0, none_of, satisfy,
};
use nom::combinator::{all_consuming, map, map_res, not, opt, recognize, value, verify};
use nom::error::ParseError;
use nom::multi::{many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use polars::prelude::{DataType, Expr, Null, col, concat_str, lit, when};

use crate::error::{EngineError, Result};

const RESERVED: [&str; 9] = [
    "and", "or", "not", "if", "then", "else", "true", "false", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Column(String),
    Not(Box<Node>),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    If(Box<Node>, Box<Node>, Box<Node>),
    Call(String, Vec<Node>),
}

/// Parses `source` into a polars expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let node = parse_node(source)?;
    lower(&node).map_err(|message| expression_error(source, message))
}

fn expression_error(source: &str, message: impl Into<String>) -> EngineError {
    EngineError::Expression {
        expression: source.to_string(),
        message: message.into(),
    }
}

fn parse_node(source: &str) -> Result<Node> {
    let parsed: IResult<&str, Node> = all_consuming(ws(expression))(source);
    match parsed {
        Ok((_, node)) => Ok(node),
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) if error.input.is_empty() => {
            Err(expression_error(source, "unexpected end of expression"))
        }
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) => Err(expression_error(
            source,
            format!("unexpected input at '{}'", error.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(expression_error(source, "incomplete expression")),
    }
}

// Whitespace wrapper
fn ws<'a, F, O, E: ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(tag_no_case(word), not(satisfy(is_identifier_char))))
}

fn identifier(input: &str) -> IResult<&str, String> {
    map(
        verify(
            recognize(pair(
                alt((alpha1, tag("_"))),
                many0(alt((alphanumeric1, tag("_"), tag(".")))),
            )),
            |name: &str| !RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name)),
        ),
        String::from,
    )(input)
}

fn number(input: &str) -> IResult<&str, Node> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |text: &str| {
            if text.contains('.') {
                text.parse().map(Node::Float).map_err(|_| "invalid float")
            } else {
                text.parse().map(Node::Int).map_err(|_| "invalid integer")
            }
        },
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, Node> {
    map(
        delimited(
            char('"'),
            many0(alt((value('"', tag("\"\"")), none_of("\"")))),
            char('"'),
        ),
        |chars: Vec<char>| Node::Str(chars.into_iter().collect()),
    )(input)
}

fn conditional(input: &str) -> IResult<&str, Node> {
    map(
        tuple((
            preceded(keyword("if"), expression),
            preceded(keyword("then"), expression),
            preceded(keyword("else"), expression),
        )),
        |(condition, then, otherwise)| {
            Node::If(Box::new(condition), Box::new(then), Box::new(otherwise))
        },
    )(input)
}

fn call(input: &str) -> IResult<&str, Node> {
    map(
        pair(
            identifier,
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), expression),
                ws(char(')')),
            ),
        ),
        |(name, arguments)| Node::Call(name, arguments),
    )(input)
}

fn primary(input: &str) -> IResult<&str, Node> {
    ws(alt((
        string_literal,
        number,
        value(Node::Bool(true), keyword("true")),
        value(Node::Bool(false), keyword("false")),
        value(Node::Null, keyword("null")),
        conditional,
        call,
        map(identifier, Node::Column),
        delimited(char('('), expression, ws(char(')'))),
    )))(input)
}

fn unary(input: &str) -> IResult<&str, Node> {
    alt((
        map(preceded(ws(char('-')), unary), |operand| {
            Node::Neg(Box::new(operand))
        }),
        primary,
    ))(input)
}

fn fold(first: Node, rest: Vec<(BinaryOp, Node)>) -> Node {
    rest.into_iter().fold(first, |left, (op, right)| {
        Node::Binary(op, Box::new(left), Box::new(right))
    })
}

fn multiplicative(input: &str) -> IResult<&str, Node> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
        ))),
        unary,
    ))(input)?;
    Ok((input, fold(first, rest)))
}

fn additive(input: &str) -> IResult<&str, Node> {
    let (input, first) = multiplicative(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOp::Concat, tag("||")),
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
        multiplicative,
    ))(input)?;
    Ok((input, fold(first, rest)))
}

fn comparison(input: &str) -> IResult<&str, Node> {
    let (input, left) = additive(input)?;
    let (input, right) = opt(pair(
        ws(alt((
            value(BinaryOp::NotEq, tag("<>")),
            value(BinaryOp::LtEq, tag("<=")),
            value(BinaryOp::GtEq, tag(">=")),
            value(BinaryOp::Eq, tag("=")),
            value(BinaryOp::Lt, tag("<")),
            value(BinaryOp::Gt, tag(">")),
        ))),
        additive,
    ))(input)?;
    let node = match right {
        Some((op, right)) => Node::Binary(op, Box::new(left), Box::new(right)),
        None => left,
    };
    Ok((input, node))
}

fn negation(input: &str) -> IResult<&str, Node> {
    alt((
        map(preceded(keyword("not"), negation), |operand| {
            Node::Not(Box::new(operand))
        }),
        comparison,
    ))(input)
}

fn conjunction(input: &str) -> IResult<&str, Node> {
    let (input, first) = negation(input)?;
    let (input, rest) = many0(map(preceded(keyword("and"), negation), |right| {
        (BinaryOp::And, right)
    }))(input)?;
    Ok((input, fold(first, rest)))
}

fn expression(input: &str) -> IResult<&str, Node> {
    let (input, first) = conjunction(input)?;
    let (input, rest) = many0(map(preceded(keyword("or"), conjunction), |right| {
        (BinaryOp::Or, right)
    }))(input)?;
    Ok((input, fold(first, rest)))
}

fn lower(node: &Node) -> std::result::Result<Expr, String> {
    let expr = match node {
        Node::Str(value) => lit(value.clone()),
        Node::Int(value) => lit(*value),
        Node::Float(value) => lit(*value),
        Node::Bool(value) => lit(*value),
        Node::Null => lit(Null {}),
        Node::Column(name) => col(name.as_str()),
        Node::Not(operand) => lower(operand)?.not(),
        Node::Neg(operand) => lit(0) - lower(operand)?,
        Node::Binary(op, left, right) => binary(*op, lower(left)?, lower(right)?),
        Node::If(condition, then, otherwise) => when(lower(condition)?)
            .then(lower(then)?)
            .otherwise(lower(otherwise)?),
        Node::Call(name, arguments) => call_function(name, arguments)?,
    };
    Ok(expr)
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    match op {
        BinaryOp::Or => left.or(right),
        BinaryOp::And => left.and(right),
        BinaryOp::Eq => left.eq(right),
        BinaryOp::NotEq => left.neq(right),
        BinaryOp::Lt => left.lt(right),
        BinaryOp::Gt => left.gt(right),
        BinaryOp::LtEq => left.lt_eq(right),
        BinaryOp::GtEq => left.gt_eq(right),
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Concat => concat_str([left, right], "", false),
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left.cast(DataType::Float64) / right.cast(DataType::Float64),
    }
}

fn call_function(name: &str, arguments: &[Node]) -> std::result::Result<Expr, String> {
    let function = name.to_ascii_lowercase();
    let expr = match (function.as_str(), arguments) {
        ("cast", [argument, Node::Column(target)]) => {
            let data_type =
                cast_type(target).ok_or_else(|| format!("unknown cast type '{target}'"))?;
            lower(argument)?.cast(data_type)
        }
        ("cast", _) => return Err("cast expects a value and a type name".to_string()),
        ("nvl", [argument, fallback]) => lower(argument)?.fill_null(lower(fallback)?),
        ("isnull", [argument]) => lower(argument)?.is_null(),
        ("upper", [argument]) => lower(argument)?.str().to_uppercase(),
        ("lower", [argument]) => lower(argument)?.str().to_lowercase(),
        ("trim", [argument]) => lower(argument)?.str().strip_chars(lit(Null {})),
        ("length", [argument]) => lower(argument)?.str().len_chars(),
        ("nvl" | "isnull" | "upper" | "lower" | "trim" | "length", _) => {
            return Err(format!(
                "wrong number of arguments for '{name}': {}",
                arguments.len()
            ));
        }
        _ => return Err(format!("unknown function '{name}'")),
    };
    Ok(expr)
}

fn cast_type(name: &str) -> Option<DataType> {
    match name.to_ascii_lowercase().as_str() {
        "number" => Some(DataType::Float64),
        "integer" => Some(DataType::Int64),
        "string" => Some(DataType::String),
        "boolean" => Some(DataType::Boolean),
        "date" => Some(DataType::Date),
        _ => None,
    }
}
