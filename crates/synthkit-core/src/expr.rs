//! # Safe Expression Evaluator
//!
//! Parses and evaluates the closed rule mini-language against a row context
//! (table name → row mapping). The grammar admits literals, name lookup,
//! attribute access `x.y`, `and`/`or`/`not`, and the six comparators with
//! chaining. Arithmetic, calls, indexing, and every other construct fail
//! with [`ExprError::Unsupported`] — this evaluator is hand-built precisely
//! so that rule files can never execute arbitrary code.
//!
//! Missing keys on a row mapping evaluate to null; unknown top-level names
//! are errors. Ordering comparisons across incompatible types are errors
//! (the rules engine treats any error as a non-true result); equality
//! across incompatible types is simply false.

use std::borrow::Cow;
use std::cmp::Ordering;

use indexmap::IndexMap;
use thiserror::Error;

use crate::generate::value::Value;

/// Evaluation context: table name → row mapping.
pub type RowContext<'a> = IndexMap<&'a str, &'a IndexMap<String, Value>>;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unsupported construct: {0}")]
    Unsupported(String),
    #[error("unknown name: {0}")]
    UnknownName(String),
    #[error("cannot order {0} and {1}")]
    Incomparable(&'static str, &'static str),
}

/// Parse `source` and evaluate its truthiness against `ctx`.
pub fn evaluate_truthy(source: &str, ctx: &RowContext<'_>) -> Result<bool, ExprError> {
    let expr = parse(source)?;
    let value = eval(&expr, ctx)?;
    Ok(value.truthy())
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Name(String),
    Attr(Box<Expr>, String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        left: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Cmp(CmpOp),
    LParen,
    RParen,
    Dot,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let mut is_float = false;
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                is_float = true;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            if is_float {
                let value = text
                    .parse()
                    .map_err(|_| ExprError::Parse(format!("bad number '{}'", text)))?;
                tokens.push(Token::Float(value));
            } else {
                let value = text
                    .parse()
                    .map_err(|_| ExprError::Parse(format!("bad number '{}'", text)))?;
                tokens.push(Token::Int(value));
            }
        } else if c == '\'' || c == '"' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(ExprError::Parse("unterminated string literal".to_string()));
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
        } else {
            match c {
                '(' => {
                    tokens.push(Token::LParen);
                    i += 1;
                }
                ')' => {
                    tokens.push(Token::RParen);
                    i += 1;
                }
                '.' => {
                    tokens.push(Token::Dot);
                    i += 1;
                }
                '=' if chars.get(i + 1) == Some(&'=') => {
                    tokens.push(Token::Cmp(CmpOp::Eq));
                    i += 2;
                }
                '!' if chars.get(i + 1) == Some(&'=') => {
                    tokens.push(Token::Cmp(CmpOp::Ne));
                    i += 2;
                }
                '<' => {
                    if chars.get(i + 1) == Some(&'=') {
                        tokens.push(Token::Cmp(CmpOp::Le));
                        i += 2;
                    } else {
                        tokens.push(Token::Cmp(CmpOp::Lt));
                        i += 1;
                    }
                }
                '>' => {
                    if chars.get(i + 1) == Some(&'=') {
                        tokens.push(Token::Cmp(CmpOp::Ge));
                        i += 2;
                    } else {
                        tokens.push(Token::Cmp(CmpOp::Gt));
                        i += 1;
                    }
                }
                other => {
                    return Err(ExprError::Unsupported(format!("character '{}'", other)));
                }
            }
        }
    }
    Ok(tokens)
}

/// Parse an expression source string into a tree.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::Unsupported(
            "trailing input after expression".to_string(),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(id)) if id.eq_ignore_ascii_case(word))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_and()?;
        if !self.peek_keyword("or") {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.peek_keyword("or") {
            self.advance();
            parts.push(self.parse_and()?);
        }
        Ok(Expr::Or(parts))
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_not()?;
        if !self.peek_keyword("and") {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.peek_keyword("and") {
            self.advance();
            parts.push(self.parse_not()?);
        }
        Ok(Expr::And(parts))
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.peek_keyword("not") {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_primary()?;
        let mut rest = Vec::new();
        while let Some(Token::Cmp(op)) = self.peek() {
            let op = *op;
            self.advance();
            rest.push((op, self.parse_primary()?));
        }
        if rest.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                rest,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Int(i)) => Ok(Expr::Int(i)),
            Some(Token::Float(f)) => Ok(Expr::Float(f)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprError::Parse("expected ')'".to_string())),
                }
            }
            Some(Token::Ident(id)) => {
                if id.eq_ignore_ascii_case("true") {
                    return Ok(Expr::Bool(true));
                }
                if id.eq_ignore_ascii_case("false") {
                    return Ok(Expr::Bool(false));
                }
                if id.eq_ignore_ascii_case("null") || id.eq_ignore_ascii_case("none") {
                    return Ok(Expr::Null);
                }
                if ["and", "or", "not"]
                    .iter()
                    .any(|kw| id.eq_ignore_ascii_case(kw))
                {
                    return Err(ExprError::Parse(format!("unexpected keyword '{}'", id)));
                }
                let mut expr = Expr::Name(id);
                while self.peek() == Some(&Token::Dot) {
                    self.advance();
                    match self.advance() {
                        Some(Token::Ident(attr)) => {
                            expr = Expr::Attr(Box::new(expr), attr);
                        }
                        _ => {
                            return Err(ExprError::Parse(
                                "expected attribute name after '.'".to_string(),
                            ))
                        }
                    }
                }
                Ok(expr)
            }
            Some(token) => Err(ExprError::Parse(format!("unexpected token {:?}", token))),
            None => Err(ExprError::Parse("unexpected end of expression".to_string())),
        }
    }
}

/// A value produced during evaluation.
#[derive(Debug, Clone)]
pub enum EvalValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Row(&'a IndexMap<String, Value>),
}

impl EvalValue<'_> {
    pub fn truthy(&self) -> bool {
        match self {
            EvalValue::Null => false,
            EvalValue::Bool(b) => *b,
            EvalValue::Int(i) => *i != 0,
            EvalValue::Float(f) => *f != 0.0,
            EvalValue::Str(s) => !s.is_empty(),
            EvalValue::Row(row) => !row.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            EvalValue::Null => "null",
            EvalValue::Bool(_) => "bool",
            EvalValue::Int(_) => "int",
            EvalValue::Float(_) => "float",
            EvalValue::Str(_) => "string",
            EvalValue::Row(_) => "row",
        }
    }
}

/// Row values enter comparisons as scalars; dates and datetimes become
/// ISO-8601 strings so lexicographic ordering agrees with temporal order.
fn scalar<'a>(value: &'a Value) -> EvalValue<'a> {
    match value {
        Value::Null => EvalValue::Null,
        Value::Bool(b) => EvalValue::Bool(*b),
        Value::Int(i) => EvalValue::Int(*i),
        Value::Float(f) => EvalValue::Float(*f),
        Value::String(s) => EvalValue::Str(Cow::Borrowed(s.as_ref())),
        Value::Date(d) => EvalValue::Str(Cow::Owned(d.format("%Y-%m-%d").to_string())),
        Value::Timestamp(ts) => {
            EvalValue::Str(Cow::Owned(ts.format("%Y-%m-%dT%H:%M:%S").to_string()))
        }
        Value::Uuid(u) => EvalValue::Str(Cow::Owned(u.to_string())),
    }
}

/// Evaluate a parsed expression against a row context.
pub fn eval<'a>(expr: &'a Expr, ctx: &RowContext<'a>) -> Result<EvalValue<'a>, ExprError> {
    match expr {
        Expr::Str(s) => Ok(EvalValue::Str(Cow::Borrowed(s))),
        Expr::Int(i) => Ok(EvalValue::Int(*i)),
        Expr::Float(f) => Ok(EvalValue::Float(*f)),
        Expr::Bool(b) => Ok(EvalValue::Bool(*b)),
        Expr::Null => Ok(EvalValue::Null),
        Expr::Name(name) => match ctx.get(name.as_str()) {
            Some(row) => Ok(EvalValue::Row(*row)),
            None => Err(ExprError::UnknownName(name.clone())),
        },
        Expr::Attr(base, attr) => {
            let base = eval(base, ctx)?;
            match base {
                EvalValue::Row(row) => Ok(row.get(attr).map(scalar).unwrap_or(EvalValue::Null)),
                _ => Ok(EvalValue::Null),
            }
        }
        Expr::And(parts) => {
            let values = parts
                .iter()
                .map(|p| eval(p, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(EvalValue::Bool(values.iter().all(|v| v.truthy())))
        }
        Expr::Or(parts) => {
            let values = parts
                .iter()
                .map(|p| eval(p, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(EvalValue::Bool(values.iter().any(|v| v.truthy())))
        }
        Expr::Not(inner) => {
            let value = eval(inner, ctx)?;
            Ok(EvalValue::Bool(!value.truthy()))
        }
        Expr::Compare { left, rest } => {
            let mut current = eval(left, ctx)?;
            for (op, right_expr) in rest {
                let right = eval(right_expr, ctx)?;
                if !compare(*op, &current, &right)? {
                    return Ok(EvalValue::Bool(false));
                }
                current = right;
            }
            Ok(EvalValue::Bool(true))
        }
    }
}

fn values_eq(left: &EvalValue, right: &EvalValue) -> bool {
    match (left, right) {
        (EvalValue::Null, EvalValue::Null) => true,
        (EvalValue::Bool(a), EvalValue::Bool(b)) => a == b,
        (EvalValue::Int(a), EvalValue::Int(b)) => a == b,
        (EvalValue::Float(a), EvalValue::Float(b)) => a == b,
        (EvalValue::Int(a), EvalValue::Float(b)) | (EvalValue::Float(b), EvalValue::Int(a)) => {
            (*a as f64) == *b
        }
        (EvalValue::Str(a), EvalValue::Str(b)) => a == b,
        _ => false,
    }
}

fn order(left: &EvalValue, right: &EvalValue) -> Result<Option<Ordering>, ExprError> {
    match (left, right) {
        (EvalValue::Int(a), EvalValue::Int(b)) => Ok(Some(a.cmp(b))),
        (EvalValue::Float(a), EvalValue::Float(b)) => Ok(a.partial_cmp(b)),
        (EvalValue::Int(a), EvalValue::Float(b)) => Ok((*a as f64).partial_cmp(b)),
        (EvalValue::Float(a), EvalValue::Int(b)) => Ok(a.partial_cmp(&(*b as f64))),
        (EvalValue::Str(a), EvalValue::Str(b)) => Ok(Some(a.cmp(b))),
        _ => Err(ExprError::Incomparable(left.type_name(), right.type_name())),
    }
}

fn compare(op: CmpOp, left: &EvalValue, right: &EvalValue) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => Ok(values_eq(left, right)),
        CmpOp::Ne => Ok(!values_eq(left, right)),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ord = order(left, right)?;
            Ok(match ord {
                None => false,
                Some(o) => match op {
                    CmpOp::Lt => o == Ordering::Less,
                    CmpOp::Le => o != Ordering::Greater,
                    CmpOp::Gt => o == Ordering::Greater,
                    CmpOp::Ge => o != Ordering::Less,
                    CmpOp::Eq | CmpOp::Ne => unreachable!(),
                },
            })
        }
    }
}
