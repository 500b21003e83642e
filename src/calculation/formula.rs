//! Restricted arithmetic expression evaluation for formula components.
//!
//! Formulas are parsed by a small recursive-descent parser over a fixed
//! grammar: numbers, context symbols, `+ - * /`, parentheses, and the
//! two-argument functions `min` and `max`. Nothing else is accepted, so a
//! formula can never execute host code.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := '-' factor | primary
//! primary := NUMBER | SYMBOL | '(' expr ')'
//!          | ('min' | 'max') '(' expr ',' expr ')'
//! ```

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Evaluates a formula expression against a context of resolved symbols.
///
/// `component` is the code of the component being evaluated; it appears in
/// error messages only.
///
/// # Errors
///
/// Returns `FormulaEvaluation` on syntax errors, unknown symbols, or
/// division by zero.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::evaluate_formula;
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
///
/// let mut context = HashMap::new();
/// context.insert("BASIC".to_string(), Decimal::from(20000));
///
/// let value = evaluate_formula("PF", "min(BASIC, 15000) * 0.12", &context).unwrap();
/// assert_eq!(value, Decimal::from(1800));
/// ```
pub fn evaluate_formula(
    component: &str,
    expression: &str,
    context: &HashMap<String, Decimal>,
) -> EngineResult<Decimal> {
    let ast = parse(component, expression)?;
    eval(component, &ast, context)
}

/// Parses a formula and returns the distinct symbols it references, in
/// first-appearance order. Used to build the component dependency graph.
///
/// # Errors
///
/// Returns `FormulaEvaluation` if the expression does not parse.
pub fn referenced_symbols(component: &str, expression: &str) -> EngineResult<Vec<String>> {
    let ast = parse(component, expression)?;
    let mut symbols = Vec::new();
    collect_symbols(&ast, &mut symbols);
    Ok(symbols)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(Decimal),
    Symbol(String),
    Neg(Box<Expr>),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Symbol(String),
    Func(Func),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

fn formula_error(component: &str, message: impl Into<String>) -> EngineError {
    EngineError::FormulaEvaluation {
        component: component.to_string(),
        message: message.into(),
    }
}

fn tokenize(component: &str, expression: &str) -> EngineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                let mut seen_dot = false;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    if chars[i] == '.' {
                        if seen_dot {
                            return Err(formula_error(component, "malformed number"));
                        }
                        seen_dot = true;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = Decimal::from_str(&text)
                    .map_err(|_| formula_error(component, format!("malformed number '{}'", text)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                match text.as_str() {
                    "min" => tokens.push(Token::Func(Func::Min)),
                    "max" => tokens.push(Token::Func(Func::Max)),
                    _ => tokens.push(Token::Symbol(text)),
                }
            }
            other => {
                return Err(formula_error(
                    component,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    component: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> EngineResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            _ => Err(formula_error(self.component, format!("expected {}", what))),
        }
    }

    fn expr(&mut self) -> EngineResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Bin(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> EngineResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.factor()?;
            left = Expr::Bin(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn factor(&mut self) -> EngineResult<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            let inner = self.factor()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> EngineResult<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Symbol(name)) => Ok(Expr::Symbol(name)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Func(func)) => {
                self.expect(Token::LParen, "'(' after function name")?;
                let first = self.expr()?;
                self.expect(Token::Comma, "',' between function arguments")?;
                let second = self.expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Call(func, Box::new(first), Box::new(second)))
            }
            Some(other) => Err(formula_error(
                self.component,
                format!("unexpected token {:?}", other),
            )),
            None => Err(formula_error(self.component, "unexpected end of expression")),
        }
    }
}

fn parse(component: &str, expression: &str) -> EngineResult<Expr> {
    let tokens = tokenize(component, expression)?;
    if tokens.is_empty() {
        return Err(formula_error(component, "empty expression"));
    }
    let mut parser = Parser {
        component,
        tokens,
        pos: 0,
    };
    let ast = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(formula_error(component, "trailing input after expression"));
    }
    Ok(ast)
}

fn eval(
    component: &str,
    ast: &Expr,
    context: &HashMap<String, Decimal>,
) -> EngineResult<Decimal> {
    match ast {
        Expr::Number(value) => Ok(*value),
        Expr::Symbol(name) => context.get(name).copied().ok_or_else(|| {
            formula_error(component, format!("unknown symbol '{}'", name))
        }),
        Expr::Neg(inner) => Ok(-eval(component, inner, context)?),
        Expr::Bin(op, left, right) => {
            let l = eval(component, left, context)?;
            let r = eval(component, right, context)?;
            match op {
                BinOp::Add => Ok(l + r),
                BinOp::Sub => Ok(l - r),
                BinOp::Mul => Ok(l * r),
                BinOp::Div => {
                    if r.is_zero() {
                        Err(formula_error(component, "division by zero"))
                    } else {
                        Ok(l / r)
                    }
                }
            }
        }
        Expr::Call(func, first, second) => {
            let a = eval(component, first, context)?;
            let b = eval(component, second, context)?;
            Ok(match func {
                Func::Min => a.min(b),
                Func::Max => a.max(b),
            })
        }
    }
}

fn collect_symbols(ast: &Expr, out: &mut Vec<String>) {
    match ast {
        Expr::Number(_) => {}
        Expr::Symbol(name) => {
            if !out.iter().any(|s| s == name) {
                out.push(name.clone());
            }
        }
        Expr::Neg(inner) => collect_symbols(inner, out),
        Expr::Bin(_, left, right) | Expr::Call(_, left, right) => {
            collect_symbols(left, out);
            collect_symbols(right, out);
        }
    }
}
