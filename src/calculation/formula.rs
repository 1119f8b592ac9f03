//! Formula expression parsing and evaluation.
//!
//! Formula components carry a small arithmetic expression over `+ - * / ( )`,
//! numeric literals, and component codes as free variables. The expression is
//! parsed by a hand-rolled recursive-descent parser into a fixed AST and
//! evaluated against a map of already-resolved amounts. Keeping the language
//! this small bounds the failure surface to unresolved references and
//! arithmetic errors; no scripting engine is ever involved.

use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing or evaluating a formula expression.
///
/// Callers attach the owning component code when converting into the
/// engine-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The expression text could not be parsed.
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset of the offending token.
        position: usize,
        /// A description of the parse failure.
        message: String,
    },
    /// The expression referenced a variable missing from the environment.
    #[error("unknown variable '{code}'")]
    UnknownVariable {
        /// The unresolved variable name.
        code: String,
    },
    /// The expression divided by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// An intermediate result exceeded the representable decimal range.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Binary arithmetic operators, in the order of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

/// A node in the parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A numeric literal.
    Literal(Decimal),
    /// A reference to a component code (or the reserved `CTC` input).
    Variable(String),
    /// Unary negation.
    Negate(Box<Expr>),
    /// A binary operation with standard precedence.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

/// A parsed formula expression.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::FormulaAst;
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
/// use std::str::FromStr;
///
/// let ast = FormulaAst::parse("BASIC * 0.1 + HRA * 0.05").unwrap();
/// let mut env = HashMap::new();
/// env.insert("BASIC".to_string(), Decimal::from(20000));
/// env.insert("HRA".to_string(), Decimal::from(10000));
/// assert_eq!(ast.evaluate(&env).unwrap(), Decimal::from_str("2500.0").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaAst {
    root: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, FormulaError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let text = &input[start..i];
                let value = Decimal::from_str(text).map_err(|_| FormulaError::Parse {
                    position: start,
                    message: format!("invalid number '{text}'"),
                })?;
                tokens.push((start, Token::Number(value)));
            }
            'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, 'A'..='Z' | '0'..='9' | '_') {
                    i += 1;
                }
                tokens.push((start, Token::Ident(input[start..i].to_string())));
            }
            _ => {
                return Err(FormulaError::Parse {
                    position: i,
                    message: format!("unexpected character '{c}'"),
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(usize, Token)],
    pos: usize,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or(self.input_len)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t);
        self.pos += 1;
        token
    }

    // expr := term (("+" | "-") term)*
    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // term := factor (("*" | "/") factor)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.factor()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.advance();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // factor := number | ident | "(" expr ")" | "-" factor
    fn factor(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Literal(*value)),
            Some(Token::Ident(name)) => Ok(Expr::Variable(name.clone())),
            Some(Token::Minus) => {
                let operand = self.factor()?;
                Ok(Expr::Negate(Box::new(operand)))
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::Parse {
                        position: self.position(),
                        message: "expected ')'".to_string(),
                    }),
                }
            }
            Some(other) => Err(FormulaError::Parse {
                position,
                message: format!("unexpected token {other:?}"),
            }),
            None => Err(FormulaError::Parse {
                position,
                message: "unexpected end of expression".to_string(),
            }),
        }
    }
}

impl FormulaAst {
    /// Parses an expression string into an AST.
    ///
    /// Returns a [`FormulaError::Parse`] for empty input, unknown
    /// characters, unbalanced parentheses, or trailing tokens.
    pub fn parse(expression: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(FormulaError::Parse {
                position: 0,
                message: "empty expression".to_string(),
            });
        }

        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            input_len: expression.len(),
        };
        let root = parser.expr()?;

        if parser.pos != tokens.len() {
            return Err(FormulaError::Parse {
                position: parser.position(),
                message: "unexpected trailing tokens".to_string(),
            });
        }

        Ok(Self { root })
    }

    /// Returns the set of free variables the expression references, in
    /// sorted order.
    pub fn variables(&self) -> BTreeSet<String> {
        fn collect(expr: &Expr, out: &mut BTreeSet<String>) {
            match expr {
                Expr::Literal(_) => {}
                Expr::Variable(name) => {
                    out.insert(name.clone());
                }
                Expr::Negate(operand) => collect(operand, out),
                Expr::Binary { lhs, rhs, .. } => {
                    collect(lhs, out);
                    collect(rhs, out);
                }
            }
        }

        let mut out = BTreeSet::new();
        collect(&self.root, &mut out);
        out
    }

    /// Evaluates the expression against a map of resolved amounts.
    ///
    /// An unknown variable is an error, never a silent zero. All
    /// arithmetic is checked: an overflowing intermediate result is a
    /// [`FormulaError::Overflow`], never a panic, so one pathological
    /// formula can only fail its own evaluation.
    pub fn evaluate(&self, env: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
        fn eval(expr: &Expr, env: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
            match expr {
                Expr::Literal(value) => Ok(*value),
                Expr::Variable(name) => {
                    env.get(name)
                        .copied()
                        .ok_or_else(|| FormulaError::UnknownVariable {
                            code: name.clone(),
                        })
                }
                Expr::Negate(operand) => Ok(-eval(operand, env)?),
                Expr::Binary { op, lhs, rhs } => {
                    let lhs = eval(lhs, env)?;
                    let rhs = eval(rhs, env)?;
                    match op {
                        BinaryOp::Add => lhs.checked_add(rhs).ok_or(FormulaError::Overflow),
                        BinaryOp::Sub => lhs.checked_sub(rhs).ok_or(FormulaError::Overflow),
                        BinaryOp::Mul => lhs.checked_mul(rhs).ok_or(FormulaError::Overflow),
                        BinaryOp::Div => {
                            if rhs.is_zero() {
                                Err(FormulaError::DivisionByZero)
                            } else {
                                lhs.checked_div(rhs).ok_or(FormulaError::Overflow)
                            }
                        }
                    }
                }
            }
        }

        eval(&self.root, env)
    }
}
