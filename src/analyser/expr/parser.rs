//! Recursive-descent parser over the lexer's tokens.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons
//! (`== != < <= > >=`), `+ -`, `* / %`, unary minus, primary. Binary
//! operators are left-associative.

use super::ast::{BinaryOp, Expr, ExprKind, Function, Literal, UnaryOp};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{EngineError, Result};

/// Nesting limit, so hostile input cannot exhaust the stack.
const MAX_DEPTH: usize = 64;
/// Bounds the depth of left-nested operator chains.
const MAX_TOKENS: usize = 2048;

pub fn parse(input: &str) -> Result<Expr> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.len() > MAX_TOKENS {
        return Err(EngineError::InvalidExpression {
            message: format!("expression has more than {MAX_TOKENS} tokens"),
            position: 0,
            fragment: input.chars().take(12).collect(),
        });
    }
    let mut parser = Parser {
        input,
        tokens,
        position: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    let trailing = parser.current();
    if trailing.kind != TokenKind::Eof {
        return Err(parser.error_at("unexpected trailing input", trailing.position));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser<'_> {
    fn current(&self) -> Token {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .cloned()
            .unwrap_or(Token {
                kind: TokenKind::Eof,
                position: self.input.len(),
            })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_at(&self, message: impl Into<String>, position: usize) -> EngineError {
        let fragment = self
            .input
            .get(position..)
            .map(|rest| rest.chars().take(12).collect::<String>())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "<end of input>".to_owned());
        EngineError::InvalidExpression {
            message: message.into(),
            position,
            fragment,
        }
    }

    fn descend(&mut self, position: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error_at("expression is nested too deeply", position));
        }
        Ok(())
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let position = left.position;
        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            position,
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.matches(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.matches(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        let token = self.current();
        if token.kind == TokenKind::Not {
            self.advance();
            self.descend(token.position)?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                position: token.position,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::LessThanOrEqual => BinaryOp::LessThanOrEqual,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.current();
        match token.kind {
            TokenKind::Minus => {
                self.advance();
                // fold into the literal so i64::MIN can be written
                if let TokenKind::Integer(magnitude) = self.current().kind {
                    let value = 0_i64.checked_sub_unsigned(magnitude).ok_or_else(|| {
                        self.error_at("integer literal out of range", token.position)
                    })?;
                    self.advance();
                    return Ok(Expr {
                        kind: ExprKind::Literal(Literal::Integer(value)),
                        position: token.position,
                    });
                }
                self.descend(token.position)?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr {
                    kind: ExprKind::Unary {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    },
                    position: token.position,
                })
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current();
        let position = token.position;
        let literal = |lit| Expr {
            kind: ExprKind::Literal(lit),
            position,
        };

        match token.kind {
            TokenKind::Integer(magnitude) => {
                let value = i64::try_from(magnitude)
                    .map_err(|_| self.error_at("integer literal out of range", position))?;
                self.advance();
                Ok(literal(Literal::Integer(value)))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(literal(Literal::Float(v)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(literal(Literal::String(s)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(literal(Literal::Boolean(b)))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.current().kind == TokenKind::LeftParen {
                    self.parse_call(&name, position)
                } else {
                    Ok(Expr {
                        kind: ExprKind::Identifier(name),
                        position,
                    })
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                self.descend(position)?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                let close = self.current();
                if !self.matches(&TokenKind::RightParen) {
                    return Err(self.error_at("expected ')'", close.position));
                }
                Ok(inner)
            }
            TokenKind::Eof => Err(self.error_at("unexpected end of expression", position)),
            _ => Err(self.error_at("expected a value", position)),
        }
    }

    fn parse_call(&mut self, name: &str, position: usize) -> Result<Expr> {
        let Some(function) = Function::from_name(name) else {
            return Err(self.error_at(format!("unknown function '{name}'"), position));
        };
        // consume '('
        self.advance();
        self.descend(position)?;

        let mut args = Vec::new();
        if !self.matches(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_or()?);
                if self.matches(&TokenKind::Comma) {
                    continue;
                }
                let close = self.current();
                if self.matches(&TokenKind::RightParen) {
                    break;
                }
                return Err(self.error_at("expected ',' or ')'", close.position));
            }
        }
        self.depth -= 1;

        Ok(Expr {
            kind: ExprKind::Call { function, args },
            position,
        })
    }
}
