use crate::error::{EngineError, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    /// Unsigned magnitude; the parser applies any leading minus
    Integer(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
    Comma,
    Eof,
}

/// A token and the byte offset where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenizes the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position..)?.chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input.get(self.position..)?.chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>, start: usize) -> EngineError {
        let fragment: String = self
            .input
            .get(start..)
            .unwrap_or_default()
            .chars()
            .take(12)
            .collect();
        EngineError::InvalidExpression {
            message: message.into(),
            position: start,
            fragment,
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }

        let start = self.position;
        let Some(ch) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                position: start,
            });
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.peek() == Some('*') {
                    return Err(self.error("exponentiation is not supported", start));
                }
                TokenKind::Star
            }
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::Equal
                } else {
                    return Err(self.error("assignment is not allowed, use '=='", start));
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::NotEqual
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::LessThanOrEqual
                } else {
                    TokenKind::LessThan
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    TokenKind::GreaterThanOrEqual
                } else {
                    TokenKind::GreaterThan
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                }
                TokenKind::And
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                }
                TokenKind::Or
            }
            '\'' | '"' => self.read_string(ch, start)?,
            '`' => self.read_quoted_identifier(start)?,
            '0'..='9' => self.read_number(start)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start)?,
            c if c.is_alphabetic() || c == '_' => self.read_word(start),
            _ => return Err(self.error(format!("unexpected character '{ch}'"), start)),
        };

        Ok(Token {
            kind,
            position: start,
        })
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<TokenKind> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal", start)),
                Some(c) if c == quote => return Ok(TokenKind::String(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated string literal", start)),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn read_quoted_identifier(&mut self, start: usize) -> Result<TokenKind> {
        let name_start = self.position;
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted identifier", start)),
                Some('`') => {
                    let name = self
                        .input
                        .get(name_start..self.position - 1)
                        .unwrap_or_default();
                    if name.is_empty() {
                        return Err(self.error("empty quoted identifier", start));
                    }
                    return Ok(TokenKind::Identifier(name.to_owned()));
                }
                Some(_) => {}
            }
        }
    }

    fn read_number(&mut self, start: usize) -> Result<TokenKind> {
        let mut is_float = self.input.get(start..self.position) == Some(".");

        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if !is_float && self.peek() == Some('.') {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_second(), Some('+' | '-'));
            let save = self.position;
            self.bump();
            if signed {
                self.bump();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.position = save;
            }
        }
        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(self.error("malformed number", start));
        }

        let text: String = self
            .input
            .get(start..self.position)
            .unwrap_or_default()
            .chars()
            .filter(|&c| c != '_')
            .collect();

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error("malformed number", start))
        } else {
            text.parse::<u64>()
                .map(TokenKind::Integer)
                .map_err(|_| self.error("integer literal out of range", start))
        }
    }

    fn read_word(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let word = self.input.get(start..self.position).unwrap_or_default();
        match word {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "true" | "True" => TokenKind::Boolean(true),
            "false" | "False" => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(word.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_and_literals() {
        assert_eq!(
            kinds("price >= 1.5 and name != 'a b'"),
            vec![
                TokenKind::Identifier("price".to_owned()),
                TokenKind::GreaterThanOrEqual,
                TokenKind::Float(1.5),
                TokenKind::And,
                TokenKind::Identifier("name".to_owned()),
                TokenKind::NotEqual,
                TokenKind::String("a b".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Integer(42));
        assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
        assert_eq!(kinds(".5")[0], TokenKind::Float(0.5));
        assert_eq!(kinds("1_000")[0], TokenKind::Integer(1000));
    }

    #[test]
    fn test_backtick_identifier() {
        assert_eq!(
            kinds("`unit price` > 3")[0],
            TokenKind::Identifier("unit price".to_owned())
        );
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let tokens = Lexer::new("é + b").tokenize().expect("tokenize");
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 3, 5, 6]);
    }

    #[test]
    fn test_rejections_carry_position() {
        let err = Lexer::new("a = 1").tokenize().expect_err("assignment");
        assert!(matches!(
            err,
            EngineError::InvalidExpression { position: 2, .. }
        ));

        let err = Lexer::new("os.system").tokenize().expect_err("attribute");
        match err {
            EngineError::InvalidExpression {
                position, fragment, ..
            } => {
                assert_eq!(position, 2);
                assert!(fragment.starts_with(".system"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("x[0]").tokenize().is_err());
        assert!(Lexer::new("2 ** 3").tokenize().is_err());
    }
}
