use crate::ast::Operator;
use crate::error::LexError;
use log::{debug, trace};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Operator(Operator),
    LeftParen,
    RightParen,
    Comma,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "number {}", value),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Operator(operator) => write!(f, "operator '{}'", operator),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::End => f.write_str("end of input"),
        }
    }
}

/// A token together with the character offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

/// Splits `source` into tokens. The returned sequence always ends with
/// [`Token::End`]. Positions are character offsets, so `π` counts as one.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    debug!("Tokenizing: {}", source);
    let tokens = Tokenizer::new(source).run()?;
    trace!("Tokens: {:?}", tokens);
    Ok(tokens)
}

struct Tokenizer {
    chars: Vec<char>,
    i: usize,
}

impl Tokenizer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            i: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.i + offset).copied()
    }

    fn run(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.i += 1;
            }
            let position = self.i;
            let Some(c) = self.peek() else {
                tokens.push(SpannedToken {
                    token: Token::End,
                    position,
                });
                return Ok(tokens);
            };

            let token = match c {
                '(' => {
                    self.i += 1;
                    Token::LeftParen
                }
                ')' => {
                    self.i += 1;
                    Token::RightParen
                }
                ',' => {
                    self.i += 1;
                    Token::Comma
                }
                'π' => {
                    self.i += 1;
                    Token::Identifier("pi".to_string())
                }
                '+' => self.operator(Operator::Add),
                '-' => self.operator(Operator::Subtract),
                '*' => self.operator(Operator::Multiply),
                '/' => self.operator(Operator::Divide),
                '^' => self.operator(Operator::Power),
                c if c.is_ascii_digit() || c == '.' => self.number()?,
                c if c.is_ascii_alphabetic() => self.identifier(),
                _ => return Err(LexError::UnexpectedCharacter(position, c)),
            };
            tokens.push(SpannedToken { token, position });
        }
    }

    fn operator(&mut self, operator: Operator) -> Token {
        self.i += 1;
        Token::Operator(operator)
    }

    /// Digits with at most one decimal point, optionally followed by an
    /// exponent. `e`/`E` starts an exponent only when a digit follows it
    /// directly; otherwise it is left for the identifier rule so `2e` reads as
    /// two times Euler's number.
    fn number(&mut self) -> Result<Token, LexError> {
        let start = self.i;
        let mut seen_dot = false;
        let mut seen_digit = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                seen_digit = true;
                self.i += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.i += 1;
            } else {
                break;
            }
        }
        if !seen_digit {
            return Err(LexError::UnexpectedCharacter(start, '.'));
        }
        if matches!(self.peek(), Some('e' | 'E'))
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.i += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.i += 1;
            }
        }
        // `1.2.3` is not two adjacent numbers.
        if self.peek() == Some('.') {
            return Err(LexError::UnexpectedCharacter(self.i, '.'));
        }

        let text: String = self.chars[start..self.i].iter().collect();
        let value = text
            .parse::<f64>()
            .map_err(|_| LexError::UnexpectedCharacter(start, self.chars[start]))?;
        Ok(Token::Number(value))
    }

    fn identifier(&mut self) -> Token {
        let start = self.i;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.i += 1;
        }
        Token::Identifier(self.chars[start..self.i].iter().collect())
    }
}
