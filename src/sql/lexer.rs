//! # Lexer
//!
//! Byte-at-a-time scanner producing position-tagged tokens that borrow from
//! the input. Keywords and type names are matched case-insensitively against
//! the fixed table in [`super::token::KEYWORDS`]; everything else falls back
//! to identifier.
//!
//! Rules:
//!
//! - whitespace skipped, comments unsupported
//! - identifier: `[A-Za-z_][A-Za-z0-9_]*`
//! - integer: `[0-9]+`; float: `[0-9]+\.[0-9]+`; numbers never carry a sign
//! - string: `"..."` or `'...'`, backslash escapes honored for delimiting,
//!   quotes stripped from the lexeme
//! - `!=`, `>=`, `<=` are single tokens; a lone `!` lexes as `Bang`
//! - any other character is a lexical error tagged with its position

use super::token::{Token, TokenKind, KEYWORDS};
use crate::error::{Error, Result};

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'a>> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        if self.is_eof() {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        }

        let ch = self.current();

        if ch.is_ascii_alphabetic() || ch == b'_' {
            return Ok(self.scan_identifier_or_keyword(line, column));
        }

        if ch.is_ascii_digit() {
            return Ok(self.scan_number(line, column));
        }

        let single = |kind| {
            let lexeme = &self.input[self.pos..self.pos + 1];
            Token::new(kind, lexeme, line, column)
        };

        let token = match ch {
            b'\'' | b'"' => return self.scan_string(ch, line, column),
            b',' => single(TokenKind::Comma),
            b'(' => single(TokenKind::LParen),
            b')' => single(TokenKind::RParen),
            b'*' => single(TokenKind::Star),
            b'+' => single(TokenKind::Plus),
            b'-' => single(TokenKind::Minus),
            b'/' => single(TokenKind::Slash),
            b'%' => single(TokenKind::Percent),
            b'=' => single(TokenKind::Eq),
            b'!' => return Ok(self.scan_exclamation(line, column)),
            b'>' => return Ok(self.scan_comparison(TokenKind::Gt, TokenKind::GtEq, line, column)),
            b'<' => return Ok(self.scan_comparison(TokenKind::Lt, TokenKind::LtEq, line, column)),
            other => {
                return Err(Error::Lex {
                    ch: other as char,
                    line,
                    column,
                })
            }
        };
        self.advance();
        Ok(token)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_char(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.current() == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() {
            match self.current() {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                _ => break,
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self, line: u32, column: u32) -> Token<'a> {
        let start = self.pos;
        while !self.is_eof() && (self.current().is_ascii_alphanumeric() || self.current() == b'_') {
            self.advance();
        }

        let lexeme = &self.input[start..self.pos];
        let upper = lexeme.to_ascii_uppercase();
        let kind = KEYWORDS
            .get(upper.as_str())
            .copied()
            .unwrap_or(TokenKind::Ident);
        Token::new(kind, lexeme, line, column)
    }

    fn scan_number(&mut self, line: u32, column: u32) -> Token<'a> {
        let start = self.pos;
        while !self.is_eof() && self.current().is_ascii_digit() {
            self.advance();
        }

        let mut kind = TokenKind::Integer;
        if !self.is_eof() && self.current() == b'.' {
            if let Some(next) = self.peek_char() {
                if next.is_ascii_digit() {
                    kind = TokenKind::Float;
                    self.advance();
                    while !self.is_eof() && self.current().is_ascii_digit() {
                        self.advance();
                    }
                }
            }
        }

        Token::new(kind, &self.input[start..self.pos], line, column)
    }

    fn scan_string(&mut self, quote: u8, line: u32, column: u32) -> Result<Token<'a>> {
        self.advance();
        let start = self.pos;

        loop {
            if self.is_eof() {
                return Err(Error::UnterminatedString { line, column });
            }
            match self.current() {
                b'\\' => {
                    self.advance();
                    if self.is_eof() {
                        return Err(Error::UnterminatedString { line, column });
                    }
                    self.advance();
                }
                c if c == quote => {
                    let end = self.pos;
                    self.advance();
                    return Ok(Token::new(
                        TokenKind::String,
                        &self.input[start..end],
                        line,
                        column,
                    ));
                }
                _ => self.advance(),
            }
        }
    }

    fn scan_exclamation(&mut self, line: u32, column: u32) -> Token<'a> {
        let start = self.pos;
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            Token::new(TokenKind::NotEq, &self.input[start..self.pos], line, column)
        } else {
            Token::new(TokenKind::Bang, &self.input[start..start + 1], line, column)
        }
    }

    fn scan_comparison(
        &mut self,
        bare: TokenKind,
        with_eq: TokenKind,
        line: u32,
        column: u32,
    ) -> Token<'a> {
        let start = self.pos;
        self.advance();
        if !self.is_eof() && self.current() == b'=' {
            self.advance();
            Token::new(with_eq, &self.input[start..self.pos], line, column)
        } else {
            Token::new(bare, &self.input[start..self.pos], line, column)
        }
    }
}

/// Scans the whole input. The returned sequence always ends with `Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
