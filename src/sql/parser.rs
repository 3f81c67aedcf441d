//! # Parser
//!
//! Recursive descent over the token stream. The grammar, precedence low to
//! high:
//!
//! ```text
//! statement      := select | create_table | show_tables
//! select         := "SELECT" projections ("FROM" IDENT)? ("WHERE" expr)? ("LIMIT" INT)? EOF
//! projections    := "*" | expr ("," expr)*
//! create_table   := "CREATE" "TABLE" IDENT "(" coldef ("," coldef)* ")"
//!                   ("PARTITION" "BY" IDENT)? EOF
//! coldef         := IDENT type_name
//! show_tables    := "SHOW" "TABLES" EOF
//! expr           := disjunction
//! disjunction    := conjunction ("OR" conjunction)*
//! conjunction    := negation ("AND" negation)*
//! negation       := ("NOT")* equality
//! equality       := comparison (("=" | "!=" | "LIKE") comparison)*
//! comparison     := term (("<" | "<=" | ">" | ">=") term)*
//! term           := factor (("+" | "-") factor)*
//! factor         := unary (("*" | "/" | "%") unary)*
//! unary          := "-" unary | primary
//! primary        := INT | FLOAT | STRING | IDENT | "(" expr ")"
//! ```
//!
//! `*` cannot be combined with any other projection, and LIMIT accepts only
//! a non-negative integer literal.

use super::ast::*;
use super::token::{Token, TokenKind};
use crate::error::{Error, Result};
use crate::types::DataType;

const COLUMN_TYPES: [TokenKind; 6] = [
    TokenKind::Text,
    TokenKind::Keyword,
    TokenKind::IntegerType,
    TokenKind::FloatType,
    TokenKind::Datetime,
    TokenKind::Geopoint,
];

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    /// The token sequence must end with `Eof`, as produced by
    /// [`super::lexer::tokenize`].
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        ));
        Self { tokens, index: 0 }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        match () {
            _ if self.consume(TokenKind::Select) => self.select_statement(),
            _ if self.consume(TokenKind::Create) => {
                self.expect(TokenKind::Table)?;
                self.create_table_statement()
            }
            _ if self.consume(TokenKind::Show) => {
                self.expect(TokenKind::Tables)?;
                self.expect_eof()?;
                Ok(Statement::ShowTables)
            }
            _ => Err(self.unexpected(&[TokenKind::Select, TokenKind::Create, TokenKind::Show])),
        }
    }

    fn select_statement(&mut self) -> Result<Statement> {
        let mut projections = Vec::new();

        if self.consume(TokenKind::Star) {
            projections.push(Expr::Asterisk);
            if self.check(TokenKind::Comma) {
                return Err(self.unexpected(&[TokenKind::From, TokenKind::Where]));
            }
        } else {
            loop {
                projections.push(self.disjunction()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut select = SelectStatement {
            projections,
            table: None,
            predicate: None,
            limit: None,
        };

        if self.consume(TokenKind::From) {
            let name = self.expect(TokenKind::Ident)?;
            select.table = Some(TableRef::new(name.lexeme));
        }

        if self.consume(TokenKind::Where) {
            select.predicate = Some(self.disjunction()?);
        }

        if self.consume(TokenKind::Limit) {
            let token = self.expect(TokenKind::Integer)?;
            let limit = token.lexeme.parse::<u64>().map_err(|e| Error::Conversion {
                lexeme: token.lexeme.to_string(),
                target: "limit",
                reason: e.to_string(),
            })?;
            select.limit = Some(limit);
        }

        self.expect_eof()?;
        Ok(Statement::Select(select))
    }

    fn create_table_statement(&mut self) -> Result<Statement> {
        let name = self.expect(TokenKind::Ident)?.lexeme.to_string();
        self.expect(TokenKind::LParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.column_definition()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let mut partition = None;
        if self.consume(TokenKind::Partition) {
            self.expect(TokenKind::By)?;
            partition = Some(self.expect(TokenKind::Ident)?.lexeme.to_string());
        }

        self.expect_eof()?;
        Ok(Statement::CreateTable(CreateTableStatement {
            name,
            columns,
            partition,
        }))
    }

    fn column_definition(&mut self) -> Result<ColumnSpec> {
        let name = self.expect(TokenKind::Ident)?.lexeme.to_string();

        let data_type = match self.peek().kind {
            TokenKind::Text => DataType::Text,
            TokenKind::Keyword => DataType::Keyword,
            TokenKind::IntegerType => DataType::Integer,
            TokenKind::FloatType => DataType::Float,
            TokenKind::Datetime => DataType::Datetime,
            TokenKind::Geopoint => DataType::Geopoint,
            _ => return Err(self.unexpected(&COLUMN_TYPES)),
        };
        self.advance();

        Ok(ColumnSpec { name, data_type })
    }

    fn disjunction(&mut self) -> Result<Expr> {
        let mut expr = self.conjunction()?;
        while self.consume(TokenKind::Or) {
            let right = self.conjunction()?;
            expr = Expr::binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn conjunction(&mut self) -> Result<Expr> {
        let mut expr = self.negation()?;
        while self.consume(TokenKind::And) {
            let right = self.negation()?;
            expr = Expr::binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn negation(&mut self) -> Result<Expr> {
        if self.consume(TokenKind::Not) {
            let inner = self.negation()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.equality()
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Like => BinaryOp::Like,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            expr = Expr::binary(op, expr, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.consume(TokenKind::Minus) {
            let inner = self.unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.peek().kind {
            TokenKind::Integer => {
                let token = *self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|e| Error::Conversion {
                    lexeme: token.lexeme.to_string(),
                    target: "integer",
                    reason: e.to_string(),
                })?;
                Ok(Expr::Integer(value))
            }
            TokenKind::Float => {
                let token = *self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|e| Error::Conversion {
                    lexeme: token.lexeme.to_string(),
                    target: "float",
                    reason: e.to_string(),
                })?;
                Ok(Expr::Float(value))
            }
            TokenKind::String => {
                let token = *self.advance();
                Ok(Expr::String(token.lexeme.to_string()))
            }
            TokenKind::Ident => {
                let token = *self.advance();
                Ok(Expr::Column(ColumnRef::new(token.lexeme)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.disjunction()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            _ => Err(self.unexpected(&[
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::String,
                TokenKind::Ident,
                TokenKind::LParen,
            ])),
        }
    }

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.index]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token<'a> {
        if !self.at_eof() {
            self.index += 1;
        }
        &self.tokens[self.index - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[kind]))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.unexpected(&[TokenKind::Eof]))
        }
    }

    fn unexpected(&self, expected: &[TokenKind]) -> Error {
        let token = self.peek();
        Error::Parse {
            expected: expected.to_vec(),
            found: if token.kind == TokenKind::Eof {
                "EOF".to_string()
            } else {
                token.lexeme.to_string()
            },
            line: token.line,
            column: token.column,
        }
    }
}

/// Lexes and parses one statement.
pub fn parse(input: &str) -> Result<Statement> {
    let tokens = super::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}
