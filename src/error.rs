//! Crate-wide error taxonomy.
//!
//! Every failure the engine can produce is a variant of [`Error`], so callers
//! can match on the kind instead of parsing messages. Front-half errors
//! (lexing, parsing, resolution, planning) abort a statement before any
//! operator opens; operator-level failures on a single row travel inside
//! [`crate::record::RowResult`] and do not stop the stream.

use crate::sql::token::TokenKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognized character '{ch}' at line {line}, column {column}")]
    Lex { ch: char, line: u32, column: u32 },

    #[error("unterminated string literal at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("expected one of {expected:?}, found '{found}' at line {line}, column {column}")]
    Parse {
        expected: Vec<TokenKind>,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("cannot convert '{lexeme}' to {target}: {reason}")]
    Conversion {
        lexeme: String,
        target: &'static str,
        reason: String,
    },

    #[error("table '{0}' does not exist")]
    NoSuchTable(String),

    #[error("column '{0}' does not exist in table list")]
    NoSuchColumn(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("invalid partition column '{0}' does not exist in column definition list")]
    InvalidPartition(String),

    #[error("cannot plan statement: {0}")]
    Plan(String),

    #[error("cannot evaluate expression: {0}")]
    Eval(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index error: {0}")]
    Index(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("query cancelled")]
    Cancelled,
}

impl Error {
    /// True for failures scoped to a single row rather than the whole
    /// statement. The stream carries these inside the affected row.
    pub fn is_row_level(&self) -> bool {
        matches!(self, Error::Eval(_) | Error::DivisionByZero)
    }
}
