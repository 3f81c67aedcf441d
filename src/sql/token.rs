//! Token and keyword definitions.

use phf::phf_map;
use std::fmt;

/// Closed set of token kinds.
///
/// Type-name keywords get their own kinds (`IntegerType`, `FloatType`, ...)
/// distinct from numeric literals, so `CREATE TABLE t (c INTEGER)` and
/// `SELECT 42` never collide in the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,

    // literals
    Integer,
    Float,
    String,

    // statement keywords
    Select,
    From,
    Where,
    Limit,
    Like,
    Create,
    Table,
    Partition,
    By,
    Show,
    Tables,
    And,
    Or,
    Not,

    // type names
    Text,
    Keyword,
    IntegerType,
    FloatType,
    Datetime,
    Geopoint,

    // punctuation
    Comma,
    LParen,
    RParen,

    // arithmetic ('*' doubles as the projection asterisk)
    Star,
    Plus,
    Minus,
    Slash,
    Percent,

    // comparison
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,

    // reserved, rejected by the grammar
    Bang,

    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::Integer | TokenKind::IntegerType => "INTEGER",
            TokenKind::Float | TokenKind::FloatType => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Select => "SELECT",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::Limit => "LIMIT",
            TokenKind::Like => "LIKE",
            TokenKind::Create => "CREATE",
            TokenKind::Table => "TABLE",
            TokenKind::Partition => "PARTITION",
            TokenKind::By => "BY",
            TokenKind::Show => "SHOW",
            TokenKind::Tables => "TABLES",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::Text => "TEXT",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Datetime => "DATETIME",
            TokenKind::Geopoint => "GEOPOINT",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Star => "*",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Eq => "=",
            TokenKind::NotEq => "!=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Bang => "!",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords and type names, matched case-insensitively by uppercasing the
/// scanned identifier before lookup.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "SELECT" => TokenKind::Select,
    "FROM" => TokenKind::From,
    "WHERE" => TokenKind::Where,
    "LIMIT" => TokenKind::Limit,
    "LIKE" => TokenKind::Like,
    "CREATE" => TokenKind::Create,
    "TABLE" => TokenKind::Table,
    "PARTITION" => TokenKind::Partition,
    "BY" => TokenKind::By,
    "SHOW" => TokenKind::Show,
    "TABLES" => TokenKind::Tables,
    "AND" => TokenKind::And,
    "OR" => TokenKind::Or,
    "NOT" => TokenKind::Not,
    "TEXT" => TokenKind::Text,
    "KEYWORD" => TokenKind::Keyword,
    "INTEGER" => TokenKind::IntegerType,
    "FLOAT" => TokenKind::FloatType,
    "DATETIME" => TokenKind::Datetime,
    "GEOPOINT" => TokenKind::Geopoint,
};

/// One token. String literal lexemes have their surrounding quotes stripped;
/// backslash escape sequences are preserved as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: u32,
    pub column: u32,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
        }
    }
}
