//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.
//!
//! Identifiers are emitted exactly as written. Every identifier that reaches
//! a token is either a compiled-in column name or has passed
//! [`crate::validation::validate_identifier`], so no quoting is applied and
//! administrator-authored fragments can refer to the same names verbatim.

use super::dialect::{Dialect, SqlDialect};
use super::fragment::RawSqlFragment;
use crate::model::FieldType;

/// SQL Token - every element the compilers emit.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    As,
    On,
    Join,
    Inner,
    GroupBy,
    Between,
    Intersect,
    Except,
    With,
    Null,

    // === Staging Keywords ===
    CreateTempTable,
    Drop,
    Table,
    If,
    Exists,
    Insert,
    Into,
    Values,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Lte,

    // === Whitespace ===
    Space,

    // === Dynamic Content ===
    /// Simple identifier (table, column, alias, CTE name)
    Ident(String),
    /// Dotted identifier: database.schema.table
    QualifiedIdent(Vec<String>),
    /// Temporary table, named per dialect convention
    TempTable(String),
    /// Column type of a staged table
    ColumnType(FieldType),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),
    /// Bound parameter placeholder; the value travels separately.
    Param(String),

    // === Escape Hatches ===
    /// A validated, administrator-authored SQL fragment.
    Fragment(RawSqlFragment),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Between => "BETWEEN".into(),
            Token::Intersect => dialect.intersect_keyword().into(),
            Token::Except => dialect.except_keyword().into(),
            Token::With => "WITH".into(),
            Token::Null => "NULL".into(),

            // Staging keywords
            Token::CreateTempTable => dialect.create_temp_table_keyword().into(),
            Token::Drop => "DROP".into(),
            Token::Table => "TABLE".into(),
            Token::If => "IF".into(),
            Token::Exists => "EXISTS".into(),
            Token::Insert => "INSERT".into(),
            Token::Into => "INTO".into(),
            Token::Values => "VALUES".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Lte => "<=".into(),

            // Whitespace
            Token::Space => " ".into(),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => name.clone(),
            Token::QualifiedIdent(parts) => parts.join("."),
            Token::TempTable(name) => dialect.temp_table_name(name),
            Token::ColumnType(ft) => dialect.emit_field_type(ft).into(),
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).into(),
            Token::Param(name) => dialect.placeholder(name),

            // Escape hatches
            Token::Fragment(fragment) => fragment.as_str().into(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
