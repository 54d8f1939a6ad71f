//! Expression AST for the predicates and projections the compilers emit.
//!
//! The compilers only need a narrow slice of SQL expressions: column
//! references, bound parameters, equality/range comparisons joined by AND,
//! and BETWEEN. Anything richer arrives as a validated fragment.

use super::fragment::RawSqlFragment;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// `*` or `table.*`
    Star { table: Option<String> },

    /// Boolean literal
    Bool(bool),

    /// Bound parameter placeholder
    Param(String),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },

    /// Validated predicate text, emitted verbatim
    Fragment(RawSqlFragment),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Lte,
    And,
}

impl BinaryOperator {
    fn token(self) -> Token {
        match self {
            BinaryOperator::Eq => Token::Eq,
            BinaryOperator::Lte => Token::Lte,
            BinaryOperator::And => Token::And,
        }
    }
}

impl Expr {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Bool(b) => {
                ts.push(Token::LitBool(*b));
            }

            Expr::Param(name) => {
                ts.push(Token::Param(name.clone()));
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens())
                    .space()
                    .push(op.token())
                    .space()
                    .append(&right.to_tokens());
            }

            Expr::Between { expr, low, high } => {
                ts.append(&expr.to_tokens())
                    .space()
                    .push(Token::Between)
                    .space()
                    .append(&low.to_tokens())
                    .space()
                    .push(Token::And)
                    .space()
                    .append(&high.to_tokens());
            }

            Expr::Fragment(fragment) => {
                ts.push(Token::Fragment(fragment.clone()));
            }
        }

        ts
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Create an unqualified column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// `table.*`
pub fn table_star(table: &str) -> Expr {
    Expr::Star {
        table: Some(table.into()),
    }
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Bool(b)
}

/// Embed a validated predicate.
pub fn predicate(fragment: RawSqlFragment) -> Expr {
    Expr::Fragment(fragment)
}

/// Reference a bound parameter by its placeholder name.
pub fn param(name: &str) -> Expr {
    Expr::Param(name.into())
}

// =============================================================================
// Builder Extension
// =============================================================================

/// Fluent comparison builders.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Eq,
            right: Box::new(other.into()),
        }
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Lte,
            right: Box::new(other.into()),
        }
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::And,
            right: Box::new(other.into()),
        }
    }

    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
