//! Query builder - construct SELECT statements, set operations and CTE
//! pipelines with a fluent API.
//!
//! Output is rendered on a single line so composed statements stay stable
//! and diffable across compiles.

use super::dialect::Dialect;
use super::expr::Expr;
use super::fragment::RawSqlFragment;
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.expr.to_tokens();
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Table Reference
// =============================================================================

/// Where rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A table or CTE name, possibly dotted (db.schema.table).
    Named(Vec<String>),
    /// A session temporary table, named per dialect.
    Temp(String),
    /// A parenthesized subquery.
    Derived(TokenStream),
    /// Validated FROM-clause text, emitted without parentheses.
    Inline(RawSqlFragment),
}

/// A table reference with optional alias.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            source: TableSource::Named(vec![table.into()]),
            alias: None,
        }
    }

    /// A dotted name such as `LeafDB.app.Cohort`.
    pub fn qualified(parts: &[&str]) -> Self {
        Self {
            source: TableSource::Named(parts.iter().map(|p| p.to_string()).collect()),
            alias: None,
        }
    }

    pub fn temp(name: &str) -> Self {
        Self {
            source: TableSource::Temp(name.into()),
            alias: None,
        }
    }

    /// `( <body> )`
    pub fn derived(body: TokenStream) -> Self {
        Self {
            source: TableSource::Derived(body),
            alias: None,
        }
    }

    /// `( <fragment> )`
    pub fn fragment(fragment: RawSqlFragment) -> Self {
        let mut body = TokenStream::new();
        body.push(Token::Fragment(fragment));
        Self::derived(body)
    }

    /// A FROM-clause template used as written, e.g. `dbo.Observation`.
    pub fn inline(fragment: RawSqlFragment) -> Self {
        Self {
            source: TableSource::Inline(fragment),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match &self.source {
            TableSource::Named(parts) if parts.len() == 1 => {
                ts.push(Token::Ident(parts[0].clone()));
            }
            TableSource::Named(parts) => {
                ts.push(Token::QualifiedIdent(parts.clone()));
            }
            TableSource::Temp(name) => {
                ts.push(Token::TempTable(name.clone()));
            }
            TableSource::Derived(body) => {
                ts.lparen().space().append(body).space().rparen();
            }
            TableSource::Inline(fragment) => {
                ts.push(Token::Fragment(fragment.clone()));
            }
        }
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

// =============================================================================
// Joins
// =============================================================================

/// An INNER JOIN clause. The compilers never need another join type.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Inner)
            .space()
            .push(Token::Join)
            .space()
            .append(&self.table.to_tokens())
            .space()
            .push(Token::On)
            .space()
            .append(&self.on.to_tokens());
        ts
    }
}

// =============================================================================
// CTE (Common Table Expression)
// =============================================================================

/// A Common Table Expression: `name AS ( body )`.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Cte {
    pub name: String,
    pub body: TokenStream,
}

impl Cte {
    pub fn new(name: &str, body: TokenStream) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    pub fn from_select(name: &str, query: &Select) -> Self {
        Self::new(name, query.to_tokens())
    }

    pub fn from_fragment(name: &str, fragment: RawSqlFragment) -> Self {
        let mut body = TokenStream::new();
        body.push(Token::Fragment(fragment));
        Self::new(name, body)
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.name.clone()))
            .space()
            .push(Token::As)
            .space()
            .lparen()
            .space()
            .append(&self.body)
            .space()
            .rparen();
        ts
    }
}

// =============================================================================
// Select Builder
// =============================================================================

/// A SELECT statement, optionally preceded by CTEs.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Select has no effect until converted to SQL with to_sql() or to_tokens()"]
pub struct Select {
    pub with: Vec<Cte>,
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl Select {
    /// Create a new empty query. An empty select list renders as `*`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a CTE (WITH clause).
    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.with.push(cte);
        self
    }

    /// Set the SELECT list.
    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(Into::into).collect();
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    pub fn inner_join(mut self, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { table, on });
        self
    }

    /// Set the WHERE clause.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        if !self.with.is_empty() {
            ts.push(Token::With).space();
            for (i, cte) in self.with.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&cte.to_tokens());
            }
            ts.space();
        }

        ts.push(Token::Select).space();
        if self.select.is_empty() {
            ts.push(Token::Star);
        } else {
            for (i, item) in self.select.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&item.to_tokens());
            }
        }

        if let Some(from) = &self.from {
            ts.space().push(Token::From).space().append(&from.to_tokens());
        }

        for join in &self.joins {
            ts.space().append(&join.to_tokens());
        }

        if let Some(cond) = &self.where_clause {
            ts.space().push(Token::Where).space().append(&cond.to_tokens());
        }

        if !self.group_by.is_empty() {
            ts.space().push(Token::GroupBy).space();
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens());
            }
        }

        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }
}

// =============================================================================
// Set Operations
// =============================================================================

/// Set operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpType {
    Intersect,
    Except,
}

/// A flat chain of set operations: `q1 INTERSECT q2 ... EXCEPT qn`.
///
/// Operands are not parenthesized; operators apply left to right, which is
/// the intended semantics as long as every INTERSECT precedes every EXCEPT.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SetOperation {
    pub first: Select,
    pub rest: Vec<(SetOpType, Select)>,
}

impl SetOperation {
    pub fn new(first: Select) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// Append another operand.
    pub fn chain(mut self, op: SetOpType, right: Select) -> Self {
        self.rest.push((op, right));
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = self.first.to_tokens();
        for (op, query) in &self.rest {
            ts.space()
                .push(match op {
                    SetOpType::Intersect => Token::Intersect,
                    SetOpType::Except => Token::Except,
                })
                .space()
                .append(&query.to_tokens());
        }
        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }
}
