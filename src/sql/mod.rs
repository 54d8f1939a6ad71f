//! SQL generation module.
//!
//! This module provides the type-safe building blocks the compilers use to
//! compose multi-dialect SQL:
//!
//! - [`query`] - SELECT, set-operation and CTE builders
//! - [`expr`] - Expression AST and builder DSL
//! - [`fragment`] - Validated administrator-authored SQL text
//! - [`param`] - Bound parameters and per-statement placeholder allocation
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod fragment;
pub mod param;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, lit_bool, param, predicate, table_col, table_star, BinaryOperator, Expr, ExprExt,
};
pub use fragment::RawSqlFragment;
pub use param::{BoundParameter, ParamValue, ParameterSet};
pub use query::{Cte, Join, Select, SelectExpr, SetOpType, SetOperation, TableRef, TableSource};
pub use token::{Token, TokenStream};
