//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the handful of places
//! where composed cohort and dataset SQL differs between warehouses:
//!
//! - Bound parameter placeholders: `@name` (T-SQL/MySQL/BigQuery), `:name` (PG/Oracle)
//! - Set difference keyword: `EXCEPT` vs `MINUS` (Oracle)
//! - Boolean literals: true/false vs 1/0
//! - Column type names for staged cohort tables
//! - Temporary table naming and creation syntax
//!
//! # Usage
//!
//! ```ignore
//! use cohort_compiler::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let late = dialect.placeholder("late");  // :late
//! ```
//!
//! Every dialect is a zero-sized unit struct, so the `&'static dyn SqlDialect`
//! returned by [`Dialect::dialect`] is an immutable process-wide table.

mod bigquery;
pub mod helpers;
mod mysql;
mod oracle;
mod postgres;
mod tsql;

pub use bigquery::BigQuery;
pub use mysql::MySql;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use crate::model::FieldType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Parameters and Literals
    // =========================================================================

    /// Render a named bound-parameter placeholder.
    ///
    /// - T-SQL/MySQL/BigQuery: `@name`
    /// - PostgreSQL/Oracle: `:name`
    fn placeholder(&self, name: &str) -> String;

    /// Quote a string literal.
    ///
    /// Only used for staged cohort rows, which come from the application
    /// database rather than from users.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL/BigQuery: `true`/`false`
    /// - MySQL/T-SQL/Oracle: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Set Operations
    // =========================================================================

    /// Keyword for set intersection.
    ///
    /// BigQuery requires the explicit `DISTINCT` qualifier.
    fn intersect_keyword(&self) -> &'static str {
        "INTERSECT"
    }

    /// Keyword for set difference.
    ///
    /// Oracle spells it `MINUS`.
    fn except_keyword(&self) -> &'static str {
        "EXCEPT"
    }

    // =========================================================================
    // Keyword Matching
    // =========================================================================

    /// Whether statement keywords are recognised regardless of case.
    fn case_insensitive_keywords(&self) -> bool {
        true
    }

    // =========================================================================
    // Staged Cohort Tables
    // =========================================================================

    /// Column type used for a field of the given type.
    fn emit_field_type(&self, ft: &FieldType) -> &'static str;

    /// Session-scoped name for a temporary table.
    ///
    /// - T-SQL: `#name`
    /// - Oracle: `ORA$PTT_name` (private temporary table prefix)
    fn temp_table_name(&self, name: &str) -> String {
        name.into()
    }

    /// Statement prefix that creates a temporary table.
    fn create_temp_table_keyword(&self) -> &'static str {
        "CREATE TEMPORARY TABLE"
    }

    /// Whether `DROP TABLE IF EXISTS` is supported.
    fn supports_if_exists(&self) -> bool {
        true
    }

    /// Whether one INSERT may carry several `VALUES` rows.
    fn supports_multi_row_values(&self) -> bool {
        true
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    TSql,
    Postgres,
    MySql,
    Oracle,
    BigQuery,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::TSql => &TSql,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Oracle => &Oracle,
            Dialect::BigQuery => &BigQuery,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn placeholder(&self, name: &str) -> String {
        self.dialect().placeholder(name)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn intersect_keyword(&self) -> &'static str {
        self.dialect().intersect_keyword()
    }

    fn except_keyword(&self) -> &'static str {
        self.dialect().except_keyword()
    }

    fn case_insensitive_keywords(&self) -> bool {
        self.dialect().case_insensitive_keywords()
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        self.dialect().emit_field_type(ft)
    }

    fn temp_table_name(&self, name: &str) -> String {
        self.dialect().temp_table_name(name)
    }

    fn create_temp_table_keyword(&self) -> &'static str {
        self.dialect().create_temp_table_keyword()
    }

    fn supports_if_exists(&self) -> bool {
        self.dialect().supports_if_exists()
    }

    fn supports_multi_row_values(&self) -> bool {
        self.dialect().supports_multi_row_values()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
