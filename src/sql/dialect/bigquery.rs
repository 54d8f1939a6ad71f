//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - `@name` query parameters
//! - Set operations must state `DISTINCT` or `ALL`
//! - Backslash escapes inside string literals
//! - CREATE TEMP TABLE inside a multi-statement script

use super::helpers;
use super::SqlDialect;
use crate::model::FieldType;

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn placeholder(&self, name: &str) -> String {
        helpers::placeholder_at(name)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn intersect_keyword(&self) -> &'static str {
        "INTERSECT DISTINCT"
    }

    fn except_keyword(&self) -> &'static str {
        "EXCEPT DISTINCT"
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        helpers::emit_field_type_bigquery(ft)
    }

    fn create_temp_table_keyword(&self) -> &'static str {
        "CREATE TEMP TABLE"
    }
}
