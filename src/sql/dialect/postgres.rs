//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - `:name` placeholders (rewritten to positional by the driver layer)
//! - Native boolean type (true/false), so `Exported = true`
//! - Native UUID column type
//! - CREATE TEMPORARY TABLE with session lifetime

use super::helpers;
use super::SqlDialect;
use crate::model::FieldType;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, name: &str) -> String {
        helpers::placeholder_colon(name)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        helpers::emit_field_type_postgres(ft)
    }
}
