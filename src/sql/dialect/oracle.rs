//! Oracle (PL/SQL) dialect.
//!
//! Oracle differences:
//! - `:name` bind variables
//! - `MINUS` instead of `EXCEPT`
//! - No boolean column type before 23c (NUMBER(1))
//! - Private temporary tables must carry the `ORA$PTT_` prefix
//! - No multi-row `VALUES`; no `IF EXISTS`

use super::helpers;
use super::SqlDialect;
use crate::model::FieldType;

/// Oracle SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl SqlDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn placeholder(&self, name: &str) -> String {
        helpers::placeholder_colon(name)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn except_keyword(&self) -> &'static str {
        "MINUS"
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        helpers::emit_field_type_oracle(ft)
    }

    fn temp_table_name(&self, name: &str) -> String {
        format!("ORA$PTT_{}", name)
    }

    fn create_temp_table_keyword(&self) -> &'static str {
        "CREATE PRIVATE TEMPORARY TABLE"
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn supports_multi_row_values(&self) -> bool {
        false
    }
}
