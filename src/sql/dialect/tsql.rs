//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differences that matter for cohort composition:
//! - `@name` parameter placeholders
//! - No native boolean in comparisons (BIT columns compare against 1/0)
//! - N'...' prefix for Unicode strings
//! - `#name` session temporary tables created with a plain CREATE TABLE

use super::helpers;
use super::SqlDialect;
use crate::model::FieldType;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn placeholder(&self, name: &str) -> String {
        helpers::placeholder_at(name)
    }

    fn quote_string(&self, s: &str) -> String {
        // T-SQL uses N'...' for Unicode strings
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        helpers::emit_field_type_tsql(ft)
    }

    fn temp_table_name(&self, name: &str) -> String {
        format!("#{}", name)
    }

    fn create_temp_table_keyword(&self) -> &'static str {
        // The '#' prefix is what makes the table temporary
        "CREATE TABLE"
    }
}
