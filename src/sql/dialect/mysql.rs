//! MySQL / MariaDB SQL dialect.
//!
//! MySQL features:
//! - `@name` placeholders through the connector's named parameters
//! - Backslash escapes inside string literals
//! - No native boolean or UUID column types
//! - INTERSECT/EXCEPT require 8.0.31+ (MariaDB 10.3+)

use super::helpers;
use super::SqlDialect;
use crate::model::FieldType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, name: &str) -> String {
        helpers::placeholder_at(name)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_field_type(&self, ft: &FieldType) -> &'static str {
        helpers::emit_field_type_mysql(ft)
    }
}
