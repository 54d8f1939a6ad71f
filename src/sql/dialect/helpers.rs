//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use crate::model::FieldType;

// =============================================================================
// Placeholders
// =============================================================================

/// Named placeholder with an `@` prefix.
/// Used by: T-SQL, MySQL (connector named parameters), BigQuery
pub fn placeholder_at(name: &str) -> String {
    format!("@{}", name)
}

/// Named placeholder with a `:` prefix.
/// Used by: Postgres, Oracle
pub fn placeholder_colon(name: &str) -> String {
    format!(":{}", name)
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
/// Used by: T-SQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

/// Quote string with backslash escaping as well as doubled quotes.
/// Used by: MySQL, BigQuery
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres, BigQuery
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: T-SQL, MySQL, Oracle
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Column Types
// =============================================================================

pub fn emit_field_type_tsql(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String => "NVARCHAR(200)",
        FieldType::Guid => "UNIQUEIDENTIFIER",
        FieldType::Bool => "BIT",
        FieldType::DateTime => "DATETIME",
        FieldType::Int => "INT",
        FieldType::Numeric => "DECIMAL(18,3)",
    }
}

pub fn emit_field_type_postgres(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String => "TEXT",
        FieldType::Guid => "UUID",
        FieldType::Bool => "BOOLEAN",
        FieldType::DateTime => "TIMESTAMP",
        FieldType::Int => "INTEGER",
        FieldType::Numeric => "NUMERIC",
    }
}

pub fn emit_field_type_mysql(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String => "VARCHAR(200)",
        // No native UUID type; 36 characters covers the hyphenated form.
        FieldType::Guid => "CHAR(36)",
        FieldType::Bool => "TINYINT(1)",
        FieldType::DateTime => "DATETIME",
        FieldType::Int => "INT",
        FieldType::Numeric => "DECIMAL(18,3)",
    }
}

pub fn emit_field_type_oracle(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String => "NVARCHAR2(200)",
        FieldType::Guid => "CHAR(36)",
        FieldType::Bool => "NUMBER(1)",
        FieldType::DateTime => "TIMESTAMP",
        FieldType::Int => "NUMBER(10)",
        FieldType::Numeric => "NUMBER",
    }
}

pub fn emit_field_type_bigquery(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String | FieldType::Guid => "STRING",
        FieldType::Bool => "BOOL",
        FieldType::DateTime => "DATETIME",
        FieldType::Int => "INT64",
        FieldType::Numeric => "NUMERIC",
    }
}
