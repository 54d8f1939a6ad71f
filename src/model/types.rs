//! Primitive field types shared by schemas, parameters and staged tables.

use serde::{Deserialize, Serialize};

/// The logical type of a dataset column or bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Guid,
    Bool,
    DateTime,
    Int,
    Numeric,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Guid => "guid",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::Int => "int",
            FieldType::Numeric => "numeric",
        };
        f.write_str(s)
    }
}
