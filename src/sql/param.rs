//! Bound parameters.
//!
//! Every value that originates outside the administered catalog (query ids,
//! date bounds, session flags) is carried as a [`BoundParameter`] and only
//! its placeholder appears in SQL text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::FieldType;

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParamValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            ParamValue::Guid(_) => FieldType::Guid,
            ParamValue::DateTime(_) => FieldType::DateTime,
            ParamValue::Bool(_) => FieldType::Bool,
            ParamValue::Int(_) => FieldType::Int,
            ParamValue::Text(_) => FieldType::String,
        }
    }
}

impl From<Uuid> for ParamValue {
    fn from(v: Uuid) -> Self {
        ParamValue::Guid(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        ParamValue::DateTime(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.into())
    }
}

/// A named, typed value passed by placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundParameter {
    pub name: String,
    pub value: ParamValue,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl BoundParameter {
    pub fn new(name: &str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            field_type: value.field_type(),
            value,
        }
    }
}

/// The ordered parameters of one compiled statement.
///
/// Placeholder names are unique within a statement. Binding a name that is
/// already taken appends a numeric suffix (`late`, `late2`, ...), compared
/// case-insensitively since several drivers fold parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<BoundParameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return the placeholder name to emit.
    pub fn bind(&mut self, name: &str, value: impl Into<ParamValue>) -> String {
        let unique = self.unique_name(name);
        self.params.push(BoundParameter::new(&unique, value));
        unique
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&BoundParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundParameter> {
        self.params.iter()
    }

    pub fn into_vec(self) -> Vec<BoundParameter> {
        self.params
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}{}", base, n);
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl IntoIterator for ParameterSet {
    type Item = BoundParameter;
    type IntoIter = std::vec::IntoIter<BoundParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}
