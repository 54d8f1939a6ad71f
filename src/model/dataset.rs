// src/model/dataset.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::{demographic_contract, SchemaFieldSelector};
use super::shape::Shape;

/// A named, shaped dataset definition authored by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetQuery {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub shape: Shape,
    pub sql_statement: String,
    #[serde(default)]
    pub is_encounter_based: bool,
    /// Declared columns of a Dynamic dataset.
    #[serde(default)]
    pub schema: Option<DynamicSchema>,
}

/// Schema a Dynamic dataset declares for itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchema {
    #[serde(default)]
    pub sql_field_date: Option<String>,
    #[serde(default)]
    pub fields: Vec<SchemaFieldSelector>,
}

/// The patient demographics statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicQuery {
    pub sql_statement: String,
    /// Overrides the built-in demographic contract when present.
    #[serde(default)]
    pub schema: Option<Vec<SchemaFieldSelector>>,
}

impl DemographicQuery {
    pub fn new(sql_statement: &str) -> Self {
        Self {
            sql_statement: sql_statement.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, fields: Vec<SchemaFieldSelector>) -> Self {
        self.schema = Some(fields);
        self
    }

    /// Declared fields, falling back to the built-in contract.
    pub fn fields(&self) -> &[SchemaFieldSelector] {
        match &self.schema {
            Some(fields) => fields,
            None => demographic_contract(),
        }
    }
}
