// src/model/schema.rs
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::types::FieldType;

/// Column names every shaped dataset exposes.
pub mod columns {
    pub const PERSON_ID: &str = "personId";
    pub const ENCOUNTER_ID: &str = "encounterId";
    pub const SALT: &str = "Salt";
    pub const EXPORTED: &str = "Exported";
    pub const DATE_FIELD: &str = "dateField";
    pub const NUMBER_FIELD: &str = "numberField";
}

/// One declared dataset column with its PHI handling flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFieldSelector {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub phi: bool,
    #[serde(default)]
    pub mask: bool,
    #[serde(default)]
    pub required: bool,
}

fn default_field_type() -> FieldType {
    FieldType::String
}

impl SchemaFieldSelector {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            phi: false,
            mask: false,
            required: false,
        }
    }

    pub fn phi(mut self) -> Self {
        self.phi = true;
        self
    }

    pub fn mask(mut self) -> Self {
        self.mask = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether the field may be projected for a caller without access to
    /// identified data. Maskable PHI is projected and masked client-side.
    pub fn visible_when_restricted(&self) -> bool {
        self.required || !self.phi || self.mask
    }
}

static DEMOGRAPHIC_CONTRACT: LazyLock<Vec<SchemaFieldSelector>> = LazyLock::new(|| {
    use FieldType::*;
    vec![
        SchemaFieldSelector::new(columns::PERSON_ID, String).phi().mask().required(),
        SchemaFieldSelector::new("addressPostalCode", String),
        SchemaFieldSelector::new("addressState", String),
        SchemaFieldSelector::new("ethnicity", String),
        SchemaFieldSelector::new("gender", String),
        SchemaFieldSelector::new("language", String),
        SchemaFieldSelector::new("maritalStatus", String),
        SchemaFieldSelector::new("race", String),
        SchemaFieldSelector::new("religion", String),
        SchemaFieldSelector::new("marriedBoolean", Bool),
        SchemaFieldSelector::new("hispanicBoolean", Bool),
        SchemaFieldSelector::new("deceasedBoolean", Bool),
        SchemaFieldSelector::new("birthDate", DateTime).phi().mask(),
        SchemaFieldSelector::new("deceasedDateTime", DateTime).phi().mask(),
        SchemaFieldSelector::new("name", String).phi(),
        SchemaFieldSelector::new("mrn", String).phi(),
    ]
});

/// The built-in patient demographic contract.
pub fn demographic_contract() -> &'static [SchemaFieldSelector] {
    &DEMOGRAPHIC_CONTRACT
}
