// src/model/concept.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable, administrator-defined clinical data definition.
///
/// `sql_set_where` and the referenced [`ConceptSqlSet`] are SQL text and are
/// validated before composition even though only administrators author them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: Uuid,
    #[serde(default)]
    pub universal_id: Option<String>,
    pub sql_set_id: i32,
    #[serde(default)]
    pub sql_set_where: Option<String>,
    #[serde(default)]
    pub is_numeric: bool,
    #[serde(default)]
    pub sql_field_numeric: Option<String>,
    #[serde(default)]
    pub is_encounter_based: bool,
    #[serde(default)]
    pub specialization_groups: Vec<SpecializationGroup>,
}

impl Concept {
    /// Preferred external reference: the universal id when one exists.
    pub fn reference(&self) -> ConceptRef {
        match &self.universal_id {
            Some(uid) => ConceptRef::UniversalId(uid.clone()),
            None => ConceptRef::Id(self.id),
        }
    }
}

/// How a panel item names its concept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConceptRef {
    Id(Uuid),
    UniversalId(String),
}

/// The FROM-clause template and column names shared by a family of concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptSqlSet {
    pub id: i32,
    pub sql_set_from: String,
    #[serde(default)]
    pub is_encounter_based: bool,
    #[serde(default)]
    pub sql_field_date: Option<String>,
    #[serde(default)]
    pub sql_field_event: Option<String>,
}

/// A group of mutually exclusive narrowing options for a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializationGroup {
    pub id: i32,
    pub sql_set_id: i32,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialization {
    pub id: Uuid,
    #[serde(default)]
    pub universal_id: Option<String>,
    pub specialization_group_id: i32,
    pub sql_set_when: String,
}
