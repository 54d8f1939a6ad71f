// src/model/shape.rs
use serde::{Deserialize, Serialize};

/// The semantic row type of a dataset.
///
/// Numeric ids match the values stored alongside administered dataset
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Concept,
    Dynamic,
    Observation,
    Encounter,
    #[serde(alias = "Demographics")]
    Demographic,
    Condition,
    Procedure,
    Immunization,
    Allergy,
    MedicationRequest,
    MedicationAdministration,
}

impl Shape {
    pub const ALL: [Shape; 11] = [
        Shape::Concept,
        Shape::Dynamic,
        Shape::Observation,
        Shape::Encounter,
        Shape::Demographic,
        Shape::Condition,
        Shape::Procedure,
        Shape::Immunization,
        Shape::Allergy,
        Shape::MedicationRequest,
        Shape::MedicationAdministration,
    ];

    pub fn id(self) -> i32 {
        match self {
            Shape::Concept => -2,
            Shape::Dynamic => -1,
            Shape::Observation => 1,
            Shape::Encounter => 2,
            Shape::Demographic => 3,
            Shape::Condition => 4,
            Shape::Procedure => 5,
            Shape::Immunization => 6,
            Shape::Allergy => 7,
            Shape::MedicationRequest => 8,
            Shape::MedicationAdministration => 9,
        }
    }

    pub fn from_id(id: i32) -> Option<Shape> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
