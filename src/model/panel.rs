// src/model/panel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::concept::Concept;

/// One top-level inclusion or exclusion unit of a cohort query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub index: usize,
    pub include_panel: bool,
    #[serde(default)]
    pub panel_type: PanelType,
    #[serde(default)]
    pub date_filter: Option<DateBounds>,
    #[serde(default)]
    pub sub_panels: Vec<SubPanel>,
}

impl Panel {
    /// Deterministic alias used when the panel is embedded as a subquery.
    pub fn alias(&self) -> String {
        format!("P{}", self.index)
    }

    /// Whether any item in the panel is tied to encounters.
    pub fn is_encounter_based(&self) -> bool {
        self.sub_panels
            .iter()
            .flat_map(|sp| sp.panel_items.iter())
            .any(|item| item.concept.is_encounter_based)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PanelType {
    #[default]
    Patient,
    Sequence,
}

/// A count-threshold grouping of panel items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPanel {
    #[serde(default = "default_true")]
    pub include_sub_panel: bool,
    #[serde(default = "default_minimum_count")]
    pub minimum_count: u32,
    #[serde(default)]
    pub join_sequence: Option<JoinSequence>,
    #[serde(default)]
    pub date_filter: Option<DateBounds>,
    #[serde(default)]
    pub panel_items: Vec<PanelItem>,
}

fn default_true() -> bool {
    true
}

fn default_minimum_count() -> u32 {
    1
}

/// Ordering constraint between consecutive sub-panels of a sequence panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSequence {
    pub sequence_type: SequenceType,
    #[serde(default)]
    pub increment: i32,
    #[serde(default)]
    pub date_increment_type: DateIncrementType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceType {
    Encounter,
    Event,
    PlusMinus,
    WithinFollowing,
    AnytimeFollowing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateIncrementType {
    #[default]
    None,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// A single concept reference with optional narrowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelItem {
    pub index: usize,
    pub concept: Concept,
    #[serde(default)]
    pub numeric_filter: Option<NumericFilter>,
    #[serde(default)]
    pub recency_filter: RecencyFilter,
    #[serde(default)]
    pub specializations: Vec<SelectedSpecialization>,
}

impl PanelItem {
    pub fn new(index: usize, concept: Concept) -> Self {
        Self {
            index,
            concept,
            numeric_filter: None,
            recency_filter: RecencyFilter::None,
            specializations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericFilter {
    pub filter_type: NumericFilterType,
    pub filter: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericFilterType {
    None,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    EqualTo,
    Between,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecencyFilter {
    #[default]
    None,
    Min,
    Max,
}

/// The specialization chosen for one specialization group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSpecialization {
    pub specialization_group_id: i32,
    pub specialization_id: uuid::Uuid,
}

/// Optional start/end bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateBounds {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}
