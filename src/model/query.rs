// src/model/query.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::concept::Concept;
use super::panel::{Panel, PanelItem, PanelType, SubPanel};

/// A saved or ad-hoc cohort query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub panel_filters: Vec<PanelFilter>,
}

/// A quick-add criterion switched on from the filter bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelFilter {
    pub concept: Concept,
    #[serde(default = "default_true")]
    pub is_inclusion: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Query {
    /// All panels to compile: the explicit panels followed by one
    /// single-item patient panel per active filter, indexed after them.
    pub fn all_panels(&self) -> Vec<Panel> {
        let next = self
            .panels
            .iter()
            .map(|p| p.index + 1)
            .max()
            .unwrap_or(0);

        let filters = self
            .panel_filters
            .iter()
            .filter(|f| f.is_active)
            .enumerate()
            .map(|(i, f)| f.to_panel(next + i));

        self.panels.iter().cloned().chain(filters).collect()
    }
}

impl PanelFilter {
    pub fn to_panel(&self, index: usize) -> Panel {
        Panel {
            index,
            include_panel: self.is_inclusion,
            panel_type: PanelType::Patient,
            date_filter: None,
            sub_panels: vec![SubPanel {
                include_sub_panel: true,
                minimum_count: 1,
                join_sequence: None,
                date_filter: None,
                panel_items: vec![PanelItem::new(0, self.concept.clone())],
            }],
        }
    }
}
