//! Collaborators the compilers consume through traits.
//!
//! Panel SQL generation and entitlement checks live outside this crate.
//! [`PrecompiledPanels`] and [`FixedEntitlement`] are the simple in-process
//! implementations used by the CLI and tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::UserContext;
use crate::error::{CompileError, CompileResult};
use crate::model::Panel;

/// A panel's person-id SELECT and its estimated cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSql {
    pub sql: String,
    #[serde(default)]
    pub estimated_count: u64,
}

/// Builds the SQL of a single panel.
///
/// Returned text is treated as untrusted and validated before it is
/// embedded.
pub trait PanelSqlBuilder: Send + Sync {
    /// Single-column SELECT of the person ids matching `panel`.
    fn estimate_panel_sql(&self, panel: &Panel) -> CompileResult<PanelSql>;

    /// SELECT of the person and encounter ids matching `panel`.
    fn panel_encounter_sql(&self, panel: &Panel) -> CompileResult<String>;

    /// SELECT of `personId`, `encounterId`, `dateField` rows for `panel`.
    fn panel_dataset_sql(&self, panel: &Panel) -> CompileResult<String>;
}

/// Decides whether a user may receive identified data.
pub trait EntitlementGate: Send + Sync {
    fn is_authorized_for_identified_data(&self, user: &UserContext) -> bool;
}

/// Gate that answers the same for everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedEntitlement(pub bool);

impl EntitlementGate for FixedEntitlement {
    fn is_authorized_for_identified_data(&self, _user: &UserContext) -> bool {
        self.0
    }
}

/// SQL for one panel, produced ahead of time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecompiledPanel {
    pub sql: String,
    #[serde(default)]
    pub estimated_count: u64,
    #[serde(default)]
    pub encounter_sql: Option<String>,
    #[serde(default)]
    pub dataset_sql: Option<String>,
}

impl PrecompiledPanel {
    pub fn new(sql: &str, estimated_count: u64) -> Self {
        Self {
            sql: sql.into(),
            estimated_count,
            ..Default::default()
        }
    }

    pub fn with_encounter_sql(mut self, sql: &str) -> Self {
        self.encounter_sql = Some(sql.into());
        self
    }

    pub fn with_dataset_sql(mut self, sql: &str) -> Self {
        self.dataset_sql = Some(sql.into());
        self
    }
}

/// Panel SQL keyed by panel index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrecompiledPanels {
    panels: HashMap<usize, PrecompiledPanel>,
}

impl PrecompiledPanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_panel(mut self, index: usize, panel: PrecompiledPanel) -> Self {
        self.panels.insert(index, panel);
        self
    }

    pub fn insert(&mut self, index: usize, panel: PrecompiledPanel) {
        self.panels.insert(index, panel);
    }

    fn lookup(&self, panel: &Panel) -> CompileResult<&PrecompiledPanel> {
        self.panels
            .get(&panel.index)
            .ok_or_else(|| missing(panel, "no SQL registered"))
    }
}

fn missing(panel: &Panel, what: &str) -> CompileError {
    CompileError::InvalidPanel {
        index: panel.index,
        reason: what.into(),
    }
}

impl PanelSqlBuilder for PrecompiledPanels {
    fn estimate_panel_sql(&self, panel: &Panel) -> CompileResult<PanelSql> {
        let p = self.lookup(panel)?;
        Ok(PanelSql {
            sql: p.sql.clone(),
            estimated_count: p.estimated_count,
        })
    }

    fn panel_encounter_sql(&self, panel: &Panel) -> CompileResult<String> {
        self.lookup(panel)?
            .encounter_sql
            .clone()
            .ok_or_else(|| missing(panel, "no encounter SQL registered"))
    }

    fn panel_dataset_sql(&self, panel: &Panel) -> CompileResult<String> {
        self.lookup(panel)?
            .dataset_sql
            .clone()
            .ok_or_else(|| missing(panel, "no dataset SQL registered"))
    }
}
