//! Compiler inputs and outputs.
//!
//! Input contexts are built by the caller per request and borrowed by the
//! compilers. Execution contexts are created fresh per call and handed back
//! whole; nothing holds on to them afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::EntitlementGate;
use crate::error::{CompileError, CompileResult};
use crate::model::{Concept, ConceptSqlSet, DatasetQuery, DemographicQuery, Panel, SchemaFieldSelector};
use crate::sql::{BoundParameter, ParameterSet};

// =============================================================================
// Caller scope
// =============================================================================

/// Declared purpose of the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    Research,
    QualityImprovement,
}

/// The requesting user, as far as compilation cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub username: String,
    #[serde(default)]
    pub session_type: Option<SessionType>,
}

impl UserContext {
    pub fn new(username: &str, session_type: Option<SessionType>) -> Self {
        Self {
            username: username.into(),
            session_type,
        }
    }
}

/// Resolved session scope: whether identified data may be returned, and
/// under which session type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextScope {
    pub identified: bool,
    pub session: SessionType,
}

impl ContextScope {
    /// Resolve the scope of `user`, asking `gate` whether identified data
    /// may be returned.
    pub fn resolve(user: &UserContext, gate: &dyn EntitlementGate) -> CompileResult<Self> {
        let session = user.session_type.ok_or_else(|| {
            CompileError::MissingScope(format!("user '{}' has no session type", user.username))
        })?;
        Ok(Self {
            identified: gate.is_authorized_for_identified_data(user),
            session,
        })
    }

    /// Bind `IsIdentified`, `IsResearch` and `IsQI` for administrator SQL
    /// that branches on the session.
    pub fn bind(&self, params: &mut ParameterSet) {
        params.bind("IsIdentified", self.identified);
        params.bind("IsResearch", self.session == SessionType::Research);
        params.bind("IsQI", self.session == SessionType::QualityImprovement);
    }
}

/// Per-request context shared by all compilers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    pub query_id: Uuid,
    pub scope: Option<ContextScope>,
}

impl QueryContext {
    pub fn new(query_id: Uuid) -> Self {
        Self {
            query_id,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: ContextScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub(crate) fn bind_scope(&self, params: &mut ParameterSet) {
        if let Some(scope) = &self.scope {
            scope.bind(params);
        }
    }
}

// =============================================================================
// Compiler inputs
// =============================================================================

/// Input of the dataset compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetCompilerContext {
    pub query_context: QueryContext,
    pub dataset_query: DatasetQuery,
    pub early: Option<DateTime<Utc>>,
    pub late: Option<DateTime<Utc>>,
    /// Restrict the cohort to encounters of this panel.
    pub join_panel: Option<Panel>,
}

impl DatasetCompilerContext {
    pub fn new(query_context: QueryContext, dataset_query: DatasetQuery) -> Self {
        Self {
            query_context,
            dataset_query,
            early: None,
            late: None,
            join_panel: None,
        }
    }

    pub fn with_bounds(
        mut self,
        early: Option<DateTime<Utc>>,
        late: Option<DateTime<Utc>>,
    ) -> Self {
        self.early = early;
        self.late = late;
        self
    }

    pub fn join_to_panel(mut self, panel: Panel) -> Self {
        self.join_panel = Some(panel);
        self
    }
}

/// Input of the demographic compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct DemographicCompilerContext {
    pub query_context: QueryContext,
    pub demographic_query: DemographicQuery,
}

/// Input of the concept preview compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDatasetCompilerContext {
    pub query_context: QueryContext,
    pub concept: Concept,
    pub sql_set: ConceptSqlSet,
}

/// Input of the panel drill-down compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDatasetCompilerContext {
    pub query_context: QueryContext,
    pub panel: Panel,
}

// =============================================================================
// Compiler outputs
// =============================================================================

/// A compiled statement ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledExecutionContext {
    pub compiled_query: String,
    pub parameters: Vec<BoundParameter>,
    /// Statements to run first, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prelude: Vec<String>,
    /// Statements to run afterwards, in order, even if the query fails.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub epilogue: Vec<String>,
    /// Execution timeout the runner should apply.
    pub timeout_seconds: u64,
}

/// Output of the cohort compiler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledCohort {
    pub compiled_query: String,
    pub parameters: Vec<BoundParameter>,
    /// Panel indexes of the inclusions, in emitted order.
    pub inclusion_order: Vec<usize>,
    /// Panel indexes of the exclusions, in emitted order.
    pub exclusion_order: Vec<usize>,
}

/// Output of the demographic compiler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicExecutionContext {
    #[serde(flatten)]
    pub execution: CompiledExecutionContext,
    /// Fields the statement projects, in order.
    pub field_selectors: Vec<SchemaFieldSelector>,
}
