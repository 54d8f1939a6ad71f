//! Cohort preparation.
//!
//! A [`CohortPreparer`] turns a query id into the body of the `cohort` CTE
//! that every dataset statement joins against, plus any statements that
//! must run before (staging) and after (cleanup) the compiled query.
//!
//! Two implementations are provided:
//! - [`SharedCohortPreparer`] reads the persisted `app.Cohort` table directly.
//! - [`TempTableCohortPreparer`] fetches the persisted cohort on each
//!   prepare and stages it into a session temporary table.

mod shared;
mod staged;

use async_trait::async_trait;
use uuid::Uuid;

use crate::sql::{ParameterSet, Select};

pub use shared::SharedCohortPreparer;
pub use staged::{CohortFetcher, CohortMember, TempTableCohortPreparer};

/// Mangled person id column exposed by the `cohort` CTE.
pub const INTERNAL_PERSON_ID: &str = "__personId__";

/// Mangled encounter id column exposed by a panel-joined `cohort` CTE.
pub const INTERNAL_ENCOUNTER_ID: &str = "__encounterId__";

/// Base name of the staged cohort table.
pub const TEMP_TABLE: &str = "__cohort__";

/// Result type for cohort preparation.
pub type CohortResult<T> = Result<T, CohortError>;

/// Errors raised while preparing a cohort.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// The cohort for this query has not been computed or was purged.
    #[error("no cohort is stored for query {0}")]
    NotFound(Uuid),

    /// The backing store failed.
    #[error("failed to fetch cohort for query {query_id}: {message}")]
    FetchFailed { query_id: Uuid, message: String },
}

impl CohortError {
    pub fn fetch_failed(query_id: Uuid, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            query_id,
            message: message.into(),
        }
    }
}

/// A cohort ready to be embedded as the `cohort` CTE.
///
/// `parameters` holds whatever the body binds and seeds the parameter set
/// of the statement the body is embedded in.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCohort {
    /// Statements that must run before the compiled query.
    pub setup: Vec<String>,
    /// SELECT producing `__personId__`, `Exported`, `Salt`.
    pub body: Select,
    pub parameters: ParameterSet,
    /// Statements that must run after the compiled query.
    pub teardown: Vec<String>,
}

/// Supplies the cohort rows for a query.
#[async_trait]
pub trait CohortPreparer: Send + Sync {
    /// Prepare the cohort of `query_id`. With `exported_only`, rows not
    /// flagged as exported are excluded.
    async fn prepare(&self, query_id: Uuid, exported_only: bool) -> CohortResult<PreparedCohort>;
}
