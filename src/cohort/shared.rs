//! Cohort read straight from the persisted `app.Cohort` table.

use async_trait::async_trait;
use uuid::Uuid;

use super::{CohortPreparer, CohortResult, PreparedCohort, INTERNAL_PERSON_ID};
use crate::config::CompilerOptions;
use crate::model::columns;
use crate::sql::{col, lit_bool, param, ExprExt, ParameterSet, Select, SelectExpr, TableRef};

/// Reads `{app_db}.app.Cohort` filtered by query id. Needs no staging.
#[derive(Debug, Clone)]
pub struct SharedCohortPreparer {
    options: CompilerOptions,
}

impl SharedCohortPreparer {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// The cohort body with `queryid` bound into `params`.
    pub fn body(&self, query_id: Uuid, exported_only: bool, params: &mut ParameterSet) -> Select {
        let qid = params.bind("queryid", query_id);

        let mut condition = col("QueryId").eq(param(&qid));
        if exported_only {
            condition = condition.and(col(columns::EXPORTED).eq(lit_bool(true)));
        }

        Select::new()
            .select(vec![
                SelectExpr::new(col("PersonId")).with_alias(INTERNAL_PERSON_ID),
                col(columns::EXPORTED).into(),
                col(columns::SALT).into(),
            ])
            .from(TableRef::qualified(&self.options.cohort_table()))
            .filter(condition)
    }
}

#[async_trait]
impl CohortPreparer for SharedCohortPreparer {
    async fn prepare(&self, query_id: Uuid, exported_only: bool) -> CohortResult<PreparedCohort> {
        let mut parameters = ParameterSet::new();
        let body = self.body(query_id, exported_only, &mut parameters);
        tracing::debug!(%query_id, exported_only, "prepared shared cohort");
        Ok(PreparedCohort {
            setup: Vec::new(),
            body,
            parameters,
            teardown: Vec::new(),
        })
    }
}
