//! The `cohort` / `dataset` / `filter` CTE pipeline shared by every dataset
//! compiler.
//!
//! ```text
//! WITH cohort AS ( ... ), dataset AS ( ... ), filter AS ( ... )
//! SELECT Salt, filter.* FROM filter INNER JOIN cohort ON filter.personId = cohort.__personId__
//! ```

use crate::cohort::{PreparedCohort, INTERNAL_ENCOUNTER_ID, INTERNAL_PERSON_ID};
use crate::config::CompilerOptions;
use crate::model::columns;
use crate::sql::{
    col, table_col, table_star, Cte, Expr, ExprExt, ParameterSet, RawSqlFragment, Select,
    TableRef,
};

use super::context::CompiledExecutionContext;

pub(crate) const COHORT: &str = "cohort";
pub(crate) const DATASET: &str = "dataset";
pub(crate) const FILTER: &str = "filter";

/// Inputs of one pipeline statement.
pub(crate) struct Pipeline<'a> {
    pub cohort: &'a Select,
    pub dataset: RawSqlFragment,
    pub filter: Select,
    /// Cohort columns projected ahead of `filter.*`.
    pub leading: &'a [&'a str],
    /// Also join on the encounter id (panel-joined cohorts).
    pub join_encounter: bool,
}

impl Pipeline<'_> {
    pub fn to_select(&self) -> Select {
        let mut on = table_col(FILTER, columns::PERSON_ID).eq(table_col(COHORT, INTERNAL_PERSON_ID));
        if self.join_encounter {
            on = on.and(
                table_col(FILTER, columns::ENCOUNTER_ID).eq(table_col(COHORT, INTERNAL_ENCOUNTER_ID)),
            );
        }

        let mut projection: Vec<Expr> = self.leading.iter().map(|c| col(c)).collect();
        projection.push(table_star(FILTER));

        Select::new()
            .with_cte(Cte::from_select(COHORT, self.cohort))
            .with_cte(Cte::from_fragment(DATASET, self.dataset.clone()))
            .with_cte(Cte::from_select(FILTER, &self.filter))
            .select(projection)
            .from(TableRef::new(FILTER))
            .inner_join(TableRef::new(COHORT), on)
    }
}

/// `SELECT * FROM dataset`
pub(crate) fn unfiltered() -> Select {
    Select::new().from(TableRef::new(DATASET))
}

/// Render `statement` and hand back everything the runner needs.
pub(crate) fn finish(
    statement: &Select,
    params: ParameterSet,
    prepared: PreparedCohort,
    options: &CompilerOptions,
) -> CompiledExecutionContext {
    let compiled_query = statement.to_sql(options.dialect);
    tracing::trace!(sql = %compiled_query, params = params.len());
    CompiledExecutionContext {
        compiled_query,
        parameters: params.into_vec(),
        prelude: prepared.setup,
        epilogue: prepared.teardown,
        timeout_seconds: options.timeout_seconds,
    }
}
