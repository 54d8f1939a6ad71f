//! Demographic SQL compiler.
//!
//! Same pipeline as the dataset compiler, without date filtering. When the
//! caller may not see identified data the `filter` stage projects only the
//! fields that are required, not PHI, or maskable; the projected fields are
//! reported alongside the SQL so the caller can mask them.

use std::sync::Arc;

use super::context::{DemographicCompilerContext, DemographicExecutionContext};
use super::pipeline::{finish, unfiltered, Pipeline, DATASET};
use crate::cohort::CohortPreparer;
use crate::config::CompilerOptions;
use crate::error::{CompileError, CompileResult};
use crate::model::{columns, SchemaFieldSelector};
use crate::sql::{col, Select, TableRef};
use crate::validation::{validate_identifier, SqlValidator};

pub struct DemographicSqlCompiler {
    options: CompilerOptions,
    preparer: Arc<dyn CohortPreparer>,
    validator: SqlValidator,
}

impl DemographicSqlCompiler {
    pub fn new(options: CompilerOptions, preparer: Arc<dyn CohortPreparer>) -> Self {
        let validator = SqlValidator::for_dialect(options.dialect);
        Self {
            options,
            preparer,
            validator,
        }
    }

    pub fn with_validator(mut self, validator: SqlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Compile with PHI restriction taken from the caller's scope.
    pub async fn build_scoped(
        &self,
        ctx: &DemographicCompilerContext,
    ) -> CompileResult<DemographicExecutionContext> {
        let scope = ctx.query_context.scope.ok_or_else(|| {
            CompileError::MissingScope("demographics require a resolved session scope".into())
        })?;
        self.build_demographic_sql(ctx, !scope.identified).await
    }

    pub async fn build_demographic_sql(
        &self,
        ctx: &DemographicCompilerContext,
        restrict_phi: bool,
    ) -> CompileResult<DemographicExecutionContext> {
        let statement = self.validator.validate_named(
            "demographic query",
            &ctx.demographic_query.sql_statement,
        )?;

        let declared = ctx.demographic_query.fields();
        for field in declared {
            validate_identifier(&field.name)?;
        }
        let (filter, field_selectors) = restrict(declared, restrict_phi)?;

        // Non-exported rows are included; the Exported column tells the
        // caller which patients may leave the system.
        let mut prepared = self.preparer.prepare(ctx.query_context.query_id, false).await?;
        let mut params = std::mem::take(&mut prepared.parameters);
        ctx.query_context.bind_scope(&mut params);

        let pipeline = Pipeline {
            cohort: &prepared.body,
            dataset: statement,
            filter,
            leading: &[columns::EXPORTED, columns::SALT],
            join_encounter: false,
        };
        let statement = pipeline.to_select();

        tracing::debug!(
            query_id = %ctx.query_context.query_id,
            restrict_phi,
            fields = field_selectors.len(),
            declared = declared.len(),
            "compiled demographics"
        );

        Ok(DemographicExecutionContext {
            execution: finish(&statement, params, prepared, &self.options),
            field_selectors,
        })
    }
}

/// The `filter` stage and the fields it projects.
fn restrict(
    declared: &[SchemaFieldSelector],
    restrict_phi: bool,
) -> CompileResult<(Select, Vec<SchemaFieldSelector>)> {
    if !restrict_phi {
        return Ok((unfiltered(), declared.to_vec()));
    }

    // The outer join reads `filter.personId`, so an override schema must
    // declare personId as required to stay executable when restricted.
    let visible: Vec<SchemaFieldSelector> = declared
        .iter()
        .filter(|f| f.visible_when_restricted())
        .cloned()
        .collect();
    // An empty projection would render as `*` and leak every column.
    if visible.is_empty() {
        return Err(CompileError::EmptyProjection("the demographic query".into()));
    }

    let filter = Select::new()
        .select(visible.iter().map(|f| col(&f.name)).collect::<Vec<_>>())
        .from(TableRef::new(DATASET));
    Ok((filter, visible))
}
