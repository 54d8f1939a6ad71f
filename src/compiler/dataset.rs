//! Dataset SQL compiler.
//!
//! Wraps an administered dataset statement in the cohort pipeline and
//! bounds its rows by the requested date window.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::context::{CompiledExecutionContext, DatasetCompilerContext};
use super::date_filter::{date_window, target_date_field};
use super::pipeline::{finish, unfiltered, Pipeline, DATASET};
use super::provider::PanelSqlBuilder;
use crate::cohort::{CohortPreparer, INTERNAL_ENCOUNTER_ID, INTERNAL_PERSON_ID};
use crate::config::CompilerOptions;
use crate::error::{CompileError, CompileResult};
use crate::model::{columns, Panel};
use crate::sql::{table_col, ExprExt, RawSqlFragment, Select, SelectExpr, TableRef};
use crate::validation::SqlValidator;

/// Compiles event-shaped and dynamic datasets.
pub struct DatasetSqlCompiler {
    options: CompilerOptions,
    preparer: Arc<dyn CohortPreparer>,
    panels: Option<Arc<dyn PanelSqlBuilder>>,
    validator: SqlValidator,
    now: Option<DateTime<Utc>>,
}

impl DatasetSqlCompiler {
    pub fn new(options: CompilerOptions, preparer: Arc<dyn CohortPreparer>) -> Self {
        let validator = SqlValidator::for_dialect(options.dialect);
        Self {
            options,
            preparer,
            panels: None,
            validator,
            now: None,
        }
    }

    /// Panel SQL source, needed for panel-joined cohorts.
    pub fn with_panels(mut self, panels: Arc<dyn PanelSqlBuilder>) -> Self {
        self.panels = Some(panels);
        self
    }

    pub fn with_validator(mut self, validator: SqlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Pin the instant that open-ended windows close at.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub async fn build_dataset_sql(
        &self,
        ctx: &DatasetCompilerContext,
    ) -> CompileResult<CompiledExecutionContext> {
        let dataset = &ctx.dataset_query;
        let statement = self
            .validator
            .validate_named(&format!("dataset '{}'", dataset.name), &dataset.sql_statement)?;
        let date_field = target_date_field(dataset)?;

        let encounters = ctx
            .join_panel
            .as_ref()
            .map(|panel| self.panel_encounter_sql(panel, dataset.is_encounter_based))
            .transpose()?;

        let mut prepared = self.preparer.prepare(ctx.query_context.query_id, true).await?;
        let mut params = std::mem::take(&mut prepared.parameters);

        let cohort = match (&ctx.join_panel, encounters) {
            (Some(panel), Some(encounters)) => self.join_to_panel(panel, encounters, &prepared.body),
            _ => prepared.body.clone(),
        };

        let filter = match date_field {
            Some(field) => {
                let now = self.now.unwrap_or_else(Utc::now);
                let window = date_window(field, ctx.early, ctx.late, now, &mut params);
                Select::new().from(TableRef::new(DATASET)).filter(window)
            }
            None => unfiltered(),
        };

        ctx.query_context.bind_scope(&mut params);

        let pipeline = Pipeline {
            cohort: &cohort,
            dataset: statement,
            filter,
            leading: &[columns::SALT],
            join_encounter: ctx.join_panel.is_some(),
        };

        tracing::debug!(
            query_id = %ctx.query_context.query_id,
            dataset = %dataset.name,
            shape = %dataset.shape,
            date_field = ?date_field,
            join_panel = ?ctx.join_panel.as_ref().map(|p| p.index),
            "compiled dataset"
        );

        Ok(finish(&pipeline.to_select(), params, prepared, &self.options))
    }

    /// Compile several datasets of one request concurrently.
    ///
    /// Results are returned in input order; one failure does not stop the
    /// others.
    pub async fn build_dataset_batch(
        &self,
        contexts: &[DatasetCompilerContext],
    ) -> Vec<CompileResult<CompiledExecutionContext>> {
        let futures: Vec<_> = contexts
            .iter()
            .map(|ctx| self.build_dataset_sql(ctx))
            .collect();
        futures::future::join_all(futures).await
    }

    fn panel_encounter_sql(
        &self,
        panel: &Panel,
        dataset_is_encounter_based: bool,
    ) -> CompileResult<RawSqlFragment> {
        let invalid = |reason: &str| CompileError::InvalidPanel {
            index: panel.index,
            reason: reason.into(),
        };
        if !dataset_is_encounter_based {
            return Err(invalid("dataset is not encounter based"));
        }
        if !panel.is_encounter_based() {
            return Err(invalid("panel is not encounter based"));
        }
        let builder = self
            .panels
            .as_ref()
            .ok_or_else(|| invalid("no panel SQL builder configured"))?;

        let sql = builder.panel_encounter_sql(panel)?;
        self.validator
            .validate_named(&format!("panel {}", panel.index), &sql)
    }

    /// Narrow the cohort to the encounters matched by a panel.
    fn join_to_panel(
        &self,
        panel: &Panel,
        encounters: RawSqlFragment,
        cohort: &Select,
    ) -> Select {
        let person = self.options.field_person_id.as_str();
        let encounter = self.options.field_encounter_id.as_str();
        tracing::trace!(panel = panel.index, "joining cohort to panel encounters");

        Select::new()
            .select(vec![
                SelectExpr::new(table_col("J", person)).with_alias(INTERNAL_PERSON_ID),
                SelectExpr::new(table_col("J", encounter)).with_alias(INTERNAL_ENCOUNTER_ID),
                table_col("C", columns::SALT).into(),
            ])
            .from(TableRef::fragment(encounters).with_alias("J"))
            .inner_join(
                TableRef::derived(cohort.to_tokens()).with_alias("C"),
                table_col("J", person).eq(table_col("C", INTERNAL_PERSON_ID)),
            )
            .group_by(vec![
                table_col("J", person),
                table_col("J", encounter),
                table_col("C", columns::SALT),
            ])
    }
}
