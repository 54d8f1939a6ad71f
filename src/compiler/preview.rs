//! Single-concept and single-panel datasets for preview and drill-down.
//!
//! The `dataset` stage is generated from a concept's SQL set or taken from
//! the panel builder. Rows are neither date filtered nor PHI restricted.

use std::sync::Arc;

use super::context::{
    CompiledExecutionContext, ConceptDatasetCompilerContext, PanelDatasetCompilerContext,
    QueryContext,
};
use super::pipeline::{finish, unfiltered, Pipeline};
use super::provider::PanelSqlBuilder;
use crate::cohort::CohortPreparer;
use crate::config::CompilerOptions;
use crate::error::{CompileError, CompileResult};
use crate::model::{columns, Shape};
use crate::sql::{predicate, table_col, RawSqlFragment, Select, SelectExpr, TableRef};
use crate::validation::{validate_identifier, SqlValidator};

/// Alias the concept's SQL set is bound to in preview SQL.
pub const SET_ALIAS: &str = "_S";

pub struct PreviewSqlCompiler {
    options: CompilerOptions,
    preparer: Arc<dyn CohortPreparer>,
    panels: Option<Arc<dyn PanelSqlBuilder>>,
    validator: SqlValidator,
}

impl PreviewSqlCompiler {
    pub fn new(options: CompilerOptions, preparer: Arc<dyn CohortPreparer>) -> Self {
        let validator = SqlValidator::for_dialect(options.dialect);
        Self {
            options,
            preparer,
            panels: None,
            validator,
        }
    }

    pub fn with_panels(mut self, panels: Arc<dyn PanelSqlBuilder>) -> Self {
        self.panels = Some(panels);
        self
    }

    /// The `dataset` SELECT of one concept.
    ///
    /// ```text
    /// SELECT _S.PersonId AS personId, _S.EncounterId AS encounterId,
    ///        _S.{date} AS dateField[, _S.{numeric} AS numberField]
    /// FROM {sql_set_from} AS _S [WHERE {sql_set_where}]
    /// ```
    pub fn concept_sql(&self, ctx: &ConceptDatasetCompilerContext) -> CompileResult<Select> {
        let concept = &ctx.concept;
        let set = &ctx.sql_set;

        let date = set
            .sql_field_date
            .as_deref()
            .ok_or(CompileError::UnsupportedShape(Shape::Concept))?;
        validate_identifier(date)?;

        let mut projection = vec![
            SelectExpr::new(table_col(SET_ALIAS, &self.options.field_person_id))
                .with_alias(columns::PERSON_ID),
            SelectExpr::new(table_col(SET_ALIAS, &self.options.field_encounter_id))
                .with_alias(columns::ENCOUNTER_ID),
            SelectExpr::new(table_col(SET_ALIAS, date)).with_alias(columns::DATE_FIELD),
        ];
        if concept.is_numeric {
            if let Some(numeric) = concept.sql_field_numeric.as_deref() {
                validate_identifier(numeric)?;
                projection.push(
                    SelectExpr::new(table_col(SET_ALIAS, numeric)).with_alias(columns::NUMBER_FIELD),
                );
            }
        }

        let from = self.fragment(&format!("SQL set {}", set.id), &set.sql_set_from)?;
        let mut select = Select::new()
            .select(projection)
            .from(TableRef::inline(from).with_alias(SET_ALIAS));

        if let Some(where_clause) = concept.sql_set_where.as_deref() {
            let source = format!("concept {}", concept.id);
            select = select.filter(predicate(self.fragment(&source, where_clause)?));
        }
        Ok(select)
    }

    pub async fn build_concept_dataset_sql(
        &self,
        ctx: &ConceptDatasetCompilerContext,
    ) -> CompileResult<CompiledExecutionContext> {
        let dataset = self.concept_sql(ctx)?.to_sql(self.options.dialect);
        // Alias substitution can join fragments; check the assembled text too.
        let dataset = self
            .validator
            .validate_named(&format!("concept {}", ctx.concept.id), &dataset)?;

        tracing::debug!(
            query_id = %ctx.query_context.query_id,
            concept = %ctx.concept.id,
            sql_set = ctx.sql_set.id,
            "compiling concept dataset"
        );
        self.compose(&ctx.query_context, dataset).await
    }

    pub async fn build_panel_dataset_sql(
        &self,
        ctx: &PanelDatasetCompilerContext,
    ) -> CompileResult<CompiledExecutionContext> {
        let panel = &ctx.panel;
        let builder = self.panels.as_ref().ok_or_else(|| CompileError::InvalidPanel {
            index: panel.index,
            reason: "no panel SQL builder configured".into(),
        })?;
        let sql = builder.panel_dataset_sql(panel)?;
        let dataset = self
            .validator
            .validate_named(&format!("panel {}", panel.index), &sql)?;

        tracing::debug!(
            query_id = %ctx.query_context.query_id,
            panel = panel.index,
            "compiling panel dataset"
        );
        self.compose(&ctx.query_context, dataset).await
    }

    async fn compose(
        &self,
        query_context: &QueryContext,
        dataset: RawSqlFragment,
    ) -> CompileResult<CompiledExecutionContext> {
        let mut prepared = self.preparer.prepare(query_context.query_id, true).await?;
        let mut params = std::mem::take(&mut prepared.parameters);
        query_context.bind_scope(&mut params);

        let statement = Pipeline {
            cohort: &prepared.body,
            dataset,
            filter: unfiltered(),
            leading: &[columns::SALT],
            join_encounter: false,
        }
        .to_select();
        Ok(finish(&statement, params, prepared, &self.options))
    }

    /// Validate administrator text with the alias token bound to `_S`.
    fn fragment(&self, source_name: &str, text: &str) -> CompileResult<RawSqlFragment> {
        let bound = text.replace(&self.options.alias, SET_ALIAS);
        self.validator.validate_named(source_name, &bound)
    }
}
