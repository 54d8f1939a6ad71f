//! Cohort set-algebra compiler.
//!
//! Each panel contributes a SELECT of person ids. Inclusions are
//! intersected, cheapest first, and exclusions are subtracted in query
//! order:
//!
//! ```text
//! SELECT P1.PersonId FROM ( ... ) AS P1
//! INTERSECT SELECT P0.PersonId FROM ( ... ) AS P0
//! EXCEPT SELECT P2.PersonId FROM ( ... ) AS P2
//! ```
//!
//! The chain is flat. Some engines (T-SQL, PostgreSQL) bind INTERSECT
//! tighter than EXCEPT, others evaluate left to right. Both readings agree
//! only because every INTERSECT precedes the first EXCEPT, so every
//! exclusion applies to the full intersection. Keep that ordering.

use std::sync::Arc;

use super::context::{CompiledCohort, ContextScope};
use super::provider::PanelSqlBuilder;
use crate::config::CompilerOptions;
use crate::error::{CompileError, CompileResult};
use crate::model::{Panel, Query};
use crate::sql::{table_col, ParameterSet, Select, SetOpType, SetOperation, TableRef};
use crate::validation::SqlValidator;

/// A panel's SELECT, ready to be chained.
struct CompiledPanel {
    index: usize,
    include: bool,
    estimated_count: u64,
    select: Select,
}

/// Combines per-panel SQL into one cohort statement.
pub struct CohortSqlCompiler {
    options: CompilerOptions,
    panels: Arc<dyn PanelSqlBuilder>,
    validator: SqlValidator,
}

impl CohortSqlCompiler {
    pub fn new(options: CompilerOptions, panels: Arc<dyn PanelSqlBuilder>) -> Self {
        let validator = SqlValidator::for_dialect(options.dialect);
        Self {
            options,
            panels,
            validator,
        }
    }

    pub fn with_validator(mut self, validator: SqlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Compile `query` into its cohort-defining statement.
    ///
    /// Quick-add filters are compiled as trailing panels.
    pub fn compile(&self, query: &Query, scope: Option<&ContextScope>) -> CompileResult<CompiledCohort> {
        let panels = query.all_panels();

        if !panels.iter().any(|p| p.include_panel) {
            return Err(CompileError::EmptyInclusionSet);
        }
        for panel in &panels {
            check_structure(panel)?;
        }

        let compiled = panels
            .iter()
            .map(|p| self.compile_panel(p))
            .collect::<CompileResult<Vec<_>>>()?;

        let (mut inclusions, exclusions): (Vec<_>, Vec<_>) =
            compiled.into_iter().partition(|p| p.include);
        inclusions.sort_by_key(|p| (p.estimated_count, p.index));

        let inclusion_order: Vec<usize> = inclusions.iter().map(|p| p.index).collect();
        let exclusion_order: Vec<usize> = exclusions.iter().map(|p| p.index).collect();

        let mut inclusions = inclusions.into_iter();
        let first = inclusions.next().ok_or(CompileError::EmptyInclusionSet)?;

        let set = inclusions
            .map(|p| (SetOpType::Intersect, p.select))
            .chain(exclusions.into_iter().map(|p| (SetOpType::Except, p.select)))
            .fold(SetOperation::new(first.select), |set, (op, select)| {
                set.chain(op, select)
            });

        let mut params = ParameterSet::new();
        if let Some(scope) = scope {
            scope.bind(&mut params);
        }

        let compiled_query = set.to_sql(self.options.dialect);
        tracing::debug!(
            panels = panels.len(),
            inclusions = ?inclusion_order,
            exclusions = ?exclusion_order,
            "compiled cohort"
        );
        tracing::trace!(sql = %compiled_query);

        Ok(CompiledCohort {
            compiled_query,
            parameters: params.into_vec(),
            inclusion_order,
            exclusion_order,
        })
    }

    fn compile_panel(&self, panel: &Panel) -> CompileResult<CompiledPanel> {
        let panel_sql = self.panels.estimate_panel_sql(panel)?;
        let fragment = self
            .validator
            .validate_named(&format!("panel {}", panel.index), &panel_sql.sql)?;

        let alias = panel.alias();
        let select = Select::new()
            .select(vec![table_col(&alias, &self.options.field_person_id)])
            .from(TableRef::fragment(fragment).with_alias(&alias));

        Ok(CompiledPanel {
            index: panel.index,
            include: panel.include_panel,
            estimated_count: panel_sql.estimated_count,
            select,
        })
    }
}

/// Reject panels whose shape cannot produce meaningful SQL.
pub fn check_structure(panel: &Panel) -> CompileResult<()> {
    let invalid = |reason: String| CompileError::InvalidPanel {
        index: panel.index,
        reason,
    };

    if panel.sub_panels.is_empty() {
        return Err(invalid("panel has no sub-panels".into()));
    }
    for (i, sub) in panel.sub_panels.iter().enumerate() {
        if sub.minimum_count == 0 {
            return Err(invalid(format!("sub-panel {} has a minimum count of 0", i)));
        }
        if sub.minimum_count as usize > sub.panel_items.len() {
            return Err(invalid(format!(
                "sub-panel {} requires {} items but has {}",
                i,
                sub.minimum_count,
                sub.panel_items.len()
            )));
        }
    }
    Ok(())
}
