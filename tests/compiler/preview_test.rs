use std::sync::Arc;

use uuid::Uuid;

use cohort_compiler::compiler::{
    ConceptDatasetCompilerContext, PanelDatasetCompilerContext, PrecompiledPanel,
    PrecompiledPanels, PreviewSqlCompiler, QueryContext,
};
use cohort_compiler::model::{Concept, ConceptSqlSet, PanelType};
use cohort_compiler::prelude::*;

fn compiler(dialect: Dialect) -> PreviewSqlCompiler {
    let options = CompilerOptions::default().with_dialect(dialect);
    PreviewSqlCompiler::new(options.clone(), Arc::new(SharedCohortPreparer::new(options)))
}

fn a1c() -> Concept {
    Concept {
        id: Uuid::new_v4(),
        universal_id: Some("urn:leaf:concept:lab:a1c".into()),
        sql_set_id: 12,
        sql_set_where: Some("@.code = '4548-4' AND @.status = 'final'".into()),
        is_numeric: true,
        sql_field_numeric: Some("valueQuantity".into()),
        is_encounter_based: true,
        specialization_groups: vec![],
    }
}

fn labs() -> ConceptSqlSet {
    ConceptSqlSet {
        id: 12,
        sql_set_from: "dbo.Observation".into(),
        is_encounter_based: true,
        sql_field_date: Some("effectiveDate".into()),
        sql_field_event: None,
    }
}

fn concept_context(concept: Concept, sql_set: ConceptSqlSet) -> ConceptDatasetCompilerContext {
    ConceptDatasetCompilerContext {
        query_context: QueryContext::new(Uuid::new_v4()),
        concept,
        sql_set,
    }
}

#[tokio::test]
async fn test_concept_preview() {
    let out = compiler(Dialect::Postgres)
        .build_concept_dataset_sql(&concept_context(a1c(), labs()))
        .await
        .unwrap();
    insta::assert_snapshot!(out.compiled_query, @"WITH cohort AS ( SELECT PersonId AS __personId__, Exported, Salt FROM LeafDB.app.Cohort WHERE QueryId = :queryid AND Exported = true ), dataset AS ( SELECT _S.PersonId AS personId, _S.EncounterId AS encounterId, _S.effectiveDate AS dateField, _S.valueQuantity AS numberField FROM dbo.Observation AS _S WHERE _S.code = '4548-4' AND _S.status = 'final' ), filter AS ( SELECT * FROM dataset ) SELECT Salt, filter.* FROM filter INNER JOIN cohort ON filter.personId = cohort.__personId__");
    assert_eq!(out.parameters.len(), 1);
}

#[tokio::test]
async fn test_custom_alias_token() {
    let mut options = CompilerOptions::default();
    options.alias = "$$".into();
    let compiler =
        PreviewSqlCompiler::new(options.clone(), Arc::new(SharedCohortPreparer::new(options)));

    let mut concept = a1c();
    concept.sql_set_where = Some("$$.code = '4548-4'".into());
    let out = compiler
        .build_concept_dataset_sql(&concept_context(concept, labs()))
        .await
        .unwrap();
    assert!(out.compiled_query.contains("WHERE _S.code = '4548-4'"));
}

#[tokio::test]
async fn test_concept_without_date_field_is_rejected() {
    let mut set = labs();
    set.sql_field_date = None;
    assert!(matches!(
        compiler(Dialect::TSql)
            .build_concept_dataset_sql(&concept_context(a1c(), set))
            .await,
        Err(CompileError::UnsupportedShape(Shape::Concept))
    ));
}

#[tokio::test]
async fn test_sql_set_from_is_validated() {
    let mut set = labs();
    set.sql_set_from = "dbo.Observation; TRUNCATE TABLE dbo.Observation".into();
    let err = compiler(Dialect::TSql)
        .build_concept_dataset_sql(&concept_context(a1c(), set))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SQL set 12"));
}

#[tokio::test]
async fn test_panel_preview_needs_dataset_sql() {
    let panel = Panel {
        index: 1,
        include_panel: true,
        panel_type: PanelType::Patient,
        date_filter: None,
        sub_panels: vec![],
    };
    let ctx = PanelDatasetCompilerContext {
        query_context: QueryContext::new(Uuid::new_v4()),
        panel,
    };

    let without = compiler(Dialect::TSql).build_panel_dataset_sql(&ctx).await;
    assert!(matches!(without, Err(CompileError::InvalidPanel { index: 1, .. })));

    let panels = PrecompiledPanels::new().with_panel(1, PrecompiledPanel::new("SELECT 1", 1));
    let missing = compiler(Dialect::TSql)
        .with_panels(Arc::new(panels))
        .build_panel_dataset_sql(&ctx)
        .await;
    assert!(matches!(missing, Err(CompileError::InvalidPanel { index: 1, .. })));

    let panels = PrecompiledPanels::new().with_panel(
        1,
        PrecompiledPanel::new("SELECT 1", 1)
            .with_dataset_sql("SELECT personId, encounterId, admitDate AS dateField FROM dbo.Enc"),
    );
    let out = compiler(Dialect::MySql)
        .with_panels(Arc::new(panels))
        .build_panel_dataset_sql(&ctx)
        .await
        .unwrap();
    assert!(out
        .compiled_query
        .contains("dataset AS ( SELECT personId, encounterId, admitDate AS dateField FROM dbo.Enc )"));
    assert!(out.compiled_query.contains("QueryId = @queryid AND Exported = 1"));
}
