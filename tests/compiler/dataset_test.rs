use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use uuid::Uuid;

use cohort_compiler::cohort::{
    CohortError, CohortFetcher, CohortMember, CohortResult, SharedCohortPreparer,
    TempTableCohortPreparer,
};
use cohort_compiler::compiler::{
    ContextScope, DatasetCompilerContext, DatasetSqlCompiler, PrecompiledPanel, PrecompiledPanels,
    QueryContext, SessionType,
};
use cohort_compiler::config::CompilerOptions;
use cohort_compiler::model::{DatasetQuery, DynamicSchema, Panel, Shape};
use cohort_compiler::sql::{Dialect, ParamValue};
use cohort_compiler::validation::SqlValidator;
use cohort_compiler::CompileError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn options(dialect: Dialect) -> CompilerOptions {
    CompilerOptions::default().with_dialect(dialect)
}

fn shared(dialect: Dialect) -> DatasetSqlCompiler {
    let options = options(dialect);
    DatasetSqlCompiler::new(options.clone(), Arc::new(SharedCohortPreparer::new(options)))
        .with_now(now())
}

fn dataset(shape: Shape) -> DatasetQuery {
    DatasetQuery {
        id: Uuid::new_v4(),
        name: format!("{} rows", shape),
        shape,
        sql_statement: "SELECT * FROM dbo.Rows".into(),
        is_encounter_based: true,
        schema: None,
    }
}

fn context(ds: DatasetQuery) -> DatasetCompilerContext {
    DatasetCompilerContext::new(QueryContext::new(Uuid::new_v4()), ds)
}

/// Every `:name` in the SQL is bound exactly once, and nothing else is.
fn assert_placeholders_match(sql: &str, bound: &[&str]) {
    let re = Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    let used: HashSet<&str> = re
        .captures_iter(sql)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    let bound: HashSet<&str> = bound.iter().copied().collect();
    assert_eq!(used, bound, "{}", sql);
}

#[tokio::test]
async fn test_date_window_placeholders_are_bound() {
    let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

    for shape in [
        Shape::Observation,
        Shape::Encounter,
        Shape::Condition,
        Shape::Procedure,
        Shape::Immunization,
        Shape::Allergy,
        Shape::MedicationRequest,
        Shape::MedicationAdministration,
    ] {
        for (e, l) in [(None, None), (Some(early), None), (None, Some(late)), (Some(early), Some(late))] {
            let ctx = context(dataset(shape)).with_bounds(e, l);
            let out = shared(Dialect::Postgres).build_dataset_sql(&ctx).await.unwrap();
            let names: Vec<&str> = out.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_placeholders_match(&out.compiled_query, &names);

            let late_value = out
                .parameters
                .iter()
                .find(|p| p.name == "late")
                .map(|p| p.value.clone());
            assert_eq!(late_value, Some(ParamValue::DateTime(l.unwrap_or_else(now))));
            assert_eq!(names.contains(&"early"), e.is_some());
        }
    }
}

#[tokio::test]
async fn test_between_when_both_bounds_given() {
    let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let ctx = context(dataset(Shape::Condition)).with_bounds(Some(early), None);
    let out = shared(Dialect::TSql).build_dataset_sql(&ctx).await.unwrap();
    assert!(out
        .compiled_query
        .contains("filter AS ( SELECT * FROM dataset WHERE onsetDateTime BETWEEN @early AND @late )"));
}

#[tokio::test]
async fn test_dynamic_dataset_without_date_is_unfiltered() {
    let mut ds = dataset(Shape::Dynamic);
    ds.schema = Some(DynamicSchema {
        sql_field_date: None,
        fields: vec![],
    });
    let out = shared(Dialect::TSql)
        .build_dataset_sql(&context(ds).with_bounds(Some(now()), None))
        .await
        .unwrap();
    assert!(out.compiled_query.contains("filter AS ( SELECT * FROM dataset )"));
    assert_eq!(out.parameters.len(), 1);
}

#[tokio::test]
async fn test_dynamic_dataset_with_blank_date_is_unfiltered() {
    for blank in ["", "   "] {
        let mut ds = dataset(Shape::Dynamic);
        ds.schema = Some(DynamicSchema {
            sql_field_date: Some(blank.into()),
            fields: vec![],
        });
        let out = shared(Dialect::TSql)
            .build_dataset_sql(&context(ds).with_bounds(Some(now()), Some(now())))
            .await
            .unwrap();
        assert!(out.compiled_query.contains("filter AS ( SELECT * FROM dataset )"));
        let names: Vec<_> = out.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["queryid"]);
    }
}

#[tokio::test]
async fn test_dynamic_dataset_date_field_must_be_identifier() {
    let mut ds = dataset(Shape::Dynamic);
    ds.schema = Some(DynamicSchema {
        sql_field_date: Some("x) OR (1=1".into()),
        fields: vec![],
    });
    assert!(matches!(
        shared(Dialect::TSql).build_dataset_sql(&context(ds)).await,
        Err(CompileError::InvalidIdentifier(_))
    ));
}

fn encounter_panel() -> Panel {
    serde_json::from_value(serde_json::json!({
        "index": 2,
        "includePanel": true,
        "subPanels": [{
            "panelItems": [{
                "index": 0,
                "concept": { "id": Uuid::nil(), "sqlSetId": 4, "isEncounterBased": true }
            }]
        }]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_join_to_panel_narrows_cohort_to_encounters() {
    let panels = PrecompiledPanels::new().with_panel(
        2,
        PrecompiledPanel::new("SELECT PersonId FROM dbo.Enc", 10)
            .with_encounter_sql("SELECT PersonId, EncounterId FROM dbo.Enc"),
    );
    let ctx = context(dataset(Shape::Observation)).join_to_panel(encounter_panel());
    let out = shared(Dialect::TSql)
        .with_panels(Arc::new(panels))
        .build_dataset_sql(&ctx)
        .await
        .unwrap();

    let sql = &out.compiled_query;
    assert!(sql.starts_with(
        "WITH cohort AS ( SELECT J.PersonId AS __personId__, J.EncounterId AS __encounterId__, C.Salt \
         FROM ( SELECT PersonId, EncounterId FROM dbo.Enc ) AS J INNER JOIN"
    ), "{}", sql);
    assert!(sql.contains("AS C ON J.PersonId = C.__personId__ GROUP BY J.PersonId, J.EncounterId, C.Salt )"));
    assert!(sql.ends_with(
        "ON filter.personId = cohort.__personId__ AND filter.encounterId = cohort.__encounterId__"
    ));
}

#[tokio::test]
async fn test_join_to_panel_requires_encounter_dataset() {
    let panels = PrecompiledPanels::new().with_panel(
        2,
        PrecompiledPanel::new("SELECT PersonId FROM dbo.Enc", 10)
            .with_encounter_sql("SELECT PersonId, EncounterId FROM dbo.Enc"),
    );
    let mut ds = dataset(Shape::Observation);
    ds.is_encounter_based = false;
    let result = shared(Dialect::TSql)
        .with_panels(Arc::new(panels))
        .build_dataset_sql(&context(ds).join_to_panel(encounter_panel()))
        .await;
    assert!(matches!(result, Err(CompileError::InvalidPanel { index: 2, .. })));
}

#[tokio::test]
async fn test_panel_encounter_sql_is_validated() {
    let panels = PrecompiledPanels::new().with_panel(
        2,
        PrecompiledPanel::new("SELECT PersonId FROM dbo.Enc", 10)
            .with_encounter_sql("SELECT 1; DELETE FROM dbo.Enc"),
    );
    let result = shared(Dialect::TSql)
        .with_panels(Arc::new(panels))
        .build_dataset_sql(&context(dataset(Shape::Encounter)).join_to_panel(encounter_panel()))
        .await;
    assert!(
        matches!(result, Err(CompileError::IllegalSql { keyword, source_name }) if keyword == "DELETE" && source_name == "panel 2")
    );
}

#[tokio::test]
async fn test_scope_parameters_follow_date_bounds() {
    let ctx = DatasetCompilerContext::new(
        QueryContext::new(Uuid::new_v4()).with_scope(ContextScope {
            identified: true,
            session: SessionType::Research,
        }),
        dataset(Shape::Procedure),
    );
    let out = shared(Dialect::Postgres).build_dataset_sql(&ctx).await.unwrap();
    let names: Vec<_> = out.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["queryid", "late", "IsIdentified", "IsResearch", "IsQI"]);
}

struct StaticFetcher(Vec<CohortMember>);

#[async_trait]
impl CohortFetcher for StaticFetcher {
    async fn fetch_cohort(
        &self,
        query_id: Uuid,
        exported_only: bool,
    ) -> CohortResult<Vec<CohortMember>> {
        if self.0.is_empty() {
            return Err(CohortError::fetch_failed(query_id, "store offline"));
        }
        Ok(self
            .0
            .iter()
            .filter(|m| !exported_only || m.exported)
            .cloned()
            .collect())
    }
}

fn member(id: &str, exported: bool) -> CohortMember {
    CohortMember {
        person_id: id.into(),
        exported,
        salt: Some(Uuid::nil()),
    }
}

#[tokio::test]
async fn test_temp_table_cohort_wraps_statement() {
    let fetcher = Arc::new(StaticFetcher(vec![member("p1", true), member("p2", false)]));
    let preparer = Arc::new(TempTableCohortPreparer::new(fetcher, Dialect::TSql));
    let compiler = DatasetSqlCompiler::new(options(Dialect::TSql), preparer).with_now(now());

    let out = compiler
        .build_dataset_sql(&context(dataset(Shape::Observation)))
        .await
        .unwrap();

    assert!(out
        .compiled_query
        .starts_with("WITH cohort AS ( SELECT __personId__, Exported, Salt FROM #__cohort__ )"));
    assert_eq!(out.prelude.len(), 2);
    assert!(out.prelude[0].starts_with("CREATE TABLE #__cohort__"));
    // Datasets only ever see exported patients.
    assert!(out.prelude[1].contains("'p1'"));
    assert!(!out.prelude[1].contains("'p2'"));
    assert_eq!(out.epilogue, vec!["DROP TABLE IF EXISTS #__cohort__"]);

    let names: Vec<_> = out.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["late"]);
}

#[tokio::test]
async fn test_cohort_fetch_failure_surfaces() {
    let preparer = Arc::new(TempTableCohortPreparer::new(
        Arc::new(StaticFetcher(vec![])),
        Dialect::Postgres,
    ));
    let compiler = DatasetSqlCompiler::new(options(Dialect::Postgres), preparer);
    let err = compiler
        .build_dataset_sql(&context(dataset(Shape::Observation)))
        .await
        .unwrap_err();
    assert!(matches!(err, CompileError::Prepare(CohortError::FetchFailed { .. })));
    assert!(err.to_string().contains("store offline"));
}

#[tokio::test]
async fn test_execution_context_serializes_camel_case() {
    let out = shared(Dialect::Postgres)
        .build_dataset_sql(&context(dataset(Shape::Observation)))
        .await
        .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json.get("compiledQuery").is_some());
    assert_eq!(json["parameters"][0]["name"], "queryid");
    assert_eq!(json["timeoutSeconds"], 180);
    // Shared cohorts need no staging.
    assert!(json.get("prelude").is_none());
}

#[tokio::test]
async fn test_custom_validator_is_used() {
    let mut ds = dataset(Shape::Observation);
    ds.sql_statement = "SELECT * FROM dbo.Rows WHERE status <> 'update pending'".into();
    assert!(shared(Dialect::TSql).build_dataset_sql(&context(ds.clone())).await.is_err());
    assert!(shared(Dialect::TSql)
        .with_validator(SqlValidator::new(false))
        .build_dataset_sql(&context(ds))
        .await
        .is_ok());
}
