use std::sync::Arc;

use uuid::Uuid;

use cohort_compiler::cohort::SharedCohortPreparer;
use cohort_compiler::compiler::{
    ContextScope, DemographicCompilerContext, DemographicSqlCompiler, FixedEntitlement,
    QueryContext, SessionType, UserContext,
};
use cohort_compiler::config::CompilerOptions;
use cohort_compiler::model::{demographic_contract, DemographicQuery, FieldType, SchemaFieldSelector};
use cohort_compiler::sql::{Dialect, ParamValue};
use cohort_compiler::validation::SqlValidator;
use cohort_compiler::CompileError;

fn compiler(dialect: Dialect) -> DemographicSqlCompiler {
    let options = CompilerOptions::default().with_dialect(dialect);
    DemographicSqlCompiler::new(options.clone(), Arc::new(SharedCohortPreparer::new(options)))
}

fn context(query: DemographicQuery) -> DemographicCompilerContext {
    DemographicCompilerContext {
        query_context: QueryContext::new(Uuid::new_v4()),
        demographic_query: query,
    }
}

fn names(fields: &[SchemaFieldSelector]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

#[tokio::test]
async fn test_restricted_projection_of_mixed_schema() {
    let query = DemographicQuery::new("SELECT personId, mrn, age FROM dbo.Person").with_schema(vec![
        SchemaFieldSelector::new("personId", FieldType::String).phi().mask().required(),
        SchemaFieldSelector::new("mrn", FieldType::String).phi(),
        SchemaFieldSelector::new("age", FieldType::Int),
    ]);
    let out = compiler(Dialect::TSql)
        .build_demographic_sql(&context(query), true)
        .await
        .unwrap();

    assert_eq!(names(&out.field_selectors), vec!["personId", "age"]);
    insta::assert_snapshot!(out.execution.compiled_query, @"WITH cohort AS ( SELECT PersonId AS __personId__, Exported, Salt FROM LeafDB.app.Cohort WHERE QueryId = @queryid ), dataset AS ( SELECT personId, mrn, age FROM dbo.Person ), filter AS ( SELECT personId, age FROM dataset ) SELECT Exported, Salt, filter.* FROM filter INNER JOIN cohort ON filter.personId = cohort.__personId__");
}

#[tokio::test]
async fn test_override_without_required_person_drops_phi_fields() {
    let query = DemographicQuery::new("SELECT personId, mrn, age FROM dbo.Person").with_schema(vec![
        SchemaFieldSelector::new("mrn", FieldType::String).phi(),
        SchemaFieldSelector::new("age", FieldType::Int),
    ]);
    let out = compiler(Dialect::TSql)
        .build_demographic_sql(&context(query), true)
        .await
        .unwrap();
    assert!(out
        .execution
        .compiled_query
        .contains("filter AS ( SELECT age FROM dataset )"));
    assert_eq!(names(&out.field_selectors), vec!["age"]);
    // Without a required personId the override drops the join column.
    assert!(out
        .execution
        .compiled_query
        .ends_with("ON filter.personId = cohort.__personId__"));
}

#[tokio::test]
async fn test_restriction_is_idempotent_and_narrowing() {
    let full = compiler(Dialect::Postgres)
        .build_demographic_sql(&context(DemographicQuery::new("SELECT * FROM dbo.Person")), false)
        .await
        .unwrap();
    let restricted = compiler(Dialect::Postgres)
        .build_demographic_sql(&context(DemographicQuery::new("SELECT * FROM dbo.Person")), true)
        .await
        .unwrap();

    assert_eq!(full.field_selectors, demographic_contract());
    for field in &restricted.field_selectors {
        assert!(full.field_selectors.contains(field), "{}", field.name);
    }
    assert!(restricted.field_selectors.len() < full.field_selectors.len());

    // Restricting what is already restricted changes nothing.
    let again = compiler(Dialect::Postgres)
        .build_demographic_sql(
            &context(
                DemographicQuery::new("SELECT * FROM dbo.Person")
                    .with_schema(restricted.field_selectors.clone()),
            ),
            true,
        )
        .await
        .unwrap();
    assert_eq!(again.field_selectors, restricted.field_selectors);
    assert_eq!(again.execution.compiled_query, restricted.execution.compiled_query);
}

#[tokio::test]
async fn test_non_exported_rows_are_kept() {
    let out = compiler(Dialect::Postgres)
        .build_demographic_sql(&context(DemographicQuery::new("SELECT * FROM dbo.Person")), false)
        .await
        .unwrap();
    assert!(!out.execution.compiled_query.contains("Exported = "));
    assert!(out.execution.compiled_query.contains("SELECT Exported, Salt, filter.*"));
}

#[tokio::test]
async fn test_scope_decides_restriction() {
    let demo = || DemographicQuery::new("SELECT * FROM dbo.Person");
    let user = UserContext::new("analyst", Some(SessionType::QualityImprovement));

    let identified = ContextScope::resolve(&user, &FixedEntitlement(true)).unwrap();
    let mut ctx = context(demo());
    ctx.query_context = ctx.query_context.with_scope(identified);
    let out = compiler(Dialect::TSql).build_scoped(&ctx).await.unwrap();
    assert_eq!(out.field_selectors.len(), demographic_contract().len());
    let qi = out.execution.parameters.iter().find(|p| p.name == "IsQI").unwrap();
    assert_eq!(qi.value, ParamValue::Bool(true));

    let deidentified = ContextScope::resolve(&user, &FixedEntitlement(false)).unwrap();
    let mut ctx = context(demo());
    ctx.query_context = ctx.query_context.with_scope(deidentified);
    let out = compiler(Dialect::TSql).build_scoped(&ctx).await.unwrap();
    assert!(!names(&out.field_selectors).contains(&"mrn"));
}

#[tokio::test]
async fn test_missing_session_is_rejected() {
    let user = UserContext::new("analyst", None);
    assert!(matches!(
        ContextScope::resolve(&user, &FixedEntitlement(true)),
        Err(CompileError::MissingScope(_))
    ));
    assert!(matches!(
        compiler(Dialect::TSql)
            .build_scoped(&context(DemographicQuery::new("SELECT * FROM dbo.Person")))
            .await,
        Err(CompileError::MissingScope(_))
    ));
}

#[tokio::test]
async fn test_demographic_statement_is_validated() {
    let query = DemographicQuery::new("SELECT * FROM dbo.Person; exec sp_purge ");
    let err = compiler(Dialect::TSql)
        .build_demographic_sql(&context(query), false)
        .await
        .unwrap_err();
    assert!(matches!(err, CompileError::IllegalSql { ref keyword, .. } if keyword == "EXEC"));
    assert!(err.to_string().contains("demographic query"));
}

#[tokio::test]
async fn test_field_selectors_serialize_with_type() {
    let out = compiler(Dialect::TSql)
        .build_demographic_sql(&context(DemographicQuery::new("SELECT * FROM dbo.Person")), true)
        .await
        .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json.get("compiledQuery").is_some());
    assert_eq!(json["fieldSelectors"][0]["name"], "personId");
    assert!(json["fieldSelectors"][0].get("type").is_some());
}

#[tokio::test]
async fn test_custom_validator_is_used() {
    let query = DemographicQuery::new("SELECT * FROM dbo.Person WHERE note <> 'drop in'");
    assert!(compiler(Dialect::TSql)
        .build_demographic_sql(&context(query.clone()), false)
        .await
        .is_err());
    assert!(compiler(Dialect::TSql)
        .with_validator(SqlValidator::new(false))
        .build_demographic_sql(&context(query), false)
        .await
        .is_ok());
}
