use std::sync::Arc;

use cohort_compiler::compiler::{
    CohortSqlCompiler, ContextScope, PrecompiledPanel, PrecompiledPanels, SessionType,
};
use cohort_compiler::config::CompilerOptions;
use cohort_compiler::model::{Concept, Panel, PanelFilter, PanelItem, PanelType, Query, SubPanel};
use cohort_compiler::sql::Dialect;
use cohort_compiler::validation::SqlValidator;
use cohort_compiler::CompileError;
use uuid::Uuid;

fn concept() -> Concept {
    Concept {
        id: Uuid::nil(),
        universal_id: Some("urn:leaf:concept:dx:e11".into()),
        sql_set_id: 1,
        sql_set_where: Some("@.code = 'E11'".into()),
        is_numeric: false,
        sql_field_numeric: None,
        is_encounter_based: false,
        specialization_groups: vec![],
    }
}

fn panel(index: usize, include: bool) -> Panel {
    Panel {
        index,
        include_panel: include,
        panel_type: PanelType::Patient,
        date_filter: None,
        sub_panels: vec![SubPanel {
            include_sub_panel: true,
            minimum_count: 1,
            join_sequence: None,
            date_filter: None,
            panel_items: vec![PanelItem::new(0, concept())],
        }],
    }
}

fn panel_sql(index: usize) -> String {
    format!("SELECT PersonId FROM dbo.panel{}", index)
}

fn compiler(counts: &[u64], dialect: Dialect) -> CohortSqlCompiler {
    let mut panels = PrecompiledPanels::new();
    for (index, count) in counts.iter().enumerate() {
        panels.insert(index, PrecompiledPanel::new(&panel_sql(index), *count));
    }
    CohortSqlCompiler::new(CompilerOptions::default().with_dialect(dialect), Arc::new(panels))
}

fn query(includes: &[bool]) -> Query {
    Query {
        id: Some(Uuid::new_v4()),
        panels: includes
            .iter()
            .enumerate()
            .map(|(i, inc)| panel(i, *inc))
            .collect(),
        panel_filters: vec![],
    }
}

#[test]
fn test_n_inclusions_yield_n_minus_one_intersects() {
    for n in 1..=6 {
        let counts: Vec<u64> = (0..n as u64).map(|i| 100 * (i + 1)).collect();
        let sql = compiler(&counts, Dialect::TSql)
            .compile(&query(&vec![true; n]), None)
            .unwrap()
            .compiled_query;
        assert_eq!(sql.matches(" INTERSECT ").count(), n - 1, "{}", sql);
        assert!(!sql.contains("EXCEPT"));
    }
}

#[test]
fn test_no_inclusions_is_an_error_regardless_of_exclusions() {
    for includes in [vec![], vec![false], vec![false, false, false]] {
        let result = compiler(&[1, 2, 3], Dialect::TSql).compile(&query(&includes), None);
        assert!(matches!(result, Err(CompileError::EmptyInclusionSet)));
    }
}

#[test]
fn test_inclusions_in_non_decreasing_cardinality() {
    let counts = [900, 20, 20, 5_000, 1, 300];
    let out = compiler(&counts, Dialect::TSql)
        .compile(&query(&[true; 6]), None)
        .unwrap();

    let emitted: Vec<u64> = out.inclusion_order.iter().map(|&i| counts[i]).collect();
    assert!(emitted.windows(2).all(|w| w[0] <= w[1]), "{:?}", emitted);
    assert_eq!(out.inclusion_order, vec![4, 1, 2, 5, 0, 3]);

    // Emitted text follows the reported order.
    let positions: Vec<usize> = out
        .inclusion_order
        .iter()
        .map(|i| out.compiled_query.find(&format!("AS P{}", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_cheaper_panel_leads_and_exclusion_trails() {
    let out = compiler(&[50_000, 500, 10], Dialect::TSql)
        .compile(&query(&[true, true, false]), None)
        .unwrap();
    insta::assert_snapshot!(out.compiled_query, @"SELECT P1.PersonId FROM ( SELECT PersonId FROM dbo.panel1 ) AS P1 INTERSECT SELECT P0.PersonId FROM ( SELECT PersonId FROM dbo.panel0 ) AS P0 EXCEPT SELECT P2.PersonId FROM ( SELECT PersonId FROM dbo.panel2 ) AS P2");
}

#[test]
fn test_configured_person_field() {
    let mut panels = PrecompiledPanels::new();
    panels.insert(0, PrecompiledPanel::new("SELECT person_id FROM cdm.person", 1));
    let mut options = CompilerOptions::default().with_dialect(Dialect::Postgres);
    options.field_person_id = "person_id".into();

    let sql = CohortSqlCompiler::new(options, Arc::new(panels))
        .compile(&query(&[true]), None)
        .unwrap()
        .compiled_query;
    assert_eq!(
        sql,
        "SELECT P0.person_id FROM ( SELECT person_id FROM cdm.person ) AS P0"
    );
}

#[test]
fn test_panel_filters_compile_as_trailing_panels() {
    let mut q = query(&[true]);
    q.panel_filters.push(PanelFilter {
        concept: concept(),
        is_inclusion: false,
        is_active: true,
    });
    q.panel_filters.push(PanelFilter {
        concept: concept(),
        is_inclusion: true,
        is_active: false,
    });

    let out = compiler(&[10, 10], Dialect::TSql).compile(&q, None).unwrap();
    assert_eq!(out.inclusion_order, vec![0]);
    assert_eq!(out.exclusion_order, vec![1]);
    assert!(out.compiled_query.ends_with("EXCEPT SELECT P1.PersonId FROM ( SELECT PersonId FROM dbo.panel1 ) AS P1"));
}

#[test]
fn test_dialect_set_operators() {
    let q = query(&[true, true, false]);
    let bigquery = compiler(&[1, 2, 3], Dialect::BigQuery)
        .compile(&q, None)
        .unwrap()
        .compiled_query;
    assert!(bigquery.contains(" INTERSECT DISTINCT "));
    assert!(bigquery.contains(" EXCEPT DISTINCT "));

    let oracle = compiler(&[1, 2, 3], Dialect::Oracle)
        .compile(&q, None)
        .unwrap()
        .compiled_query;
    assert!(oracle.contains(" MINUS "));
}

#[test]
fn test_scope_adds_context_parameters() {
    let scope = ContextScope {
        identified: true,
        session: SessionType::QualityImprovement,
    };
    let out = compiler(&[1], Dialect::TSql)
        .compile(&query(&[true]), Some(&scope))
        .unwrap();
    let names: Vec<_> = out.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["IsIdentified", "IsResearch", "IsQI"]);
}

#[test]
fn test_invalid_structure_is_reported_before_sql() {
    let mut q = query(&[true]);
    q.panels[0].sub_panels[0].minimum_count = 3;
    // Panel SQL would be rejected too; the structure error must win.
    let mut panels = PrecompiledPanels::new();
    panels.insert(0, PrecompiledPanel::new("DROP TABLE x", 1));
    let result = CohortSqlCompiler::new(CompilerOptions::default(), Arc::new(panels)).compile(&q, None);
    assert!(matches!(result, Err(CompileError::InvalidPanel { index: 0, .. })));
}

#[test]
fn test_case_sensitive_validator_allows_lowercase_words() {
    let mut panels = PrecompiledPanels::new();
    panels.insert(
        0,
        PrecompiledPanel::new("select PersonId from dbo.Notes where topic = 'set aside'", 5),
    );
    let q = query(&[true]);

    let default = CohortSqlCompiler::new(CompilerOptions::default(), Arc::new(panels.clone()));
    assert!(matches!(
        default.compile(&q, None),
        Err(CompileError::IllegalSql { keyword, .. }) if keyword == "SET"
    ));

    let strict_case = CohortSqlCompiler::new(CompilerOptions::default(), Arc::new(panels))
        .with_validator(SqlValidator::new(false));
    assert!(strict_case.compile(&q, None).is_ok());
}
