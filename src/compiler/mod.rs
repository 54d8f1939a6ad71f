//! Cohort and dataset SQL compilers.
//!
//! ```text
//! Query ──[cohort]──▶ INTERSECT / EXCEPT chain of panel SELECTs
//!
//! DatasetQuery ──[dataset]──────▶ WITH cohort, dataset, filter SELECT ...
//! DemographicQuery ──[demographic]──▶ same, with PHI-restricted filter
//! Concept / Panel ──[preview]──▶ same, unfiltered
//! ```
//!
//! Compilers hold only immutable configuration and shared collaborators, so
//! one instance can serve concurrent requests.

pub mod cohort;
pub mod context;
pub mod dataset;
pub mod date_filter;
pub mod demographic;
mod pipeline;
pub mod preview;
pub mod provider;

pub use cohort::{check_structure, CohortSqlCompiler};
pub use context::{
    CompiledCohort, CompiledExecutionContext, ConceptDatasetCompilerContext, ContextScope,
    DatasetCompilerContext, DemographicCompilerContext, DemographicExecutionContext,
    PanelDatasetCompilerContext, QueryContext, SessionType, UserContext,
};
pub use dataset::DatasetSqlCompiler;
pub use date_filter::{date_window, target_date_field};
pub use demographic::DemographicSqlCompiler;
pub use preview::PreviewSqlCompiler;
pub use provider::{
    EntitlementGate, FixedEntitlement, PanelSql, PanelSqlBuilder, PrecompiledPanel,
    PrecompiledPanels,
};
