//! # Cohort Compiler
//!
//! Compiles clinical cohort queries and their datasets to multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Query (inclusion / exclusion panels)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [PanelSqlBuilder + validator]
//! ┌─────────────────────────────────────────────────────────┐
//! │       Per-panel person-id SELECTs + cardinality          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [cohort compiler]
//! ┌─────────────────────────────────────────────────────────┐
//! │           INTERSECT / EXCEPT cohort statement            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [CohortPreparer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Dataset pipelines: cohort → dataset → filter → join    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Administrator-authored SQL is composed as validated text
//! ([`sql::RawSqlFragment`]); every runtime value is a bound parameter
//! ([`sql::BoundParameter`]).

pub mod cohort;
pub mod compiler;
pub mod config;
pub mod error;
pub mod model;
pub mod sql;
pub mod validation;

pub use error::{CompileError, CompileResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cohort::{
        CohortFetcher, CohortPreparer, PreparedCohort, SharedCohortPreparer,
        TempTableCohortPreparer,
    };
    pub use crate::compiler::{
        CohortSqlCompiler, CompiledExecutionContext, ContextScope, DatasetCompilerContext,
        DatasetSqlCompiler, DemographicCompilerContext, DemographicSqlCompiler, EntitlementGate,
        PanelSqlBuilder, PreviewSqlCompiler, QueryContext,
    };
    pub use crate::config::{CompilerOptions, Settings};
    pub use crate::error::{CompileError, CompileResult};
    pub use crate::model::{DatasetQuery, DemographicQuery, Panel, Query, Shape};
    pub use crate::sql::{BoundParameter, Dialect, ParamValue, SqlDialect};
    pub use crate::validation::SqlValidator;
}
