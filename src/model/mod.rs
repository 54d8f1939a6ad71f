//! Cohort query and dataset model types.
//!
//! These are read-only inputs to the compilers: queries built by users,
//! concepts and dataset queries administered elsewhere.

pub mod concept;
pub mod dataset;
pub mod panel;
pub mod query;
pub mod schema;
pub mod shape;
pub mod types;

pub use concept::{Concept, ConceptRef, ConceptSqlSet, Specialization, SpecializationGroup};
pub use dataset::{DatasetQuery, DemographicQuery, DynamicSchema};
pub use panel::{
    DateBounds, DateIncrementType, JoinSequence, NumericFilter, NumericFilterType, Panel,
    PanelItem, PanelType, RecencyFilter, SelectedSpecialization, SequenceType, SubPanel,
};
pub use query::{PanelFilter, Query};
pub use schema::{columns, demographic_contract, SchemaFieldSelector};
pub use shape::Shape;
pub use types::FieldType;
