//! Per-shape date filtering of dataset rows.
//!
//! Every event-shaped dataset exposes one well-known date column. The
//! filter stage bounds that column by the requested window, always with
//! bound parameters.

use chrono::{DateTime, Utc};

use crate::error::{CompileError, CompileResult};
use crate::model::{DatasetQuery, Shape};
use crate::sql::{col, param, Expr, ExprExt, ParameterSet};
use crate::validation::validate_identifier;

/// The date column of a shape.
///
/// `Ok(None)` means the dataset cannot be date filtered (a Dynamic dataset
/// that declares no date field, or a blank one). Demographic and Concept
/// datasets have no date strategy at all.
pub fn target_date_field(dataset: &DatasetQuery) -> CompileResult<Option<&str>> {
    let field = match dataset.shape {
        Shape::Observation => "effectiveDate",
        Shape::Encounter => "admitDate",
        Shape::Condition => "onsetDateTime",
        Shape::Procedure => "performedDateTime",
        Shape::Immunization => "occurrenceDateTime",
        Shape::Allergy => "onsetDateTime",
        Shape::MedicationRequest => "authoredOn",
        Shape::MedicationAdministration => "effectiveDateTime",
        Shape::Dynamic => {
            let declared = dataset
                .schema
                .as_ref()
                .and_then(|s| s.sql_field_date.as_deref())
                .filter(|f| !f.trim().is_empty());
            if let Some(field) = declared {
                validate_identifier(field)?;
            }
            return Ok(declared);
        }
        Shape::Demographic | Shape::Concept => {
            return Err(CompileError::UnsupportedShape(dataset.shape));
        }
    };
    Ok(Some(field))
}

/// Bound the date column by `[early, late]`.
///
/// A missing `late` is bound to `now`. Without `early` the window is open
/// at the start. Placeholder names come from `params`, so repeated filters
/// in one statement never collide.
pub fn date_window(
    field: &str,
    early: Option<DateTime<Utc>>,
    late: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    params: &mut ParameterSet,
) -> Expr {
    match early {
        Some(early) => {
            let early_name = params.bind("early", early);
            let late_name = params.bind("late", late.unwrap_or(now));
            col(field).between(param(&early_name), param(&late_name))
        }
        None => {
            let late_name = params.bind("late", late.unwrap_or(now));
            col(field).lte(param(&late_name))
        }
    }
}
