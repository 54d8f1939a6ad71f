//! Validated SQL fragments.
//!
//! Administrator-authored SQL (concept WHERE clauses, dataset statements,
//! per-panel SELECTs) is composed into the final statement as text. A
//! [`RawSqlFragment`] can only be obtained from
//! [`SqlValidator::validate`](crate::validation::SqlValidator::validate),
//! so holding one proves the text passed the statement-keyword denylist.
//! Runtime values never become fragments; they travel as
//! [`BoundParameter`](super::param::BoundParameter)s.

use std::fmt;

/// SQL text that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSqlFragment(String);

impl RawSqlFragment {
    /// Only the validator may mint fragments.
    pub(crate) fn validated(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawSqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RawSqlFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
