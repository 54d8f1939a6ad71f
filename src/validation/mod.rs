//! Validation of administrator-authored SQL text and identifiers.
//!
//! The statement-keyword denylist is a textual second line of defense: the
//! compilers only ever splice administrator-authored fragments into SQL and
//! pass every runtime value as a bound parameter. The validator exists to
//! catch a fragment that tries to smuggle in a second statement, not to
//! parse SQL.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, CompileResult};
use crate::sql::{Dialect, RawSqlFragment, SqlDialect};

/// Statement keywords that may never appear in a fragment.
pub const ILLEGAL_KEYWORDS: [&str; 10] = [
    "UPDATE", "TRUNCATE", "EXEC", "DROP", "INSERT", "CREATE", "DELETE", "MERGE", "SET", "WITH",
];

// A keyword counts only as a whole word followed by whitespace, so
// SETUP_FLAG or LAST_UPDATE pass.
static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(UPDATE|TRUNCATE|EXEC|DROP|INSERT|CREATE|DELETE|MERGE|SET|WITH)\s").unwrap()
});

static KEYWORD_PATTERN_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(UPDATE|TRUNCATE|EXEC|DROP|INSERT|CREATE|DELETE|MERGE|SET|WITH)\s").unwrap()
});

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static QUALIFIED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

/// Rejects SQL fragments containing denylisted statement keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlValidator {
    case_insensitive: bool,
}

impl Default for SqlValidator {
    fn default() -> Self {
        Self::for_dialect(Dialect::default())
    }
}

impl SqlValidator {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Match keywords the way the target dialect reads them.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new(dialect.case_insensitive_keywords())
    }

    /// The first denylisted keyword in `fragment`, if any.
    pub fn find_illegal(&self, fragment: &str) -> Option<String> {
        let pattern = if self.case_insensitive {
            &*KEYWORD_PATTERN_ANY_CASE
        } else {
            &*KEYWORD_PATTERN
        };
        pattern
            .captures(fragment)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_uppercase())
    }

    /// Validate an anonymous fragment.
    pub fn validate(&self, fragment: &str) -> CompileResult<RawSqlFragment> {
        self.validate_named("SQL fragment", fragment)
    }

    /// Validate a fragment, naming its origin in the error so the
    /// administrator who authored it can find it.
    pub fn validate_named(
        &self,
        source_name: &str,
        fragment: &str,
    ) -> CompileResult<RawSqlFragment> {
        match self.find_illegal(fragment) {
            Some(keyword) => {
                tracing::warn!(%keyword, source = source_name, "rejected SQL fragment");
                Err(CompileError::IllegalSql {
                    keyword,
                    source_name: source_name.into(),
                })
            }
            None => Ok(RawSqlFragment::validated(fragment.to_string())),
        }
    }
}

/// Require a plain identifier (letters, digits, underscore).
pub fn validate_identifier(name: &str) -> CompileResult<()> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier(name.into()))
    }
}

/// Whether `name` is a dotted sequence of plain identifiers (`db.schema`).
pub fn is_qualified_identifier(name: &str) -> bool {
    QUALIFIED_PATTERN.is_match(name)
}
