//! Cohort staged into a session temporary table.
//!
//! The persisted cohort rows are fetched on every prepare, so a cohort
//! recomputed under the same query id is never served stale. Each prepare
//! emits a CREATE + INSERT prelude and a DROP epilogue around the compiled
//! statement, so the statement itself only reads the temp table.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CohortPreparer, CohortResult, PreparedCohort, INTERNAL_PERSON_ID, TEMP_TABLE};
use crate::model::{columns, FieldType};
use crate::sql::{col, Dialect, ParameterSet, Select, SqlDialect, TableRef, Token, TokenStream};

/// Rows per multi-row INSERT.
pub const INSERT_BATCH_SIZE: usize = 1000;

const STAGED_COLUMNS: [(&str, FieldType); 3] = [
    (INTERNAL_PERSON_ID, FieldType::String),
    (columns::EXPORTED, FieldType::Bool),
    (columns::SALT, FieldType::Guid),
];

/// One persisted cohort row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMember {
    pub person_id: String,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub salt: Option<Uuid>,
}

/// Loads cohort rows from wherever cohorts are persisted.
#[async_trait]
pub trait CohortFetcher: Send + Sync {
    /// Rows of `query_id`. With `exported_only`, only rows flagged as
    /// exported are returned.
    async fn fetch_cohort(
        &self,
        query_id: Uuid,
        exported_only: bool,
    ) -> CohortResult<Vec<CohortMember>>;
}

/// Stages a persisted cohort into a temporary table.
pub struct TempTableCohortPreparer<F: CohortFetcher> {
    fetcher: Arc<F>,
    dialect: Dialect,
}

impl<F: CohortFetcher> TempTableCohortPreparer<F> {
    pub fn new(fetcher: Arc<F>, dialect: Dialect) -> Self {
        Self { fetcher, dialect }
    }

    fn create_statement(&self) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::CreateTempTable)
            .space()
            .push(Token::TempTable(TEMP_TABLE.into()))
            .space()
            .lparen();
        for (i, (name, ft)) in STAGED_COLUMNS.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.push(Token::Ident((*name).into()))
                .space()
                .push(Token::ColumnType(*ft));
        }
        ts.rparen();
        ts.serialize(self.dialect)
    }

    fn insert_statements<'a>(&self, rows: impl Iterator<Item = &'a CohortMember>) -> Vec<String> {
        let rows: Vec<&CohortMember> = rows.collect();
        let batch = if self.dialect.supports_multi_row_values() {
            INSERT_BATCH_SIZE
        } else {
            1
        };

        rows.chunks(batch)
            .map(|chunk| {
                let mut ts = insert_prefix();
                for (i, row) in chunk.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&row_values(row));
                }
                ts.serialize(self.dialect)
            })
            .collect()
    }

    fn drop_statement(&self) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(Token::Table).space();
        if self.dialect.supports_if_exists() {
            ts.push(Token::If).space().push(Token::Exists).space();
        }
        ts.push(Token::TempTable(TEMP_TABLE.into()));
        ts.serialize(self.dialect)
    }
}

fn insert_prefix() -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Insert)
        .space()
        .push(Token::Into)
        .space()
        .push(Token::TempTable(TEMP_TABLE.into()))
        .space()
        .lparen();
    for (i, (name, _)) in STAGED_COLUMNS.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.push(Token::Ident((*name).into()));
    }
    ts.rparen().space().push(Token::Values).space();
    ts
}

fn row_values(row: &CohortMember) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.lparen()
        .push(Token::LitString(row.person_id.clone()))
        .comma()
        .space()
        .push(Token::LitBool(row.exported))
        .comma()
        .space();
    match row.salt {
        Some(salt) => ts.push(Token::LitString(salt.to_string())),
        None => ts.push(Token::Null),
    };
    ts.rparen();
    ts
}

#[async_trait]
impl<F: CohortFetcher> CohortPreparer for TempTableCohortPreparer<F> {
    async fn prepare(&self, query_id: Uuid, exported_only: bool) -> CohortResult<PreparedCohort> {
        let members = self.fetcher.fetch_cohort(query_id, exported_only).await?;
        tracing::debug!(%query_id, rows = members.len(), "fetched cohort");

        // Fetchers may ignore `exported_only`.
        let staged = members.iter().filter(|m| !exported_only || m.exported);

        let mut setup = vec![self.create_statement()];
        setup.extend(self.insert_statements(staged));

        let body = Select::new()
            .select(STAGED_COLUMNS.iter().map(|(name, _)| col(name)).collect::<Vec<_>>())
            .from(TableRef::temp(TEMP_TABLE));

        tracing::debug!(
            %query_id,
            exported_only,
            dialect = self.dialect.name(),
            statements = setup.len(),
            "staged cohort"
        );

        Ok(PreparedCohort {
            setup,
            body,
            parameters: ParameterSet::new(),
            teardown: vec![self.drop_statement()],
        })
    }
}
