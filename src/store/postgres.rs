use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CharterPartyStore, StoreError};
use crate::models::{CharterParty, NewCharterParty};

const COLUMNS: &str = "id, voyage_id, cp_number, cp_date, laycan_start, laycan_end, \
     laytime_allowed, laytime_unit, terms, demurrage_rate, despatch_rate, \
     despatch_percentage, reversible, pro_ratable, shinc, shex, notes, created_at";

/// Postgres-backed store. Schema lives in `migrations/`.
pub struct PgCharterPartyStore {
    pool: PgPool,
}

impl PgCharterPartyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharterPartyStore for PgCharterPartyStore {
    async fn list_for_voyage(&self, voyage_id: &str) -> Result<Vec<CharterParty>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM charter_parties WHERE voyage_id = $1 ORDER BY created_at DESC"
        );

        let records = sqlx::query_as::<_, CharterParty>(&sql)
            .bind(voyage_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn create(&self, record: NewCharterParty) -> Result<CharterParty, StoreError> {
        let id = Uuid::new_v4().to_string();

        let sql = format!(
            "INSERT INTO charter_parties (id, voyage_id, cp_number, cp_date, laycan_start, \
             laycan_end, laytime_allowed, laytime_unit, terms, demurrage_rate, despatch_rate, \
             despatch_percentage, reversible, pro_ratable, shinc, shex, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {COLUMNS}"
        );

        let created = sqlx::query_as::<_, CharterParty>(&sql)
            .bind(&id)
            .bind(&record.voyage_id)
            .bind(&record.cp_number)
            .bind(record.cp_date)
            .bind(record.laycan_start)
            .bind(record.laycan_end)
            .bind(record.laytime_allowed)
            .bind(&record.laytime_unit)
            .bind(&record.terms)
            .bind(record.demurrage_rate)
            .bind(record.despatch_rate)
            .bind(record.despatch_percentage)
            .bind(record.reversible)
            .bind(record.pro_ratable)
            .bind(record.shinc)
            .bind(record.shex)
            .bind(&record.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match &err {
                // FK violation means the parent voyage is gone or never existed
                sqlx::Error::Database(db)
                    if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
                {
                    StoreError::UnknownVoyage(record.voyage_id.clone())
                }
                _ => StoreError::Sqlx(err),
            })?;

        Ok(created)
    }

    async fn delete(&self, charter_party_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM charter_parties WHERE id = $1")
            .bind(charter_party_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(charter_party_id.to_string()));
        }

        Ok(())
    }
}
