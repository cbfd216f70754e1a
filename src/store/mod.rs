pub mod postgres;

pub use postgres::PgCharterPartyStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CharterParty, NewCharterParty};

/// Errors surfaced by a charter party store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("charter party not found: {0}")]
    NotFound(String),

    #[error("voyage does not exist: {0}")]
    UnknownVoyage(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence operations for charter party records.
///
/// One inbound request maps to exactly one call here; transactional
/// guarantees (uniqueness, FK integrity, write ordering) are the store's
/// problem, not the handler's. Handlers hold this behind an `Arc` in
/// `AppState`, which is also what lets the tests swap in an in-memory double.
#[async_trait]
pub trait CharterPartyStore: Send + Sync {
    /// All records for one voyage, newest first
    async fn list_for_voyage(&self, voyage_id: &str) -> Result<Vec<CharterParty>, StoreError>;

    /// Persist a new record; the store assigns id and created_at
    async fn create(&self, record: NewCharterParty) -> Result<CharterParty, StoreError>;

    /// Remove one record by its own id. Voyage scoping is intentionally not
    /// checked here; deletion is identifier-scoped only.
    async fn delete(&self, charter_party_id: &str) -> Result<(), StoreError>;
}
