//! The store seam between the engine and the underlying database.
//!
//! One trait covers candidate selection, per-entity access and the run's
//! transactional boundary. The engine calls it strictly sequentially; an
//! implementation may assume no overlapping calls within a run.

use async_trait::async_trait;
use sweep_core::{EntityKind, EntityRecord};
use thiserror::Error;

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A candidate selection query failed to execute. Distinguishable from
    /// "zero candidates", which is an empty `Ok` result.
    #[error("selection query failed: {0}")]
    Query(String),

    /// The requested entity does not exist (or is gone within this run).
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// No transaction is active for an operation that requires one.
    #[error("no active transaction")]
    NoTransaction,

    /// Any other database-level failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Entity access and transactional boundary for one run.
///
/// `update` and `delete` return the number of affected rows; the coordinator
/// treats zero affected rows as a failure, matching the convention that a
/// non-positive action result is an error.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Begin the run's single logical transaction.
    async fn begin(&self) -> Result<(), StoreError>;

    /// Durably apply everything done since `begin`.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Discard everything done since `begin`.
    async fn rollback(&self) -> Result<(), StoreError>;

    /// Execute a rendered selection query and return the candidate ids in
    /// store order (unspecified but stable within one run).
    async fn query_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError>;

    /// Fetch a fresh, independent copy of an entity.
    async fn fetch(&self, kind: EntityKind, id: i64) -> Result<EntityRecord, StoreError>;

    /// Persist the record's field values. Returns affected row count.
    async fn update(&self, record: &EntityRecord, actor: &str) -> Result<u64, StoreError>;

    /// Delete the entity. Returns affected row count.
    async fn delete(&self, kind: EntityKind, id: i64, actor: &str) -> Result<u64, StoreError>;

    /// Whether dependent records block mutation of this entity. Kinds
    /// without declared child tables always answer `false`.
    async fn is_referenced(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError>;
}
