//! In-memory store.
//!
//! Backs engine tests and local experimentation. Selection queries are
//! staged ahead of time: a rendered SQL string maps to the candidate ids it
//! should yield, filtered at query time to ids that still exist so a row
//! deleted earlier in the run is not re-selected. Transactions snapshot the
//! entity map on `begin` and restore it on `rollback`.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use sweep_core::{EntityKind, EntityRecord};

use crate::store::{EntityStore, StoreError};

type Key = (EntityKind, i64);

#[derive(Debug, Default)]
struct MemoryState {
    entities: HashMap<Key, EntityRecord>,
    referenced: HashSet<Key>,
    selections: HashMap<String, (EntityKind, Vec<i64>)>,
    failing_selections: HashSet<String>,
    failing_mutations: HashSet<Key>,
    snapshot: Option<HashMap<Key, EntityRecord>>,
}

/// Entity store holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entity row.
    pub fn insert(&self, record: EntityRecord) {
        let mut state = self.lock();
        state.entities.insert((record.kind, record.id), record);
    }

    /// Mark an entity as blocked by dependent records.
    pub fn set_referenced(&self, kind: EntityKind, id: i64) {
        self.lock().referenced.insert((kind, id));
    }

    /// Stage the ids a rendered selection query should yield.
    pub fn stage_selection(&self, sql: impl Into<String>, kind: EntityKind, ids: Vec<i64>) {
        self.lock().selections.insert(sql.into(), (kind, ids));
    }

    /// Make a rendered selection query fail.
    pub fn fail_selection(&self, sql: impl Into<String>) {
        self.lock().failing_selections.insert(sql.into());
    }

    /// Make update/delete fail for one entity.
    pub fn fail_mutation(&self, kind: EntityKind, id: i64) {
        self.lock().failing_mutations.insert((kind, id));
    }

    /// Current (possibly uncommitted) view of an entity.
    pub fn get(&self, kind: EntityKind, id: i64) -> Option<EntityRecord> {
        self.lock().entities.get(&(kind, id)).cloned()
    }

    pub fn contains(&self, kind: EntityKind, id: i64) -> bool {
        self.lock().entities.contains_key(&(kind, id))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        let snapshot = state.entities.clone();
        state.snapshot = Some(snapshot);
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.snapshot.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        let snapshot = state.snapshot.take().ok_or(StoreError::NoTransaction)?;
        state.entities = snapshot;
        Ok(())
    }

    async fn query_ids(&self, sql: &str) -> Result<Vec<i64>, StoreError> {
        let state = self.lock();
        if state.failing_selections.contains(sql) {
            return Err(StoreError::Query("simulated selection failure".into()));
        }
        let Some((kind, ids)) = state.selections.get(sql) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.entities.contains_key(&(*kind, *id)))
            .collect())
    }

    async fn fetch(&self, kind: EntityKind, id: i64) -> Result<EntityRecord, StoreError> {
        self.lock()
            .entities
            .get(&(kind, id))
            .cloned()
            .ok_or(StoreError::NotFound { kind, id })
    }

    async fn update(&self, record: &EntityRecord, _actor: &str) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let key = (record.kind, record.id);
        if state.failing_mutations.contains(&key) {
            return Err(StoreError::Database("simulated update failure".into()));
        }
        if state.entities.contains_key(&key) {
            state.entities.insert(key, record.clone());
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn delete(&self, kind: EntityKind, id: i64, _actor: &str) -> Result<u64, StoreError> {
        let mut state = self.lock();
        if state.failing_mutations.contains(&(kind, id)) {
            return Err(StoreError::Database("simulated delete failure".into()));
        }
        Ok(state.entities.remove(&(kind, id)).map_or(0, |_| 1))
    }

    async fn is_referenced(&self, kind: EntityKind, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().referenced.contains(&(kind, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact(id: i64) -> EntityRecord {
        let mut rec = EntityRecord::new(EntityKind::Contact, id);
        rec.set("email", json!("someone@x.com"));
        rec
    }

    #[tokio::test]
    async fn rollback_restores_deleted_rows() {
        let store = MemoryStore::new();
        store.insert(contact(1));

        store.begin().await.unwrap();
        assert_eq!(store.delete(EntityKind::Contact, 1, "actor").await.unwrap(), 1);
        assert!(!store.contains(EntityKind::Contact, 1));

        store.rollback().await.unwrap();
        assert!(store.contains(EntityKind::Contact, 1));
    }

    #[tokio::test]
    async fn commit_keeps_changes() {
        let store = MemoryStore::new();
        store.insert(contact(1));

        store.begin().await.unwrap();
        store.delete(EntityKind::Contact, 1, "actor").await.unwrap();
        store.commit().await.unwrap();
        assert!(!store.contains(EntityKind::Contact, 1));
    }

    #[tokio::test]
    async fn staged_selection_filters_out_deleted_ids() {
        let store = MemoryStore::new();
        store.insert(contact(1));
        store.insert(contact(2));
        store.stage_selection("Q", EntityKind::Contact, vec![1, 2]);

        store.begin().await.unwrap();
        assert_eq!(store.query_ids("Q").await.unwrap(), vec![1, 2]);
        store.delete(EntityKind::Contact, 1, "actor").await.unwrap();
        assert_eq!(store.query_ids("Q").await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn commit_without_begin_is_an_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.commit().await,
            Err(StoreError::NoTransaction)
        ));
    }
}
