//! In-memory entity store
//!
//! Every collection lives behind one `RwLock`, so the reference check and the
//! removal in `delete_unreferenced` happen under a single write guard. Used by
//! the test suite and by `store.backend = "memory"`.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConditionalDelete, EntityStore};
use crate::{
    error::{AppError, AppResult},
    models::{EntityKind, Filter, RefField, Record, Relation},
};

/// Collections keyed by id, in creation order
#[derive(Default)]
struct Collections {
    tables: HashMap<EntityKind, IndexMap<Uuid, Record>>,
}

impl Collections {
    fn table(&self, kind: EntityKind) -> Option<&IndexMap<Uuid, Record>> {
        self.tables.get(&kind)
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut IndexMap<Uuid, Record> {
        self.tables.entry(kind).or_default()
    }

    fn contains(&self, kind: EntityKind, id: &Uuid) -> bool {
        self.table(kind).map_or(false, |t| t.contains_key(id))
    }

    fn select(&self, kind: EntityKind, filter: &Filter) -> Vec<Record> {
        self.table(kind)
            .map(|t| t.values().filter(|r| r.matches(filter)).cloned().collect())
            .unwrap_or_default()
    }

    /// Every reference must resolve, as the SQL store enforces on write
    fn check_references(&self, record: &Record) -> AppResult<()> {
        for field in [RefField::Author, RefField::Genre, RefField::Book] {
            for id in record.references(field) {
                if !self.contains(field.target(), &id) {
                    return Err(AppError::Validation(format!(
                        "{} {} does not exist",
                        field.target().label(),
                        id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_applicable(kind: EntityKind, filter: &Filter) -> AppResult<()> {
    if filter.is_applicable(kind) {
        return Ok(());
    }
    Err(AppError::Internal(format!(
        "filter {:?} does not apply to {}",
        filter, kind
    )))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, record: Record) -> AppResult<Record> {
        let mut inner = self.inner.write().await;
        inner.check_references(&record)?;
        let table = inner.table_mut(record.kind());
        if table.contains_key(&record.id()) {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                record.kind(),
                record.id()
            )));
        }
        table.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<Record>> {
        let inner = self.inner.read().await;
        Ok(inner.table(kind).and_then(|t| t.get(&id)).cloned())
    }

    async fn get_many(&self, kind: EntityKind, ids: &[Uuid]) -> AppResult<Vec<Record>> {
        let inner = self.inner.read().await;
        let Some(table) = inner.table(kind) else {
            return Ok(Vec::new());
        };
        Ok(table
            .values()
            .filter(|r| ids.contains(&r.id()))
            .cloned()
            .collect())
    }

    async fn find(&self, kind: EntityKind, filter: &Filter) -> AppResult<Vec<Record>> {
        ensure_applicable(kind, filter)?;
        Ok(self.inner.read().await.select(kind, filter))
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> AppResult<i64> {
        ensure_applicable(kind, filter)?;
        Ok(self.inner.read().await.select(kind, filter).len() as i64)
    }

    async fn update(&self, record: Record) -> AppResult<Option<Record>> {
        let mut inner = self.inner.write().await;
        if !inner.contains(record.kind(), &record.id()) {
            return Ok(None);
        }
        inner.check_references(&record)?;
        let slot = inner
            .table_mut(record.kind())
            .get_mut(&record.id())
            .ok_or_else(|| AppError::Internal("record vanished under write lock".to_string()))?;
        *slot = record.clone();
        Ok(Some(record))
    }

    async fn delete_unreferenced(
        &self,
        kind: EntityKind,
        id: Uuid,
        relations: &[Relation],
    ) -> AppResult<ConditionalDelete> {
        let mut inner = self.inner.write().await;
        if !inner.contains(kind, &id) {
            return Ok(ConditionalDelete::NotFound);
        }

        let blocking: Vec<Record> = relations
            .iter()
            .flat_map(|rel| inner.select(rel.child, &Filter::references(rel.field, id)))
            .collect();
        if !blocking.is_empty() {
            return Ok(ConditionalDelete::Blocked(blocking));
        }

        match inner.table_mut(kind).shift_remove(&id) {
            Some(record) => Ok(ConditionalDelete::Deleted(record)),
            None => Ok(ConditionalDelete::NotFound),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
