//! Repository layer: the entity store seam and its backends

pub mod memory;
pub mod postgres;

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{sync::watch, time::Instant};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{EntityKind, Filter, Record, Relation},
};

/// Result of a conditional delete
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalDelete {
    /// The record was removed
    Deleted(Record),
    /// Nothing removed: these records still reference the target
    Blocked(Vec<Record>),
    NotFound,
}

/// Typed CRUD over catalog records.
///
/// `find` returns records in creation order. `delete_unreferenced` must check
/// the given relations and delete as a single atomic step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create(&self, record: Record) -> AppResult<Record>;

    async fn get(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<Record>>;

    /// Records of `kind` among `ids`; missing ids are skipped
    async fn get_many(&self, kind: EntityKind, ids: &[Uuid]) -> AppResult<Vec<Record>>;

    async fn find(&self, kind: EntityKind, filter: &Filter) -> AppResult<Vec<Record>>;

    async fn count(&self, kind: EntityKind, filter: &Filter) -> AppResult<i64>;

    /// Replace the stored record with the same id; `None` if absent
    async fn update(&self, record: Record) -> AppResult<Option<Record>>;

    /// Delete `id` only if no record of any `relations` still references it
    async fn delete_unreferenced(
        &self,
        kind: EntityKind,
        id: Uuid,
        relations: &[Relation],
    ) -> AppResult<ConditionalDelete>;

    async fn ping(&self) -> AppResult<()>;
}

/// Deadline and cancellation signal shared by every store call of one request
#[derive(Debug, Clone)]
pub struct QueryContext {
    deadline: Instant,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every query running under the paired [`QueryContext`]
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

impl QueryContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            cancel: None,
        }
    }

    pub fn cancellable(timeout: Duration) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: Instant::now() + timeout,
            cancel: Some(rx),
        };
        (ctx, CancelHandle(tx))
    }

    /// Run one store operation under the deadline and cancellation signal
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let cancel = self.cancel.clone();
        tokio::select! {
            result = tokio::time::timeout_at(self.deadline, fut) => match result {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(operation, "store query deadline exceeded");
                    Err(AppError::Timeout(operation.to_string()))
                }
            },
            _ = cancelled(cancel) => {
                tracing::debug!(operation, "store query cancelled");
                Err(AppError::Cancelled)
            }
        }
    }
}

/// Resolves once cancellation is requested; never resolves without a signal
async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // handle dropped without cancelling
            return std::future::pending().await;
        }
    }
}

/// Main repository handle: a shared store with every call bounded by a [`QueryContext`]
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn EntityStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, record: Record, ctx: &QueryContext) -> AppResult<Record> {
        let operation = format!("create {}", record.kind());
        ctx.run(&operation, self.store.create(record)).await
    }

    pub async fn get(&self, kind: EntityKind, id: Uuid, ctx: &QueryContext) -> AppResult<Option<Record>> {
        ctx.run(&format!("get {}", kind), self.store.get(kind, id)).await
    }

    /// Like [`Repository::get`] but absence is an error
    pub async fn fetch(&self, kind: EntityKind, id: Uuid, ctx: &QueryContext) -> AppResult<Record> {
        self.get(kind, id, ctx)
            .await?
            .ok_or_else(|| AppError::not_found(kind, id))
    }

    pub async fn get_many(&self, kind: EntityKind, ids: Vec<Uuid>, ctx: &QueryContext) -> AppResult<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ctx.run(&format!("get many {}", kind), self.store.get_many(kind, &ids)).await
    }

    pub async fn find(&self, kind: EntityKind, filter: Filter, ctx: &QueryContext) -> AppResult<Vec<Record>> {
        ctx.run(&format!("find {}", kind), self.store.find(kind, &filter)).await
    }

    pub async fn count(&self, kind: EntityKind, filter: Filter, ctx: &QueryContext) -> AppResult<i64> {
        ctx.run(&format!("count {}", kind), self.store.count(kind, &filter)).await
    }

    pub async fn update(&self, record: Record, ctx: &QueryContext) -> AppResult<Record> {
        let (kind, id) = (record.kind(), record.id());
        ctx.run(&format!("update {}", kind), self.store.update(record))
            .await?
            .ok_or_else(|| AppError::not_found(kind, id))
    }

    pub async fn delete_unreferenced(
        &self,
        kind: EntityKind,
        id: Uuid,
        relations: &[Relation],
        ctx: &QueryContext,
    ) -> AppResult<ConditionalDelete> {
        ctx.run(
            &format!("delete {}", kind),
            self.store.delete_unreferenced(kind, id, relations),
        )
        .await
    }

    pub async fn ping(&self, ctx: &QueryContext) -> AppResult<()> {
        ctx.run("ping", self.store.ping()).await
    }
}
