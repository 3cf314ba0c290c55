//! Referential-integrity guard
//!
//! Decides whether a record may be deleted and performs guarded deletes. The
//! delete itself goes through the store's conditional delete, so a child
//! created between the check and the removal still blocks it.

use futures::future::try_join_all;
use uuid::Uuid;

use super::relations::RelationshipIndex;
use crate::{
    error::{AppError, AppResult},
    models::{EntityKind, Filter, Record, Relation},
    repository::{ConditionalDelete, QueryContext, Repository},
};

/// Answer to "may this record be deleted"
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCheck {
    pub allowed: bool,
    /// Referencing records, grouped by relation, each group in store order
    pub blocking: Vec<Record>,
}

impl DeleteCheck {
    fn from_blocking(blocking: Vec<Record>) -> Self {
        Self {
            allowed: blocking.is_empty(),
            blocking,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Record),
    Blocked(DeleteCheck),
}

#[derive(Clone)]
pub struct IntegrityGuard {
    repository: Repository,
    relations: RelationshipIndex,
}

impl IntegrityGuard {
    pub fn new(repository: Repository, relations: RelationshipIndex) -> Self {
        Self {
            repository,
            relations,
        }
    }

    pub fn relations(&self) -> &RelationshipIndex {
        &self.relations
    }

    /// Fetch a record together with its delete check.
    ///
    /// The record lookup and one query per dependent relation run
    /// concurrently; the first failure fails the whole call.
    pub async fn inspect(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<(Record, DeleteCheck)> {
        let relations = self.relations.dependents_of(kind);
        let (record, blocking) = tokio::try_join!(
            self.repository.fetch(kind, id, ctx),
            self.blocking_records(relations, id, ctx),
        )?;
        Ok((record, DeleteCheck::from_blocking(blocking)))
    }

    /// Check whether `id` can be deleted; absent records are `NotFound`
    pub async fn can_delete(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<DeleteCheck> {
        let (_, check) = self.inspect(kind, id, ctx).await?;
        Ok(check)
    }

    /// Delete `id` unless something still references it
    pub async fn delete(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<DeleteOutcome> {
        let relations = self.relations.dependents_of(kind);
        match self
            .repository
            .delete_unreferenced(kind, id, relations, ctx)
            .await?
        {
            ConditionalDelete::Deleted(record) => {
                tracing::info!(kind = %kind, id = %id, "record deleted");
                Ok(DeleteOutcome::Deleted(record))
            }
            ConditionalDelete::Blocked(blocking) => {
                tracing::info!(
                    kind = %kind,
                    id = %id,
                    blocking = blocking.len(),
                    "delete refused, record still referenced"
                );
                Ok(DeleteOutcome::Blocked(DeleteCheck::from_blocking(blocking)))
            }
            ConditionalDelete::NotFound => Err(AppError::not_found(kind, id)),
        }
    }

    async fn blocking_records(
        &self,
        relations: &[Relation],
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<Vec<Record>> {
        let queries = relations.iter().map(|relation| {
            self.repository
                .find(relation.child, Filter::references(relation.field, id), ctx)
        });
        let groups = try_join_all(queries).await?;
        Ok(groups.into_iter().flatten().collect())
    }
}
