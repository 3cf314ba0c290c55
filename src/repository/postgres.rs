//! PostgreSQL entity store
//!
//! Author and book references are foreign keys. Genre references live in a
//! `UUID[]` column, so writes lock the referenced genre rows `FOR SHARE` to
//! keep them alive until the transaction commits.

use async_trait::async_trait;
use sqlx::{PgExecutor, Pool, Postgres};
use uuid::Uuid;

use super::{ConditionalDelete, EntityStore};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookInstance, EntityKind, Filter, Genre, RefField, Record, Relation},
};

/// Run a typed query for `kind` and wrap every row into a [`Record`].
///
/// `$bind` receives the untyped query builder as `$q`; `$fetch` is
/// `fetch_all` or `fetch_optional`.
macro_rules! query_records {
    ($kind:expr, $sql:expr, $executor:expr, $fetch:ident, |$q:ident| $bind:expr) => {
        match $kind {
            EntityKind::Author => {
                let $q = sqlx::query_as::<_, Author>($sql);
                wrap!($fetch, $bind.$fetch($executor).await?, Record::Author)
            }
            EntityKind::Genre => {
                let $q = sqlx::query_as::<_, Genre>($sql);
                wrap!($fetch, $bind.$fetch($executor).await?, Record::Genre)
            }
            EntityKind::Book => {
                let $q = sqlx::query_as::<_, Book>($sql);
                wrap!($fetch, $bind.$fetch($executor).await?, Record::Book)
            }
            EntityKind::BookInstance => {
                let $q = sqlx::query_as::<_, BookInstance>($sql);
                wrap!($fetch, $bind.$fetch($executor).await?, Record::BookInstance)
            }
        }
    };
}

/// Map fetched rows into records
macro_rules! wrap {
    (fetch_all, $rows:expr, $variant:path) => {
        $rows.into_iter().map($variant).collect::<Vec<_>>()
    };
    (fetch_optional, $row:expr, $variant:path) => {
        $row.map($variant)
    };
}

/// Bind the parameters referenced by [`where_clause`]
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {
        match $filter {
            Filter::All => $query,
            Filter::References { id, .. } => $query.bind(*id),
            Filter::Status(status) => $query.bind(*status),
            Filter::AuthorName {
                first_name,
                family_name,
            } => $query.bind(first_name).bind(family_name),
            Filter::GenreName(name) => $query.bind(name),
        }
    };
}

fn where_clause(filter: &Filter) -> String {
    match filter {
        Filter::All => String::new(),
        Filter::References {
            field: RefField::Genre,
            ..
        } => "WHERE $1 = ANY(genre)".to_string(),
        Filter::References { field, .. } => format!("WHERE {} = $1", field.name()),
        Filter::Status(_) => "WHERE status = $1".to_string(),
        Filter::AuthorName { .. } => "WHERE first_name = $1 AND family_name = $2".to_string(),
        Filter::GenreName(_) => "WHERE name = $1".to_string(),
    }
}

/// A foreign key violation on insert or update means the parent row is gone
fn missing_parent(err: sqlx::Error, parent: EntityKind, id: Uuid) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Validation(format!("{} {} does not exist", parent.label(), id))
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn select<'e, E>(executor: E, kind: EntityKind, filter: &Filter) -> AppResult<Vec<Record>>
    where
        E: PgExecutor<'e>,
    {
        if !filter.is_applicable(kind) {
            return Err(AppError::Internal(format!(
                "filter {:?} does not apply to {}",
                filter, kind
            )));
        }
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY created_at, id",
            kind.table(),
            where_clause(filter)
        );
        let records: Vec<Record> =
            query_records!(kind, &sql, executor, fetch_all, |q| bind_filter!(q, filter));
        Ok(records)
    }

    async fn delete_returning<'e, E>(executor: E, kind: EntityKind, id: Uuid) -> AppResult<Option<Record>>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING *", kind.table());
        let record: Option<Record> =
            query_records!(kind, &sql, executor, fetch_optional, |q| q.bind(id));
        Ok(record)
    }

    /// Lock the genres a book points at; fails when one of them is missing
    async fn lock_genres<'e, E>(executor: E, genre: &[Uuid]) -> AppResult<()>
    where
        E: PgExecutor<'e>,
    {
        if genre.is_empty() {
            return Ok(());
        }
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM genres WHERE id = ANY($1) FOR SHARE")
            .bind(genre)
            .fetch_all(executor)
            .await?;
        match genre.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(AppError::Validation(format!("Genre {} does not exist", missing))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn create(&self, record: Record) -> AppResult<Record> {
        let created = match record {
            Record::Author(a) => Record::Author(
                sqlx::query_as::<_, Author>(
                    r#"
                    INSERT INTO authors (id, first_name, family_name, date_of_birth, date_of_death)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(a.id)
                .bind(&a.first_name)
                .bind(&a.family_name)
                .bind(a.date_of_birth)
                .bind(a.date_of_death)
                .fetch_one(&self.pool)
                .await?,
            ),
            Record::Genre(g) => Record::Genre(
                sqlx::query_as::<_, Genre>("INSERT INTO genres (id, name) VALUES ($1, $2) RETURNING *")
                    .bind(g.id)
                    .bind(&g.name)
                    .fetch_one(&self.pool)
                    .await?,
            ),
            Record::Book(b) => {
                let mut tx = self.pool.begin().await?;
                Self::lock_genres(&mut *tx, &b.genre).await?;
                let book = sqlx::query_as::<_, Book>(
                    r#"
                    INSERT INTO books (id, title, summary, isbn, author, genre)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(b.id)
                .bind(&b.title)
                .bind(&b.summary)
                .bind(&b.isbn)
                .bind(b.author)
                .bind(&b.genre)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| missing_parent(e, EntityKind::Author, b.author))?;
                tx.commit().await?;
                Record::Book(book)
            }
            Record::BookInstance(i) => Record::BookInstance(
                sqlx::query_as::<_, BookInstance>(
                    r#"
                    INSERT INTO book_instances (id, book, imprint, status, due_back)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(i.id)
                .bind(i.book)
                .bind(&i.imprint)
                .bind(i.status)
                .bind(i.due_back)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| missing_parent(e, EntityKind::Book, i.book))?,
            ),
        };
        Ok(created)
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> AppResult<Option<Record>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", kind.table());
        let record: Option<Record> =
            query_records!(kind, &sql, &self.pool, fetch_optional, |q| q.bind(id));
        Ok(record)
    }

    async fn get_many(&self, kind: EntityKind, ids: &[Uuid]) -> AppResult<Vec<Record>> {
        let sql = format!(
            "SELECT * FROM {} WHERE id = ANY($1) ORDER BY created_at, id",
            kind.table()
        );
        let records: Vec<Record> =
            query_records!(kind, &sql, &self.pool, fetch_all, |q| q.bind(ids));
        Ok(records)
    }

    async fn find(&self, kind: EntityKind, filter: &Filter) -> AppResult<Vec<Record>> {
        Self::select(&self.pool, kind, filter).await
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> AppResult<i64> {
        if !filter.is_applicable(kind) {
            return Err(AppError::Internal(format!(
                "filter {:?} does not apply to {}",
                filter, kind
            )));
        }
        let sql = format!(
            "SELECT COUNT(*)::bigint FROM {} {}",
            kind.table(),
            where_clause(filter)
        );
        let count = bind_filter!(sqlx::query_scalar::<_, i64>(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(&self, record: Record) -> AppResult<Option<Record>> {
        let updated = match record {
            Record::Author(a) => sqlx::query_as::<_, Author>(
                r#"
                UPDATE authors
                SET first_name = $2, family_name = $3, date_of_birth = $4, date_of_death = $5
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(a.id)
            .bind(&a.first_name)
            .bind(&a.family_name)
            .bind(a.date_of_birth)
            .bind(a.date_of_death)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::Author),
            Record::Genre(g) => sqlx::query_as::<_, Genre>(
                "UPDATE genres SET name = $2 WHERE id = $1 RETURNING *",
            )
            .bind(g.id)
            .bind(&g.name)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::Genre),
            Record::Book(b) => {
                let mut tx = self.pool.begin().await?;
                Self::lock_genres(&mut *tx, &b.genre).await?;
                let book = sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books
                    SET title = $2, summary = $3, isbn = $4, author = $5, genre = $6
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(b.id)
                .bind(&b.title)
                .bind(&b.summary)
                .bind(&b.isbn)
                .bind(b.author)
                .bind(&b.genre)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| missing_parent(e, EntityKind::Author, b.author))?;
                tx.commit().await?;
                book.map(Record::Book)
            }
            Record::BookInstance(i) => sqlx::query_as::<_, BookInstance>(
                r#"
                UPDATE book_instances
                SET book = $2, imprint = $3, status = $4, due_back = $5
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(i.id)
            .bind(i.book)
            .bind(&i.imprint)
            .bind(i.status)
            .bind(i.due_back)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| missing_parent(e, EntityKind::Book, i.book))?
            .map(Record::BookInstance),
        };
        Ok(updated)
    }

    async fn delete_unreferenced(
        &self,
        kind: EntityKind,
        id: Uuid,
        relations: &[Relation],
    ) -> AppResult<ConditionalDelete> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent inserts referencing this row wait for us
        let sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", kind.table());
        let locked = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(ConditionalDelete::NotFound);
        }

        let mut blocking = Vec::new();
        for relation in relations {
            let filter = Filter::references(relation.field, id);
            blocking.extend(Self::select(&mut *tx, relation.child, &filter).await?);
        }
        if !blocking.is_empty() {
            tx.rollback().await?;
            return Ok(ConditionalDelete::Blocked(blocking));
        }

        let deleted = Self::delete_returning(&mut *tx, kind, id).await?;
        tx.commit().await?;
        Ok(deleted.map_or(ConditionalDelete::NotFound, ConditionalDelete::Deleted))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
