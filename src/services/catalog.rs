//! Catalog management service: validated writes for every entity kind

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        Author, AuthorForm, Book, BookForm, BookInstance, BookInstanceForm, EntityKind, Filter,
        Genre, GenreForm, Record,
    },
    repository::{QueryContext, Repository},
};

/// Result of a create that may resolve to an existing record
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome<T> {
    Created(T),
    /// A record with the same name already existed and was returned instead
    Existing(T),
}

impl<T> CreateOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            CreateOutcome::Created(v) | CreateOutcome::Existing(v) => v,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

fn expect_kind<T>(record: Record, unwrap: fn(Record) -> Option<T>) -> AppResult<T> {
    let kind = record.kind();
    unwrap(record).ok_or_else(|| AppError::Internal(format!("store returned a {} record", kind)))
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create an author, or return the one already carrying exactly this name
    pub async fn create_author(&self, form: AuthorForm, ctx: &QueryContext) -> AppResult<CreateOutcome<Author>> {
        let form = form.normalized();
        form.validate()?;

        let filter = Filter::AuthorName {
            first_name: form.first_name.clone(),
            family_name: form.family_name.clone(),
        };
        if let Some(existing) = self.repository.find(EntityKind::Author, filter, ctx).await?.into_iter().next() {
            tracing::info!(id = %existing.id(), "author already exists, returning it");
            return Ok(CreateOutcome::Existing(expect_kind(existing, Record::into_author)?));
        }

        let created = self
            .repository
            .create(form.into_author(Uuid::new_v4()).into(), ctx)
            .await?;
        tracing::info!(id = %created.id(), "author created");
        Ok(CreateOutcome::Created(expect_kind(created, Record::into_author)?))
    }

    pub async fn update_author(&self, id: Uuid, form: AuthorForm, ctx: &QueryContext) -> AppResult<Author> {
        let form = form.normalized();
        form.validate()?;

        let updated = self.repository.update(form.into_author(id).into(), ctx).await?;
        expect_kind(updated, Record::into_author)
    }

    /// Create a genre, or return the one already carrying exactly this name
    pub async fn create_genre(&self, form: GenreForm, ctx: &QueryContext) -> AppResult<CreateOutcome<Genre>> {
        let form = form.normalized();
        form.validate()?;

        let filter = Filter::GenreName(form.name.clone());
        if let Some(existing) = self.repository.find(EntityKind::Genre, filter, ctx).await?.into_iter().next() {
            tracing::info!(id = %existing.id(), "genre already exists, returning it");
            return Ok(CreateOutcome::Existing(expect_kind(existing, Record::into_genre)?));
        }

        let created = self
            .repository
            .create(form.into_genre(Uuid::new_v4()).into(), ctx)
            .await?;
        tracing::info!(id = %created.id(), "genre created");
        Ok(CreateOutcome::Created(expect_kind(created, Record::into_genre)?))
    }

    pub async fn update_genre(&self, id: Uuid, form: GenreForm, ctx: &QueryContext) -> AppResult<Genre> {
        let form = form.normalized();
        form.validate()?;

        let updated = self.repository.update(form.into_genre(id).into(), ctx).await?;
        expect_kind(updated, Record::into_genre)
    }

    pub async fn create_book(&self, form: BookForm, ctx: &QueryContext) -> AppResult<Book> {
        let book = self.checked_book(form, Uuid::new_v4(), ctx).await?;
        let created = self.repository.create(book.into(), ctx).await?;
        tracing::info!(id = %created.id(), "book created");
        expect_kind(created, Record::into_book)
    }

    pub async fn update_book(&self, id: Uuid, form: BookForm, ctx: &QueryContext) -> AppResult<Book> {
        let book = self.checked_book(form, id, ctx).await?;
        let updated = self.repository.update(book.into(), ctx).await?;
        expect_kind(updated, Record::into_book)
    }

    pub async fn create_book_instance(
        &self,
        form: BookInstanceForm,
        ctx: &QueryContext,
    ) -> AppResult<BookInstance> {
        let copy = self.checked_book_instance(form, Uuid::new_v4(), ctx).await?;
        let created = self.repository.create(copy.into(), ctx).await?;
        tracing::info!(id = %created.id(), "book instance created");
        expect_kind(created, Record::into_book_instance)
    }

    pub async fn update_book_instance(
        &self,
        id: Uuid,
        form: BookInstanceForm,
        ctx: &QueryContext,
    ) -> AppResult<BookInstance> {
        let copy = self.checked_book_instance(form, id, ctx).await?;
        let updated = self.repository.update(copy.into(), ctx).await?;
        expect_kind(updated, Record::into_book_instance)
    }

    /// Validate a book submission and make sure its author and genres exist
    async fn checked_book(&self, form: BookForm, id: Uuid, ctx: &QueryContext) -> AppResult<Book> {
        let form = form.normalized();
        form.validate()?;
        let book = form
            .into_book(id)
            .ok_or_else(|| AppError::Validation("Author must not be empty.".to_string()))?;

        tokio::try_join!(
            self.ensure_exist(EntityKind::Author, vec![book.author], ctx),
            self.ensure_exist(EntityKind::Genre, book.genre.clone(), ctx),
        )?;
        Ok(book)
    }

    async fn checked_book_instance(
        &self,
        form: BookInstanceForm,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<BookInstance> {
        let form = form.normalized();
        form.validate()?;
        let copy = form
            .into_book_instance(id)
            .ok_or_else(|| AppError::Validation("Book must be specified".to_string()))?;

        self.ensure_exist(EntityKind::Book, vec![copy.book], ctx).await?;
        Ok(copy)
    }

    async fn ensure_exist(&self, kind: EntityKind, ids: Vec<Uuid>, ctx: &QueryContext) -> AppResult<()> {
        let found: Vec<Uuid> = self
            .repository
            .get_many(kind, ids.clone(), ctx)
            .await?
            .iter()
            .map(Record::id)
            .collect();
        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(AppError::Validation(format!("{} {} does not exist", kind, missing))),
            None => Ok(()),
        }
    }
}
