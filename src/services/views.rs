//! View aggregation: fan-out reads joined into presentation-ready views

use std::collections::HashMap;

use futures::future::try_join_all;
use indexmap::IndexSet;
use uuid::Uuid;

use super::{
    integrity::{DeleteCheck, IntegrityGuard},
    relations::referrers_of,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        view::{
            AuthorView, BookFormOptions, BookInstanceFormOptions, BookInstanceView, BookSummary,
            BookView, CatalogSummary, DeleteView, GenreOption, GenreView,
        },
        BookInstanceStatus, EntityDetail, EntityKind, EntityView, Filter, RefField, Record,
    },
    repository::{QueryContext, Repository},
};

/// Reference targets loaded for one batch of records
#[derive(Default)]
struct Joins {
    authors: HashMap<Uuid, AuthorView>,
    genres: HashMap<Uuid, GenreView>,
    books: HashMap<Uuid, BookSummary>,
}

impl Joins {
    fn view(&self, record: &Record) -> EntityView {
        match record {
            Record::Author(a) => EntityView::Author(a.into()),
            Record::Genre(g) => EntityView::Genre(g.into()),
            Record::Book(b) => {
                let author = self.authors.get(&b.author).cloned();
                if author.is_none() {
                    tracing::warn!(book = %b.id, author = %b.author, "book references a missing author");
                }
                let genre = b
                    .genre
                    .iter()
                    .filter_map(|id| {
                        let found = self.genres.get(id).cloned();
                        if found.is_none() {
                            tracing::warn!(book = %b.id, genre = %id, "book references a missing genre");
                        }
                        found
                    })
                    .collect();
                EntityView::Book(BookView::new(b, author, genre))
            }
            Record::BookInstance(i) => {
                let book = self.books.get(&i.book).cloned();
                if book.is_none() {
                    tracing::warn!(book_instance = %i.id, book = %i.book, "copy references a missing book");
                }
                EntityView::BookInstance(BookInstanceView::new(i, book))
            }
        }
    }
}

fn referenced_ids(records: &[Record], field: RefField) -> Vec<Uuid> {
    records
        .iter()
        .flat_map(|r| r.references(field))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn sort_for_listing(records: &mut [Record]) {
    // stable: equal keys keep store order
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[derive(Clone)]
pub struct ViewAggregator {
    repository: Repository,
    guard: IntegrityGuard,
}

impl ViewAggregator {
    pub fn new(repository: Repository, guard: IntegrityGuard) -> Self {
        Self { repository, guard }
    }

    /// Turn records into views, resolving every reference with one batched
    /// lookup per target kind
    pub async fn resolve(&self, records: &[Record], ctx: &QueryContext) -> AppResult<Vec<EntityView>> {
        let (authors, genres, books) = tokio::try_join!(
            self.repository
                .get_many(EntityKind::Author, referenced_ids(records, RefField::Author), ctx),
            self.repository
                .get_many(EntityKind::Genre, referenced_ids(records, RefField::Genre), ctx),
            self.repository
                .get_many(EntityKind::Book, referenced_ids(records, RefField::Book), ctx),
        )?;

        let mut joins = Joins::default();
        for record in authors.into_iter().chain(genres).chain(books) {
            match record {
                Record::Author(a) => {
                    joins.authors.insert(a.id, AuthorView::from(&a));
                }
                Record::Genre(g) => {
                    joins.genres.insert(g.id, GenreView::from(&g));
                }
                Record::Book(b) => {
                    joins.books.insert(b.id, BookSummary::from(&b));
                }
                Record::BookInstance(_) => {}
            }
        }

        Ok(records.iter().map(|r| joins.view(r)).collect())
    }

    async fn resolve_with(
        &self,
        record: Record,
        others: Vec<Record>,
        ctx: &QueryContext,
    ) -> AppResult<(EntityView, Vec<EntityView>)> {
        let mut batch = Vec::with_capacity(others.len() + 1);
        batch.push(record);
        batch.extend(others);
        let mut views = self.resolve(&batch, ctx).await?.into_iter();
        let first = views
            .next()
            .ok_or_else(|| AppError::Internal("empty view batch".to_string()))?;
        Ok((first, views.collect()))
    }

    /// Entity plus every record referencing it, whatever the delete policy
    pub async fn load_detail(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<EntityDetail> {
        let dependents = referrers_of(kind).iter().map(|relation| {
            self.repository
                .find(relation.child, Filter::references(relation.field, id), ctx)
        });
        let (record, groups) = tokio::try_join!(
            self.repository.fetch(kind, id, ctx),
            try_join_all(dependents),
        )?;

        let (entity, dependents) = self
            .resolve_with(record, groups.into_iter().flatten().collect(), ctx)
            .await?;
        Ok(EntityDetail { entity, dependents })
    }

    /// All records of `kind`, sorted for display
    pub async fn load_list(&self, kind: EntityKind, ctx: &QueryContext) -> AppResult<Vec<EntityView>> {
        let mut records = self.repository.find(kind, Filter::All, ctx).await?;
        sort_for_listing(&mut records);
        self.resolve(&records, ctx).await
    }

    /// Counts shown on the catalog home page
    pub async fn load_summary(&self, ctx: &QueryContext) -> AppResult<CatalogSummary> {
        let repo = &self.repository;
        let (book_count, book_instance_count, book_instance_available_count, author_count, genre_count) = tokio::try_join!(
            repo.count(EntityKind::Book, Filter::All, ctx),
            repo.count(EntityKind::BookInstance, Filter::All, ctx),
            repo.count(
                EntityKind::BookInstance,
                Filter::Status(BookInstanceStatus::Available),
                ctx
            ),
            repo.count(EntityKind::Author, Filter::All, ctx),
            repo.count(EntityKind::Genre, Filter::All, ctx),
        )?;

        Ok(CatalogSummary {
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count,
        })
    }

    /// Authors and genres for the book form; genres already on `book_id` are checked
    pub async fn load_book_form(
        &self,
        book_id: Option<Uuid>,
        ctx: &QueryContext,
    ) -> AppResult<BookFormOptions> {
        let book = async {
            match book_id {
                Some(id) => self.repository.fetch(EntityKind::Book, id, ctx).await.map(Some),
                None => Ok(None),
            }
        };
        let (authors, genres, book) = tokio::try_join!(
            self.sorted(EntityKind::Author, ctx),
            self.sorted(EntityKind::Genre, ctx),
            book,
        )?;

        let assigned = book.map(|b| b.references(RefField::Genre)).unwrap_or_default();
        Ok(BookFormOptions {
            authors: authors
                .into_iter()
                .filter_map(Record::into_author)
                .map(|a| AuthorView::from(&a))
                .collect(),
            genres: genres
                .into_iter()
                .filter_map(Record::into_genre)
                .map(|g| GenreOption {
                    checked: assigned.contains(&g.id),
                    genre: GenreView::from(&g),
                })
                .collect(),
        })
    }

    /// Books and statuses for the book instance form
    pub async fn load_instance_form(&self, ctx: &QueryContext) -> AppResult<BookInstanceFormOptions> {
        let books = self.sorted(EntityKind::Book, ctx).await?;
        Ok(BookInstanceFormOptions {
            books: books
                .into_iter()
                .filter_map(Record::into_book)
                .map(|b| BookSummary::from(&b))
                .collect(),
            statuses: vec![
                BookInstanceStatus::Available,
                BookInstanceStatus::Maintenance,
                BookInstanceStatus::Loaned,
                BookInstanceStatus::Reserved,
            ],
        })
    }

    /// Delete confirmation: the entity, whether it may go, and what blocks it
    pub async fn delete_view(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &QueryContext,
    ) -> AppResult<DeleteView> {
        let (record, DeleteCheck { allowed, blocking }) = self.guard.inspect(kind, id, ctx).await?;
        let (entity, blocking) = self.resolve_with(record, blocking, ctx).await?;
        Ok(DeleteView {
            entity,
            allowed,
            blocking,
        })
    }

    async fn sorted(&self, kind: EntityKind, ctx: &QueryContext) -> AppResult<Vec<Record>> {
        let mut records = self.repository.find(kind, Filter::All, ctx).await?;
        sort_for_listing(&mut records);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::IntegrityConfig,
        models::{Author, Book, BookInstance, Genre},
        repository::{memory::MemoryStore, EntityStore, MockEntityStore},
        services::relations::RelationshipIndex,
    };

    fn ctx() -> QueryContext {
        QueryContext::new(Duration::from_secs(5))
    }

    fn aggregator_over(store: Arc<dyn EntityStore>) -> (ViewAggregator, Repository) {
        let repository = Repository::new(store);
        let guard = IntegrityGuard::new(
            repository.clone(),
            RelationshipIndex::new(&IntegrityConfig::default()),
        );
        (ViewAggregator::new(repository.clone(), guard), repository)
    }

    fn author(first: &str, family: &str) -> Record {
        Record::Author(Author {
            id: Uuid::new_v4(),
            first_name: first.to_string(),
            family_name: family.to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
    }

    fn genre(name: &str) -> Record {
        Record::Genre(Genre {
            id: Uuid::new_v4(),
            name: name.to_string(),
        })
    }

    fn book(title: &str, author: Uuid, genre: Vec<Uuid>) -> Record {
        Record::Book(Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            summary: "Summary".to_string(),
            isbn: "9780141439587".to_string(),
            author,
            genre,
        })
    }

    fn copy_of(book: Uuid, status: BookInstanceStatus) -> Record {
        Record::BookInstance(BookInstance {
            id: Uuid::new_v4(),
            book,
            imprint: "Penguin".to_string(),
            status,
            due_back: None,
        })
    }

    fn names(views: &[EntityView]) -> Vec<String> {
        views
            .iter()
            .map(|v| match v {
                EntityView::Author(a) => a.name.clone(),
                EntityView::Genre(g) => g.name.clone(),
                EntityView::Book(b) => b.title.clone(),
                EntityView::BookInstance(i) => i.imprint.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_author_list_sorted_by_family_name_and_stable() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        for (first, family) in [("Virginia", "Woolf"), ("Jane", "Austen"), ("Cassandra", "Austen"), ("George", "Eliot")] {
            repo.create(author(first, family), &ctx()).await.unwrap();
        }

        let list = views.load_list(EntityKind::Author, &ctx()).await.unwrap();
        assert_eq!(
            names(&list),
            vec!["Austen, Jane", "Austen, Cassandra", "Eliot, George", "Woolf, Virginia"]
        );
    }

    #[tokio::test]
    async fn test_book_list_resolves_references() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        let fiction = repo.create(genre("Fiction"), &ctx()).await.unwrap();
        let romance = repo.create(genre("Romance"), &ctx()).await.unwrap();
        repo.create(book("Persuasion", jane.id(), vec![romance.id()]), &ctx())
            .await
            .unwrap();
        repo.create(book("Emma", jane.id(), vec![fiction.id(), romance.id()]), &ctx())
            .await
            .unwrap();

        let list = views.load_list(EntityKind::Book, &ctx()).await.unwrap();
        assert_eq!(names(&list), vec!["Emma", "Persuasion"]);
        let EntityView::Book(emma) = &list[0] else {
            panic!("expected a book view");
        };
        assert_eq!(emma.author.as_ref().map(|a| a.name.as_str()), Some("Austen, Jane"));
        let genres: Vec<&str> = emma.genre.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["Fiction", "Romance"]);
    }

    #[tokio::test]
    async fn test_author_detail_lists_books() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        let emma = repo.create(book("Emma", jane.id(), vec![]), &ctx()).await.unwrap();

        let detail = views.load_detail(EntityKind::Author, jane.id(), &ctx()).await.unwrap();
        assert_eq!(detail.entity.id(), jane.id());
        assert_eq!(detail.dependents.len(), 1);
        assert_eq!(detail.dependents[0].id(), emma.id());
    }

    #[tokio::test]
    async fn test_genre_detail_lists_books_even_when_unchecked() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        let fiction = repo.create(genre("Fiction"), &ctx()).await.unwrap();
        repo.create(book("Emma", jane.id(), vec![fiction.id()]), &ctx())
            .await
            .unwrap();

        let detail = views.load_detail(EntityKind::Genre, fiction.id(), &ctx()).await.unwrap();
        assert_eq!(names(&detail.dependents), vec!["Emma"]);
    }

    #[tokio::test]
    async fn test_missing_book_detail_is_not_found() {
        let mut store = MockEntityStore::new();
        store.expect_get().returning(|_, _| Ok(None));
        store.expect_find().returning(|_, _| {
            Ok(vec![copy_of(Uuid::new_v4(), BookInstanceStatus::Available)])
        });
        let (views, _) = aggregator_over(Arc::new(store));

        let result = views.load_detail(EntityKind::Book, Uuid::new_v4(), &ctx()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_detail_fails_when_dependent_query_fails() {
        let found = author("Jane", "Austen");
        let mut store = MockEntityStore::new();
        store.expect_get().returning(move |_, _| Ok(Some(found.clone())));
        store
            .expect_find()
            .returning(|_, _| Err(AppError::Store("connection reset".to_string())));
        let (views, _) = aggregator_over(Arc::new(store));

        let result = views.load_detail(EntityKind::Author, Uuid::new_v4(), &ctx()).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_deleted_genre_is_skipped_in_book_view() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        let fiction = repo.create(genre("Fiction"), &ctx()).await.unwrap();
        let emma = repo
            .create(book("Emma", jane.id(), vec![fiction.id()]), &ctx())
            .await
            .unwrap();
        views
            .guard
            .delete(EntityKind::Genre, fiction.id(), &ctx())
            .await
            .unwrap();

        let detail = views.load_detail(EntityKind::Book, emma.id(), &ctx()).await.unwrap();
        let EntityView::Book(view) = detail.entity else {
            panic!("expected a book view");
        };
        assert!(view.genre.is_empty());
        assert!(view.author.is_some());
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        repo.create(genre("Fiction"), &ctx()).await.unwrap();
        let emma = repo.create(book("Emma", jane.id(), vec![]), &ctx()).await.unwrap();
        repo.create(copy_of(emma.id(), BookInstanceStatus::Available), &ctx())
            .await
            .unwrap();
        repo.create(copy_of(emma.id(), BookInstanceStatus::Loaned), &ctx())
            .await
            .unwrap();

        let summary = views.load_summary(&ctx()).await.unwrap();
        assert_eq!(
            summary,
            CatalogSummary {
                book_count: 1,
                book_instance_count: 2,
                book_instance_available_count: 1,
                author_count: 1,
                genre_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_book_form_checks_assigned_genres() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        let romance = repo.create(genre("Romance"), &ctx()).await.unwrap();
        repo.create(genre("Fiction"), &ctx()).await.unwrap();
        let emma = repo
            .create(book("Emma", jane.id(), vec![romance.id()]), &ctx())
            .await
            .unwrap();

        let form = views.load_book_form(Some(emma.id()), &ctx()).await.unwrap();
        assert_eq!(form.authors.len(), 1);
        let flags: Vec<(&str, bool)> = form
            .genres
            .iter()
            .map(|o| (o.genre.name.as_str(), o.checked))
            .collect();
        assert_eq!(flags, vec![("Fiction", false), ("Romance", true)]);

        let blank = views.load_book_form(None, &ctx()).await.unwrap();
        assert!(blank.genres.iter().all(|o| !o.checked));
    }

    #[tokio::test]
    async fn test_delete_view_lists_blocking_records() {
        let (views, repo) = aggregator_over(Arc::new(MemoryStore::new()));
        let jane = repo.create(author("Jane", "Austen"), &ctx()).await.unwrap();
        repo.create(book("Emma", jane.id(), vec![]), &ctx()).await.unwrap();

        let view = views.delete_view(EntityKind::Author, jane.id(), &ctx()).await.unwrap();
        assert!(!view.allowed);
        assert_eq!(names(&view.blocking), vec!["Emma"]);
    }
}
