//! Read models handed to the presentation layer
//!
//! Views carry the derived fields (display name, lifespan, urls) computed from
//! immutable records, and reference fields already resolved to their targets.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Author, Book, BookInstance, BookInstanceStatus, EntityKind, Genre};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorView {
    pub kind: EntityKind,
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    /// "Family, First"
    pub name: String,
    pub lifespan: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    /// "YYYY-MM-DD", prefills the edit form's date inputs
    pub date_of_birth_iso: Option<String>,
    pub date_of_death_iso: Option<String>,
    pub url: String,
}

impl From<&Author> for AuthorView {
    fn from(a: &Author) -> Self {
        Self {
            kind: EntityKind::Author,
            id: a.id,
            first_name: a.first_name.clone(),
            family_name: a.family_name.clone(),
            name: a.display_name(),
            lifespan: a.lifespan(),
            date_of_birth: a.date_of_birth,
            date_of_death: a.date_of_death,
            date_of_birth_iso: a.date_of_birth_iso(),
            date_of_death_iso: a.date_of_death_iso(),
            url: a.url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreView {
    pub kind: EntityKind,
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

impl From<&Genre> for GenreView {
    fn from(g: &Genre) -> Self {
        Self {
            kind: EntityKind::Genre,
            id: g.id,
            name: g.name.clone(),
            url: g.url(),
        }
    }
}

/// Short form of a book used inside other views
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub url: String,
}

impl From<&Book> for BookSummary {
    fn from(b: &Book) -> Self {
        Self {
            id: b.id,
            title: b.title.clone(),
            url: b.url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookView {
    pub kind: EntityKind,
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub url: String,
    /// `None` when the referenced author no longer exists
    pub author: Option<AuthorView>,
    pub genre: Vec<GenreView>,
}

impl BookView {
    pub fn new(book: &Book, author: Option<AuthorView>, genre: Vec<GenreView>) -> Self {
        Self {
            kind: EntityKind::Book,
            id: book.id,
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            url: book.url(),
            author,
            genre,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceView {
    pub kind: EntityKind,
    pub id: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
    pub due_back_formatted: Option<String>,
    pub url: String,
    /// `None` when the referenced book no longer exists
    pub book: Option<BookSummary>,
}

impl BookInstanceView {
    pub fn new(copy: &BookInstance, book: Option<BookSummary>) -> Self {
        Self {
            kind: EntityKind::BookInstance,
            id: copy.id,
            imprint: copy.imprint.clone(),
            status: copy.status,
            due_back: copy.due_back,
            due_back_formatted: copy.due_back_formatted(),
            url: copy.url(),
            book,
        }
    }
}

/// Any entity with its references resolved
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum EntityView {
    Author(AuthorView),
    Genre(GenreView),
    Book(BookView),
    BookInstance(BookInstanceView),
}

impl EntityView {
    pub fn id(&self) -> Uuid {
        match self {
            EntityView::Author(v) => v.id,
            EntityView::Genre(v) => v.id,
            EntityView::Book(v) => v.id,
            EntityView::BookInstance(v) => v.id,
        }
    }
}

/// Detail page data: the entity and every record referencing it
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EntityDetail {
    pub entity: EntityView,
    pub dependents: Vec<EntityView>,
}

/// Delete confirmation data
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeleteView {
    pub entity: EntityView,
    pub allowed: bool,
    /// Records that must be deleted first
    pub blocking: Vec<EntityView>,
}

/// Body of a refused delete
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeleteBlocked {
    pub code: u32,
    pub error: String,
    pub message: String,
    pub blocking: Vec<EntityView>,
}

/// Catalog home page counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub book_count: i64,
    pub book_instance_count: i64,
    pub book_instance_available_count: i64,
    pub author_count: i64,
    pub genre_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreOption {
    #[serde(flatten)]
    pub genre: GenreView,
    /// Already assigned to the book being edited
    pub checked: bool,
}

/// Choices offered by the book form
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookFormOptions {
    pub authors: Vec<AuthorView>,
    pub genres: Vec<GenreOption>,
}

/// Choices offered by the book instance form
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookInstanceFormOptions {
    pub books: Vec<BookSummary>,
    pub statuses: Vec<BookInstanceStatus>,
}
