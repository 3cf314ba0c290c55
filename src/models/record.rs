//! Entity kinds, type-erased records and store filters

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Author, Book, BookInstance, BookInstanceStatus, Genre};

/// The closed set of catalog entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Author,
    Genre,
    Book,
    BookInstance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Author,
        EntityKind::Genre,
        EntityKind::Book,
        EntityKind::BookInstance,
    ];

    /// Table name in the SQL store
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Author => "authors",
            EntityKind::Genre => "genres",
            EntityKind::Book => "books",
            EntityKind::BookInstance => "book_instances",
        }
    }

    /// Human readable label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Author => "Author",
            EntityKind::Genre => "Genre",
            EntityKind::Book => "Book",
            EntityKind::BookInstance => "Book instance",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Reference fields: a field on one entity holding the id(s) of another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RefField {
    /// `Book.author` -> Author
    Author,
    /// `Book.genre` -> Genre (many)
    Genre,
    /// `BookInstance.book` -> Book
    Book,
}

impl RefField {
    pub fn name(&self) -> &'static str {
        match self {
            RefField::Author => "author",
            RefField::Genre => "genre",
            RefField::Book => "book",
        }
    }

    /// Entity type carrying the field
    pub fn owner(&self) -> EntityKind {
        match self {
            RefField::Author | RefField::Genre => EntityKind::Book,
            RefField::Book => EntityKind::BookInstance,
        }
    }

    /// Entity type the field points at
    pub fn target(&self) -> EntityKind {
        match self {
            RefField::Author => EntityKind::Author,
            RefField::Genre => EntityKind::Genre,
            RefField::Book => EntityKind::Book,
        }
    }
}

/// A (child type, field) pair: records of `child` reference a parent through `field`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct Relation {
    pub child: EntityKind,
    pub field: RefField,
}

impl Relation {
    pub const fn new(child: EntityKind, field: RefField) -> Self {
        Self { child, field }
    }
}

/// Filter understood by every entity store backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Records whose reference field points at `id`
    References { field: RefField, id: Uuid },
    /// Book instances in a given status
    Status(BookInstanceStatus),
    /// Authors with exactly this name
    AuthorName { first_name: String, family_name: String },
    /// Genres with exactly this name
    GenreName(String),
}

impl Filter {
    pub fn references(field: RefField, id: Uuid) -> Self {
        Filter::References { field, id }
    }

    /// Entity type this filter can be applied to, `None` when it applies to any
    pub fn applies_to(&self) -> Option<EntityKind> {
        match self {
            Filter::All => None,
            Filter::References { field, .. } => Some(field.owner()),
            Filter::Status(_) => Some(EntityKind::BookInstance),
            Filter::AuthorName { .. } => Some(EntityKind::Author),
            Filter::GenreName(_) => Some(EntityKind::Genre),
        }
    }

    pub fn is_applicable(&self, kind: EntityKind) -> bool {
        self.applies_to().map_or(true, |k| k == kind)
    }
}

/// A stored entity of any kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Author(Author),
    Genre(Genre),
    Book(Book),
    BookInstance(BookInstance),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Author(_) => EntityKind::Author,
            Record::Genre(_) => EntityKind::Genre,
            Record::Book(_) => EntityKind::Book,
            Record::BookInstance(_) => EntityKind::BookInstance,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Author(a) => a.id,
            Record::Genre(g) => g.id,
            Record::Book(b) => b.id,
            Record::BookInstance(i) => i.id,
        }
    }

    /// Ids this record points at through `field`
    pub fn references(&self, field: RefField) -> Vec<Uuid> {
        match (self, field) {
            (Record::Book(b), RefField::Author) => vec![b.author],
            (Record::Book(b), RefField::Genre) => b.genre.clone(),
            (Record::BookInstance(i), RefField::Book) => vec![i.book],
            _ => Vec::new(),
        }
    }

    pub fn matches(&self, filter: &Filter) -> bool {
        match (filter, self) {
            (Filter::All, _) => true,
            (Filter::References { field, id }, record) => record.references(*field).contains(id),
            (Filter::Status(status), Record::BookInstance(i)) => i.status == *status,
            (Filter::AuthorName { first_name, family_name }, Record::Author(a)) => {
                a.first_name == *first_name && a.family_name == *family_name
            }
            (Filter::GenreName(name), Record::Genre(g)) => g.name == *name,
            _ => false,
        }
    }

    /// Key list pages are ordered by; `None` keeps store order
    pub fn sort_key(&self) -> Option<&str> {
        match self {
            Record::Author(a) => Some(&a.family_name),
            Record::Genre(g) => Some(&g.name),
            Record::Book(b) => Some(&b.title),
            Record::BookInstance(_) => None,
        }
    }

    pub fn into_author(self) -> Option<Author> {
        match self {
            Record::Author(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_genre(self) -> Option<Genre> {
        match self {
            Record::Genre(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_book(self) -> Option<Book> {
        match self {
            Record::Book(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_book_instance(self) -> Option<BookInstance> {
        match self {
            Record::BookInstance(i) => Some(i),
            _ => None,
        }
    }
}

impl From<Author> for Record {
    fn from(a: Author) -> Self {
        Record::Author(a)
    }
}

impl From<Genre> for Record {
    fn from(g: Genre) -> Self {
        Record::Genre(g)
    }
}

impl From<Book> for Record {
    fn from(b: Book) -> Self {
        Record::Book(b)
    }
}

impl From<BookInstance> for Record {
    fn from(i: BookInstance) -> Self {
        Record::BookInstance(i)
    }
}
