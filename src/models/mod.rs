//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod record;
pub mod validation;
pub mod view;

// Re-export commonly used types
pub use author::{Author, AuthorForm};
pub use book::{Book, BookForm};
pub use book_instance::{BookInstance, BookInstanceForm, BookInstanceStatus};
pub use genre::{Genre, GenreForm};
pub use record::{EntityKind, Filter, RefField, Record, Relation};
pub use view::{EntityDetail, EntityView};
