//! Book model and related types

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, OneOrMany};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validation::{compact_isbn, normalize_text, validate_isbn};

/// Book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    /// Author id
    pub author: Uuid,
    /// Genre ids
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

/// Book create/update submission
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, message = "Title must not be empty."))]
    pub title: String,
    #[validate(required(message = "Author must not be empty."))]
    pub author: Option<Uuid>,
    #[validate(length(min = 1, message = "Summary must not be empty."))]
    pub summary: String,
    #[validate(
        length(min = 1, message = "ISBN required"),
        custom(function = "validate_isbn")
    )]
    pub isbn: String,
    /// A single genre id or a list of them
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default)]
    #[schema(value_type = Vec<Uuid>)]
    pub genre: Vec<Uuid>,
}

impl BookForm {
    /// Trimmed copy with duplicate genres collapsed, first occurrence kept
    pub fn normalized(self) -> Self {
        let mut genre: Vec<Uuid> = Vec::with_capacity(self.genre.len());
        for id in self.genre {
            if !genre.contains(&id) {
                genre.push(id);
            }
        }
        Self {
            title: normalize_text(&self.title),
            author: self.author,
            summary: normalize_text(&self.summary),
            isbn: normalize_text(&self.isbn),
            genre,
        }
    }

    /// Build the record; callers validate first so `author` is present
    pub fn into_book(self, id: Uuid) -> Option<Book> {
        Some(Book {
            id,
            title: self.title,
            summary: self.summary,
            isbn: compact_isbn(&self.isbn),
            author: self.author?,
            genre: self.genre,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_genre_becomes_a_list() {
        let genre = Uuid::new_v4();
        let form: BookForm = serde_json::from_value(serde_json::json!({
            "title": "Emma",
            "author": Uuid::new_v4(),
            "summary": "Matchmaking",
            "isbn": "9780141439587",
            "genre": genre,
        }))
        .unwrap();
        assert_eq!(form.genre, vec![genre]);
    }

    #[test]
    fn test_missing_genre_is_empty() {
        let form: BookForm = serde_json::from_value(serde_json::json!({
            "title": "Emma",
            "author": Uuid::new_v4(),
            "summary": "Matchmaking",
            "isbn": "978-0-14-143958-7",
        }))
        .unwrap();
        assert!(form.genre.is_empty());
        assert!(form.validate().is_ok());
        let book = form.into_book(Uuid::new_v4()).unwrap();
        assert_eq!(book.isbn, "9780141439587");
    }

    #[test]
    fn test_validation_messages() {
        let form: BookForm = serde_json::from_value(serde_json::json!({
            "title": " ",
            "summary": "Matchmaking",
            "isbn": "9780141439588",
            "genre": [],
        }))
        .unwrap();
        let errors = form.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("author"));
        assert!(fields.contains_key("isbn"));
    }

    #[test]
    fn test_duplicate_genres_collapse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let form = BookForm {
            title: "Emma".to_string(),
            author: Some(Uuid::new_v4()),
            summary: "Matchmaking".to_string(),
            isbn: "9780141439587".to_string(),
            genre: vec![a, b, a],
        };
        assert_eq!(form.normalized().genre, vec![a, b]);
    }
}
