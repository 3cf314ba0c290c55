//! Book instance (physical copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validation::normalize_text;

/// Circulation status of a copy
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "book_instance_status")]
pub enum BookInstanceStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

/// Book instance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    /// Book id
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    /// Medium date format, e.g. "Jan 5, 2024"
    pub fn due_back_formatted(&self) -> Option<String> {
        self.due_back.map(|d| d.format("%b %-d, %Y").to_string())
    }
}

/// Book instance create/update submission
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    #[validate(required(message = "Book must be specified"))]
    pub book: Option<Uuid>,
    #[validate(length(min = 1, message = "Imprint must be specified"))]
    pub imprint: String,
    #[serde(default)]
    pub status: BookInstanceStatus,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_back: Option<NaiveDate>,
}

impl BookInstanceForm {
    pub fn normalized(self) -> Self {
        Self {
            imprint: normalize_text(&self.imprint),
            ..self
        }
    }

    /// Build the record; callers validate first so `book` is present
    pub fn into_book_instance(self, id: Uuid) -> Option<BookInstance> {
        Some(BookInstance {
            id,
            book: self.book?,
            imprint: self.imprint,
            status: self.status,
            due_back: self.due_back,
        })
    }
}
