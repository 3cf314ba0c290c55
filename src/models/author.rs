//! Author model and related types

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validation::{normalize_text, validate_alphanumeric};

/// Author record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Family, First", or an empty string when either part is missing
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// Birth and death years separated by an en dash, `??` for unknown years
    pub fn lifespan(&self) -> String {
        let year = |date: Option<NaiveDate>| {
            date.map(|d| d.year().to_string())
                .unwrap_or_else(|| "??".to_string())
        };
        format!("{}\u{2013}{}", year(self.date_of_birth), year(self.date_of_death))
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }

    pub fn date_of_birth_iso(&self) -> Option<String> {
        self.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn date_of_death_iso(&self) -> Option<String> {
        self.date_of_death.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Author create/update submission
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_lifespan"))]
pub struct AuthorForm {
    #[validate(
        length(min = 1, max = 100, message = "First name required (at most 100 characters)."),
        custom(function = "validate_alphanumeric")
    )]
    pub first_name: String,
    #[validate(
        length(min = 1, max = 100, message = "Family name required (at most 100 characters)."),
        custom(function = "validate_alphanumeric")
    )]
    pub family_name: String,
    /// ISO 8601 date; an empty string counts as absent
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_death: Option<NaiveDate>,
}

fn validate_lifespan(form: &AuthorForm) -> Result<(), ValidationError> {
    match (form.date_of_birth, form.date_of_death) {
        (Some(born), Some(died)) if died < born => Err(ValidationError::new("lifespan")
            .with_message("Date of death can't be before date of birth".into())),
        _ => Ok(()),
    }
}

impl AuthorForm {
    /// Trimmed and NFC-normalized copy of the submission
    pub fn normalized(self) -> Self {
        Self {
            first_name: normalize_text(&self.first_name),
            family_name: normalize_text(&self.family_name),
            ..self
        }
    }

    pub fn into_author(self, id: Uuid) -> Author {
        Author {
            id,
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}
