//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validation::normalize_text;

/// Genre record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

/// Genre create/update submission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreForm {
    #[validate(length(min = 1, max = 100, message = "Genre name required (at most 100 characters)."))]
    pub name: String,
}

impl GenreForm {
    pub fn normalized(self) -> Self {
        Self {
            name: normalize_text(&self.name),
        }
    }

    pub fn into_genre(self, id: Uuid) -> Genre {
        Genre { id, name: self.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_rejects_blank_and_overlong_names() {
        let expected = "Genre name required (at most 100 characters).";
        for name in ["   ".to_string(), "x".repeat(101)] {
            let form = GenreForm { name }.normalized();
            let errors = form.validate().unwrap_err();
            let field_errors = errors.field_errors();
            let name_errors = field_errors["name"];
            assert_eq!(name_errors[0].message.as_deref(), Some(expected));
        }

        let form = GenreForm {
            name: " Science Fiction ".to_string(),
        }
        .normalized();
        assert!(form.validate().is_ok());
        assert_eq!(form.name, "Science Fiction");
    }
}
