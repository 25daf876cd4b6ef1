//! Genre model and related types

use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, Page};

/// Genre from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    /// Reference to an uploaded image
    pub image: Option<String>,
    pub view_count: i32,
}

/// Create or replace a genre
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenrePayload {
    #[validate(custom(function = "not_blank"), length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub name: String,
    pub image: Option<String>,
}

/// Partial genre update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchGenre {
    pub name: Option<String>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
}

impl PatchGenre {
    /// Overlay onto the stored genre
    pub fn merge(self, current: &Genre) -> GenrePayload {
        GenrePayload {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            image: self.image.unwrap_or_else(|| current.image.clone()),
        }
    }
}

/// Genre list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct GenreQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl GenreQuery {
    pub fn page(&self) -> Page {
        Page {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Genre {
        Genre {
            id: 1,
            name: "Poetry".to_string(),
            image: Some("images/genres/poetry.png".to_string()),
            view_count: 3,
        }
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let patch: PatchGenre = serde_json::from_str(r#"{"name": "Verse"}"#).unwrap();
        let merged = patch.merge(&stored());
        assert_eq!(merged.name, "Verse");
        assert_eq!(merged.image.as_deref(), Some("images/genres/poetry.png"));
    }

    #[test]
    fn test_patch_null_clears_image() {
        let patch: PatchGenre = serde_json::from_str(r#"{"image": null}"#).unwrap();
        let merged = patch.merge(&stored());
        assert_eq!(merged.name, "Poetry");
        assert!(merged.image.is_none());
    }

    #[test]
    fn test_blank_name_refused() {
        let payload = GenrePayload {
            name: "  ".to_string(),
            image: None,
        };
        let errors = crate::error::AppError::from(payload.validate().unwrap_err());
        match errors {
            crate::error::AppError::InvalidFields(fields) => {
                assert_eq!(fields["name"], vec![crate::models::BLANK_MESSAGE.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_name_length_limit() {
        let payload = GenrePayload {
            name: "x".repeat(201),
            image: None,
        };
        assert!(payload.validate().is_err());
    }
}
