//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, present, Page};
use crate::validation::{AuthorCandidate, DateInput};

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub image: Option<String>,
    pub about_the_author: Option<String>,
    pub view_count: i32,
}

impl Author {
    /// "Last, First", the form used in listings and job reports
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Create or replace an author
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorPayload {
    #[validate(custom(function = "not_blank"), length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"), length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: DateInput,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_death: DateInput,
    pub image: Option<String>,
    #[validate(length(max = 1000, message = "Ensure this field has no more than 1000 characters."))]
    pub about_the_author: Option<String>,
}

impl AuthorPayload {
    /// View checked by the rule engine; `id` is the row being replaced
    pub fn candidate(&self, id: Option<i32>) -> AuthorCandidate<'_> {
        AuthorCandidate {
            id,
            first_name: &self.first_name,
            last_name: &self.last_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

/// Partial author update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchAuthor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<DateInput>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_death: Option<DateInput>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub about_the_author: Option<Option<String>>,
}

impl PatchAuthor {
    /// Overlay onto the stored author
    pub fn merge(self, current: &Author) -> AuthorPayload {
        AuthorPayload {
            first_name: self.first_name.unwrap_or_else(|| current.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| current.last_name.clone()),
            date_of_birth: self
                .date_of_birth
                .unwrap_or_else(|| current.date_of_birth.into()),
            date_of_death: self
                .date_of_death
                .unwrap_or_else(|| current.date_of_death.into()),
            image: self.image.unwrap_or_else(|| current.image.clone()),
            about_the_author: self
                .about_the_author
                .unwrap_or_else(|| current.about_the_author.clone()),
        }
    }
}

/// Values written after the rules pass
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub image: Option<String>,
    pub about_the_author: Option<String>,
}

impl From<AuthorPayload> for AuthorRecord {
    fn from(p: AuthorPayload) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            date_of_birth: p.date_of_birth.date(),
            date_of_death: p.date_of_death.date(),
            image: p.image,
            about_the_author: p.about_the_author,
        }
    }
}

/// Author list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuthorQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AuthorQuery {
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

    fn stored() -> Author {
        Author {
            id: 5,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1970, 1, 1),
            date_of_death: NaiveDate::from_ymd_opt(2020, 1, 1),
            image: None,
            about_the_author: Some("Wrote things".to_string()),
            view_count: 0,
        }
    }

    #[test]
    fn test_payload_reads_dates_leniently() {
        let payload: AuthorPayload = serde_json::from_str(
            r#"{"first_name": "A", "last_name": "B", "date_of_birth": "12-12-2000"}"#,
        )
        .unwrap();
        assert_eq!(payload.date_of_birth, DateInput::Malformed);
        assert_eq!(payload.date_of_death, DateInput::Absent);
    }

    #[test]
    fn test_patch_merges_over_stored_author() {
        let patch: PatchAuthor =
            serde_json::from_str(r#"{"last_name": "Roe", "date_of_death": null}"#).unwrap();
        let merged = patch.merge(&stored());

        assert_eq!(merged.first_name, "John");
        assert_eq!(merged.last_name, "Roe");
        assert_eq!(merged.date_of_birth, DateInput::Valid(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()));
        assert_eq!(merged.date_of_death, DateInput::Absent);
        assert_eq!(merged.about_the_author.as_deref(), Some("Wrote things"));
    }

    #[test]
    fn test_candidate_carries_update_id() {
        let payload = PatchAuthor::default().merge(&stored());
        let candidate = payload.candidate(Some(5));
        assert_eq!(candidate.id, Some(5));
        assert_eq!(candidate.first_name, "John");
    }

    fn messages(errors: &validator::ValidationErrors, field: &str) -> Vec<String> {
        errors.field_errors()[field]
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_and_long_names_get_distinct_messages() {
        let payload: AuthorPayload =
            serde_json::from_str(r#"{"first_name": "", "last_name": "Doe"}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(messages(&errors, "first_name"), vec![crate::models::BLANK_MESSAGE]);
        assert!(!errors.field_errors().contains_key("last_name"));

        let payload = AuthorPayload {
            first_name: "x".repeat(51),
            ..PatchAuthor::default().merge(&stored())
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(
            messages(&errors, "first_name"),
            vec!["Ensure this field has no more than 50 characters."]
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(stored().display_name(), "Doe, John");
    }
}
