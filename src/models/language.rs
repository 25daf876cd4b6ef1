//! Language model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, Page};

/// Book language from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
    pub view_count: i32,
}

/// Create or replace a language
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LanguagePayload {
    #[validate(custom(function = "not_blank"), length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    pub name: String,
}

/// Partial language update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchLanguage {
    pub name: Option<String>,
}

impl PatchLanguage {
    pub fn merge(self, current: &Language) -> LanguagePayload {
        LanguagePayload {
            name: self.name.unwrap_or_else(|| current.name.clone()),
        }
    }
}

/// Language list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LanguageQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl LanguageQuery {
    pub fn page(&self) -> Page {
        Page {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
