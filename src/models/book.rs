//! Book model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, present, Page};
use crate::validation::{BookCandidate, DateInput};

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    #[sqlx(rename = "author_id")]
    pub author: Option<i32>,
    pub summary: String,
    pub isbn: Option<String>,
    /// Genre ids, ascending
    pub genre: Vec<i32>,
    #[sqlx(rename = "language_id")]
    pub language: Option<i32>,
    pub date_added: Option<NaiveDate>,
    pub published: Option<NaiveDate>,
    pub copies: i32,
    pub loaned_copies: i32,
    pub available_copies: i32,
    pub image: Option<String>,
    pub view_count: i32,
}

/// Create or replace a book
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(custom(function = "not_blank"), length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub title: String,
    pub author: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Ensure this field has no more than 1000 characters."))]
    pub summary: String,
    #[validate(length(max = 13, message = "Ensure this field has no more than 13 characters."))]
    pub isbn: Option<String>,
    #[serde(default)]
    pub genre: Vec<i32>,
    pub language: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_added: DateInput,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub published: DateInput,
    pub copies: i32,
    pub loaned_copies: i32,
    pub available_copies: i32,
    pub image: Option<String>,
}

impl BookPayload {
    pub fn candidate(&self, id: Option<i32>) -> BookCandidate<'_> {
        BookCandidate {
            id,
            title: &self.title,
            author_id: self.author,
            date_added: self.date_added,
            published: self.published,
            copies: self.copies,
            loaned_copies: self.loaned_copies,
            available_copies: self.available_copies,
        }
    }
}

/// Partial book update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchBook {
    pub title: Option<String>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub author: Option<Option<i32>>,
    pub summary: Option<String>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    pub genre: Option<Vec<i32>>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub language: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_added: Option<DateInput>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub published: Option<DateInput>,
    pub copies: Option<i32>,
    pub loaned_copies: Option<i32>,
    pub available_copies: Option<i32>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
}

impl PatchBook {
    /// Overlay onto the stored book
    pub fn merge(self, current: &Book) -> BookPayload {
        BookPayload {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            author: self.author.unwrap_or(current.author),
            summary: self.summary.unwrap_or_else(|| current.summary.clone()),
            isbn: self.isbn.unwrap_or_else(|| current.isbn.clone()),
            genre: self.genre.unwrap_or_else(|| current.genre.clone()),
            language: self.language.unwrap_or(current.language),
            date_added: self.date_added.unwrap_or_else(|| current.date_added.into()),
            published: self.published.unwrap_or_else(|| current.published.into()),
            copies: self.copies.unwrap_or(current.copies),
            loaned_copies: self.loaned_copies.unwrap_or(current.loaned_copies),
            available_copies: self.available_copies.unwrap_or(current.available_copies),
            image: self.image.unwrap_or_else(|| current.image.clone()),
        }
    }
}

/// Values written after the rules pass
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub title: String,
    pub author: Option<i32>,
    pub summary: String,
    pub isbn: Option<String>,
    pub genre: Vec<i32>,
    pub language: Option<i32>,
    pub date_added: Option<NaiveDate>,
    pub published: Option<NaiveDate>,
    pub copies: i32,
    pub loaned_copies: i32,
    pub available_copies: i32,
    pub image: Option<String>,
}

impl From<BookPayload> for BookRecord {
    fn from(p: BookPayload) -> Self {
        let mut genre = p.genre;
        genre.sort_unstable();
        genre.dedup();
        Self {
            title: p.title,
            author: p.author,
            summary: p.summary,
            isbn: p.isbn,
            genre,
            language: p.language,
            date_added: p.date_added.date(),
            published: p.published.date(),
            copies: p.copies,
            loaned_copies: p.loaned_copies,
            available_copies: p.available_copies,
            image: p.image,
        }
    }
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
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

    fn stored() -> Book {
        Book {
            id: 2,
            title: "Book of John".to_string(),
            author: Some(1),
            summary: "Doe".to_string(),
            isbn: None,
            genre: vec![1, 2],
            language: Some(1),
            date_added: NaiveDate::from_ymd_opt(2020, 1, 1),
            published: NaiveDate::from_ymd_opt(2019, 1, 1),
            copies: 3,
            loaned_copies: 0,
            available_copies: 3,
            image: None,
            view_count: 0,
        }
    }

    #[test]
    fn test_patch_changes_language_only() {
        let patch: PatchBook = serde_json::from_str(r#"{"language": 2, "genre": [3, 4]}"#).unwrap();
        let merged = patch.merge(&stored());
        assert_eq!(merged.language, Some(2));
        assert_eq!(merged.genre, vec![3, 4]);
        assert_eq!(merged.author, Some(1));
        assert_eq!(merged.copies, 3);
    }

    #[test]
    fn test_patch_null_author_detaches() {
        let patch: PatchBook = serde_json::from_str(r#"{"author": null}"#).unwrap();
        assert_eq!(patch.merge(&stored()).author, None);
    }

    #[test]
    fn test_record_dedups_genres() {
        let payload: BookPayload = serde_json::from_str(
            r#"{"title": "X", "genre": [4, 1, 4], "copies": 1, "loaned_copies": 0, "available_copies": 1}"#,
        )
        .unwrap();
        let record = BookRecord::from(payload);
        assert_eq!(record.genre, vec![1, 4]);
        assert_eq!(record.summary, "");
    }

    #[test]
    fn test_isbn_limited_to_13_characters() {
        let payload: BookPayload = serde_json::from_str(
            r#"{"title": "X", "isbn": "978-0-00-000000-0", "copies": 1, "loaned_copies": 0, "available_copies": 1}"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
