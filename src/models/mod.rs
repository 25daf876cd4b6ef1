//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::ValidationError;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use book_instance::{BookInstance, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use user::{Group, Profile, User, UserClaims};

/// Every persisted entity kind, with its backing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Genre,
    Language,
    Author,
    Book,
    BookInstance,
    User,
    Group,
    Profile,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Genre => "genres",
            EntityKind::Language => "languages",
            EntityKind::Author => "authors",
            EntityKind::Book => "books",
            EntityKind::BookInstance => "book_instances",
            EntityKind::User => "users",
            EntityKind::Group => "groups",
            EntityKind::Profile => "profiles",
        }
    }

    /// Name used in user-facing messages.
    ///
    /// Language keeps its capitalised verbose name; clients match on these strings.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Genre => "genre",
            EntityKind::Language => "Language",
            EntityKind::Author => "author",
            EntityKind::Book => "book",
            EntityKind::BookInstance => "book instance",
            EntityKind::User => "user",
            EntityKind::Group => "group",
            EntityKind::Profile => "profile",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// `deserialize_with` helper for PATCH fields: present (even as null) becomes `Some`
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub const BLANK_MESSAGE: &str = "This field may not be blank.";

/// `validator` custom rule for required text: empty or whitespace-only is refused
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(BLANK_MESSAGE.into());
        return Err(error);
    }
    Ok(())
}

/// Pagination parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct Page {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Page {
    pub fn number(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn size(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        (self.number() - 1) * self.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Poetry").is_ok());
        for blank in ["", "   ", "\t"] {
            let error = not_blank(blank).unwrap_err();
            assert_eq!(error.message.as_deref(), Some(BLANK_MESSAGE));
        }
    }

    #[test]
    fn test_page_defaults() {
        let page = Page::default();
        assert_eq!(page.number(), 1);
        assert_eq!(page.size(), 20);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_offset_and_bounds() {
        let page = Page {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(page.offset(), 20);

        let page = Page {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(page.number(), 1);
        assert_eq!(page.size(), 200);
    }
}
