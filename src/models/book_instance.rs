//! Book instance (physical copy) model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, present};
use crate::validation::DateInput;

/// Loan state of a copy, stored as its one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl TryFrom<String> for LoanStatus {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        match code.as_str() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("unknown loan status '{}'", other)),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

/// A physical copy of a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: i32,
    #[sqlx(rename = "book_id")]
    pub book: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    #[sqlx(rename = "borrower_id")]
    pub borrower: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: LoanStatus,
    /// Derived from `due_back`, filled in by the service
    #[sqlx(skip)]
    pub is_overdue: bool,
}

impl BookInstance {
    pub fn overdue_on(&self, today: NaiveDate) -> bool {
        self.due_back.is_some_and(|d| d < today)
    }

    pub fn with_overdue(mut self, today: NaiveDate) -> Self {
        self.is_overdue = self.overdue_on(today);
        self
    }
}

/// Create or replace a book instance
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInstancePayload {
    pub book: Option<i32>,
    #[validate(custom(function = "not_blank"), length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    pub imprint: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_back: DateInput,
    pub borrower: Option<i32>,
    #[serde(default)]
    pub status: LoanStatus,
}

/// Partial book instance update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchBookInstance {
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub book: Option<Option<i32>>,
    pub imprint: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_back: Option<DateInput>,
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub borrower: Option<Option<i32>>,
    pub status: Option<LoanStatus>,
}

impl PatchBookInstance {
    pub fn merge(self, current: &BookInstance) -> BookInstancePayload {
        BookInstancePayload {
            book: self.book.unwrap_or(current.book),
            imprint: self.imprint.unwrap_or_else(|| current.imprint.clone()),
            due_back: self.due_back.unwrap_or_else(|| current.due_back.into()),
            borrower: self.borrower.unwrap_or(current.borrower),
            status: self.status.unwrap_or(current.status),
        }
    }
}

/// Book instance list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookInstanceQuery {
    pub book: Option<i32>,
    pub imprint: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookInstanceQuery {
    pub fn page(&self) -> super::Page {
        super::Page {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: 1,
            book: Some(1),
            imprint: "First edition".to_string(),
            due_back,
            borrower: None,
            status: LoanStatus::OnLoan,
            is_overdue: false,
        }
    }

    #[test]
    fn test_overdue_only_strictly_before_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(copy(NaiveDate::from_ymd_opt(2024, 6, 14)).overdue_on(today));
        assert!(!copy(Some(today)).overdue_on(today));
        assert!(!copy(None).overdue_on(today));
        assert!(copy(NaiveDate::from_ymd_opt(2024, 1, 1)).with_overdue(today).is_overdue);
    }

    #[test]
    fn test_status_codes() {
        let status: LoanStatus = serde_json::from_str(r#""o""#).unwrap();
        assert_eq!(status, LoanStatus::OnLoan);
        assert_eq!(serde_json::to_string(&LoanStatus::Reserved).unwrap(), r#""r""#);
        assert_eq!(LoanStatus::try_from("a".to_string()), Ok(LoanStatus::Available));
        assert!(LoanStatus::try_from("x".to_string()).is_err());
        assert_eq!(LoanStatus::default().to_string(), "Maintenance");
    }

    #[test]
    fn test_payload_defaults_to_maintenance() {
        let payload: BookInstancePayload =
            serde_json::from_str(r#"{"imprint": "Penguin", "due_back": "soon"}"#).unwrap();
        assert_eq!(payload.status, LoanStatus::Maintenance);
        assert_eq!(payload.due_back, DateInput::Malformed);
    }

    #[test]
    fn test_patch_clears_borrower() {
        let mut stored = copy(None);
        stored.borrower = Some(4);
        let patch: PatchBookInstance =
            serde_json::from_str(r#"{"borrower": null, "status": "a"}"#).unwrap();
        let merged = patch.merge(&stored);
        assert_eq!(merged.borrower, None);
        assert_eq!(merged.status, LoanStatus::Available);
        assert_eq!(merged.book, Some(1));
    }
}
