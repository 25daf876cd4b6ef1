//! Catalog rule engine.
//!
//! Checks run once per create or update, before anything is written. Every
//! violation found in a pass is collected so the API can report all offending
//! fields in one response. The engine only reads from storage through
//! [`UniquenessGateway`] and only learns the date through [`Clock`].

pub mod clock;
pub mod dates;
pub mod rules;
pub mod uniqueness;

use std::fmt;

use crate::{error::FieldErrors, models::EntityKind};

pub use clock::{Clock, SystemClock};
pub use dates::{validate_date_not_in_future, DateInput};
pub use rules::{AuthorCandidate, BookCandidate, CatalogRules, NameCandidate};
pub use uniqueness::{KeyField, KeyValue, UniquenessGateway};

pub const FUTURE_DATE_MESSAGE: &str =
    "Invalid date logic declaration! Check the dates and reconfigure them accordingly!";
pub const DATE_ORDER_MESSAGE: &str =
    "Incorrect date logic assignment! Check how the dates are set and reconfigure them accordingly!";
pub const COPY_ACCOUNTING_MESSAGE: &str =
    "Incorrect values. Total copies should match the aggregate of available and loaned copies";
pub const MALFORMED_DATE_MESSAGE: &str =
    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Key under which violations spanning a composite key are reported
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MalformedDate,
    InvalidDateLogic,
    InconsistentDateOrder,
    InvalidCopyAccounting,
    DuplicateEntity,
}

/// A single broken catalog rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Input could not be read as a date
    MalformedDate { field: &'static str },
    /// Date lies after today
    InvalidDateLogic { field: &'static str },
    /// `later` precedes `earlier`
    InconsistentDateOrder {
        earlier: &'static str,
        later: &'static str,
    },
    /// copies != loaned_copies + available_copies
    InvalidCopyAccounting,
    /// Another row already holds the same key
    DuplicateEntity {
        kind: EntityKind,
        fields: Vec<&'static str>,
    },
}

impl RuleViolation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            RuleViolation::MalformedDate { .. } => ViolationKind::MalformedDate,
            RuleViolation::InvalidDateLogic { .. } => ViolationKind::InvalidDateLogic,
            RuleViolation::InconsistentDateOrder { .. } => ViolationKind::InconsistentDateOrder,
            RuleViolation::InvalidCopyAccounting => ViolationKind::InvalidCopyAccounting,
            RuleViolation::DuplicateEntity { .. } => ViolationKind::DuplicateEntity,
        }
    }

    /// Field names the message is reported under
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            RuleViolation::MalformedDate { field } | RuleViolation::InvalidDateLogic { field } => {
                vec![*field]
            }
            RuleViolation::InconsistentDateOrder { earlier, later } => vec![*earlier, *later],
            RuleViolation::InvalidCopyAccounting => {
                vec!["copies", "loaned_copies", "available_copies"]
            }
            RuleViolation::DuplicateEntity { fields, .. } => match fields.as_slice() {
                [single] => vec![*single],
                _ => vec![NON_FIELD_ERRORS],
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            RuleViolation::MalformedDate { .. } => MALFORMED_DATE_MESSAGE.to_string(),
            RuleViolation::InvalidDateLogic { .. } => FUTURE_DATE_MESSAGE.to_string(),
            RuleViolation::InconsistentDateOrder { .. } => DATE_ORDER_MESSAGE.to_string(),
            RuleViolation::InvalidCopyAccounting => COPY_ACCOUNTING_MESSAGE.to_string(),
            RuleViolation::DuplicateEntity { kind, fields } => match fields.as_slice() {
                [single] => format!("{} with this {} already exists.", kind.label(), single),
                _ => format!("The fields {} must make a unique set.", fields.join(", ")),
            },
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.fields().join(", "), self.message())
    }
}

impl std::error::Error for RuleViolation {}

/// Ordered collection of violations from one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<RuleViolation>);

impl Violations {
    pub fn push(&mut self, violation: RuleViolation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleViolation> {
        self.0.iter()
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.0.iter().map(RuleViolation::kind).collect()
    }

    pub fn contains(&self, kind: ViolationKind) -> bool {
        self.0.iter().any(|v| v.kind() == kind)
    }

    /// Ok when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Field name to messages, keeping check order
    pub fn field_messages(&self) -> FieldErrors {
        let mut out = FieldErrors::new();
        for violation in &self.0 {
            let message = violation.message();
            for field in violation.fields() {
                out.entry(field.to_string()).or_default().push(message.clone());
            }
        }
        out
    }
}

impl From<RuleViolation> for Violations {
    fn from(violation: RuleViolation) -> Self {
        Violations(vec![violation])
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field_duplicate_message() {
        let genre = RuleViolation::DuplicateEntity {
            kind: EntityKind::Genre,
            fields: vec!["name"],
        };
        assert_eq!(genre.message(), "genre with this name already exists.");
        assert_eq!(genre.fields(), vec!["name"]);

        let language = RuleViolation::DuplicateEntity {
            kind: EntityKind::Language,
            fields: vec!["name"],
        };
        assert_eq!(language.message(), "Language with this name already exists.");
    }

    #[test]
    fn test_composite_duplicate_message() {
        let author = RuleViolation::DuplicateEntity {
            kind: EntityKind::Author,
            fields: vec!["first_name", "last_name"],
        };
        assert_eq!(
            author.message(),
            "The fields first_name, last_name must make a unique set."
        );
        assert_eq!(author.fields(), vec![NON_FIELD_ERRORS]);
    }

    #[test]
    fn test_field_messages_keep_check_order() {
        let mut violations = Violations::default();
        violations.push(RuleViolation::InvalidDateLogic {
            field: "date_of_death",
        });
        violations.push(RuleViolation::InconsistentDateOrder {
            earlier: "date_of_birth",
            later: "date_of_death",
        });

        let fields = violations.field_messages();
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["date_of_death", "date_of_birth"]);
        assert_eq!(
            fields["date_of_death"],
            vec![FUTURE_DATE_MESSAGE.to_string(), DATE_ORDER_MESSAGE.to_string()]
        );
        assert_eq!(fields["date_of_birth"], vec![DATE_ORDER_MESSAGE.to_string()]);
    }

    #[test]
    fn test_copy_accounting_reported_on_all_counts() {
        let fields = Violations::from(RuleViolation::InvalidCopyAccounting).field_messages();
        assert_eq!(fields.len(), 3);
        assert!(fields.values().all(|m| m == &vec![COPY_ACCOUNTING_MESSAGE.to_string()]));
    }

    #[test]
    fn test_empty_violations_into_ok() {
        assert!(Violations::default().into_result().is_ok());
        assert!(Violations::from(RuleViolation::InvalidCopyAccounting)
            .into_result()
            .is_err());
    }
}
