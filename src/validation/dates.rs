//! Date input parsing and the date-not-in-future check

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::{RuleViolation, Violations};

/// A date field as received from a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateInput {
    #[default]
    Absent,
    Valid(NaiveDate),
    /// Present but not a `YYYY-MM-DD` date
    Malformed,
}

impl DateInput {
    /// Blank strings count as absent.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => DateInput::Absent,
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(DateInput::Valid)
                .unwrap_or(DateInput::Malformed),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateInput::Valid(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<Option<NaiveDate>> for DateInput {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map(DateInput::Valid).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for DateInput {
    /// Never fails: anything other than null or a `YYYY-MM-DD` string is malformed.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(serde_json::Value::Null) => DateInput::Absent,
            Some(serde_json::Value::String(s)) => DateInput::parse(Some(&s)),
            Some(_) => DateInput::Malformed,
        })
    }
}

/// Fails when `date` lies after `today`. Absent dates pass.
pub fn validate_date_not_in_future(
    field: &'static str,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), RuleViolation> {
    match date {
        Some(d) if d > today => Err(RuleViolation::InvalidDateLogic { field }),
        _ => Ok(()),
    }
}

/// Records a format error or a future date for one field
pub(crate) fn check_date_field(
    field: &'static str,
    input: DateInput,
    today: NaiveDate,
    violations: &mut Violations,
) {
    match input {
        DateInput::Malformed => violations.push(RuleViolation::MalformedDate { field }),
        other => {
            if let Err(v) = validate_date_not_in_future(field, other.date(), today) {
                violations.push(v);
            }
        }
    }
}

/// Records an order violation when `later` precedes `earlier`.
///
/// Skipped unless both fields parsed.
pub(crate) fn check_date_order(
    earlier: (&'static str, DateInput),
    later: (&'static str, DateInput),
    violations: &mut Violations,
) {
    if let (Some(e), Some(l)) = (earlier.1.date(), later.1.date()) {
        if l < e {
            violations.push(RuleViolation::InconsistentDateOrder {
                earlier: earlier.0,
                later: later.0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_input() {
        assert_eq!(DateInput::parse(None), DateInput::Absent);
        assert_eq!(DateInput::parse(Some("  ")), DateInput::Absent);
        assert_eq!(
            DateInput::parse(Some("2020-01-31")),
            DateInput::Valid(date(2020, 1, 31))
        );
        assert_eq!(DateInput::parse(Some("31/01/2020")), DateInput::Malformed);
        assert_eq!(DateInput::parse(Some("2020-02-30")), DateInput::Malformed);
    }

    #[test]
    fn test_deserialize_date_input() {
        let parsed: Vec<DateInput> =
            serde_json::from_str(r#"[null, "1970-01-01", "yesterday", 19700101]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                DateInput::Absent,
                DateInput::Valid(date(1970, 1, 1)),
                DateInput::Malformed,
                DateInput::Malformed,
            ]
        );
    }

    #[test]
    fn test_future_dates_rejected() {
        let today = date(2024, 6, 15);
        for d in [date(2024, 6, 16), date(2031, 1, 1), date(2100, 12, 31)] {
            assert_eq!(
                validate_date_not_in_future("published", Some(d), today),
                Err(RuleViolation::InvalidDateLogic { field: "published" })
            );
        }
    }

    #[test]
    fn test_past_and_present_dates_accepted() {
        let today = date(2024, 6, 15);
        for d in [today, date(2024, 6, 14), date(1970, 1, 1)] {
            assert!(validate_date_not_in_future("date_of_birth", Some(d), today).is_ok());
        }
        assert!(validate_date_not_in_future("date_of_birth", None, today).is_ok());
    }

    #[test]
    fn test_malformed_date_skips_future_check() {
        let mut violations = Violations::default();
        check_date_field("date_added", DateInput::Malformed, date(2024, 1, 1), &mut violations);
        assert_eq!(violations.kinds(), vec![ViolationKind::MalformedDate]);
    }

    #[test]
    fn test_order_check_needs_both_dates() {
        let mut violations = Violations::default();
        check_date_order(
            ("date_of_birth", DateInput::Malformed),
            ("date_of_death", DateInput::Valid(date(1900, 1, 1))),
            &mut violations,
        );
        check_date_order(
            ("date_of_birth", DateInput::Absent),
            ("date_of_death", DateInput::Valid(date(1900, 1, 1))),
            &mut violations,
        );
        assert!(violations.is_empty());

        check_date_order(
            ("date_of_birth", DateInput::Valid(date(1950, 1, 1))),
            ("date_of_death", DateInput::Valid(date(1900, 1, 1))),
            &mut violations,
        );
        assert_eq!(violations.kinds(), vec![ViolationKind::InconsistentDateOrder]);
    }

    #[test]
    fn test_same_day_is_not_out_of_order() {
        let mut violations = Violations::default();
        let d = DateInput::Valid(date(2000, 5, 5));
        check_date_order(("published", d), ("date_added", d), &mut violations);
        assert!(violations.is_empty());
    }
}
