//! Per-entity rule checks

use std::sync::Arc;

use chrono::NaiveDate;

use super::{
    dates::{check_date_field, check_date_order},
    uniqueness::check_unique,
    Clock, DateInput, KeyField, RuleViolation, UniquenessGateway, Violations,
};
use crate::{
    error::{AppError, AppResult},
    models::EntityKind,
};

/// Author fields the rules look at
#[derive(Debug, Clone)]
pub struct AuthorCandidate<'a> {
    /// Set when updating an existing author
    pub id: Option<i32>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: DateInput,
    pub date_of_death: DateInput,
}

/// Book fields the rules look at
#[derive(Debug, Clone)]
pub struct BookCandidate<'a> {
    pub id: Option<i32>,
    pub title: &'a str,
    pub author_id: Option<i32>,
    pub date_added: DateInput,
    pub published: DateInput,
    pub copies: i32,
    pub loaned_copies: i32,
    pub available_copies: i32,
}

/// Genre or language: only the name is constrained
#[derive(Debug, Clone)]
pub struct NameCandidate<'a> {
    pub id: Option<i32>,
    pub name: &'a str,
}

/// Runs the catalog rules against a clock and the stored rows
#[derive(Clone)]
pub struct CatalogRules {
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn UniquenessGateway>,
}

impl CatalogRules {
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<dyn UniquenessGateway>) -> Self {
        Self { clock, gateway }
    }

    /// Birth and death dates, then the (first_name, last_name) key
    pub async fn check_author(&self, author: &AuthorCandidate<'_>) -> AppResult<()> {
        let today = self.clock.today();
        let mut violations = Violations::default();

        check_date_field("date_of_birth", author.date_of_birth, today, &mut violations);
        check_date_field("date_of_death", author.date_of_death, today, &mut violations);
        check_date_order(
            ("date_of_birth", author.date_of_birth),
            ("date_of_death", author.date_of_death),
            &mut violations,
        );

        let key = [
            KeyField::text("first_name", author.first_name),
            KeyField::text("last_name", author.last_name),
        ];
        self.check_key(EntityKind::Author, &key, author.id, &mut violations)
            .await?;

        finish(violations)
    }

    /// Dates, then copy accounting, then the (title, author) key
    pub async fn check_book(&self, book: &BookCandidate<'_>) -> AppResult<()> {
        let today = self.clock.today();
        let mut violations = Violations::default();

        check_date_field("date_added", book.date_added, today, &mut violations);
        check_date_field("published", book.published, today, &mut violations);
        check_date_order(
            ("published", book.published),
            ("date_added", book.date_added),
            &mut violations,
        );

        if i64::from(book.copies) != i64::from(book.loaned_copies) + i64::from(book.available_copies) {
            violations.push(RuleViolation::InvalidCopyAccounting);
        }

        // A book without an author never collides, like NULL in the unique constraint.
        if let Some(author_id) = book.author_id {
            let key = [
                KeyField::text("title", book.title),
                KeyField::id("author", "author_id", author_id),
            ];
            self.check_key(EntityKind::Book, &key, book.id, &mut violations)
                .await?;
        }

        finish(violations)
    }

    /// Copies may be due back on any date; only the format is checked
    pub fn check_book_instance(&self, due_back: DateInput) -> AppResult<()> {
        let mut violations = Violations::default();
        if due_back == DateInput::Malformed {
            violations.push(RuleViolation::MalformedDate { field: "due_back" });
        }
        finish(violations)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn check_genre(&self, genre: &NameCandidate<'_>) -> AppResult<()> {
        self.check_name(EntityKind::Genre, genre).await
    }

    pub async fn check_language(&self, language: &NameCandidate<'_>) -> AppResult<()> {
        self.check_name(EntityKind::Language, language).await
    }

    async fn check_name(&self, kind: EntityKind, candidate: &NameCandidate<'_>) -> AppResult<()> {
        let mut violations = Violations::default();
        let key = [KeyField::text("name", candidate.name)];
        self.check_key(kind, &key, candidate.id, &mut violations)
            .await?;
        finish(violations)
    }

    async fn check_key(
        &self,
        kind: EntityKind,
        key: &[KeyField],
        exclude_id: Option<i32>,
        violations: &mut Violations,
    ) -> AppResult<()> {
        if let Some(v) = check_unique(self.gateway.as_ref(), kind, key, exclude_id).await? {
            violations.push(v);
        }
        Ok(())
    }
}

fn finish(violations: Violations) -> AppResult<()> {
    violations.into_result().map_err(AppError::Rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{clock::MockClock, uniqueness::testing::InMemoryKeys, ViolationKind};
    use tokio_test::{assert_err, assert_ok};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock_at(today: NaiveDate) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_today().return_const(today);
        Arc::new(clock)
    }

    fn rules_with(keys: Arc<InMemoryKeys>) -> CatalogRules {
        CatalogRules::new(clock_at(date(2024, 6, 15)), keys)
    }

    fn kinds(result: AppResult<()>) -> Vec<ViolationKind> {
        match result {
            Err(AppError::Rules(v)) => v.kinds(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => vec![],
        }
    }

    fn author<'a>(first: &'a str, last: &'a str) -> AuthorCandidate<'a> {
        AuthorCandidate {
            id: None,
            first_name: first,
            last_name: last,
            date_of_birth: DateInput::Absent,
            date_of_death: DateInput::Absent,
        }
    }

    fn book(title: &str) -> BookCandidate<'_> {
        BookCandidate {
            id: None,
            title,
            author_id: Some(1),
            date_added: DateInput::Valid(date(2020, 1, 1)),
            published: DateInput::Valid(date(2019, 1, 1)),
            copies: 3,
            loaned_copies: 0,
            available_copies: 3,
        }
    }

    #[tokio::test]
    async fn test_author_future_dates() {
        let rules = rules_with(Arc::default());
        let mut candidate = author("Ada", "Lovelace");
        candidate.date_of_birth = DateInput::Valid(date(2024, 6, 16));
        candidate.date_of_death = DateInput::Valid(date(2030, 1, 1));

        assert_eq!(
            kinds(rules.check_author(&candidate).await),
            vec![ViolationKind::InvalidDateLogic, ViolationKind::InvalidDateLogic]
        );
    }

    #[tokio::test]
    async fn test_author_death_before_birth() {
        let rules = rules_with(Arc::default());
        let mut candidate = author("Ada", "Lovelace");
        candidate.date_of_birth = DateInput::Valid(date(1900, 1, 1));
        candidate.date_of_death = DateInput::Valid(date(1899, 12, 31));
        assert_eq!(
            kinds(rules.check_author(&candidate).await),
            vec![ViolationKind::InconsistentDateOrder]
        );

        candidate.date_of_death = DateInput::Valid(date(1900, 1, 1));
        assert_ok!(rules.check_author(&candidate).await);
    }

    #[tokio::test]
    async fn test_author_malformed_date_suppresses_order_check() {
        let rules = rules_with(Arc::default());
        let mut candidate = author("Ada", "Lovelace");
        candidate.date_of_birth = DateInput::Malformed;
        candidate.date_of_death = DateInput::Valid(date(1800, 1, 1));
        assert_eq!(
            kinds(rules.check_author(&candidate).await),
            vec![ViolationKind::MalformedDate]
        );
    }

    #[tokio::test]
    async fn test_duplicate_author_then_self_exclusion() {
        let keys = Arc::new(InMemoryKeys::default());
        let rules = rules_with(keys.clone());

        let mut john = author("John", "Doe");
        john.date_of_birth = DateInput::Valid(date(1970, 1, 1));
        john.date_of_death = DateInput::Valid(date(2020, 1, 1));
        assert_ok!(rules.check_author(&john).await);
        keys.insert(
            EntityKind::Author,
            1,
            vec![
                KeyField::text("first_name", "John"),
                KeyField::text("last_name", "Doe"),
            ],
        );

        let second = author("John", "Doe");
        let result = rules.check_author(&second).await;
        assert_eq!(kinds(result), vec![ViolationKind::DuplicateEntity]);

        // Updating the stored row with its own values is not a duplicate.
        john.id = Some(1);
        assert_ok!(rules.check_author(&john).await);

        // Names compare case-sensitively.
        assert_ok!(rules.check_author(&author("john", "Doe")).await);
    }

    #[tokio::test]
    async fn test_book_copy_accounting() {
        let rules = rules_with(Arc::default());
        let mut candidate = book("X");
        candidate.copies = 3;
        candidate.loaned_copies = 1;
        candidate.available_copies = 1;
        assert_eq!(
            kinds(rules.check_book(&candidate).await),
            vec![ViolationKind::InvalidCopyAccounting]
        );

        candidate.available_copies = 2;
        assert_ok!(rules.check_book(&candidate).await);
    }

    #[tokio::test]
    async fn test_book_published_in_future() {
        let rules = rules_with(Arc::default());
        let mut candidate = book("X");
        candidate.date_added = DateInput::Absent;
        candidate.published = DateInput::Valid(date(2031, 1, 1));
        assert_eq!(
            kinds(rules.check_book(&candidate).await),
            vec![ViolationKind::InvalidDateLogic]
        );
    }

    #[tokio::test]
    async fn test_book_published_after_added() {
        let rules = rules_with(Arc::default());
        let mut candidate = book("X");
        candidate.date_added = DateInput::Valid(date(2020, 1, 1));
        candidate.published = DateInput::Valid(date(2021, 1, 1));
        assert_eq!(
            kinds(rules.check_book(&candidate).await),
            vec![ViolationKind::InconsistentDateOrder]
        );
    }

    #[tokio::test]
    async fn test_book_violations_accumulate_in_order() {
        let keys = Arc::new(InMemoryKeys::default());
        keys.insert(
            EntityKind::Book,
            9,
            vec![
                KeyField::text("title", "X"),
                KeyField::id("author", "author_id", 1),
            ],
        );
        let rules = rules_with(keys);

        let mut candidate = book("X");
        candidate.date_added = DateInput::Malformed;
        candidate.published = DateInput::Valid(date(2030, 1, 1));
        candidate.copies = 10;

        assert_eq!(
            kinds(rules.check_book(&candidate).await),
            vec![
                ViolationKind::MalformedDate,
                ViolationKind::InvalidDateLogic,
                ViolationKind::InvalidCopyAccounting,
                ViolationKind::DuplicateEntity,
            ]
        );
    }

    #[tokio::test]
    async fn test_book_key_is_title_and_author() {
        let keys = Arc::new(InMemoryKeys::default());
        keys.insert(
            EntityKind::Book,
            9,
            vec![
                KeyField::text("title", "X"),
                KeyField::id("author", "author_id", 1),
            ],
        );
        let rules = rules_with(keys);

        let mut other_author = book("X");
        other_author.author_id = Some(2);
        assert_ok!(rules.check_book(&other_author).await);

        let mut no_author = book("X");
        no_author.author_id = None;
        assert_ok!(rules.check_book(&no_author).await);

        assert_err!(rules.check_book(&book("X")).await);

        // Re-validating book 9 against its own stored key
        let mut same_row = book("X");
        same_row.id = Some(9);
        assert_ok!(rules.check_book(&same_row).await);
    }

    #[test]
    fn test_book_instance_due_back() {
        let rules = rules_with(Arc::default());
        assert_ok!(rules.check_book_instance(DateInput::Valid(date(2099, 1, 1))));
        assert_ok!(rules.check_book_instance(DateInput::Absent));
        assert_eq!(
            kinds(rules.check_book_instance(DateInput::Malformed)),
            vec![ViolationKind::MalformedDate]
        );
    }

    #[tokio::test]
    async fn test_genre_and_language_names() {
        let keys = Arc::new(InMemoryKeys::default());
        keys.insert(EntityKind::Genre, 1, vec![KeyField::text("name", "Poetry")]);
        let rules = rules_with(keys);

        let duplicate = NameCandidate { id: None, name: "Poetry" };
        assert_eq!(
            kinds(rules.check_genre(&duplicate).await),
            vec![ViolationKind::DuplicateEntity]
        );

        let renamed_self = NameCandidate { id: Some(1), name: "Poetry" };
        assert_ok!(rules.check_genre(&renamed_self).await);

        assert_ok!(rules.check_genre(&NameCandidate { id: None, name: "poetry" }).await);

        // Genres and languages keep separate name spaces.
        assert_ok!(rules.check_language(&duplicate).await);
    }
}
