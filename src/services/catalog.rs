//! Catalog management service
//!
//! Every write goes through the same sequence: field validation, reference
//! checks, the catalog rules, then the repository.

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{
        author::{AuthorPayload, AuthorQuery, AuthorRecord, PatchAuthor},
        book::{BookPayload, BookQuery, BookRecord, PatchBook},
        book_instance::{BookInstancePayload, BookInstanceQuery, PatchBookInstance},
        genre::{GenrePayload, GenreQuery, PatchGenre},
        language::{LanguagePayload, LanguageQuery, PatchLanguage},
        Author, Book, BookInstance, EntityKind, Genre, Language,
    },
    repository::{book_instances::BookInstanceRecord, Repository},
    validation::{CatalogRules, Clock, NameCandidate},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    rules: CatalogRules,
}

impl CatalogService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        let rules = CatalogRules::new(clock, Arc::new(repository.clone()));
        Self { repository, rules }
    }

    /// Database reachability, for the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    // =========================================================================
    // Genres
    // =========================================================================

    pub async fn list_genres(&self, query: &GenreQuery) -> AppResult<(Vec<Genre>, i64)> {
        self.repository.genres.list(query).await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, data: GenrePayload) -> AppResult<Genre> {
        data.validate()?;
        self.rules
            .check_genre(&NameCandidate { id: None, name: &data.name })
            .await?;
        let genre = self.repository.genres.create(&data).await?;
        tracing::info!("Created genre {} ({})", genre.name, genre.id);
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i32, data: GenrePayload) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await?;
        data.validate()?;
        self.rules
            .check_genre(&NameCandidate { id: Some(id), name: &data.name })
            .await?;
        self.repository.genres.update(id, &data).await
    }

    pub async fn patch_genre(&self, id: i32, patch: PatchGenre) -> AppResult<Genre> {
        let current = self.repository.genres.get_by_id(id).await?;
        self.update_genre(id, patch.merge(&current)).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }

    /// Used by bulk generation to skip names already taken
    pub async fn genre_name_exists(&self, name: &str) -> AppResult<bool> {
        self.repository.genres.name_exists(name).await
    }

    // =========================================================================
    // Languages
    // =========================================================================

    pub async fn list_languages(&self, query: &LanguageQuery) -> AppResult<(Vec<Language>, i64)> {
        self.repository.languages.list(query).await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, data: LanguagePayload) -> AppResult<Language> {
        data.validate()?;
        self.rules
            .check_language(&NameCandidate { id: None, name: &data.name })
            .await?;
        let language = self.repository.languages.create(&data).await?;
        tracing::info!("Created language {} ({})", language.name, language.id);
        Ok(language)
    }

    pub async fn update_language(&self, id: i32, data: LanguagePayload) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await?;
        data.validate()?;
        self.rules
            .check_language(&NameCandidate { id: Some(id), name: &data.name })
            .await?;
        self.repository.languages.update(id, &data).await
    }

    pub async fn patch_language(&self, id: i32, patch: PatchLanguage) -> AppResult<Language> {
        let current = self.repository.languages.get_by_id(id).await?;
        self.update_language(id, patch.merge(&current)).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages.delete(id).await
    }

    pub async fn language_name_exists(&self, name: &str) -> AppResult<bool> {
        self.repository.languages.name_exists(name).await
    }

    // =========================================================================
    // Authors
    // =========================================================================

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(query).await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, data: AuthorPayload) -> AppResult<Author> {
        data.validate()?;
        self.rules.check_author(&data.candidate(None)).await?;
        let author = self
            .repository
            .authors
            .create(&AuthorRecord::from(data))
            .await?;
        tracing::info!("Created author {} ({})", author.display_name(), author.id);
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, data: AuthorPayload) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await?;
        data.validate()?;
        self.rules.check_author(&data.candidate(Some(id))).await?;
        self.repository
            .authors
            .update(id, &AuthorRecord::from(data))
            .await
    }

    pub async fn patch_author(&self, id: i32, patch: PatchAuthor) -> AppResult<Author> {
        let current = self.repository.authors.get_by_id(id).await?;
        self.update_author(id, patch.merge(&current)).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // =========================================================================
    // Books
    // =========================================================================

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.list(query).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, data: BookPayload) -> AppResult<Book> {
        self.check_book_input(&data).await?;
        self.rules.check_book(&data.candidate(None)).await?;
        let book = self.repository.books.create(&BookRecord::from(data)).await?;
        tracing::info!("Created book {} ({})", book.title, book.id);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, data: BookPayload) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;
        self.check_book_input(&data).await?;
        self.rules.check_book(&data.candidate(Some(id))).await?;
        self.repository
            .books
            .update(id, &BookRecord::from(data))
            .await
    }

    pub async fn patch_book(&self, id: i32, patch: PatchBook) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;
        self.update_book(id, patch.merge(&current)).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    async fn check_book_input(&self, data: &BookPayload) -> AppResult<()> {
        data.validate()?;
        self.check_references(&[
            ("author", EntityKind::Author, data.author.into_iter().collect()),
            ("language", EntityKind::Language, data.language.into_iter().collect()),
            ("genre", EntityKind::Genre, data.genre.clone()),
        ])
        .await
    }

    // =========================================================================
    // Book instances
    // =========================================================================

    pub async fn list_book_instances(
        &self,
        query: &BookInstanceQuery,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let today = self.rules.today();
        let (rows, total) = self.repository.book_instances.list(query).await?;
        let rows = rows.into_iter().map(|c| c.with_overdue(today)).collect();
        Ok((rows, total))
    }

    pub async fn get_book_instance(&self, id: i32) -> AppResult<BookInstance> {
        let copy = self.repository.book_instances.get_by_id(id).await?;
        Ok(copy.with_overdue(self.rules.today()))
    }

    pub async fn create_book_instance(&self, data: BookInstancePayload) -> AppResult<BookInstance> {
        let record = self.check_book_instance_input(data).await?;
        let copy = self.repository.book_instances.create(&record).await?;
        tracing::info!("Created book instance {} ({})", copy.imprint, copy.id);
        Ok(copy.with_overdue(self.rules.today()))
    }

    pub async fn update_book_instance(
        &self,
        id: i32,
        data: BookInstancePayload,
    ) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await?;
        let record = self.check_book_instance_input(data).await?;
        let copy = self.repository.book_instances.update(id, &record).await?;
        Ok(copy.with_overdue(self.rules.today()))
    }

    pub async fn patch_book_instance(
        &self,
        id: i32,
        patch: PatchBookInstance,
    ) -> AppResult<BookInstance> {
        let current = self.repository.book_instances.get_by_id(id).await?;
        self.update_book_instance(id, patch.merge(&current)).await
    }

    pub async fn delete_book_instance(&self, id: i32) -> AppResult<()> {
        self.repository.book_instances.delete(id).await
    }

    async fn check_book_instance_input(
        &self,
        data: BookInstancePayload,
    ) -> AppResult<BookInstanceRecord> {
        data.validate()?;
        self.check_references(&[
            ("book", EntityKind::Book, data.book.into_iter().collect()),
            ("borrower", EntityKind::User, data.borrower.into_iter().collect()),
        ])
        .await?;
        self.rules.check_book_instance(data.due_back)?;
        Ok(BookInstanceRecord {
            book: data.book,
            imprint: data.imprint,
            due_back: data.due_back.date(),
            borrower: data.borrower,
            status: data.status,
        })
    }

    /// Rejects ids that point at no row, one message per missing id
    async fn check_references(&self, refs: &[(&str, EntityKind, Vec<i32>)]) -> AppResult<()> {
        let mut fields = FieldErrors::new();
        for (field, kind, ids) in refs {
            for id in self.repository.missing_ids(*kind, ids).await? {
                fields
                    .entry(field.to_string())
                    .or_default()
                    .push(invalid_pk_message(id));
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(fields))
        }
    }
}

pub(crate) fn invalid_pk_message(id: i32) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pk_message() {
        assert_eq!(invalid_pk_message(42), "Invalid pk \"42\" - object does not exist.");
    }
}
