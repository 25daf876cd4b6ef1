//! Repository layer for database operations

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod delete_policy;
pub mod genres;
pub mod languages;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::EntityKind,
    validation::{KeyField, KeyValue, RuleViolation, UniquenessGateway, Violations},
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub genres: genres::GenresRepository,
    pub languages: languages::LanguagesRepository,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: genres::GenresRepository::new(pool.clone()),
            languages: languages::LanguagesRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Ids from `ids` that have no row in `kind`'s table
    pub async fn missing_ids(&self, kind: EntityKind, ids: &[i32]) -> AppResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT u.v FROM UNNEST($1::int4[]) AS u(v) \
             WHERE NOT EXISTS (SELECT 1 FROM {} t WHERE t.id = u.v) ORDER BY u.v",
            kind.table()
        );
        let missing: Vec<i32> = sqlx::query_scalar(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(missing)
    }
}

#[async_trait]
impl UniquenessGateway for Repository {
    async fn exists(
        &self,
        kind: EntityKind,
        key: &[KeyField],
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT EXISTS(SELECT 1 FROM ");
        builder.push(kind.table());
        builder.push(" WHERE 1=1");
        for field in key {
            builder.push(" AND ");
            builder.push(field.column);
            builder.push(" = ");
            match &field.value {
                KeyValue::Text(text) => builder.push_bind(text.clone()),
                KeyValue::Id(id) => builder.push_bind(*id),
            };
        }
        if let Some(id) = exclude_id {
            builder.push(" AND id <> ");
            builder.push_bind(id);
        }
        builder.push(")");

        let exists: bool = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(exists)
    }
}

/// Maps a unique-constraint failure to the same violation the rules report.
///
/// Covers the window between the rule check and the write.
pub(crate) fn duplicate_or_db(err: sqlx::Error, kind: EntityKind, fields: &[&'static str]) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            tracing::warn!("Unique constraint hit writing {}: {}", kind, db.message());
            return AppError::Rules(Violations::from(RuleViolation::DuplicateEntity {
                kind,
                fields: fields.to_vec(),
            }));
        }
    }
    AppError::Database(err)
}
