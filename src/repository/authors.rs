//! Authors repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{delete_policy, duplicate_or_db};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::{AuthorQuery, AuthorRecord},
        Author, EntityKind,
    },
};

const AUTHOR_KEY: &[&str] = &["first_name", "last_name"];

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List authors ordered by last name, then first name
    pub async fn list(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, i64)> {
        let page = query.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM authors WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM authors WHERE 1=1");
        for builder in [&mut count, &mut select] {
            if let Some(first_name) = &query.first_name {
                builder.push(" AND first_name = ").push_bind(first_name.clone());
            }
            if let Some(last_name) = &query.last_name {
                builder.push(" AND last_name = ").push_bind(last_name.clone());
            }
        }
        select
            .push(" ORDER BY last_name, first_name, id LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows = select.build_query_as::<Author>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    pub async fn create(&self, data: &AuthorRecord) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death, image, about_the_author)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .bind(&data.image)
        .bind(&data.about_the_author)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::Author, AUTHOR_KEY))
    }

    pub async fn update(&self, id: i32, data: &AuthorRecord) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET
                first_name = $1, last_name = $2, date_of_birth = $3,
                date_of_death = $4, image = $5, about_the_author = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .bind(&data.image)
        .bind(&data.about_the_author)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::Author, AUTHOR_KEY))?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// The author's books stay in the catalog without an author
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::Author, id).await
    }
}
