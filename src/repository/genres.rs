//! Genres repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{delete_policy, duplicate_or_db};
use crate::{
    error::{AppError, AppResult},
    models::{
        genre::{GenrePayload, GenreQuery},
        EntityKind, Genre,
    },
};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List genres ordered by name, with the total before paging
    pub async fn list(&self, query: &GenreQuery) -> AppResult<(Vec<Genre>, i64)> {
        let page = query.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM genres WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM genres WHERE 1=1");
        if let Some(name) = &query.name {
            count.push(" AND name = ").push_bind(name.clone());
            select.push(" AND name = ").push_bind(name.clone());
        }
        select
            .push(" ORDER BY name, id LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows = select.build_query_as::<Genre>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM genres WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &GenrePayload) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("INSERT INTO genres (name, image) VALUES ($1, $2) RETURNING *")
            .bind(&data.name)
            .bind(&data.image)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, EntityKind::Genre, &["name"]))
    }

    pub async fn update(&self, id: i32, data: &GenrePayload) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>(
            "UPDATE genres SET name = $1, image = $2 WHERE id = $3 RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::Genre, &["name"]))?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    /// Removes the genre and its book links
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::Genre, id).await
    }
}
