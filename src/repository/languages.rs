//! Languages repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{delete_policy, duplicate_or_db};
use crate::{
    error::{AppError, AppResult},
    models::{
        language::{LanguagePayload, LanguageQuery},
        EntityKind, Language,
    },
};

#[derive(Clone)]
pub struct LanguagesRepository {
    pool: Pool<Postgres>,
}

impl LanguagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &LanguageQuery) -> AppResult<(Vec<Language>, i64)> {
        let page = query.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM languages WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM languages WHERE 1=1");
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
        let rows = select.build_query_as::<Language>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM languages WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &LanguagePayload) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("INSERT INTO languages (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, EntityKind::Language, &["name"]))
    }

    pub async fn update(&self, id: i32, data: &LanguagePayload) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("UPDATE languages SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&data.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, EntityKind::Language, &["name"]))?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    /// Books written in this language keep existing, without a language
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::Language, id).await
    }
}
