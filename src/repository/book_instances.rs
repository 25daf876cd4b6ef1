//! Book instances repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::delete_policy;
use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstanceQuery, LoanStatus},
        BookInstance, EntityKind,
    },
};

/// Values written after validation
#[derive(Debug, Clone)]
pub struct BookInstanceRecord {
    pub book: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower: Option<i32>,
    pub status: LoanStatus,
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List copies ordered by book title, latest due date first
    pub async fn list(&self, query: &BookInstanceQuery) -> AppResult<(Vec<BookInstance>, i64)> {
        let page = query.page();

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM book_instances bi WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT bi.* FROM book_instances bi LEFT JOIN books b ON b.id = bi.book_id WHERE 1=1",
        );
        for builder in [&mut count, &mut select] {
            if let Some(book) = query.book {
                builder.push(" AND bi.book_id = ").push_bind(book);
            }
            if let Some(imprint) = &query.imprint {
                builder.push(" AND bi.imprint = ").push_bind(imprint.clone());
            }
        }
        select
            .push(" ORDER BY b.title, bi.due_back DESC, bi.id LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows = select
            .build_query_as::<BookInstance>()
            .fetch_all(&self.pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn create(&self, data: &BookInstanceRecord) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.book)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.borrower)
        .bind(data.status.code())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &BookInstanceRecord) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances SET
                book_id = $1, imprint = $2, due_back = $3, borrower_id = $4, status = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(data.book)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.borrower)
        .bind(data.status.code())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::BookInstance, id).await
    }
}
