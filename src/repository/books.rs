//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::{delete_policy, duplicate_or_db};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookQuery, BookRecord},
        Book, EntityKind,
    },
};

const BOOK_KEY: &[&str] = &["title", "author"];

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, b.summary, b.isbn, b.language_id,
           b.date_added, b.published, b.copies, b.loaned_copies, b.available_copies,
           b.image, b.view_count,
           ARRAY(SELECT bg.genre_id FROM book_genres bg WHERE bg.book_id = b.id ORDER BY bg.genre_id) AS genre
    FROM books b
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new(BOOK_SELECT);
        select.push(" WHERE 1=1");
        if let Some(title) = &query.title {
            count.push(" AND b.title = ").push_bind(title.clone());
            select.push(" AND b.title = ").push_bind(title.clone());
        }
        select
            .push(" ORDER BY b.title, b.id LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows = select.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Insert the book and its genre links together
    pub async fn create(&self, data: &BookRecord) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (
                title, author_id, summary, isbn, language_id, date_added, published,
                copies, loaned_copies, available_copies, image
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(data.author)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.language)
        .bind(data.date_added)
        .bind(data.published)
        .bind(data.copies)
        .bind(data.loaned_copies)
        .bind(data.available_copies)
        .bind(&data.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::Book, BOOK_KEY))?;

        set_genres(&mut tx, id, &data.genre).await?;
        let book = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(book)
    }

    /// Replace every column and the genre links
    pub async fn update(&self, id: i32, data: &BookRecord) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE books SET
                title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5,
                date_added = $6, published = $7, copies = $8, loaned_copies = $9,
                available_copies = $10, image = $11
            WHERE id = $12
            "#,
        )
        .bind(&data.title)
        .bind(data.author)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.language)
        .bind(data.date_added)
        .bind(data.published)
        .bind(data.copies)
        .bind(data.loaned_copies)
        .bind(data.available_copies)
        .bind(&data.image)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::Book, BOOK_KEY))?
        .rows_affected();
        if updated == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        set_genres(&mut tx, id, &data.genre).await?;
        let book = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(book)
    }

    /// Copies stay on the shelf without a book; genre links go
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::Book, id).await
    }
}

async fn fetch(conn: &mut PgConnection, id: i32) -> AppResult<Book> {
    let sql = format!("{} WHERE b.id = $1", BOOK_SELECT);
    sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
}

async fn set_genres(conn: &mut PgConnection, book_id: i32, genres: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    if !genres.is_empty() {
        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[]) ON CONFLICT DO NOTHING",
        )
        .bind(book_id)
        .bind(genres)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
