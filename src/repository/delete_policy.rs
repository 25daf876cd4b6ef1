//! What happens to referencing rows when a parent row is deleted.
//!
//! The schema declares foreign keys without `ON DELETE` actions; every
//! delete goes through [`delete_with_policies`] so the behaviour lives in one
//! table instead of being scattered across migrations.

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::EntityKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Clear the referencing column
    SetNull,
    /// Remove the referencing rows
    Cascade,
}

/// One foreign key pointing at `parent`
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyPolicy {
    pub parent: EntityKind,
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

const fn policy(
    parent: EntityKind,
    table: &'static str,
    column: &'static str,
    on_delete: OnDelete,
) -> ForeignKeyPolicy {
    ForeignKeyPolicy {
        parent,
        table,
        column,
        on_delete,
    }
}

pub const FOREIGN_KEY_POLICIES: &[ForeignKeyPolicy] = &[
    policy(EntityKind::Author, "books", "author_id", OnDelete::SetNull),
    policy(EntityKind::Language, "books", "language_id", OnDelete::SetNull),
    policy(EntityKind::Book, "book_instances", "book_id", OnDelete::SetNull),
    policy(EntityKind::Book, "book_genres", "book_id", OnDelete::Cascade),
    policy(EntityKind::Genre, "book_genres", "genre_id", OnDelete::Cascade),
    policy(EntityKind::User, "book_instances", "borrower_id", OnDelete::SetNull),
    policy(EntityKind::User, "profiles", "user_id", OnDelete::Cascade),
    policy(EntityKind::User, "user_groups", "user_id", OnDelete::Cascade),
    policy(EntityKind::Group, "user_groups", "group_id", OnDelete::Cascade),
];

pub fn policies_for(parent: EntityKind) -> impl Iterator<Item = &'static ForeignKeyPolicy> {
    FOREIGN_KEY_POLICIES.iter().filter(move |p| p.parent == parent)
}

/// Applies every policy for `kind`, then deletes the row itself.
///
/// Returns whether the row existed.
pub async fn delete_with_policies(
    tx: &mut Transaction<'_, Postgres>,
    kind: EntityKind,
    id: i32,
) -> AppResult<bool> {
    for p in policies_for(kind) {
        let sql = match p.on_delete {
            OnDelete::SetNull => format!(
                "UPDATE {} SET {} = NULL WHERE {} = $1",
                p.table, p.column, p.column
            ),
            OnDelete::Cascade => format!("DELETE FROM {} WHERE {} = $1", p.table, p.column),
        };
        let affected = sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        if affected > 0 {
            tracing::debug!(
                "Deleting {} {}: {:?} on {}.{} touched {} rows",
                kind,
                id,
                p.on_delete,
                p.table,
                p.column,
                affected
            );
        }
    }

    let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
    let deleted = sqlx::query(&sql)
        .bind(id)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    Ok(deleted > 0)
}

/// Deletes one row in its own transaction; 404 when it does not exist
pub async fn delete(pool: &Pool<Postgres>, kind: EntityKind, id: i32) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    if !delete_with_policies(&mut tx, kind, id).await? {
        return Err(AppError::NotFound(format!("{} with id {} not found", kind, id)));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_delete_detaches_copies_and_drops_genre_links() {
        let book: Vec<_> = policies_for(EntityKind::Book)
            .map(|p| (p.table, p.on_delete))
            .collect();
        assert_eq!(
            book,
            vec![
                ("book_instances", OnDelete::SetNull),
                ("book_genres", OnDelete::Cascade),
            ]
        );
    }

    #[test]
    fn test_user_delete_keeps_copies() {
        let borrower = policies_for(EntityKind::User)
            .find(|p| p.table == "book_instances")
            .unwrap();
        assert_eq!(borrower.column, "borrower_id");
        assert_eq!(borrower.on_delete, OnDelete::SetNull);
    }

    #[test]
    fn test_leaf_kinds_have_no_policies() {
        assert_eq!(policies_for(EntityKind::BookInstance).count(), 0);
        assert_eq!(policies_for(EntityKind::Profile).count(), 0);
    }

    #[test]
    fn test_cascades_only_reach_leaf_tables() {
        // Cascades are applied one level deep, so a cascaded table must not itself be referenced.
        let parent_tables = [
            EntityKind::Genre,
            EntityKind::Language,
            EntityKind::Author,
            EntityKind::Book,
            EntityKind::User,
            EntityKind::Group,
        ]
        .map(|k| k.table());
        for p in FOREIGN_KEY_POLICIES
            .iter()
            .filter(|p| p.on_delete == OnDelete::Cascade)
        {
            assert!(!parent_tables.contains(&p.table), "{} is a parent table", p.table);
        }
    }

    #[test]
    fn test_set_null_columns_are_nullable_references() {
        // Columns declared NOT NULL in the schema can only cascade.
        let not_null = [("book_genres", "book_id"), ("book_genres", "genre_id"), ("profiles", "user_id")];
        for p in FOREIGN_KEY_POLICIES
            .iter()
            .filter(|p| p.on_delete == OnDelete::SetNull)
        {
            assert!(!not_null.contains(&(p.table, p.column)));
        }
    }
}
