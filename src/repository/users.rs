//! Users, groups and profiles repository

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::{delete_policy, duplicate_or_db};
use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateGroup, CreateUser, UpdateProfile, UpdateUser, UserCreated, UserQuery},
        EntityKind, Group, Page, Profile, User,
    },
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.password, u.is_staff, u.date_joined,
           ARRAY(SELECT ug.group_id FROM user_groups ug WHERE ug.user_id = u.id ORDER BY ug.group_id) AS groups
    FROM users u
"#;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE 1=1");
        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        select.push(" WHERE 1=1");
        if let Some(username) = &query.username {
            count.push(" AND u.username = ").push_bind(username.clone());
            select.push(" AND u.username = ").push_bind(username.clone());
        }
        select
            .push(" ORDER BY u.username LIMIT ")
            .push_bind(page.size())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
        let rows = select.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    /// Get user by username (authentication)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("{} WHERE u.username = $1", USER_SELECT);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// (username, email) for every user with an email address
    pub async fn mail_recipients(&self) -> AppResult<Vec<(String, String)>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT username, email FROM users WHERE email <> '' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert the user, its memberships and its profile in one transaction
    pub async fn create(&self, data: &CreateUser, password_hash: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password, is_staff)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&data.username)
        .bind(data.email.as_deref().unwrap_or(""))
        .bind(password_hash)
        .bind(data.is_staff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::User, &["username"]))?;

        set_groups(&mut tx, user_id, &data.groups).await?;

        let event = UserCreated {
            user_id,
            username: data.username.clone(),
        };
        initialize_profile(&mut tx, &event).await?;

        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn update(
        &self,
        id: i32,
        data: &UpdateUser,
        password_hash: Option<&str>,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE($1, username),
                email = COALESCE($2, email),
                password = COALESCE($3, password),
                is_staff = COALESCE($4, is_staff)
            WHERE id = $5
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(password_hash)
        .bind(data.is_staff)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_or_db(e, EntityKind::User, &["username"]))?
        .rows_affected();
        if updated == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        if let Some(groups) = &data.groups {
            set_groups(&mut tx, id, groups).await?;
        }

        let user = fetch_user(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Loans are detached; profile and memberships go with the user
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::User, id).await
    }

    // =========================================================================
    // Groups
    // =========================================================================

    pub async fn list_groups(&self, page: &Page) -> AppResult<(Vec<Group>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Group>(
            "SELECT * FROM groups ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows, total))
    }

    pub async fn get_group(&self, id: i32) -> AppResult<Group> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))
    }

    pub async fn create_group(&self, data: &CreateGroup) -> AppResult<Group> {
        sqlx::query_as::<_, Group>("INSERT INTO groups (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, EntityKind::Group, &["name"]))
    }

    pub async fn delete_group(&self, id: i32) -> AppResult<()> {
        delete_policy::delete(&self.pool, EntityKind::Group, id).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    pub async fn list_profiles(&self, page: &Page) -> AppResult<(Vec<Profile>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles ORDER BY user_id LIMIT $1 OFFSET $2",
        )
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows, total))
    }

    pub async fn get_profile(&self, id: i32) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }

    pub async fn update_profile(&self, id: i32, data: &UpdateProfile) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                short_description = COALESCE($1, short_description),
                birth_date = COALESCE($2, birth_date),
                image = COALESCE($3, image),
                country = COALESCE($4, country),
                town = COALESCE($5, town),
                address = COALESCE($6, address),
                phone_number = COALESCE($7, phone_number)
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&data.short_description)
        .bind(data.birth_date)
        .bind(&data.image)
        .bind(&data.country)
        .bind(&data.town)
        .bind(&data.address)
        .bind(&data.phone_number)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))
    }
}

/// Post-creation hook: every new user gets an empty profile
pub async fn initialize_profile(conn: &mut PgConnection, event: &UserCreated) -> AppResult<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id) VALUES ($1) RETURNING *",
    )
    .bind(event.user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| duplicate_or_db(e, EntityKind::Profile, &["user"]))?;

    tracing::debug!("Initialized profile {} for {}", profile.id, event.username);
    Ok(profile)
}

async fn fetch_user(conn: &mut PgConnection, id: i32) -> AppResult<User> {
    let sql = format!("{} WHERE u.id = $1", USER_SELECT);
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

async fn set_groups(conn: &mut PgConnection, user_id: i32, groups: &[i32]) -> AppResult<()> {
    sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    if !groups.is_empty() {
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_id) SELECT $1, UNNEST($2::int4[]) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(groups)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
