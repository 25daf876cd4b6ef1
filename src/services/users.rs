//! User management and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use super::catalog::invalid_pk_message;
use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{
            CreateGroup, CreateUser, LoginRequest, LoginResponse, UpdateProfile, UpdateUser,
            UserQuery,
        },
        EntityKind, Group, Page, Profile, User, UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate with username and password, returning a bearer token
    pub async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users
            .get_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password, &request.password)? {
            tracing::warn!("Failed login for {}", request.username);
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let claims = UserClaims::for_user(&user, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expiration_hours * 3600,
        })
    }

    /// Creates the configured staff account unless the username is taken
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let Some(admin) = &self.config.bootstrap_admin else {
            return Ok(());
        };
        if self.repository.users.get_by_username(&admin.username).await?.is_some() {
            return Ok(());
        }
        let user = self
            .create_user(CreateUser {
                username: admin.username.clone(),
                password: admin.password.clone(),
                email: None,
                is_staff: true,
                groups: Vec::new(),
            })
            .await?;
        tracing::info!("Bootstrapped staff account {}", user.username);
        Ok(())
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user; its profile is initialised in the same transaction
    pub async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;
        self.check_groups(&data.groups).await?;
        let hash = hash_password(&data.password)?;
        self.repository.users.create(&data, &hash).await
    }

    pub async fn update_user(&self, id: i32, data: UpdateUser) -> AppResult<User> {
        data.validate()?;
        if let Some(groups) = &data.groups {
            self.check_groups(groups).await?;
        }
        let hash = data.password.as_deref().map(hash_password).transpose()?;
        self.repository
            .users
            .update(id, &data, hash.as_deref())
            .await
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// (username, email) pairs for announcements
    pub async fn mail_recipients(&self) -> AppResult<Vec<(String, String)>> {
        self.repository.users.mail_recipients().await
    }

    pub async fn list_groups(&self, page: &Page) -> AppResult<(Vec<Group>, i64)> {
        self.repository.users.list_groups(page).await
    }

    pub async fn get_group(&self, id: i32) -> AppResult<Group> {
        self.repository.users.get_group(id).await
    }

    pub async fn create_group(&self, data: CreateGroup) -> AppResult<Group> {
        data.validate()?;
        self.repository.users.create_group(&data).await
    }

    pub async fn delete_group(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete_group(id).await
    }

    pub async fn list_profiles(&self, page: &Page) -> AppResult<(Vec<Profile>, i64)> {
        self.repository.users.list_profiles(page).await
    }

    pub async fn get_profile(&self, id: i32) -> AppResult<Profile> {
        self.repository.users.get_profile(id).await
    }

    pub async fn update_profile(&self, id: i32, data: UpdateProfile) -> AppResult<Profile> {
        data.validate()?;
        self.repository.users.update_profile(id, &data).await
    }

    async fn check_groups(&self, groups: &[i32]) -> AppResult<()> {
        let missing = self.repository.missing_ids(EntityKind::Group, groups).await?;
        if missing.is_empty() {
            return Ok(());
        }
        Err(unknown_groups(&missing))
    }
}

fn unknown_groups(missing: &[i32]) -> AppError {
    let mut fields = crate::error::FieldErrors::new();
    fields.insert(
        "groups".to_string(),
        missing.iter().map(|id| invalid_pk_message(*id)).collect(),
    );
    AppError::InvalidFields(fields)
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("not-a-hash", "x").is_err());
    }

    #[test]
    fn test_unknown_groups_use_catalog_wording() {
        match unknown_groups(&[3, 11]) {
            AppError::InvalidFields(fields) => assert_eq!(
                fields["groups"],
                vec![invalid_pk_message(3), invalid_pk_message(11)]
            ),
            other => panic!("unexpected error: {}", other),
        }
    }
}
