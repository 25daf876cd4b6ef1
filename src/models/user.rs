//! User, group and profile models, plus JWT claims

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{not_blank, Page};
use crate::error::AppError;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    /// Group ids, ascending
    pub groups: Vec<i32>,
}

/// User query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub username: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl UserQuery {
    pub fn page(&self) -> Page {
        Page {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters"))]
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub groups: Vec<i32>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub is_staff: Option<bool>,
    pub groups: Option<Vec<i32>>,
}

/// Emitted once a user row exists, inside the creating transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCreated {
    pub user_id: i32,
    pub username: String,
}

/// Permission group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Group {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroup {
    #[validate(custom(function = "not_blank"), length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub name: String,
}

/// Per-user profile, created alongside the user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: i32,
    #[sqlx(rename = "user_id")]
    pub user: i32,
    pub short_description: String,
    pub birth_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub country: String,
    pub town: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub current_loaned_books: i32,
    pub total_loaned_books: i32,
    pub total_loaned_days: i32,
    pub overdue_books: i32,
    pub total_overdue_books_over_time: i32,
    pub total_overdue_days: i32,
    pub user_reputation: i32,
}

/// Editable profile fields; counters are maintained elsewhere
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(max = 500, message = "Ensure this field has no more than 500 characters."))]
    pub short_description: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub image: Option<String>,
    #[validate(length(max = 33, message = "Ensure this field has no more than 33 characters."))]
    pub country: Option<String>,
    #[validate(length(max = 33, message = "Ensure this field has no more than 33 characters."))]
    pub town: Option<String>,
    #[validate(length(max = 77, message = "Ensure this field has no more than 77 characters."))]
    pub address: Option<String>,
    #[validate(length(max = 32, message = "Ensure this field has no more than 32 characters."))]
    pub phone_number: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, expiration_hours: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            iat: now,
            exp: now + expiration_hours * 3600,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Staff access required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_staff: bool) -> User {
        User {
            id: 7,
            username: "librarian".to_string(),
            email: "librarian@example.com".to_string(),
            password: "hash".to_string(),
            is_staff,
            date_joined: Utc::now(),
            groups: vec![],
        }
    }

    #[test]
    fn test_token_round_trip_keeps_staff_flag() {
        let claims = UserClaims::for_user(&user(true), 1);
        let token = claims.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert!(parsed.is_staff);
        assert!(parsed.require_staff().is_ok());

        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_non_staff_is_refused() {
        let claims = UserClaims::for_user(&user(false), 1);
        assert!(matches!(claims.require_staff(), Err(AppError::Authorization(_))));
    }

    #[test]
    fn test_password_never_serialized() {
        let json = serde_json::to_value(user(false)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "librarian");
    }
}
