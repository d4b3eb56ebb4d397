//! Authentication service for login, first-login password setup and tokens

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::models::{AuditEvent, User};
use shared::validation::validate_password;
use sqlx::PgPool;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;
use crate::services::user::USER_COLUMNS;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    audit: AuditLog,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Login request.
///
/// With `is_new_user` set the password is ignored and the call only reports
/// whether the account still needs a password.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: Option<String>,
    #[serde(default)]
    pub is_new_user: bool,
}

/// First-login password setup
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordInput {
    pub user_id: i64,
    pub password: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))
    }
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct AuthToken {
    pub access: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Outcome of a login request
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    Token(AuthToken),
    /// The account exists but has no password yet
    PasswordRequired { user_id: i64 },
}

#[derive(Debug, sqlx::FromRow)]
struct UserCredentials {
    #[sqlx(flatten)]
    user: User,
    password_hash: Option<String>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate with email and password, or check whether a new account still needs a password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginOutcome> {
        input.validate()?;

        let credentials = self.find_credentials(&input.email).await?;

        if input.is_new_user {
            let credentials =
                credentials.ok_or_else(|| AppError::NotFound("User email".to_string()))?;
            if credentials.password_hash.is_some() {
                return Err(AppError::AlreadyHasPassword);
            }
            return Ok(LoginOutcome::PasswordRequired {
                user_id: credentials.user.id,
            });
        }

        let credentials = credentials.ok_or(AppError::InvalidCredentials)?;
        let (Some(password), Some(password_hash)) = (input.password.as_deref(), credentials.password_hash.as_deref())
        else {
            return Err(AppError::InvalidCredentials);
        };

        let valid = verify(password, password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let user = credentials.user;

        // Update last login
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let token = self.generate_token(user.id)?;

        tracing::info!(user_id = user.id, "User logged in");
        self.audit.record(&user, AuditEvent::LoggedIn).await;

        Ok(LoginOutcome::Token(token))
    }

    /// Set the password of an account that does not have one yet
    pub async fn update_password(&self, input: UpdatePasswordInput) -> AppResult<()> {
        validate_password(&input.password).map_err(|e| AppError::validation("password", e))?;

        let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {}, password_hash FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(input.user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if credentials.password_hash.is_some() {
            return Err(AppError::AlreadyHasPassword);
        }

        let password_hash = hash_password(&input.password)?;

        // Guard against a concurrent setup having won the race
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2 AND password_hash IS NULL",
        )
        .bind(&password_hash)
        .bind(input.user_id)
        .execute(&self.db)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::AlreadyHasPassword);
        }

        tracing::info!(user_id = input.user_id, "Password set");
        self.audit.record(&credentials.user, AuditEvent::PasswordUpdated).await;

        Ok(())
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Issue an HS256 access token for `user_id`
    pub fn generate_token(&self, user_id: i64) -> AppResult<AuthToken> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthToken {
            access,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {}, password_hash FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?;
        Ok(credentials)
    }
}

/// Hash a password with bcrypt
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_user_id() {
        let claims = Claims {
            sub: "42".to_string(),
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.user_id().unwrap(), 42);

        let bad = Claims {
            sub: "not-a-number".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(matches!(bad.user_id(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hashed = hash_password("correct horse").unwrap();
        assert!(verify("correct horse", &hashed).unwrap());
        assert!(!verify("wrong horse", &hashed).unwrap());
    }
}
