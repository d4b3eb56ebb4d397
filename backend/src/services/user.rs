//! User accounts

use serde::Deserialize;
use shared::models::{AuditEvent, User, UserRole};
use shared::validation::validate_name;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditLog;

/// Columns selected for [`User`] rows
pub(crate) const USER_COLUMNS: &str =
    "id, email, fullname, role, is_superuser, last_login, created_at, updated_at";

/// Input for creating a user; the password is set later by the user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub fullname: String,
    pub role: UserRole,
}

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    audit: AuditLog,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self {
            audit: AuditLog::new(db.clone()),
            db,
        }
    }

    pub async fn find_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    /// Create a user without a password
    pub async fn create_user(&self, actor: &User, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        validate_name(&input.fullname, 255).map_err(|e| AppError::validation("fullname", e))?;

        let email = input.email.trim().to_lowercase();

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;
        if exists {
            return Err(AppError::DuplicateName("email".to_string()));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, fullname, role)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(input.fullname.trim())
        .bind(input.role)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User created");
        self.audit.record(actor, AuditEvent::UserCreated).await;

        Ok(user)
    }

    /// All users that are not superusers
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE is_superuser = FALSE ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    /// Create the configured superuser when no user exists yet.
    ///
    /// The account has no password; its owner sets one through the first-login
    /// password flow.
    pub async fn ensure_bootstrap_admin(&self, email: &str, fullname: &str) -> AppResult<Option<User>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        if count > 0 {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, fullname, role, is_superuser)
            VALUES ($1, $2, 'admin', TRUE)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .bind(fullname)
        .fetch_optional(&self.db)
        .await?;

        if let Some(user) = &user {
            tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin created");
        }
        Ok(user)
    }
}
