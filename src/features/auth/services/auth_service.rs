use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use sqlx::PgPool;
use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{LoginDto, RegisterDto};
use crate::features::auth::model::CurrentUser;
use crate::features::auth::services::TokenService;
use crate::features::users::models::User;

/// Registration and credential verification.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: Arc<TokenService>) -> Self {
        Self { pool, tokens }
    }

    /// Create a new account and issue a token for it.
    pub async fn register(&self, dto: RegisterDto) -> Result<(String, CurrentUser)> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&dto.email)
        .fetch_one(&self.pool)
        .await?;

        if existing > 0 {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, organization)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.organization)
        .fetch_one(&self.pool)
        .await
        // A concurrent registration can slip past the count above and land
        // on the unique email index instead
        .map_err(|e| AppError::on_conflict(e, "Email already registered"))?;

        info!(user_id = %user.id, "Registered new user");

        let token = self.tokens.issue(user.id)?;
        Ok((token, CurrentUser::from(user)))
    }

    /// Verify credentials and issue a token.
    ///
    /// Wrong email and wrong password produce the same message so the
    /// endpoint cannot be used to probe which accounts exist.
    pub async fn login(&self, dto: LoginDto) -> Result<(String, CurrentUser)> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(&dto.email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(&dto.password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.tokens.issue(user.id)?;
        Ok((token, CurrentUser::from(user)))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("hunter2", &hash));
    }

    #[test]
    fn test_verify_password_tolerates_bad_hash() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }
}
