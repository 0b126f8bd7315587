//! Registration and login.
//!
//! Password hashes stay server-side; responses carry only the public user
//! fields and a session token.

use anyhow::anyhow;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::User;
use crate::AppState;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Public user fields in auth responses.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Register a new user.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    req.validate()?;

    if state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(AppError::DatabaseError)?
        .is_some()
    {
        return Err(AppError::BadRequest(anyhow!("Email already registered")));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::new(req.name, req.email, password_hash);

    state
        .store
        .insert_user(&user)
        .await
        .map_err(AppError::DatabaseError)?;

    let token = state.jwt.generate_token(&user)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

/// Login with email and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .store
        .find_user_by_email(&req.email)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::AuthError(anyhow!("Invalid credentials")))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::AuthError(anyhow!("Invalid credentials")));
    }

    let token = state.jwt.generate_token(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

/// Hash password using argon2.
fn hash_password(password: &str) -> Result<String, AppError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::InternalError(anyhow!("Password hashing failed: {}", e)))
}

/// Verify password against stored hash.
fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(anyhow!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn register_request_validation() {
        let bad_email = RegisterRequest {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let empty_password = RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: String::new(),
        };
        assert!(empty_password.validate().is_err());

        let ok = RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn auth_response_never_serializes_password_hash() {
        let response = AuthResponse {
            token: "tok".to_string(),
            user: UserResponse {
                id: Uuid::new_v4(),
                name: "A".to_string(),
                email: "a@x.com".to_string(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
    }
}
