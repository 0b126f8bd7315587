use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::User;

/// JWT service for session token generation and validation.
///
/// HS256 with a shared secret; a single service signs and verifies.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Display name
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_days: config.expiry_days,
        }
    }

    /// Generate a session token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(self.expiry_days);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))?;

        Ok(token)
    }

    /// Validate a session token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service(expiry_days: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new("test-jwt-secret".to_string()),
            expiry_days,
        })
    }

    fn test_user() -> User {
        User::new(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            "hash".to_string(),
        )
    }

    #[test]
    fn token_round_trips() {
        let jwt = service(7);
        let user = test_user();

        let token = jwt.generate_token(&user).unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.name, user.name);
        // Seven-day expiry window.
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service(-1);
        let token = jwt.generate_token(&test_user()).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let jwt = service(7);
        let other = JwtService::new(&JwtConfig {
            secret: Secret::new("different-secret".to_string()),
            expiry_days: 7,
        });

        let token = other.generate_token(&test_user()).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let jwt = service(7);
        assert!(jwt.validate_token("not.a.token").is_err());
    }
}
