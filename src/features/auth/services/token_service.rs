use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Verification distinguishes an expired token from a malformed one so the
/// middleware can return a precise 401 message.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    /// Issue a token for the given user id.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(ttl_hours: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "a-test-secret-that-is-long-enough-to-pass".to_string(),
            token_ttl_hours: ttl_hours,
            leeway_secs: 0,
        }
    }

    #[test]
    fn test_issue_then_verify_round_trip() {
        let service = TokenService::new(&test_config(72));
        let user_id = Uuid::now_v7();

        let token = service.issue(user_id).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = TokenService::new(&test_config(72));

        let err = service.verify("not.a.token").unwrap_err();
        match err {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Invalid token"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_expired() {
        let service = TokenService::new(&test_config(-1));
        let token = service.issue(Uuid::now_v7()).unwrap();

        let err = service.verify(&token).unwrap_err();
        match err {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issuer = TokenService::new(&test_config(72));
        let verifier = TokenService::new(&AuthConfig {
            jwt_secret: "a-different-secret-also-long-enough-here".to_string(),
            token_ttl_hours: 72,
            leeway_secs: 0,
        });

        let token = issuer.issue(Uuid::now_v7()).unwrap();
        assert!(verifier.verify(&token).is_err());
    }
}
