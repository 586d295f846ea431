use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of the link sent in confirmation e-mails.
pub const EMAIL_TOKEN_TTL_DAYS: i64 = 7;

const EMAIL_CONFIRMATION_PURPOSE: &str = "email_confirmation";

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's id.
    pub sub: i32,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiration, seconds since the epoch.
    pub exp: i64,
}

/// Claims carried by an e-mail confirmation token.
///
/// The `purpose` field keeps a confirmation token from being replayed as an
/// access token (the `sub` types differ as well).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailClaims {
    pub sub: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies the HS256 tokens used by the API.
///
/// Keys are derived once from the configured secret and the service is cheap to clone.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_ttl_seconds),
        }
    }

    /// Generates an access token for `user_id`, valid for the configured lifetime.
    ///
    /// # Returns
    /// The encoded JWT, or `AppError::InternalServerError` if encoding fails.
    pub fn generate_access_token(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies an access token's signature and expiry and returns its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, tampered with or expired.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Generates the token embedded in confirmation links, valid for seven days.
    pub fn generate_email_token(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = EmailClaims {
            sub: email.to_string(),
            purpose: EMAIL_CONFIRMATION_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(EMAIL_TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Extracts the e-mail address from a confirmation token.
    ///
    /// Any failure is reported as `AppError::ValidationError` (422).
    pub fn verify_email_token(&self, token: &str) -> Result<String, AppError> {
        let invalid = || AppError::ValidationError("Invalid email verification token".into());

        let claims = decode::<EmailClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| invalid())?
        .claims;

        if claims.purpose != EMAIL_CONFIRMATION_PURPOSE {
            return Err(invalid());
        }
        Ok(claims.sub)
    }
}
