//! JWT token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ISSUER: &str = "solar-market";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in hours
    pub expiration_hours: i64,
    pub issuer: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
            issuer: ISSUER.to_string(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl TokenClaims {
    pub fn new(user_id: i32, email: &str, role: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    /// Numeric user id carried in `sub`.
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Create a signed token for a user
pub fn create_token(
    user_id: i32,
    email: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, email, role, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and issuer and decode the claims
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let config = JwtConfig::new("test-secret", 1);
        let token = create_token(42, "a@b.de", "installer", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, "installer");
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(1, "a@b.de", "admin", &JwtConfig::new("one", 1)).unwrap();
        assert!(verify_token(&token, &JwtConfig::new("two", 1)).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = JwtConfig::new("s", -2);
        let token = create_token(1, "a@b.de", "admin", &config).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let out = format!("{:?}", JwtConfig::new("very-secret", 1));
        assert!(!out.contains("very-secret"));
    }
}
