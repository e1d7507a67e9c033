//! Authentication helpers.
//!
//! Sessions are stateless HS256 bearer tokens. The role travels in the token
//! claims for the client's benefit; the server re-reads the account on every
//! request so deactivation takes effect immediately.

use std::fmt;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("failed to issue token")]
    Issue(#[source] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("unknown role {0}")]
    UnknownRole(String),
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AuthnError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(AuthnError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    pub session_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: impl Into<Vec<u8>>, session_ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            session_ttl_minutes,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

pub fn issue_token(user: &CurrentUser, config: &AuthConfig) -> Result<String, AuthnError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
        .map_err(AuthnError::Issue)
}

pub fn decode_token(token: &str, config: &AuthConfig) -> Result<Claims, AuthnError> {
    jsonwebtoken::decode::<Claims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
        .map_err(AuthnError::InvalidToken)
}

pub fn hash_password(password: &str) -> Result<String, AuthnError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthnError::Hash(err.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(b"0123456789abcdef0123456789abcdef".to_vec(), 30)
    }

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "lucia@nexo.test".into(),
            name: "Lucía".into(),
            role,
        }
    }

    #[test]
    fn token_carries_role() {
        let admin = user(Role::Admin);
        let token = issue_token(&admin, &config()).unwrap();
        let claims = decode_token(&token, &config()).unwrap();
        assert_eq!(CurrentUser::from(claims), admin);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = issue_token(&user(Role::Employee), &config()).unwrap();
        let other = AuthConfig::new(b"another-secret-another-secret-xx".to_vec(), 30);
        assert!(matches!(
            decode_token(&token, &other),
            Err(AuthnError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = AuthConfig::new(b"0123456789abcdef0123456789abcdef".to_vec(), -120);
        let token = issue_token(&user(Role::Employee), &expired).unwrap();
        assert!(decode_token(&token, &config()).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("secreto1").unwrap();
        assert!(verify_password("secreto1", &hash));
        assert!(!verify_password("secreto2", &hash));
        assert!(!verify_password("secreto1", "not-a-phc-string"));
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::parse("employee").unwrap(), Role::Employee);
        assert!(Role::parse("owner").is_err());
        assert_eq!(Role::default(), Role::Employee);
    }
}
