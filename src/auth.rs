//! Email/password authentication and session handling
//!
//! Accounts and sessions live in the persistent store: a user record per
//! email with a salted PBKDF2-HMAC-SHA256 password hash, and one entry
//! per session token that expires with the store's TTL. Tokens are
//! opaque random bearer values; observation of a session is a plain
//! store lookup.

use crate::{cache, CineSkyError};
use anyhow::Result;
use base64::engine::general_purpose::{STANDARD as B64, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

const PBKDF2_ITERATIONS: u32 = 100_000;
const USER_KEY_PREFIX: &str = "user:";
const SESSION_KEY_PREFIX: &str = "session:";

/// Stored account record; the password never appears in plaintext
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    email: String,
    display_name: String,
    password_hash: String,
    salt: String,
    created_at: i64,
}

/// An authenticated session as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub display_name: String,
    /// Expiry as a Unix timestamp (seconds)
    pub expires_at: i64,
}

/// Email/password authentication over the persistent store
pub struct AuthService {
    session_ttl: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(session_ttl_hours: u32) -> Self {
        Self {
            session_ttl: Duration::from_secs(u64::from(session_ttl_hours) * 60 * 60),
        }
    }

    /// Create an account and open a session for it
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(CineSkyError::validation("Display name cannot be empty").into());
        }

        let user_key = format!("{USER_KEY_PREFIX}{email}");
        if cache::get::<UserRecord>(&user_key).await?.is_some() {
            return Err(
                CineSkyError::auth("An account with this email already exists.").into(),
            );
        }

        let salt: [u8; 16] = rand::random();
        let record = UserRecord {
            email: email.clone(),
            display_name: display_name.to_string(),
            password_hash: hash_password(password, &salt),
            salt: B64.encode(salt),
            created_at: Utc::now().timestamp(),
        };

        cache::put(&user_key, record, cache::PERMANENT_TTL).await?;
        tracing::info!("Registered account for {}", email);

        self.open_session(&email, display_name).await
    }

    /// Verify credentials and open a session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email)?;
        let user_key = format!("{USER_KEY_PREFIX}{email}");

        let record: UserRecord = cache::get(&user_key)
            .await?
            .ok_or_else(|| CineSkyError::auth("Invalid email or password."))?;

        let salt = B64
            .decode(&record.salt)
            .map_err(|_| CineSkyError::auth("Stored credentials are corrupted."))?;

        if hash_password(password, &salt) != record.password_hash {
            return Err(CineSkyError::auth("Invalid email or password.").into());
        }

        tracing::info!("Login for {}", email);
        self.open_session(&email, &record.display_name).await
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> Result<()> {
        cache::remove(&format!("{SESSION_KEY_PREFIX}{token}")).await
    }

    /// Observe the session behind a token. Expired or unknown tokens
    /// yield `None`; the store's TTL handling does the aging.
    pub async fn session(&self, token: &str) -> Result<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }
        cache::get(&format!("{SESSION_KEY_PREFIX}{token}")).await
    }

    async fn open_session(&self, email: &str, display_name: &str) -> Result<Session> {
        let token = generate_token();
        let session = Session {
            token: token.clone(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            expires_at: Utc::now().timestamp() + self.session_ttl.as_secs() as i64,
        };

        cache::put(
            &format!("{SESSION_KEY_PREFIX}{token}"),
            session.clone(),
            self.session_ttl,
        )
        .await?;

        Ok(session)
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    // One '@' with something on both sides; real validation is the
    // upstream mail flow's job
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(CineSkyError::validation(format!("Invalid email address: {email}")).into());
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(
            CineSkyError::validation("Password must be at least 8 characters long").into(),
        );
    }
    Ok(())
}

fn hash_password(password: &str, salt: &[u8]) -> String {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    B64.encode(key)
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_deterministic_per_salt() {
        let salt = [7u8; 16];
        let a = hash_password("correct horse battery", &salt);
        let b = hash_password("correct horse battery", &salt);
        assert_eq!(a, b);

        let other_salt = [8u8; 16];
        assert_ne!(a, hash_password("correct horse battery", &other_salt));
        assert_ne!(a, hash_password("wrong password", &salt));
    }

    #[test]
    fn test_generate_token_is_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 32);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Gaffer@Example.COM ").unwrap(),
            "gaffer@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("user@nodot").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
