//! Session-bound, single-use CSRF tokens
//!
//! Token format: `<hmac>.<timestamp>.<nonce>` where the HMAC-SHA256 covers
//! `<session_id>.<timestamp>.<nonce>`. A token is accepted once, by the session it was
//! issued to, within an hour of issue.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use helloworld_core::AppError;

type HmacSha256 = Hmac<Sha256>;

/// CSRF token expiration time (1 hour)
pub const CSRF_TOKEN_EXPIRATION_SECS: i64 = 3600;

/// Issues and checks request tokens.
pub trait TokenService: Send + Sync {
    fn issue(&self, session_id: &str) -> Result<String, AppError>;

    /// Verify `token` for `session_id` and burn it. Returns false for anything suspicious.
    fn verify_and_consume(&self, session_id: &str, token: &str) -> bool;
}

pub struct CsrfTokenService {
    secret: String,
    /// nonce -> timestamp it was issued at
    consumed: Mutex<HashMap<String, i64>>,
}

impl CsrfTokenService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            consumed: Mutex::new(HashMap::new()),
        }
    }

    fn sign(&self, session_id: &str, timestamp: i64, nonce: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Config(format!("Invalid CSRF secret: {}", e)))?;
        mac.update(format!("{}.{}.{}", session_id, timestamp, nonce).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn issue_at(&self, session_id: &str, timestamp: i64) -> Result<String, AppError> {
        let nonce = Uuid::new_v4().to_string();
        let hmac = self.sign(session_id, timestamp, &nonce)?;
        Ok(format!("{}.{}.{}", hmac, timestamp, nonce))
    }

    fn verify_at(&self, session_id: &str, token: &str, now: i64) -> bool {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return false;
        }

        let (hmac_part, timestamp_str, nonce) = (parts[0], parts[1], parts[2]);

        let timestamp = match timestamp_str.parse::<i64>() {
            Ok(ts) => ts,
            Err(_) => return false,
        };

        if timestamp.saturating_add(CSRF_TOKEN_EXPIRATION_SECS) < now
            || timestamp > now.saturating_add(60)
        {
            tracing::debug!("CSRF token expired or issued in the future");
            return false;
        }

        let expected = match self.sign(session_id, timestamp, nonce) {
            Ok(expected) => expected,
            Err(_) => return false,
        };

        if !bool::from(expected.as_bytes().ct_eq(hmac_part.as_bytes())) {
            return false;
        }

        let mut consumed = self.consumed.lock().unwrap_or_else(|e| e.into_inner());
        consumed.retain(|_, issued| issued.saturating_add(CSRF_TOKEN_EXPIRATION_SECS) >= now);
        if consumed.contains_key(nonce) {
            tracing::debug!("CSRF token replayed");
            return false;
        }
        consumed.insert(nonce.to_string(), timestamp);

        true
    }
}

impl TokenService for CsrfTokenService {
    fn issue(&self, session_id: &str) -> Result<String, AppError> {
        self.issue_at(session_id, chrono::Utc::now().timestamp())
    }

    fn verify_and_consume(&self, session_id: &str, token: &str) -> bool {
        self.verify_at(session_id, token, chrono::Utc::now().timestamp())
    }
}
