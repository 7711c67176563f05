//! The admin session, carried explicitly through the handlers.
//!
//! After a successful login at the backend, the bearer token and the admin's identity are stored in
//! an [AdminSession]. It is serialized to JSON and signed with HMAC-SHA256 using the application
//! secret, so that it can be kept in a cookie on the client side without any server-side token
//! store: `<base64 payload>.<base64 signature>`.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Bearer token of the backend, attached to all admin-only backend calls
    pub token: String,
    pub username: String,
    pub role: String,
    /// Unix timestamp (seconds) of the login
    pub issued_at: i64,
}

impl AdminSession {
    pub fn new(token: String, username: String, role: String) -> Self {
        Self {
            token,
            username,
            role,
            issued_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Verify and decode a session from its cookie representation.
    ///
    /// Sessions older than `max_age` are rejected with [SessionError::ExpiredToken].
    pub fn from_string(value: &str, secret: &str, max_age: Duration) -> Result<Self, SessionError> {
        let (payload_part, signature_part) = value
            .split_once('.')
            .ok_or(SessionError::InvalidTokenStructure)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        hmac::verify(&signing_key(secret), payload_part.as_bytes(), &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        let session: AdminSession =
            serde_json::from_slice(&payload).map_err(|_| SessionError::InvalidTokenStructure)?;

        let age = chrono::Utc::now().timestamp() - session.issued_at;
        if age < 0 || age as u64 > max_age.as_secs() {
            return Err(SessionError::ExpiredToken);
        }
        Ok(session)
    }

    /// Serialize and sign the session for storing it in a cookie.
    pub fn as_string(&self, secret: &str) -> String {
        let payload = serde_json::to_vec(self).expect("AdminSession should be serializable");
        let payload_part = URL_SAFE_NO_PAD.encode(payload);
        let signature = hmac::sign(&signing_key(secret), payload_part.as_bytes());
        format!(
            "{}.{}",
            payload_part,
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }
}

fn signing_key(secret: &str) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenStructure,
    SignatureVerificationFailed,
    ExpiredToken,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTokenStructure => f.write_str("invalid session token structure"),
            SessionError::SignatureVerificationFailed => {
                f.write_str("session token signature verification failed")
            }
            SessionError::ExpiredToken => f.write_str("session token expired"),
        }
    }
}

impl std::error::Error for SessionError {}
