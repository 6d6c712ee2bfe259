use crate::data_store::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::rand::SecureRandom;
use ring::{hmac, pbkdf2, rand};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Signed session token, issued at login and presented by the client with each API request in the
/// `X-SESSION-TOKEN` header.
///
/// The string representation consists of the base64url-encoded JSON payload and a
/// base64url-encoded HMAC-SHA256 signature over the payload, separated by a dot. The server-side
/// `SECRET` is the signing key, so tokens cannot be forged or modified by clients.
pub struct SessionToken {
    user_id: UserId,
    issued_at: u64,
}

#[derive(Serialize, Deserialize)]
struct SessionTokenPayload {
    user_id: UserId,
    issued_at: u64,
}

impl SessionToken {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            issued_at: unix_timestamp_now(),
        }
    }

    /// Parse and verify a session token string.
    ///
    /// Fails if the signature does not match the payload under the given secret or if the token
    /// has been issued more than `max_age` ago.
    pub fn from_string(data: &str, secret: &str, max_age: Duration) -> Result<Self, SessionError> {
        let (payload_b64, signature_b64) = data
            .split_once('.')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, &payload_bytes, &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;
        let payload: SessionTokenPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        if payload.issued_at + max_age.as_secs() < unix_timestamp_now() {
            return Err(SessionError::ExpiredToken);
        }
        Ok(Self {
            user_id: payload.user_id,
            issued_at: payload.issued_at,
        })
    }

    pub fn as_string(&self, secret: &str) -> String {
        let payload = serde_json::to_vec(&SessionTokenPayload {
            user_id: self.user_id,
            issued_at: self.issued_at,
        })
        .expect("session token payload is always serializable");
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, &payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_secs()
}

#[derive(Debug)]
pub enum SessionError {
    InvalidTokenFormat,
    SignatureVerificationFailed,
    ExpiredToken,
}

const PBKDF2_ITERATIONS: u32 = 100_000;
const PBKDF2_SALT_LEN: usize = 16;
const PBKDF2_HASH_LEN: usize = 32;

/// Hash a password for storage in the user database.
///
/// Output format: `pbkdf2-sha256$<iterations>$<salt_b64>$<hash_b64>`, so the parameters of old
/// hashes stay verifiable when the defaults change.
pub fn hash_password(password: &str) -> String {
    let rng = rand::SystemRandom::new();
    let mut salt = [0u8; PBKDF2_SALT_LEN];
    rng.fill(&mut salt)
        .expect("system random number generator should be available");
    let mut hash = [0u8; PBKDF2_HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERATIONS).unwrap(),
        &salt,
        password.as_bytes(),
        &mut hash,
    );
    format!(
        "pbkdf2-sha256${}${}${}",
        PBKDF2_ITERATIONS,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    )
}

/// Check a password attempt against a stored hash. Malformed stored hashes simply fail the check.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let (Some("pbkdf2-sha256"), Some(iterations), Some(salt_b64), Some(hash_b64), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Some(iterations) = NonZeroU32::new(iterations) else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };
    let Ok(hash) = URL_SAFE_NO_PAD.decode(hash_b64) else {
        return false;
    };
    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}
