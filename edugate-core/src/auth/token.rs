// edugate-core/src/auth/token.rs

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
    Engine as _,
};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand_core::TryRngCore;
use uuid::Uuid;

use edugate_common::models::{Claims, Role};

use crate::Error;

pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

const NONCE_LEN: usize = 12;

/// Issues and verifies bearer tokens.
///
/// A token is URL-safe base64 of `nonce || AES-256-GCM(json(claims))`, so it
/// is both opaque to clients and tamper-evident.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Arc<Aes256Gcm>,
    ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec from a 32-byte AES-256 key.
    pub fn new(key_bytes: &[u8]) -> Result<Self, Error> {
        if key_bytes.len() != 32 {
            return Err(Error::KeyDerivation(format!(
                "AES-256 key must be 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::clone_from_slice(key_bytes);
        Ok(Self {
            cipher: Arc::new(Aes256Gcm::new(&key)),
            ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        })
    }

    /// Same as [`TokenCodec::new`] with the key given as standard base64.
    pub fn from_base64_key(encoded: &str) -> Result<Self, Error> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        Self::new(&bytes)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, sub: Uuid, role: Role) -> Result<String, Error> {
        self.issue_at(sub, role, Utc::now())
    }

    pub fn issue_at(&self, sub: Uuid, role: Role, now: DateTime<Utc>) -> Result<String, Error> {
        self.seal(&Claims::new(sub, role, self.ttl, now))
    }

    pub fn seal(&self, claims: &Claims) -> Result<String, Error> {
        let plaintext = serde_json::to_vec(claims)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| Error::Encryption(e.to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| Error::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Opens a token without checking expiry.
    pub fn open(&self, token: &str) -> Result<Claims, Error> {
        let data = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| Error::Decryption(e.to_string()))?;
        if data.len() < NONCE_LEN {
            return Err(Error::Decryption("token too short (missing nonce)".to_owned()));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| Error::Decryption(e.to_string()))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        self.verify_at(token, Utc::now())
    }

    /// Opens and checks expiry. Every failure is `Unauthorized`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, Error> {
        let claims = self
            .open(token)
            .map_err(|_| Error::Unauthorized("invalid token".to_string()))?;
        if claims.is_expired_at(now) {
            return Err(Error::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }
}
