//! Encryption at rest for snapshot content
//!
//! Ciphertext layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Nonces are drawn from `OsRng` for every encryption.

use crate::errors::{ExError, ExErrorKind, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric cipher applied to serialized dashboard content
pub trait ContentCipher: Send + Sync {
    /// # Errors
    ///
    /// `Crypto` on cipher failure, `RandomSource` if a nonce cannot be drawn.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// # Errors
    ///
    /// `Crypto` if the payload is truncated or fails authentication.
    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// AES-256-GCM `ContentCipher`
#[derive(Clone)]
pub struct AesGcmCipher {
    key: [u8; 32],
}

impl AesGcmCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Build from a 64-character hex string
    ///
    /// # Errors
    ///
    /// `Config` if the string is not hex or does not decode to 32 bytes.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("load_encryption_key")
                .with_message(format!("encryption key is not valid hex: {}", e))
        })?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ExError::new(ExErrorKind::Config)
                .with_op("load_encryption_key")
                .with_message(format!(
                    "encryption key must be 32 bytes, got {}",
                    bytes.len()
                ))
        })?;
        Ok(Self::new(key))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmCipher(***REDACTED***)")
    }
}

impl ContentCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce).map_err(|e| {
            ExError::new(ExErrorKind::RandomSource)
                .with_op("encrypt_content")
                .with_message(e.to_string())
        })?;

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| {
                ExError::new(ExErrorKind::Crypto)
                    .with_op("encrypt_content")
                    .with_message(format!("aes-gcm: {}", e))
            })?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(ExError::new(ExErrorKind::Crypto)
                .with_op("decrypt_content")
                .with_message("encrypted payload truncated"));
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| {
                ExError::new(ExErrorKind::Crypto)
                    .with_op("decrypt_content")
                    .with_message(format!("aes-gcm: {}", e))
            })
    }
}
