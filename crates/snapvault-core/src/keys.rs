//! Capability token generation
//!
//! Tokens are drawn from the operating system CSPRNG and mapped onto an
//! alphanumeric alphabet with rejection sampling, so every symbol is equally
//! likely. There is no fallback to a weaker generator: if the OS source
//! fails, snapshot creation fails.

use crate::errors::{ExError, Result, SnapshotError};
use rand::rngs::OsRng;
use rand::RngCore;

/// Length of generated `key` and `delete_key` values
pub const KEY_LENGTH: usize = 32;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; bytes at or above it are discarded.
const ACCEPT_BELOW: u8 = 248;

/// Source of random tokens
pub trait TokenSource: Send + Sync {
    /// Produce a token of exactly `length` alphanumeric characters
    ///
    /// # Errors
    ///
    /// `RandomSource` when entropy is unavailable.
    fn generate(&self, length: usize) -> Result<String>;
}

/// `TokenSource` backed by `OsRng`
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TokenSource for KeyGenerator {
    fn generate(&self, length: usize) -> Result<String> {
        let mut out = String::with_capacity(length);
        let mut buf = [0u8; 64];

        while out.len() < length {
            OsRng.try_fill_bytes(&mut buf).map_err(|e| {
                ExError::from(SnapshotError::RandomSource {
                    reason: e.to_string(),
                })
                .with_op("generate_key")
            })?;

            for &byte in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
                out.push(ALPHABET[(byte % 62) as usize] as char);
                if out.len() == length {
                    break;
                }
            }
        }

        Ok(out)
    }
}

/// Draws allowed before giving up on a token that differs from its partner
const DISTINCT_ATTEMPTS: usize = 3;

/// Generate a `(key, delete_key)` pair of `KEY_LENGTH` tokens that differ.
///
/// # Errors
///
/// `RandomSource` from the underlying source, or when it keeps returning the
/// same token for both halves.
pub fn generate_key_pair(source: &dyn TokenSource) -> Result<(String, String)> {
    let key = source.generate(KEY_LENGTH)?;
    let delete_key = generate_distinct(source, &key)?;
    Ok((key, delete_key))
}

/// Generate a `KEY_LENGTH` token that differs from `other`.
///
/// # Errors
///
/// Same as [`generate_key_pair`].
pub fn generate_distinct(source: &dyn TokenSource, other: &str) -> Result<String> {
    for _ in 0..DISTINCT_ATTEMPTS {
        let token = source.generate(KEY_LENGTH)?;
        if token != other {
            return Ok(token);
        }
    }
    Err(ExError::from(SnapshotError::RandomSource {
        reason: "token source produced identical key and delete key".to_string(),
    })
    .with_op("generate_key_pair"))
}

/// Whether `token` has the shape of a generated token
pub fn is_well_formed(token: &str) -> bool {
    token.len() == KEY_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
