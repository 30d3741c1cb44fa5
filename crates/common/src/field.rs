//! Content addressing for encrypted field values.
//!
//! A field value never lives under a path built from its plaintext key names.
//! Its location is `ids/<hex(sha256("origin:uid:field_name"))>` in the public
//! namespace of the user who owns it. Anyone who knows the triple can compute
//! the path; only recipients of the encryption can read what is there.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Size of a SHA-256 digest in bytes
pub const FIELD_HASH_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum FieldHashError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {FIELD_HASH_SIZE} bytes, got {0}")]
    Length(usize),
}

/// The address of one encrypted field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldHash([u8; FIELD_HASH_SIZE]);

impl FieldHash {
    pub fn new(origin: &str, uid: &str, field_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(origin.as_bytes());
        hasher.update(b":");
        hasher.update(uid.as_bytes());
        hasher.update(b":");
        hasher.update(field_name.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn from_hex(s: &str) -> Result<Self, FieldHashError> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let bytes: [u8; FIELD_HASH_SIZE] =
            bytes.try_into().map_err(|_| FieldHashError::Length(len))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for FieldHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for FieldHash {
    type Err = FieldHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for FieldHash {
    type Error = FieldHashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<FieldHash> for String {
    fn from(value: FieldHash) -> Self {
        value.to_hex()
    }
}
