//! Host root secret
//!
//! The seed is handed to the persistence layer once at startup and is the
//! only input to registry key derivation. It is never written anywhere by
//! this crate; the host decides how to store it (PEM, hex, keychain, ...).

use std::fmt;

/// Size of the root secret in bytes
pub const SEED_SIZE: usize = 16;

const PEM_TAG: &str = "ROOT SECRET";

/// Errors raised when a root secret cannot be accepted
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid seed size, expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid seed encoding: {0}")]
    Encoding(String),
    #[error("seed error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Process-wide root secret from which every registry identity is derived
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_SIZE]);

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

impl From<[u8; SEED_SIZE]> for Seed {
    fn from(bytes: [u8; SEED_SIZE]) -> Self {
        Seed(bytes)
    }
}

impl Seed {
    /// Generate a new random seed using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SeedError> {
        let mut buff = [0; SEED_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| anyhow::anyhow!("failed to generate random bytes: {}", e))?;
        Ok(Self(buff))
    }

    /// Create a seed from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::InvalidLength`] if the slice is not exactly `SEED_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SeedError> {
        if data.len() != SEED_SIZE {
            return Err(SeedError::InvalidLength {
                expected: SEED_SIZE,
                actual: data.len(),
            });
        }
        let mut buff = [0; SEED_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse a seed from a hexadecimal string, with or without a "0x" prefix
    pub fn from_hex(hex: &str) -> Result<Self, SeedError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|e| SeedError::Encoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode the seed in PEM format with tag "ROOT SECRET"
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(PEM_TAG, self.0.to_vec());
        pem::encode(&pem)
    }

    /// Parse a seed from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "ROOT SECRET"
    /// - The seed size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, SeedError> {
        let pem = pem::parse(pem_str).map_err(|e| SeedError::Encoding(e.to_string()))?;

        if pem.tag() != PEM_TAG {
            return Err(SeedError::Encoding(format!(
                "invalid PEM tag, expected {}, got {}",
                PEM_TAG,
                pem.tag()
            )));
        }

        Self::from_slice(pem.contents())
    }
}
