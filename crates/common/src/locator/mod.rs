//! Locators: how documents are addressed on the storage network
//!
//! Two kinds of locator share one 34-byte binary layout,
//! `bitfield (u16 LE) || payload (32 bytes)`, and one textual form
//! (unpadded URL-safe base64, 46 characters):
//!
//! - a [`DirectLocator`] (bitfield `0`) names one immutable blob by its
//!   [`ContentId`] and never changes
//! - a [`ResolvableLocator`] (bitfield `1`) names a registry entry by its
//!   [`EntryId`]; dereferencing it yields whatever blob the entry points at
//!
//! Everything here is pure: no operation in this module performs I/O.

mod ids;

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use ids::{ContentId, EntryId, ID_SIZE};

/// Size of a locator's binary form in bytes
pub const LOCATOR_SIZE: usize = 2 + ID_SIZE;
/// Length of a locator's textual form
pub const LOCATOR_STR_LEN: usize = 46;

const DIRECT_BITFIELD: u16 = 0;
const RESOLVER_BITFIELD: u16 = 1;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("malformed locator: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("malformed locator: invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("malformed locator: unknown bitfield {0:#06x}")]
    UnknownBitfield(u16),
    #[error("malformed locator: expected a {expected} locator")]
    UnexpectedKind { expected: &'static str },
}

/// Either kind of locator, as accepted by downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Direct(DirectLocator),
    Resolvable(ResolvableLocator),
}

impl Locator {
    pub fn to_bytes(&self) -> [u8; LOCATOR_SIZE] {
        match self {
            Locator::Direct(direct) => direct.to_bytes(),
            Locator::Resolvable(resolvable) => resolvable.to_bytes(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LocatorError> {
        let (bitfield, payload) = split(bytes)?;
        match bitfield {
            DIRECT_BITFIELD => Ok(Locator::Direct(DirectLocator(ContentId::from(payload)))),
            RESOLVER_BITFIELD => Ok(Locator::Resolvable(ResolvableLocator(EntryId::from(
                payload,
            )))),
            other => Err(LocatorError::UnknownBitfield(other)),
        }
    }
}

impl From<DirectLocator> for Locator {
    fn from(locator: DirectLocator) -> Self {
        Locator::Direct(locator)
    }
}

impl From<ResolvableLocator> for Locator {
    fn from(locator: ResolvableLocator) -> Self {
        Locator::Resolvable(locator)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.to_bytes()))
    }
}

impl FromStr for Locator {
    type Err = LocatorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::from_bytes(&decode_str(s)?)
    }
}

/// Points at exactly one immutable blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectLocator(ContentId);

impl DirectLocator {
    /// Wrap a content identifier as a direct locator
    pub fn new(content_id: ContentId) -> Self {
        Self(content_id)
    }

    pub fn content_id(&self) -> &ContentId {
        &self.0
    }

    /// Binary form, as stored in a registry entry's data
    pub fn to_bytes(&self) -> [u8; LOCATOR_SIZE] {
        join(DIRECT_BITFIELD, self.0.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LocatorError> {
        match Locator::from_bytes(bytes)? {
            Locator::Direct(direct) => Ok(direct),
            Locator::Resolvable(_) => Err(LocatorError::UnexpectedKind { expected: "direct" }),
        }
    }
}

/// Points at a registry entry; resolves to the entry's current target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvableLocator(EntryId);

impl ResolvableLocator {
    pub fn new(entry_id: EntryId) -> Self {
        Self(entry_id)
    }

    /// Build a resolvable locator from raw entry id bytes
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::InvalidLength`] if `entry_id` is not `ID_SIZE` bytes.
    pub fn from_entry_id_bytes(entry_id: &[u8]) -> Result<Self, LocatorError> {
        Ok(Self(EntryId::try_from(entry_id)?))
    }

    pub fn entry_id(&self) -> &EntryId {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; LOCATOR_SIZE] {
        join(RESOLVER_BITFIELD, self.0.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LocatorError> {
        match Locator::from_bytes(bytes)? {
            Locator::Resolvable(resolvable) => Ok(resolvable),
            Locator::Direct(_) => Err(LocatorError::UnexpectedKind {
                expected: "resolvable",
            }),
        }
    }
}

macro_rules! locator_text_impls {
    ($type:ty) => {
        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&URL_SAFE_NO_PAD.encode(self.to_bytes()))
            }
        }

        impl FromStr for $type {
            type Err = LocatorError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$type>::from_bytes(&decode_str(s)?)
            }
        }

        impl Serialize for $type {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

locator_text_impls!(DirectLocator);
locator_text_impls!(ResolvableLocator);

fn decode_str(s: &str) -> Result<Vec<u8>, LocatorError> {
    if s.len() != LOCATOR_STR_LEN {
        return Err(LocatorError::InvalidEncoding(format!(
            "expected {} characters, got {}",
            LOCATOR_STR_LEN,
            s.len()
        )));
    }
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| LocatorError::InvalidEncoding(e.to_string()))
}

fn split(bytes: &[u8]) -> Result<(u16, [u8; ID_SIZE]), LocatorError> {
    if bytes.len() != LOCATOR_SIZE {
        return Err(LocatorError::InvalidLength {
            expected: LOCATOR_SIZE,
            actual: bytes.len(),
        });
    }
    let bitfield = u16::from_le_bytes([bytes[0], bytes[1]]);
    let mut payload = [0u8; ID_SIZE];
    payload.copy_from_slice(&bytes[2..]);
    Ok((bitfield, payload))
}

fn join(bitfield: u16, payload: &[u8; ID_SIZE]) -> [u8; LOCATOR_SIZE] {
    let mut out = [0u8; LOCATOR_SIZE];
    out[..2].copy_from_slice(&bitfield.to_le_bytes());
    out[2..].copy_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_registry_keys, Seed, SEED_SIZE};

    fn direct() -> DirectLocator {
        DirectLocator::new(ContentId::from([7u8; ID_SIZE]))
    }

    #[test]
    fn test_text_form_shape() {
        let text = direct().to_string();
        assert_eq!(text.len(), LOCATOR_STR_LEN);
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(text.parse::<DirectLocator>().unwrap(), direct());
    }

    #[test]
    fn test_binary_form_carries_bitfield() {
        let bytes = direct().to_bytes();
        assert_eq!(&bytes[..2], &[0, 0]);
        assert_eq!(&bytes[2..], &[7u8; ID_SIZE]);

        let resolvable = ResolvableLocator::new(EntryId::from([9u8; ID_SIZE]));
        let bytes = resolvable.to_bytes();
        assert_eq!(&bytes[..2], &[1, 0]);
        assert_eq!(ResolvableLocator::from_bytes(&bytes).unwrap(), resolvable);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let resolvable = ResolvableLocator::new(EntryId::from([9u8; ID_SIZE]));
        assert_eq!(
            DirectLocator::from_bytes(&resolvable.to_bytes()),
            Err(LocatorError::UnexpectedKind { expected: "direct" })
        );
        assert!(resolvable.to_string().parse::<DirectLocator>().is_err());
        assert!(direct().to_string().parse::<ResolvableLocator>().is_err());

        let any: Locator = resolvable.to_string().parse().unwrap();
        assert_eq!(any, Locator::Resolvable(resolvable));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(
            DirectLocator::from_bytes(&[0u8; 33]),
            Err(LocatorError::InvalidLength {
                expected: LOCATOR_SIZE,
                actual: 33
            })
        );

        let mut bytes = direct().to_bytes();
        bytes[0] = 5;
        assert_eq!(
            Locator::from_bytes(&bytes),
            Err(LocatorError::UnknownBitfield(5))
        );

        // wrong length, bad charset, standard-alphabet characters
        assert!("short".parse::<Locator>().is_err());
        let bad_charset = format!("{}!", &direct().to_string()[..LOCATOR_STR_LEN - 1]);
        assert!(bad_charset.parse::<Locator>().is_err());
        let std_alphabet = direct().to_string().replace('_', "/").replace('-', "+");
        if std_alphabet != direct().to_string() {
            assert!(std_alphabet.parse::<Locator>().is_err());
        }
    }

    #[test]
    fn test_resolver_locator_from_entry_id_bytes() {
        assert!(ResolvableLocator::from_entry_id_bytes(&[1u8; ID_SIZE]).is_ok());
        assert_eq!(
            ResolvableLocator::from_entry_id_bytes(&[1u8; 31]),
            Err(LocatorError::InvalidLength {
                expected: ID_SIZE,
                actual: 31
            })
        );
    }

    #[test]
    fn test_resolvable_locator_is_pure() {
        let seed = Seed::from([1u8; SEED_SIZE]);
        let (kp, dk) = derive_registry_keys(&seed, "moduleA", "list1");
        let a = ResolvableLocator::new(EntryId::derive(kp.public_key(), &dk));
        let b = ResolvableLocator::new(EntryId::derive(kp.public_key(), &dk));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&direct()).unwrap();
        assert_eq!(json, format!("\"{}\"", direct()));
        let back: DirectLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, direct());
    }
}
