//! Principal identifiers
//!
//! An [`Address`] is the 20-byte RIPEMD160(SHA256(pubkey)) digest of an
//! owner's public key. Its text form is Base58Check with a `0x00` version
//! byte, the same encoding Bitcoin uses for P2PKH addresses.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::double_sha256;

/// Version byte prepended before Base58Check encoding
pub const ADDRESS_VERSION: u8 = 0x00;

/// Length of the raw address digest
pub const ADDRESS_LEN: usize = 20;

const CHECKSUM_LEN: usize = 4;

/// Errors raised while parsing an address
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Unsupported address version: {0:#04x}")]
    InvalidVersion(u8),
    #[error("Address checksum mismatch")]
    InvalidChecksum,
}

/// A principal identifier (owner or transaction target)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The null identity. Never a valid owner.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Wrap a raw 20-byte digest
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// True for the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Short form used in log lines
    pub fn short(&self) -> String {
        let full = self.to_string();
        if full.len() <= 10 {
            return full;
        }
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }

    fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
        let hash = double_sha256(payload);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&hash[..CHECKSUM_LEN]);
        checksum
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = Vec::with_capacity(1 + ADDRESS_LEN + CHECKSUM_LEN);
        bytes.push(ADDRESS_VERSION);
        bytes.extend_from_slice(&self.0);
        let checksum = Self::checksum(&bytes);
        bytes.extend_from_slice(&checksum);
        f.write_str(&bs58::encode(bytes).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;

        let expected = 1 + ADDRESS_LEN + CHECKSUM_LEN;
        if bytes.len() != expected {
            return Err(AddressError::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        if bytes[0] != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(bytes[0]));
        }

        let (payload, checksum) = bytes.split_at(1 + ADDRESS_LEN);
        if Self::checksum(payload) != checksum {
            return Err(AddressError::InvalidChecksum);
        }

        let mut digest = [0u8; ADDRESS_LEN];
        digest.copy_from_slice(&payload[1..]);
        Ok(Self(digest))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
