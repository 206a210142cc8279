//! Owner key management
//!
//! Owners are identified by the address of a secp256k1 public key. The CLI
//! derives the calling principal from a private key, so holding the key is
//! what makes a caller an owner.

use rand::rngs::OsRng;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::Digest;
use thiserror::Error;

use super::address::{Address, ADDRESS_LEN};
use super::hash::sha256;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The principal address controlled by this key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }
}

/// Derive a principal address: RIPEMD160(SHA256(compressed pubkey))
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let sha256_hash = sha256(&public_key.serialize());

    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let digest = ripemd.finalize();

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&digest);
    Address::new(bytes)
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(KeyPair::from_private_key_hex("not hex").is_err());
        // Zero is outside the curve order
        assert!(KeyPair::from_private_key_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_address_matches_public_key() {
        let kp = KeyPair::generate();
        let pubkey = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert_eq!(public_key_to_address(&pubkey), kp.address());
        // Bitcoin-style addresses start with 1 (mainnet)
        assert!(kp.address().to_string().starts_with('1'));
    }

    #[test]
    fn test_distinct_keys_distinct_addresses() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.address(), b.address());
    }
}
