//! Principal identity for the custody engine
//!
//! This module provides:
//! - SHA-256 hashing
//! - secp256k1 owner keys
//! - Base58Check principal addresses

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError, ADDRESS_LEN};
pub use hash::{double_sha256, sha256, sha256_hex};
pub use keys::{public_key_from_hex, public_key_to_address, KeyError, KeyPair};
