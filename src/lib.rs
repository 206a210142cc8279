//! Multisig Custody: an M-of-N multi-signature wallet in Rust
//!
//! This crate provides a shared-custody wallet featuring:
//! - A fixed owner set with an M-of-N confirmation threshold
//! - A transaction ledger with per-owner confirm and revoke
//! - Exactly-once execution that stays safe under reentrant calls
//! - An event journal with pluggable notification sinks
//! - A treasury that holds funds and carries out transfers
//! - JSON persistence with rotating backups
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::KeyPair;
//! use multisig_custody::multisig::MultisigWallet;
//! use multisig_custody::treasury::Treasury;
//!
//! let owners: Vec<_> = (0..3).map(|_| KeyPair::generate().address()).collect();
//! let wallet = MultisigWallet::new(owners.clone(), 2).unwrap();
//!
//! let treasury = Treasury::new();
//! treasury.deposit(owners[0], 100).unwrap();
//!
//! let recipient = KeyPair::generate().address();
//! let tx_id = wallet.submit(&owners[0], recipient, 25, vec![]).unwrap();
//! wallet.confirm(&owners[0], tx_id).unwrap();
//! wallet.confirm(&owners[1], tx_id).unwrap();
//! wallet.execute(&owners[2], tx_id, &treasury).unwrap();
//!
//! assert_eq!(treasury.balance_of(&recipient), 25);
//! ```

pub mod cli;
pub mod crypto;
pub mod multisig;
pub mod storage;
pub mod treasury;

// Re-export commonly used types
pub use crypto::{Address, KeyPair};
pub use multisig::{
    ActionError, ActionExecutor, MultisigConfig, MultisigWallet, Transaction, TxId, WalletError,
    WalletEvent,
};
pub use storage::{Storage, StorageConfig, WalletDocument};
pub use treasury::Treasury;
