//! Shared-custody authorization engine
//!
//! A fixed set of owners must jointly approve an action before it runs.
//! Components, leaf first:
//! - [`OwnerRegistry`]: immutable owner set and threshold
//! - [`TransactionLedger`]: append-only proposed actions
//! - [`ConfirmationTracker`]: per-owner approvals
//! - [`Quorum`]: threshold check
//! - dispatcher: exactly-once execution through an [`ActionExecutor`]
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::crypto::Address;
//! use multisig_custody::multisig::{ActionError, MultisigWallet};
//!
//! let (a, b, c) = (Address::new([1; 20]), Address::new([2; 20]), Address::new([3; 20]));
//! let wallet = MultisigWallet::new(vec![a, b, c], 2).unwrap();
//!
//! let tx_id = wallet.submit(&a, c, 0, vec![]).unwrap();
//! wallet.confirm(&a, tx_id).unwrap();
//! wallet.confirm(&b, tx_id).unwrap();
//!
//! let run = |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> { Ok(()) };
//! wallet.execute(&c, tx_id, &run).unwrap();
//! assert!(wallet.transaction(tx_id).unwrap().executed);
//! ```

pub mod confirmations;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod ledger;
pub mod quorum;
pub mod registry;
pub mod wallet;

pub use confirmations::ConfirmationTracker;
pub use dispatcher::{ActionError, ActionExecutor};
pub use error::WalletError;
pub use events::{EventRecord, NotificationSink, WalletEvent};
pub use ledger::{Transaction, TransactionLedger, TxId};
pub use quorum::Quorum;
pub use registry::{MultisigConfig, OwnerRegistry};
pub use wallet::{MultisigWallet, WalletState};
