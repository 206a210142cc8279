//! Funds held by a custody wallet
//!
//! [`Treasury`] is an in-memory [`ActionExecutor`](crate::multisig::ActionExecutor)
//! that moves value out of the wallet's holdings when an approved transaction
//! runs. Plain deposits top the holdings up.

pub mod vault;

pub use vault::{CallRecord, Deposit, Treasury, TreasuryBook, TreasuryError};
