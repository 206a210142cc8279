//! Errors raised by the custody engine

use crate::crypto::Address;
use crate::multisig::dispatcher::ActionError;
use crate::multisig::ledger::TxId;
use thiserror::Error;

/// Errors related to multisig operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalletError {
    // Construction
    #[error("owners required")]
    OwnersRequired,
    #[error("invalid number of required confirmations: {threshold} of {owners} owners")]
    InvalidThreshold { threshold: usize, owners: usize },
    #[error("invalid owner at position {0}")]
    InvalidOwner(usize),
    #[error("owner not unique: {0}")]
    OwnerNotUnique(Address),

    // Authorization and lookup
    #[error("not owner: {0}")]
    NotOwner(Address),
    #[error("tx does not exist: {0}")]
    TxNotFound(TxId),

    // State conflicts
    #[error("tx already executed: {0}")]
    TxAlreadyExecuted(TxId),
    #[error("tx already confirmed: {tx_id} by {owner}")]
    TxAlreadyConfirmed { tx_id: TxId, owner: Address },
    #[error("tx not confirmed: {tx_id} by {owner}")]
    TxNotConfirmed { tx_id: TxId, owner: Address },
    #[error("cannot execute tx {tx_id}: have {have} confirmations, need {need}")]
    InsufficientConfirmations { tx_id: TxId, have: usize, need: usize },

    // Execution
    #[error("tx failed: {tx_id}: {source}")]
    ExecutionFailed {
        tx_id: TxId,
        #[source]
        source: ActionError,
    },

    // Restoring a saved wallet
    #[error("Corrupt wallet state: {0}")]
    CorruptState(String),
}
