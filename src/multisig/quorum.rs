//! Quorum evaluation

use crate::multisig::error::WalletError;
use crate::multisig::ledger::Transaction;

/// Decides whether a transaction has enough confirmations to run.
///
/// Every confirmation weighs the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quorum {
    threshold: usize,
}

impl Quorum {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// `!executed && confirmation_count >= threshold`
    pub fn can_execute(&self, tx: &Transaction) -> bool {
        !tx.executed && tx.confirmation_count >= self.threshold
    }

    /// Confirmations still missing before `tx` reaches quorum
    pub fn shortfall(&self, tx: &Transaction) -> usize {
        self.threshold.saturating_sub(tx.confirmation_count)
    }

    /// Like [`Quorum::can_execute`], reporting which condition failed
    pub fn check(&self, tx: &Transaction) -> Result<(), WalletError> {
        if tx.executed {
            return Err(WalletError::TxAlreadyExecuted(tx.id));
        }
        if tx.confirmation_count < self.threshold {
            return Err(WalletError::InsufficientConfirmations {
                tx_id: tx.id,
                have: tx.confirmation_count,
                need: self.threshold,
            });
        }
        Ok(())
    }
}
