//! Confirmation tracking
//!
//! Per-transaction, per-owner approval state. Entries are created on first
//! confirmation and toggled afterwards, never removed.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use crate::multisig::ledger::{Transaction, TxId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `(tx_id, owner) -> confirmed` map
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConfirmationTracker {
    entries: HashMap<TxId, HashMap<Address, bool>>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `owner` currently confirms `tx_id`
    pub fn is_confirmed(&self, tx_id: TxId, owner: &Address) -> bool {
        self.entries
            .get(&tx_id)
            .and_then(|by_owner| by_owner.get(owner))
            .copied()
            .unwrap_or(false)
    }

    /// Record `owner`'s approval of `tx`
    ///
    /// The caller has already checked ownership and existence.
    pub fn confirm(&mut self, tx: &mut Transaction, owner: &Address) -> Result<(), WalletError> {
        if tx.executed {
            return Err(WalletError::TxAlreadyExecuted(tx.id));
        }
        if self.is_confirmed(tx.id, owner) {
            return Err(WalletError::TxAlreadyConfirmed {
                tx_id: tx.id,
                owner: *owner,
            });
        }

        self.entries.entry(tx.id).or_default().insert(*owner, true);
        tx.confirmation_count += 1;
        Ok(())
    }

    /// Withdraw `owner`'s approval of `tx`
    pub fn revoke(&mut self, tx: &mut Transaction, owner: &Address) -> Result<(), WalletError> {
        if tx.executed {
            return Err(WalletError::TxAlreadyExecuted(tx.id));
        }
        if !self.is_confirmed(tx.id, owner) {
            return Err(WalletError::TxNotConfirmed {
                tx_id: tx.id,
                owner: *owner,
            });
        }

        self.entries.entry(tx.id).or_default().insert(*owner, false);
        tx.confirmation_count -= 1;
        Ok(())
    }

    /// Confirming owners of `tx_id`, in the order of `owners`
    pub fn confirmers(&self, tx_id: TxId, owners: &[Address]) -> Vec<Address> {
        owners
            .iter()
            .filter(|owner| self.is_confirmed(tx_id, owner))
            .copied()
            .collect()
    }

    /// Count of true entries for `tx_id` among `owners`
    pub fn count(&self, tx_id: TxId, owners: &[Address]) -> usize {
        owners
            .iter()
            .filter(|owner| self.is_confirmed(tx_id, owner))
            .count()
    }

    /// Transactions with at least one entry
    pub(crate) fn tracked(&self) -> impl Iterator<Item = TxId> + '_ {
        self.entries.keys().copied()
    }

    /// Entries that name someone outside `owners`
    pub(crate) fn strangers<'a>(
        &'a self,
        owners: &'a [Address],
    ) -> impl Iterator<Item = (TxId, Address)> + 'a {
        self.entries.iter().flat_map(move |(tx_id, by_owner)| {
            by_owner
                .keys()
                .filter(move |owner| !owners.contains(owner))
                .map(move |owner| (*tx_id, *owner))
        })
    }
}
