//! Multi-signature custody wallet
//!
//! Owns the owner registry, transaction ledger, and confirmation map of a
//! single wallet. All operations take `&self`: the state sits in a `RefCell`
//! that is never held across a call into an action executor, so an executor
//! may re-enter the wallet and observe committed state.

use crate::crypto::Address;
use crate::multisig::confirmations::ConfirmationTracker;
use crate::multisig::error::WalletError;
use crate::multisig::events::{EventRecord, NotificationSink, WalletEvent};
use crate::multisig::ledger::{Transaction, TransactionLedger, TxId};
use crate::multisig::quorum::Quorum;
use crate::multisig::registry::{MultisigConfig, OwnerRegistry};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

/// Everything a wallet persists
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletState {
    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub registry: OwnerRegistry,
    pub ledger: TransactionLedger,
    pub confirmations: ConfirmationTracker,
    /// Every event emitted so far
    pub journal: Vec<EventRecord>,
    pub created_at: DateTime<Utc>,
}

impl WalletState {
    fn new(registry: OwnerRegistry, label: Option<String>) -> Self {
        Self {
            label,
            registry,
            ledger: TransactionLedger::new(),
            confirmations: ConfirmationTracker::new(),
            journal: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Check cross-component invariants of a loaded document
    fn verify(&self) -> Result<(), WalletError> {
        self.ledger.verify_sequence()?;

        let owners = self.registry.owners();
        if let Some((tx_id, stranger)) = self.confirmations.strangers(owners).next() {
            return Err(WalletError::CorruptState(format!(
                "transaction {} confirmed by non-owner {}",
                tx_id, stranger
            )));
        }

        let known: HashSet<TxId> = self.ledger.iter().map(|tx| tx.id).collect();
        if let Some(tx_id) = self
            .confirmations
            .tracked()
            .find(|tx_id| !known.contains(tx_id))
        {
            return Err(WalletError::CorruptState(format!(
                "confirmations recorded for unknown transaction {}",
                tx_id
            )));
        }

        for tx in self.ledger.iter() {
            let actual = self.confirmations.count(tx.id, owners);
            if actual != tx.confirmation_count {
                return Err(WalletError::CorruptState(format!(
                    "transaction {} records {} confirmations but {} owners confirm it",
                    tx.id, tx.confirmation_count, actual
                )));
            }
        }

        Ok(())
    }
}

/// An M-of-N custody wallet
pub struct MultisigWallet {
    pub(crate) state: RefCell<WalletState>,
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl MultisigWallet {
    /// Create a wallet from an owner set and threshold
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, WalletError> {
        Self::from_config(MultisigConfig::new(owners, threshold, None))
    }

    /// Create a wallet from a configuration
    pub fn from_config(config: MultisigConfig) -> Result<Self, WalletError> {
        let label = config.label.clone();
        let registry = OwnerRegistry::try_from(config)?;
        info!(
            "Created {} wallet{}",
            registry.description(),
            label
                .as_deref()
                .map(|l| format!(" '{}'", l))
                .unwrap_or_default()
        );
        Ok(Self::with_state(WalletState::new(registry, label)))
    }

    /// Rebuild a wallet from a saved state, checking its invariants
    pub fn restore(state: WalletState) -> Result<Self, WalletError> {
        state.verify()?;
        debug!(
            "Restored wallet with {} transactions",
            state.ledger.count()
        );
        Ok(Self::with_state(state))
    }

    fn with_state(state: WalletState) -> Self {
        Self {
            state: RefCell::new(state),
            sinks: Vec::new(),
        }
    }

    /// Copy of the current state, for persistence
    pub fn snapshot(&self) -> WalletState {
        self.state.borrow().clone()
    }

    /// Deliver future events to `sink`
    pub fn subscribe(&mut self, sink: impl NotificationSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    // ---- queries ----

    pub fn label(&self) -> Option<String> {
        self.state.borrow().label.clone()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        self.state.borrow().registry.description()
    }

    /// Owners in construction order
    pub fn owners(&self) -> Vec<Address> {
        self.state.borrow().registry.owners().to_vec()
    }

    pub fn threshold(&self) -> usize {
        self.state.borrow().registry.threshold()
    }

    pub fn is_owner(&self, id: &Address) -> bool {
        self.state.borrow().registry.is_owner(id)
    }

    /// Whether `owner` currently confirms `tx_id`
    pub fn is_confirmed(&self, tx_id: TxId, owner: &Address) -> bool {
        self.state.borrow().confirmations.is_confirmed(tx_id, owner)
    }

    /// Owners confirming `tx_id`, in owner order
    pub fn confirmers(&self, tx_id: TxId) -> Result<Vec<Address>, WalletError> {
        let state = self.state.borrow();
        state.ledger.get(tx_id)?;
        Ok(state
            .confirmations
            .confirmers(tx_id, state.registry.owners()))
    }

    pub fn transaction_count(&self) -> TxId {
        self.state.borrow().ledger.count()
    }

    pub fn transaction(&self, tx_id: TxId) -> Result<Transaction, WalletError> {
        self.state.borrow().ledger.get(tx_id).cloned()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().ledger.iter().cloned().collect()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> Vec<Transaction> {
        self.state.borrow().ledger.pending().cloned().collect()
    }

    /// Whether `tx_id` could be executed right now
    pub fn can_execute(&self, tx_id: TxId) -> Result<bool, WalletError> {
        let state = self.state.borrow();
        let tx = state.ledger.get(tx_id)?;
        Ok(Quorum::new(state.registry.threshold()).can_execute(tx))
    }

    /// Event journal
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.borrow().journal.clone()
    }

    // ---- operations ----

    /// Propose an action. Returns the new transaction id.
    pub fn submit(
        &self,
        caller: &Address,
        target: Address,
        value: u64,
        payload: Vec<u8>,
    ) -> Result<TxId, WalletError> {
        let tx_id = {
            let mut state = self.state.borrow_mut();
            state
                .registry
                .ensure_owner(caller)
                .map_err(|e| Self::rejected("submit", caller, e))?;
            state.ledger.append(*caller, target, value, payload.clone())
        };

        info!(
            "Submitted transaction {}: {} to {} by {}",
            tx_id,
            value,
            target.short(),
            caller.short()
        );
        self.emit(WalletEvent::Submitted {
            caller: *caller,
            tx_id,
            target,
            value,
            payload,
        });
        Ok(tx_id)
    }

    /// Record the caller's approval of `tx_id`
    pub fn confirm(&self, caller: &Address, tx_id: TxId) -> Result<(), WalletError> {
        let count = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state
                .registry
                .ensure_owner(caller)
                .map_err(|e| Self::rejected("confirm", caller, e))?;
            let tx = state
                .ledger
                .get_mut(tx_id)
                .map_err(|e| Self::rejected("confirm", caller, e))?;
            state
                .confirmations
                .confirm(tx, caller)
                .map_err(|e| Self::rejected("confirm", caller, e))?;
            tx.confirmation_count
        };

        info!(
            "Transaction {} confirmed by {} ({}/{})",
            tx_id,
            caller.short(),
            count,
            self.threshold()
        );
        self.emit(WalletEvent::Confirmed {
            caller: *caller,
            tx_id,
        });
        Ok(())
    }

    /// Withdraw the caller's approval of `tx_id`
    pub fn revoke(&self, caller: &Address, tx_id: TxId) -> Result<(), WalletError> {
        let count = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state
                .registry
                .ensure_owner(caller)
                .map_err(|e| Self::rejected("revoke", caller, e))?;
            let tx = state
                .ledger
                .get_mut(tx_id)
                .map_err(|e| Self::rejected("revoke", caller, e))?;
            state
                .confirmations
                .revoke(tx, caller)
                .map_err(|e| Self::rejected("revoke", caller, e))?;
            tx.confirmation_count
        };

        info!(
            "Transaction {} confirmation revoked by {} ({}/{})",
            tx_id,
            caller.short(),
            count,
            self.threshold()
        );
        self.emit(WalletEvent::Revoked {
            caller: *caller,
            tx_id,
        });
        Ok(())
    }

    /// Journal an event and hand it to the sinks
    pub(crate) fn emit(&self, event: WalletEvent) {
        let record = {
            let mut state = self.state.borrow_mut();
            let record = EventRecord {
                sequence: state.journal.len() as u64,
                emitted_at: Utc::now(),
                event,
            };
            state.journal.push(record.clone());
            record
        };

        for sink in &self.sinks {
            sink.notify(&record);
        }
    }

    pub(crate) fn rejected(op: &str, caller: &Address, err: WalletError) -> WalletError {
        debug!("Rejected {} from {}: {}", op, caller.short(), err);
        err
    }
}

impl fmt::Debug for MultisigWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisigWallet")
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
