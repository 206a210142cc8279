//! Treasury vault
//!
//! Holds the wallet's balance and executes value transfers on its behalf.

use crate::crypto::Address;
use crate::multisig::{ActionError, ActionExecutor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Treasury errors outside of action execution
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Deposit amount must be positive")]
    ZeroDeposit,
    #[error("Deposit of {amount} would overflow holdings of {holdings}")]
    Overflow { amount: u64, holdings: u64 },
}

/// A plain value transfer into the wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deposit {
    pub sender: Address,
    pub amount: u64,
    /// Holdings after the deposit
    pub balance: u64,
    pub received_at: DateTime<Utc>,
}

/// An action carried out by the treasury
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRecord {
    pub target: Address,
    pub value: u64,
    #[serde(with = "crate::multisig::ledger::hex_payload")]
    pub payload: Vec<u8>,
    pub executed_at: DateTime<Utc>,
}

/// Serializable treasury contents
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreasuryBook {
    /// Value the wallet can still send
    pub holdings: u64,
    /// Value received by each target
    pub credited: BTreeMap<Address, u64>,
    /// Targets that refuse every call
    pub refusing: BTreeSet<Address>,
    pub deposits: Vec<Deposit>,
    pub calls: Vec<CallRecord>,
}

/// In-memory treasury backing a wallet's transfers
#[derive(Debug, Default)]
pub struct Treasury {
    book: RefCell<TreasuryBook>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a saved book
    pub fn from_book(book: TreasuryBook) -> Self {
        Self {
            book: RefCell::new(book),
        }
    }

    /// Copy of the current book
    pub fn book(&self) -> TreasuryBook {
        self.book.borrow().clone()
    }

    /// Accept a plain value transfer. Returns the new holdings.
    pub fn deposit(&self, sender: Address, amount: u64) -> Result<u64, TreasuryError> {
        if amount == 0 {
            return Err(TreasuryError::ZeroDeposit);
        }

        let mut book = self.book.borrow_mut();
        let balance = book
            .holdings
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow {
                amount,
                holdings: book.holdings,
            })?;
        book.holdings = balance;
        book.deposits.push(Deposit {
            sender,
            amount,
            balance,
            received_at: Utc::now(),
        });

        log::info!(
            "Deposit of {} from {} (holdings now {})",
            amount,
            sender.short(),
            balance
        );
        Ok(balance)
    }

    /// Make every future call to `target` fail
    pub fn refuse(&self, target: Address) {
        self.book.borrow_mut().refusing.insert(target);
    }

    pub fn holdings(&self) -> u64 {
        self.book.borrow().holdings
    }

    /// Total value sent to `target`
    pub fn balance_of(&self, target: &Address) -> u64 {
        self.book.borrow().credited.get(target).copied().unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.book.borrow().calls.clone()
    }

    pub fn deposits(&self) -> Vec<Deposit> {
        self.book.borrow().deposits.clone()
    }
}

impl ActionExecutor for Treasury {
    fn invoke(&self, target: &Address, value: u64, payload: &[u8]) -> Result<(), ActionError> {
        let mut book = self.book.borrow_mut();

        if book.refusing.contains(target) {
            return Err(ActionError::Rejected(*target));
        }
        if value > book.holdings {
            return Err(ActionError::InsufficientFunds {
                requested: value,
                available: book.holdings,
            });
        }

        let credited = book.credited.entry(*target).or_insert(0);
        *credited = credited
            .checked_add(value)
            .ok_or_else(|| ActionError::Reverted(format!("balance overflow for {}", target)))?;
        book.holdings -= value;
        book.calls.push(CallRecord {
            target: *target,
            value,
            payload: payload.to_vec(),
            executed_at: Utc::now(),
        });

        log::debug!("Treasury sent {} to {}", value, target.short());
        Ok(())
    }
}
