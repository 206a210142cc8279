//! Wallet notifications
//!
//! Every committed state change produces a [`WalletEvent`]. The wallet keeps
//! them in its journal and forwards them to subscribed sinks.

use crate::crypto::Address;
use crate::multisig::ledger::TxId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A state change announced by the wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalletEvent {
    Submitted {
        caller: Address,
        tx_id: TxId,
        target: Address,
        value: u64,
        #[serde(with = "crate::multisig::ledger::hex_payload")]
        payload: Vec<u8>,
    },
    Confirmed {
        caller: Address,
        tx_id: TxId,
    },
    Revoked {
        caller: Address,
        tx_id: TxId,
    },
    Executed {
        caller: Address,
        tx_id: TxId,
    },
}

impl WalletEvent {
    pub fn tx_id(&self) -> TxId {
        match self {
            WalletEvent::Submitted { tx_id, .. }
            | WalletEvent::Confirmed { tx_id, .. }
            | WalletEvent::Revoked { tx_id, .. }
            | WalletEvent::Executed { tx_id, .. } => *tx_id,
        }
    }

    pub fn caller(&self) -> &Address {
        match self {
            WalletEvent::Submitted { caller, .. }
            | WalletEvent::Confirmed { caller, .. }
            | WalletEvent::Revoked { caller, .. }
            | WalletEvent::Executed { caller, .. } => caller,
        }
    }
}

impl fmt::Display for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletEvent::Submitted {
                caller,
                tx_id,
                target,
                value,
                payload,
            } => write!(
                f,
                "SubmitTransaction(owner={}, tx={}, to={}, value={}, data={} bytes)",
                caller,
                tx_id,
                target,
                value,
                payload.len()
            ),
            WalletEvent::Confirmed { caller, tx_id } => {
                write!(f, "ConfirmTransaction(owner={}, tx={})", caller, tx_id)
            }
            WalletEvent::Revoked { caller, tx_id } => {
                write!(f, "RevokeConfirmation(owner={}, tx={})", caller, tx_id)
            }
            WalletEvent::Executed { caller, tx_id } => {
                write!(f, "ExecuteTransaction(owner={}, tx={})", caller, tx_id)
            }
        }
    }
}

/// Journal entry for an emitted event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Position in the journal
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: WalletEvent,
}

/// Receiver of wallet notifications
pub trait NotificationSink {
    fn notify(&self, record: &EventRecord);
}

impl<F> NotificationSink for F
where
    F: Fn(&EventRecord),
{
    fn notify(&self, record: &EventRecord) {
        self(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let owner = Address::new([1; 20]);
        let event = WalletEvent::Revoked {
            caller: owner,
            tx_id: 4,
        };

        assert_eq!(event.tx_id(), 4);
        assert_eq!(event.caller(), &owner);
        assert!(event.to_string().starts_with("RevokeConfirmation"));
    }

    #[test]
    fn test_tagged_json() {
        let event = WalletEvent::Submitted {
            caller: Address::new([1; 20]),
            tx_id: 0,
            target: Address::new([2; 20]),
            value: 10,
            payload: vec![0x01, 0x02],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "submitted");
        assert_eq!(json["payload"], "0102");

        let decoded: WalletEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }
}
