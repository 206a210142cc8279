//! Transaction ledger
//!
//! Append-only store of proposed actions indexed by sequential id.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequential transaction identifier, starting at 0
pub type TxId = u64;

/// A proposed action awaiting confirmations
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Position in the ledger
    pub id: TxId,
    /// Destination of the action
    pub target: Address,
    /// Amount carried by the action
    pub value: u64,
    /// Opaque call data (hex in JSON)
    #[serde(with = "hex_payload")]
    pub payload: Vec<u8>,
    /// Set once, right before the action is invoked
    pub executed: bool,
    /// Number of owners currently confirming
    pub confirmation_count: usize,
    /// Owner who submitted the action
    pub submitted_by: Address,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// When the execution attempt was made
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    fn new(id: TxId, submitted_by: Address, target: Address, value: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            target,
            value,
            payload,
            executed: false,
            confirmation_count: 0,
            submitted_by,
            submitted_at: Utc::now(),
            executed_at: None,
        }
    }

    /// Freeze the record. No field changes after this.
    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
        self.executed_at = Some(Utc::now());
    }
}

/// Append-only list of submitted transactions
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new transaction and return its id
    pub fn append(
        &mut self,
        submitted_by: Address,
        target: Address,
        value: u64,
        payload: Vec<u8>,
    ) -> TxId {
        let id = self.count();
        self.transactions
            .push(Transaction::new(id, submitted_by, target, value, payload));
        id
    }

    /// Look up a transaction by id
    pub fn get(&self, tx_id: TxId) -> Result<&Transaction, WalletError> {
        usize::try_from(tx_id)
            .ok()
            .and_then(|index| self.transactions.get(index))
            .ok_or(WalletError::TxNotFound(tx_id))
    }

    pub(crate) fn get_mut(&mut self, tx_id: TxId) -> Result<&mut Transaction, WalletError> {
        usize::try_from(tx_id)
            .ok()
            .and_then(|index| self.transactions.get_mut(index))
            .ok_or(WalletError::TxNotFound(tx_id))
    }

    /// Number of submitted transactions (never decreases)
    pub fn count(&self) -> TxId {
        self.transactions.len() as TxId
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| !tx.executed)
    }

    /// Ids must match positions; a gap means the document was edited by hand
    pub(crate) fn verify_sequence(&self) -> Result<(), WalletError> {
        for (index, tx) in self.transactions.iter().enumerate() {
            if tx.id != index as TxId {
                return Err(WalletError::CorruptState(format!(
                    "transaction at position {} has id {}",
                    index, tx.id
                )));
            }
        }
        Ok(())
    }
}

pub(crate) mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(payload))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_sequential_ids() {
        let mut ledger = TransactionLedger::new();
        assert_eq!(ledger.count(), 0);

        assert_eq!(ledger.append(addr(1), addr(2), 10, vec![]), 0);
        assert_eq!(ledger.append(addr(1), addr(3), 0, vec![0xab]), 1);
        assert_eq!(ledger.count(), 2);

        let tx = ledger.get(1).unwrap();
        assert_eq!(tx.id, 1);
        assert_eq!(tx.target, addr(3));
        assert_eq!(tx.payload, vec![0xab]);
        assert!(!tx.executed);
        assert_eq!(tx.confirmation_count, 0);
        assert_eq!(tx.submitted_by, addr(1));
    }

    #[test]
    fn test_missing_transaction() {
        let mut ledger = TransactionLedger::new();
        assert_eq!(ledger.get(0), Err(WalletError::TxNotFound(0)));

        ledger.append(addr(1), addr(2), 0, vec![]);
        assert_eq!(ledger.get(1), Err(WalletError::TxNotFound(1)));
        assert_eq!(ledger.get(u64::MAX), Err(WalletError::TxNotFound(u64::MAX)));
    }

    #[test]
    fn test_pending_filter() {
        let mut ledger = TransactionLedger::new();
        ledger.append(addr(1), addr(2), 0, vec![]);
        ledger.append(addr(1), addr(2), 0, vec![]);
        ledger.get_mut(0).unwrap().mark_executed();

        let pending: Vec<TxId> = ledger.pending().map(|tx| tx.id).collect();
        assert_eq!(pending, vec![1]);
        assert!(ledger.get(0).unwrap().executed_at.is_some());
    }

    #[test]
    fn test_payload_serializes_as_hex() {
        let mut ledger = TransactionLedger::new();
        ledger.append(addr(1), addr(2), 5, vec![0xde, 0xad]);

        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"dead\""));

        let decoded: TransactionLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, ledger);
    }

    #[test]
    fn test_verify_sequence() {
        let mut ledger = TransactionLedger::new();
        ledger.append(addr(1), addr(2), 0, vec![]);
        ledger.append(addr(1), addr(2), 0, vec![]);
        assert!(ledger.verify_sequence().is_ok());

        ledger.get_mut(1).unwrap().id = 7;
        assert!(matches!(
            ledger.verify_sequence(),
            Err(WalletError::CorruptState(_))
        ));
    }
}
