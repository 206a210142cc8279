//! Owner registry
//!
//! Holds the immutable owner set and confirmation threshold of a wallet.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Construction input for a wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MultisigConfig {
    /// Owner addresses, in the order they will be reported
    pub owners: Vec<Address>,
    /// Confirmations required to execute (M in M-of-N)
    pub threshold: usize,
    /// Optional human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MultisigConfig {
    /// Create a new multisig configuration (unvalidated)
    pub fn new(owners: Vec<Address>, threshold: usize, label: Option<String>) -> Self {
        Self {
            owners,
            threshold,
            label,
        }
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }
}

/// Validated owner set and threshold
///
/// Read-only after construction. Deserializing goes through the same
/// validation as [`OwnerRegistry::new`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "MultisigConfig")]
pub struct OwnerRegistry {
    owners: Vec<Address>,
    threshold: usize,
}

impl OwnerRegistry {
    /// Validate and store an owner set
    ///
    /// Checks run in a fixed order and the first failure wins: empty set,
    /// threshold out of `1..=owners`, null owner, repeated owner.
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, WalletError> {
        if owners.is_empty() {
            return Err(WalletError::OwnersRequired);
        }

        if threshold == 0 || threshold > owners.len() {
            return Err(WalletError::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }

        if let Some(position) = owners.iter().position(Address::is_zero) {
            return Err(WalletError::InvalidOwner(position));
        }

        let mut seen = HashSet::with_capacity(owners.len());
        for owner in &owners {
            if !seen.insert(*owner) {
                return Err(WalletError::OwnerNotUnique(*owner));
            }
        }

        Ok(Self { owners, threshold })
    }

    /// Check if an address belongs to the owner set
    pub fn is_owner(&self, id: &Address) -> bool {
        self.owners.iter().any(|owner| owner == id)
    }

    /// Fail with `NotOwner` unless `caller` is an owner
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), WalletError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(WalletError::NotOwner(*caller))
        }
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Get the owner count (N)
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }
}

impl TryFrom<MultisigConfig> for OwnerRegistry {
    type Error = WalletError;

    fn try_from(config: MultisigConfig) -> Result<Self, Self::Error> {
        Self::new(config.owners, config.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_registry_creation() {
        let registry = OwnerRegistry::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();

        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.owner_count(), 3);
        assert_eq!(registry.owners(), &[addr(1), addr(2), addr(3)]);
        assert_eq!(registry.description(), "2-of-3");
    }

    #[test]
    fn test_threshold_equal_to_owner_count() {
        let registry = OwnerRegistry::new(vec![addr(1), addr(2)], 2).unwrap();
        assert_eq!(registry.owners(), &[addr(1), addr(2)]);
    }

    #[test]
    fn test_empty_owners() {
        assert_eq!(
            OwnerRegistry::new(vec![], 1),
            Err(WalletError::OwnersRequired)
        );
        // Empty set is reported before the threshold
        assert_eq!(
            OwnerRegistry::new(vec![], 0),
            Err(WalletError::OwnersRequired)
        );
    }

    #[test]
    fn test_invalid_threshold() {
        assert_eq!(
            OwnerRegistry::new(vec![addr(1)], 0),
            Err(WalletError::InvalidThreshold {
                threshold: 0,
                owners: 1
            })
        );
        assert_eq!(
            OwnerRegistry::new(vec![addr(1)], 2),
            Err(WalletError::InvalidThreshold {
                threshold: 2,
                owners: 1
            })
        );
    }

    #[test]
    fn test_zero_owner() {
        assert_eq!(
            OwnerRegistry::new(vec![addr(1), Address::ZERO], 1),
            Err(WalletError::InvalidOwner(1))
        );
    }

    #[test]
    fn test_duplicate_owner() {
        assert_eq!(
            OwnerRegistry::new(vec![addr(1), addr(1)], 1),
            Err(WalletError::OwnerNotUnique(addr(1)))
        );
    }

    #[test]
    fn test_validation_order() {
        // Threshold is checked before null and duplicate owners
        assert!(matches!(
            OwnerRegistry::new(vec![Address::ZERO, Address::ZERO], 3),
            Err(WalletError::InvalidThreshold { .. })
        ));
        // Null owner is checked before duplicates
        assert_eq!(
            OwnerRegistry::new(vec![addr(1), addr(1), Address::ZERO], 1),
            Err(WalletError::InvalidOwner(2))
        );
    }

    #[test]
    fn test_is_owner() {
        let registry = OwnerRegistry::new(vec![addr(1), addr(2)], 1).unwrap();

        assert!(registry.is_owner(&addr(1)));
        assert!(!registry.is_owner(&addr(9)));
        assert_eq!(
            registry.ensure_owner(&addr(9)),
            Err(WalletError::NotOwner(addr(9)))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let config = MultisigConfig::new(vec![addr(1), addr(1)], 1, None);
        let json = serde_json::to_string(&config).unwrap();

        assert!(serde_json::from_str::<OwnerRegistry>(&json).is_err());

        let good = MultisigConfig::new(vec![addr(1), addr(2)], 2, Some("Ops".to_string()));
        let json = serde_json::to_string(&good).unwrap();
        let registry: OwnerRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(registry.description(), good.description());
    }
}
