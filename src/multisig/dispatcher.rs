//! Execution dispatch
//!
//! Runs an approved transaction's action exactly once. The action is
//! untrusted and may call back into the wallet before it returns, so the
//! transaction is frozen as executed before control leaves the wallet.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use crate::multisig::events::WalletEvent;
use crate::multisig::ledger::TxId;
use crate::multisig::quorum::Quorum;
use crate::multisig::wallet::MultisigWallet;
use log::{info, warn};
use thiserror::Error;

/// Failure reported by an action executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },
    #[error("target {0} rejected the call")]
    Rejected(Address),
    #[error("call reverted: {0}")]
    Reverted(String),
}

/// Capability that carries out an approved action
///
/// Receives only the action's target, value and payload. Implementations
/// may hold a shared reference to the wallet and re-enter it.
pub trait ActionExecutor {
    fn invoke(&self, target: &Address, value: u64, payload: &[u8]) -> Result<(), ActionError>;
}

impl<F> ActionExecutor for F
where
    F: Fn(&Address, u64, &[u8]) -> Result<(), ActionError>,
{
    fn invoke(&self, target: &Address, value: u64, payload: &[u8]) -> Result<(), ActionError> {
        self(target, value, payload)
    }
}

impl MultisigWallet {
    /// Execute transaction `tx_id` through `executor`
    ///
    /// Preconditions, in order: caller is an owner, the transaction exists,
    /// it is not executed, and it has reached quorum. The transaction is then
    /// marked executed and the action invoked. A failed action surfaces as
    /// `ExecutionFailed` and the transaction stays executed; running the
    /// same action again needs a fresh submission.
    pub fn execute(
        &self,
        caller: &Address,
        tx_id: TxId,
        executor: &dyn ActionExecutor,
    ) -> Result<(), WalletError> {
        let (target, value, payload) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;

            state
                .registry
                .ensure_owner(caller)
                .map_err(|e| Self::rejected("execute", caller, e))?;
            let quorum = Quorum::new(state.registry.threshold());
            let tx = state
                .ledger
                .get_mut(tx_id)
                .map_err(|e| Self::rejected("execute", caller, e))?;
            quorum.check(tx).map_err(|e| Self::rejected("execute", caller, e))?;

            tx.mark_executed();
            (tx.target, tx.value, tx.payload.clone())
        };

        // State borrow is released here. Reentrant calls see executed = true.
        if let Err(source) = executor.invoke(&target, value, &payload) {
            warn!(
                "Transaction {} failed after quorum (stays executed): {}",
                tx_id, source
            );
            return Err(WalletError::ExecutionFailed { tx_id, source });
        }

        info!(
            "Executed transaction {}: {} to {} by {}",
            tx_id,
            value,
            target.short(),
            caller.short()
        );
        self.emit(WalletEvent::Executed {
            caller: *caller,
            tx_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn accept() -> impl Fn(&Address, u64, &[u8]) -> Result<(), ActionError> {
        |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> { Ok(()) }
    }

    /// 2-of-3 wallet with transaction 0 submitted
    fn wallet_with_tx() -> MultisigWallet {
        let wallet = MultisigWallet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        wallet.submit(&addr(1), addr(9), 0, vec![]).unwrap();
        wallet
    }

    fn approve(wallet: &MultisigWallet, tx_id: TxId) {
        wallet.confirm(&addr(1), tx_id).unwrap();
        wallet.confirm(&addr(2), tx_id).unwrap();
    }

    #[test]
    fn test_non_owner_rejected() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);

        assert_eq!(
            wallet.execute(&addr(7), 0, &accept()),
            Err(WalletError::NotOwner(addr(7)))
        );
        // Even for a transaction that does not exist
        assert_eq!(
            wallet.execute(&addr(7), 42, &accept()),
            Err(WalletError::NotOwner(addr(7)))
        );
        assert!(!wallet.transaction(0).unwrap().executed);
    }

    #[test]
    fn test_missing_transaction() {
        let wallet = MultisigWallet::new(vec![addr(1)], 1).unwrap();
        assert_eq!(
            wallet.execute(&addr(1), 0, &accept()),
            Err(WalletError::TxNotFound(0))
        );
    }

    #[test]
    fn test_below_threshold() {
        let wallet = wallet_with_tx();
        wallet.confirm(&addr(1), 0).unwrap();

        assert_eq!(
            wallet.execute(&addr(1), 0, &accept()),
            Err(WalletError::InsufficientConfirmations {
                tx_id: 0,
                have: 1,
                need: 2
            })
        );
        assert!(!wallet.transaction(0).unwrap().executed);
    }

    #[test]
    fn test_execute_with_quorum() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        let seen = RefCell::new(Vec::new());
        let executor = |target: &Address, value: u64, payload: &[u8]| -> Result<(), ActionError> {
            seen.borrow_mut().push((*target, value, payload.to_vec()));
            Ok(())
        };

        // Any owner may execute, not only confirmers
        wallet.execute(&addr(3), 0, &executor).unwrap();

        assert_eq!(seen.borrow().as_slice(), &[(addr(9), 0, vec![])]);
        let tx = wallet.transaction(0).unwrap();
        assert!(tx.executed);
        assert!(tx.executed_at.is_some());
        assert_eq!(
            wallet.events().last().map(|r| r.event.clone()),
            Some(WalletEvent::Executed {
                caller: addr(3),
                tx_id: 0
            })
        );
    }

    #[test]
    fn test_execute_exactly_once() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        let calls = Cell::new(0);
        let executor = |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> {
            calls.set(calls.get() + 1);
            Ok(())
        };

        wallet.execute(&addr(1), 0, &executor).unwrap();
        assert_eq!(
            wallet.execute(&addr(1), 0, &executor),
            Err(WalletError::TxAlreadyExecuted(0))
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reentrant_execute_same_transaction() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        let calls = Cell::new(0);
        let reentry = RefCell::new(None);
        let noop = accept();

        let executor = |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> {
            calls.set(calls.get() + 1);
            assert!(wallet.transaction(0).unwrap().executed);
            *reentry.borrow_mut() = Some(wallet.execute(&addr(2), 0, &noop));
            Ok(())
        };

        wallet.execute(&addr(1), 0, &executor).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(
            reentry.into_inner(),
            Some(Err(WalletError::TxAlreadyExecuted(0)))
        );
    }

    #[test]
    fn test_reentrant_recursion_runs_action_once() {
        // An executor that re-enters with itself
        struct Recursive<'a> {
            wallet: &'a MultisigWallet,
            calls: Cell<u32>,
            results: RefCell<Vec<Result<(), WalletError>>>,
        }

        impl ActionExecutor for Recursive<'_> {
            fn invoke(&self, _: &Address, _: u64, _: &[u8]) -> Result<(), ActionError> {
                self.calls.set(self.calls.get() + 1);
                let result = self.wallet.execute(&addr(1), 0, self);
                self.results.borrow_mut().push(result);
                Ok(())
            }
        }

        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        let executor = Recursive {
            wallet: &wallet,
            calls: Cell::new(0),
            results: RefCell::new(Vec::new()),
        };

        wallet.execute(&addr(1), 0, &executor).unwrap();

        assert_eq!(executor.calls.get(), 1);
        assert_eq!(
            executor.results.into_inner(),
            vec![Err(WalletError::TxAlreadyExecuted(0))]
        );
    }

    #[test]
    fn test_reentrant_calls_on_other_transactions() {
        let wallet = wallet_with_tx();
        wallet.submit(&addr(1), addr(8), 0, vec![0x01]).unwrap();
        approve(&wallet, 0);
        wallet.confirm(&addr(1), 1).unwrap();
        let noop = accept();

        let executor = |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> {
            // Frozen transaction rejects confirmation changes
            assert_eq!(
                wallet.revoke(&addr(1), 0),
                Err(WalletError::TxAlreadyExecuted(0))
            );
            assert_eq!(
                wallet.confirm(&addr(3), 0),
                Err(WalletError::TxAlreadyExecuted(0))
            );
            // Other transactions behave normally
            wallet.confirm(&addr(2), 1).map_err(|e| ActionError::Reverted(e.to_string()))?;
            wallet.execute(&addr(2), 1, &noop).map_err(|e| ActionError::Reverted(e.to_string()))
        };

        wallet.execute(&addr(1), 0, &executor).unwrap();

        assert!(wallet.transaction(0).unwrap().executed);
        assert_eq!(wallet.transaction(0).unwrap().confirmation_count, 2);
        assert!(wallet.transaction(1).unwrap().executed);
        // Inner execution finishes (and is announced) before the outer one
        let executed: Vec<TxId> = wallet
            .events()
            .iter()
            .filter(|r| matches!(r.event, WalletEvent::Executed { .. }))
            .map(|r| r.event.tx_id())
            .collect();
        assert_eq!(executed, vec![1, 0]);
    }

    #[test]
    fn test_failed_action_is_not_rolled_back() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        let calls = Cell::new(0);
        let failing = |_: &Address, _: u64, _: &[u8]| -> Result<(), ActionError> {
            calls.set(calls.get() + 1);
            Err(ActionError::Reverted("boom".to_string()))
        };
        let events_before = wallet.events().len();

        assert_eq!(
            wallet.execute(&addr(1), 0, &failing),
            Err(WalletError::ExecutionFailed {
                tx_id: 0,
                source: ActionError::Reverted("boom".to_string())
            })
        );
        assert!(wallet.transaction(0).unwrap().executed);
        // No announcement for a failed attempt
        assert_eq!(wallet.events().len(), events_before);

        // Cannot be retried through the same id
        assert_eq!(
            wallet.execute(&addr(1), 0, &accept()),
            Err(WalletError::TxAlreadyExecuted(0))
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_valueful_call_without_payload_routes_through_executor() {
        let wallet = MultisigWallet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        wallet.submit(&addr(1), addr(9), 10, vec![]).unwrap();
        approve(&wallet, 0);
        let refuses_plain_value =
            |target: &Address, value: u64, payload: &[u8]| -> Result<(), ActionError> {
                if value > 0 && payload.is_empty() {
                    Err(ActionError::Rejected(*target))
                } else {
                    Ok(())
                }
            };

        assert!(matches!(
            wallet.execute(&addr(1), 0, &refuses_plain_value),
            Err(WalletError::ExecutionFailed {
                tx_id: 0,
                source: ActionError::Rejected(_)
            })
        ));
    }

    #[test]
    fn test_revoked_confirmation_blocks_execution() {
        let wallet = wallet_with_tx();
        approve(&wallet, 0);
        wallet.revoke(&addr(2), 0).unwrap();

        assert_eq!(wallet.transaction(0).unwrap().confirmation_count, 1);
        assert!(matches!(
            wallet.execute(&addr(1), 0, &accept()),
            Err(WalletError::InsufficientConfirmations { .. })
        ));
    }
}
