/// In-memory account store backing the ledger service. Durable persistence
/// of the ledger is explicitly out of scope for this core (see SPEC_FULL.md
/// §1) — the store lives for the lifetime of the `ledger` process only.
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::error::LedgerError;
use crate::protocol::Receipt;

pub struct Account {
    pub username: String,
    pub balance: f64,
}

/// Thread-safe account table keyed by the address derived from the account's
/// username (`sha256(username)`, matching the reference implementation).
pub struct AccountStore {
    accounts: DashMap<String, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    fn derive_address(username: &str) -> String {
        hex::encode(Sha256::digest(username.as_bytes()))
    }

    /// Creates an account for `username` with `initial_balance`. Idempotent:
    /// a repeat call for the same username returns the existing address and
    /// leaves its balance untouched, rather than erroring, so that a renter
    /// or coordinator restarting mid-session can re-bootstrap safely.
    pub fn create_account(&self, username: &str, initial_balance: f64) -> String {
        let address = Self::derive_address(username);
        self.accounts.entry(address.clone()).or_insert_with(|| Account {
            username: username.to_string(),
            balance: initial_balance,
        });
        address
    }

    pub fn get_balance(&self, address: &str) -> Result<f64, LedgerError> {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))
    }

    /// Transfers `amount` from `sender` to `receiver`. The receiver account
    /// is auto-vivified with a zero balance if it does not yet exist,
    /// matching the reference implementation's `wallets.get(addr, 0)`.
    pub fn send_money(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
        now: i64,
    ) -> Result<Receipt, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::NonPositiveAmount);
        }

        {
            let mut sender_account = self
                .accounts
                .get_mut(sender)
                .ok_or_else(|| LedgerError::AccountNotFound(sender.to_string()))?;
            if sender_account.balance < amount {
                return Err(LedgerError::InsufficientBalance {
                    address: sender.to_string(),
                    balance: sender_account.balance,
                    amount,
                });
            }
            sender_account.balance -= amount;
        }

        self.accounts
            .entry(receiver.to_string())
            .or_insert_with(|| Account {
                username: receiver.to_string(),
                balance: 0.0,
            })
            .balance += amount;

        let receipt_input = format!("{sender}{receiver}{amount}{now}");
        let transaction_hash = hex::encode(Sha256::digest(receipt_input.as_bytes()));

        Ok(Receipt {
            transaction_hash,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp: now,
        })
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_is_idempotent() {
        let store = AccountStore::new();
        let a1 = store.create_account("alice", 100.0);
        let a2 = store.create_account("alice", 999.0);
        assert_eq!(a1, a2);
        assert_eq!(store.get_balance(&a1).unwrap(), 100.0);
    }

    #[test]
    fn send_money_moves_balance() {
        let store = AccountStore::new();
        let sender = store.create_account("alice", 10.0);
        let receiver = store.create_account("bob", 0.0);
        let receipt = store.send_money(&sender, &receiver, 4.0, 1_700_000_000).unwrap();
        assert_eq!(receipt.amount, 4.0);
        assert_eq!(store.get_balance(&sender).unwrap(), 6.0);
        assert_eq!(store.get_balance(&receiver).unwrap(), 4.0);
    }

    #[test]
    fn send_money_rejects_insufficient_balance() {
        let store = AccountStore::new();
        let sender = store.create_account("alice", 1.0);
        let receiver = store.create_account("bob", 0.0);
        let err = store.send_money(&sender, &receiver, 5.0, 0).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }

    #[test]
    fn send_money_auto_vivifies_unknown_receiver() {
        let store = AccountStore::new();
        let sender = store.create_account("alice", 10.0);
        let receipt = store.send_money(&sender, "unregistered-addr", 2.0, 0).unwrap();
        assert_eq!(store.get_balance(&receipt.receiver).unwrap(), 2.0);
    }
}
