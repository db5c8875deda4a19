//! In-memory account directory store
//!
//! Accounts are kept in a `BTreeMap` behind a `parking_lot::RwLock`.
//! Lookups share the read lock; [`AccountStore::run_transaction`] holds the
//! write lock for the whole closure, which makes a debit/credit pair a single
//! atomic unit: either both writes land or neither does.

use crate::core::traits::{AccountStore, AccountTransaction, AccountWork};
use crate::types::{Account, AccountNumber, IdentifierField, PaymentError};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Thread-safe in-memory `accounts` collection
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<BTreeMap<AccountNumber, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with `accounts`
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    /// Insert or replace an account record
    pub fn insert(&self, account: Account) {
        self.accounts
            .write()
            .insert(account.account_number.clone(), account);
    }

    pub fn balance(&self, account_number: &str) -> Option<Decimal> {
        self.accounts
            .read()
            .get(account_number)
            .map(|account| account.balance)
    }

    /// All accounts ordered by account number
    pub fn snapshot(&self) -> Vec<Account> {
        self.accounts.read().values().cloned().collect()
    }
}

impl AccountStore for MemoryAccountStore {
    fn find_first(
        &self,
        field: IdentifierField,
        value: &str,
    ) -> Result<Option<Account>, PaymentError> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|account| account.identifier(field) == Some(value))
            .cloned())
    }

    fn get(&self, account_number: &str) -> Result<Option<Account>, PaymentError> {
        Ok(self.accounts.read().get(account_number).cloned())
    }

    fn run_transaction(&self, work: &mut AccountWork<'_>) -> Result<(), PaymentError> {
        let mut accounts = self.accounts.write();
        let staged = {
            let mut txn = StagedWrites {
                committed: &*accounts,
                staged: BTreeMap::new(),
            };
            work(&mut txn)?;
            txn.staged
        };
        accounts.extend(staged);
        Ok(())
    }
}

/// Writes buffered until the enclosing transaction commits
struct StagedWrites<'a> {
    committed: &'a BTreeMap<AccountNumber, Account>,
    staged: BTreeMap<AccountNumber, Account>,
}

impl AccountTransaction for StagedWrites<'_> {
    fn get(&mut self, account_number: &str) -> Result<Option<Account>, PaymentError> {
        Ok(self
            .staged
            .get(account_number)
            .or_else(|| self.committed.get(account_number))
            .cloned())
    }

    fn put(&mut self, account: Account) {
        self.staged.insert(account.account_number.clone(), account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryAccountStore {
        MemoryAccountStore::with_accounts([
            Account::new("ACC-1", Decimal::new(500, 0)).with_upi("alice@upi"),
            Account::new("ACC-2", Decimal::new(100, 0))
                .with_upi("bob@upi")
                .with_card("card-2"),
        ])
    }

    #[test]
    fn test_find_first_by_each_field() {
        let store = store();

        let by_upi = store
            .find_first(IdentifierField::UpiId, "bob@upi")
            .unwrap()
            .unwrap();
        let by_card = store
            .find_first(IdentifierField::CardId, "card-2")
            .unwrap()
            .unwrap();
        let by_number = store
            .find_first(IdentifierField::AccountNumber, "ACC-1")
            .unwrap()
            .unwrap();

        assert_eq!(by_upi.account_number, "ACC-2");
        assert_eq!(by_card.account_number, "ACC-2");
        assert_eq!(by_number.account_number, "ACC-1");
        assert!(store
            .find_first(IdentifierField::UpiId, "nobody@upi")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_transaction_commits_all_writes() {
        let store = store();

        store
            .run_transaction(&mut |txn| {
                let mut a = txn.get("ACC-1")?.unwrap();
                let mut b = txn.get("ACC-2")?.unwrap();
                a.balance -= Decimal::new(200, 0);
                b.balance += Decimal::new(200, 0);
                txn.put(a);
                txn.put(b);
                Ok(())
            })
            .unwrap();

        assert_eq!(store.balance("ACC-1"), Some(Decimal::new(300, 0)));
        assert_eq!(store.balance("ACC-2"), Some(Decimal::new(300, 0)));
    }

    #[test]
    fn test_failed_transaction_discards_staged_writes() {
        let store = store();

        let result = store.run_transaction(&mut |txn| {
            let mut a = txn.get("ACC-1")?.unwrap();
            a.balance -= Decimal::new(200, 0);
            txn.put(a);
            Err(PaymentError::account_not_found("ACC-404"))
        });

        assert_eq!(result, Err(PaymentError::account_not_found("ACC-404")));
        assert_eq!(store.balance("ACC-1"), Some(Decimal::new(500, 0)));
    }

    #[test]
    fn test_reads_observe_staged_writes() {
        let store = store();

        store
            .run_transaction(&mut |txn| {
                let mut a = txn.get("ACC-1")?.unwrap();
                a.balance -= Decimal::ONE;
                txn.put(a);
                let again = txn.get("ACC-1")?.unwrap();
                assert_eq!(again.balance, Decimal::new(499, 0));
                Ok(())
            })
            .unwrap();
    }
}
