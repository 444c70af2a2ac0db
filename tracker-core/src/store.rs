//! In-memory repository behind the per-user consistency boundary
//!
//! One `Account` owns everything that belongs to a single user: the user
//! record, the transaction history with its running balance, the site table,
//! and the notification list. A single write lock therefore covers every
//! combined mutation (site upsert + mint, registration + welcome bonus), and
//! readers can never observe one half of such an operation without the other.
//!
//! Mutations for different users take different locks and proceed
//! independently. No async work happens while a lock is held.

use crate::types::{Notification, TokenTransaction, TrackedSite, TransactionId, User, UserId};
use crate::{Error, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// All state owned by one user
#[derive(Debug)]
pub struct Account {
    /// User record
    pub user: User,

    /// Append-only transaction history, oldest first
    pub transactions: Vec<TokenTransaction>,

    /// Running balance, maintained alongside each append
    pub balance: Decimal,

    /// Site table, keyed by site URL
    pub sites: HashMap<String, TrackedSite>,

    /// Notification list, oldest first
    pub notifications: Vec<Notification>,
}

impl Account {
    /// Create an empty account for a user
    pub fn new(user: User) -> Self {
        Self {
            user,
            transactions: Vec::new(),
            balance: Decimal::ZERO,
            sites: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Append a transaction and update the running balance
    ///
    /// The entry is immutable from this point on; there is deliberately no
    /// method that modifies or removes an appended transaction.
    pub fn apply_transaction(&mut self, tx: TokenTransaction) {
        self.balance += tx.signed_amount();
        self.transactions.push(tx);
    }

    /// Recompute the balance from the full history
    ///
    /// Must always agree with `balance`; the invariant suite asserts this.
    pub fn recompute_balance(&self) -> Decimal {
        self.transactions
            .iter()
            .map(TokenTransaction::signed_amount)
            .sum()
    }
}

/// Shared account store
///
/// Cloneable handle; all clones see the same accounts.
#[derive(Debug, Clone)]
pub struct AccountStore {
    accounts: Arc<DashMap<UserId, Arc<RwLock<Account>>>>,
    notification_owners: Arc<DashMap<Uuid, UserId>>,
    tx_seq: Arc<AtomicU64>,
}

impl AccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            notification_owners: Arc::new(DashMap::new()),
            tx_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Insert a freshly registered account
    ///
    /// The caller populates the account (welcome bonus included) before it
    /// becomes visible; insertion publishes it atomically.
    pub fn insert(&self, account: Account) -> Arc<RwLock<Account>> {
        let user_id = account.user.user_id.clone();
        let handle = Arc::new(RwLock::new(account));
        self.accounts.insert(user_id, handle.clone());
        handle
    }

    /// Look up an account handle
    pub fn account(&self, user_id: &UserId) -> Result<Arc<RwLock<Account>>> {
        self.accounts
            .get(user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", user_id)))
    }

    /// True if the user exists
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.accounts.contains_key(user_id)
    }

    /// Issue the next transaction id (strictly increasing, store-wide)
    pub fn next_transaction_id(&self) -> TransactionId {
        TransactionId::new(self.tx_seq.fetch_add(1, Ordering::SeqCst))
    }

    /// Record which user owns a notification id
    pub fn index_notification(&self, notification_id: Uuid, user_id: UserId) {
        self.notification_owners.insert(notification_id, user_id);
    }

    /// Owner of a notification id, if known
    pub fn notification_owner(&self, notification_id: &Uuid) -> Option<UserId> {
        // Clone out of the shard guard before any account lock is taken
        self.notification_owners
            .get(notification_id)
            .map(|entry| entry.value().clone())
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
    use crate::types::{TxKind, User};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn test_user(id: &str) -> User {
        User {
            user_id: UserId::new(id),
            eth_address: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
            email_hash: None,
            privacy_settings: Default::default(),
            data_sharing_flags: Default::default(),
            created_at: Utc::now(),
        }
    }

    fn earn(store: &AccountStore, user: &str, amount: Decimal) -> TokenTransaction {
        TokenTransaction {
            transaction_id: store.next_transaction_id(),
            user_id: UserId::new(user),
            kind: TxKind::Earn,
            direction: None,
            amount,
            timestamp: Utc::now(),
            description: None,
            related_entity_id: None,
        }
    }

    #[test]
    fn test_running_balance_matches_recompute() {
        let store = AccountStore::new();
        let handle = store.insert(Account::new(test_user("fc_fid_1")));

        let mut account = handle.write();
        account.apply_transaction(earn(&store, "fc_fid_1", dec!(10)));
        account.apply_transaction(earn(&store, "fc_fid_1", dec!(0.05)));
        assert_eq!(account.balance, dec!(10.05));
        assert_eq!(account.balance, account.recompute_balance());
    }

    #[test]
    fn test_transaction_ids_strictly_increase() {
        let store = AccountStore::new();
        let a = store.next_transaction_id();
        let b = store.next_transaction_id();
        let c = store.next_transaction_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_unknown_user_not_found() {
        let store = AccountStore::new();
        let err = store.account(&UserId::new("fc_fid_missing")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
