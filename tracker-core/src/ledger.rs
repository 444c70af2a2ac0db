//! Ledger store
//!
//! Append-only log of signed token movements plus the user registry. The
//! ledger is the sole source of truth for a balance: `balance_of` serves the
//! running balance maintained alongside each append, and `recompute_balance`
//! folds the full history so the two can be checked against each other.
//!
//! # Example
//!
//! ```no_run
//! use tracker_core::{AccountStore, Config, Ledger, TxKind};
//! use rust_decimal_macros::dec;
//!
//! fn main() -> tracker_core::Result<()> {
//!     let config = Config::default();
//!     let store = AccountStore::new();
//!     let ledger = Ledger::new(store, &config.earning);
//!
//!     let user = ledger.register_user("0x742d35Cc6634C0532925a3b844Bc454e4438f44e", None)?;
//!     ledger.append(&user.user_id, TxKind::Earn, dec!(0.05), None, None, None)?;
//!     Ok(())
//! }
//! ```

use crate::config::EarningConfig;
use crate::store::{Account, AccountStore};
use crate::types::{
    DataSharingFlags, LedgerPage, LedgerTotals, PrivacySettings, TokenTransaction,
    TransferDirection, TxKind, User, UserId,
};
use crate::{Error, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tracing::info;

/// Ledger store over the shared account repository
#[derive(Debug, Clone)]
pub struct Ledger {
    store: AccountStore,
    welcome_bonus: Decimal,
}

impl Ledger {
    /// Create a ledger over a store
    pub fn new(store: AccountStore, earning: &EarningConfig) -> Self {
        Self {
            store,
            welcome_bonus: earning.welcome_bonus,
        }
    }

    /// Register a new user
    ///
    /// The welcome-bonus transaction is applied before the account becomes
    /// visible, so no reader ever sees the user without the bonus.
    pub fn register_user(&self, eth_address: &str, email: Option<&str>) -> Result<User> {
        if !is_valid_eth_address(eth_address) {
            return Err(Error::InvalidArgument(
                "A valid Ethereum address is required".to_string(),
            ));
        }

        let user = User {
            user_id: UserId::generate(),
            eth_address: eth_address.to_string(),
            email_hash: email.map(email_hash_sha256),
            privacy_settings: PrivacySettings::default(),
            data_sharing_flags: DataSharingFlags::default(),
            created_at: Utc::now(),
        };

        let mut account = Account::new(user.clone());
        account.apply_transaction(TokenTransaction {
            transaction_id: self.store.next_transaction_id(),
            user_id: user.user_id.clone(),
            kind: TxKind::Earn,
            direction: None,
            amount: self.welcome_bonus,
            timestamp: Utc::now(),
            description: Some("Welcome bonus".to_string()),
            related_entity_id: None,
        });
        self.store.insert(account);

        info!(
            "Registered user {} with welcome bonus {}",
            user.user_id, self.welcome_bonus
        );

        Ok(user)
    }

    /// Get a user record
    pub fn get_user(&self, user_id: &UserId) -> Result<User> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();
        Ok(account.user.clone())
    }

    /// Update user settings
    ///
    /// Absent fields are left untouched, matching the merge-style update of
    /// the settings surface.
    pub fn update_user(
        &self,
        user_id: &UserId,
        privacy_settings: Option<PrivacySettings>,
        data_sharing_flags: Option<DataSharingFlags>,
    ) -> Result<User> {
        let handle = self.store.account(user_id)?;
        let mut account = handle.write();

        if let Some(settings) = privacy_settings {
            account.user.privacy_settings = settings;
        }
        if let Some(flags) = data_sharing_flags {
            account.user.data_sharing_flags = flags;
        }

        Ok(account.user.clone())
    }

    /// Append a transaction
    ///
    /// Atomic per user; assigns a unique, strictly increasing transaction id
    /// and maintains the running balance in the same critical section.
    pub fn append(
        &self,
        user_id: &UserId,
        kind: TxKind,
        amount: Decimal,
        description: Option<String>,
        related_entity_id: Option<String>,
        direction: Option<TransferDirection>,
    ) -> Result<TokenTransaction> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(
                "Amount must be positive".to_string(),
            ));
        }
        let direction = match (kind, direction) {
            (TxKind::Transfer, d) => Some(d.unwrap_or(TransferDirection::Outbound)),
            (_, Some(_)) => {
                return Err(Error::InvalidArgument(
                    "Direction is only valid for transfer transactions".to_string(),
                ))
            }
            (_, None) => None,
        };

        let handle = self.store.account(user_id)?;
        let mut account = handle.write();

        let tx = TokenTransaction {
            transaction_id: self.store.next_transaction_id(),
            user_id: user_id.clone(),
            kind,
            direction,
            amount,
            timestamp: Utc::now(),
            description,
            related_entity_id,
        };
        account.apply_transaction(tx.clone());

        info!(
            "Appended {} {} {} for user {} (balance: {})",
            tx.transaction_id, tx.kind, tx.amount, user_id, account.balance
        );

        Ok(tx)
    }

    /// Query a user's transactions
    ///
    /// Returns up to `limit` transactions, newest first, with per-kind totals
    /// computed over the returned page rather than the full ledger.
    pub fn query(
        &self,
        user_id: &UserId,
        kind_filter: Option<TxKind>,
        limit: usize,
    ) -> Result<LedgerPage> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();

        // History is append-ordered, so reverse iteration is newest first
        let transactions: Vec<TokenTransaction> = account
            .transactions
            .iter()
            .rev()
            .filter(|tx| kind_filter.map_or(true, |k| tx.kind == k))
            .take(limit)
            .cloned()
            .collect();

        let mut totals = LedgerTotals::default();
        for tx in &transactions {
            match tx.kind {
                TxKind::Earn => totals.earned += tx.amount,
                TxKind::Spend => totals.spent += tx.amount,
                TxKind::Transfer => totals.transferred += tx.amount,
            }
        }

        let count = transactions.len();
        Ok(LedgerPage {
            transactions,
            totals,
            count,
        })
    }

    /// Current balance (running balance maintained on append)
    pub fn balance_of(&self, user_id: &UserId) -> Result<Decimal> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();
        Ok(account.balance)
    }

    /// Balance derived by folding the full history
    ///
    /// Must equal `balance_of` at all times; exposed so tests and audits can
    /// assert the agreement.
    pub fn recompute_balance(&self, user_id: &UserId) -> Result<Decimal> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();
        Ok(account.recompute_balance())
    }
}

/// Validate a 0x-prefixed 20-byte hex address
fn is_valid_eth_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// SHA-256 of the lower-cased, trimmed email, lowercase hex
///
/// Used only for at-rest storage on the user record; the breach gateway has
/// its own SHA-1 hashing for range-protocol compatibility.
fn email_hash_sha256(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn test_ledger() -> Ledger {
        Ledger::new(AccountStore::new(), &EarningConfig::default())
    }

    #[test]
    fn test_register_mints_welcome_bonus() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();

        assert_eq!(ledger.balance_of(&user.user_id).unwrap(), dec!(10));

        let page = ledger.query(&user.user_id, None, 10).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.transactions[0].kind, TxKind::Earn);
        assert_eq!(
            page.transactions[0].description.as_deref(),
            Some("Welcome bonus")
        );
    }

    #[test]
    fn test_register_rejects_bad_address() {
        let ledger = test_ledger();
        assert!(matches!(
            ledger.register_user("not-an-address", None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.register_user("0x1234", None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_email_stored_as_hash_only() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, Some("Alice@Example.com ")).unwrap();

        let hash = user.email_hash.unwrap();
        assert_eq!(hash.len(), 64);
        assert!(!hash.contains('@'));
        // Normalization: case and whitespace do not change the hash
        assert_eq!(hash, email_hash_sha256("alice@example.com"));
    }

    #[test]
    fn test_append_and_query_round_trip() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();

        let tx = ledger
            .append(
                &user.user_id,
                TxKind::Earn,
                dec!(0.05),
                Some("Blocked 5 trackers on example.com".to_string()),
                Some("example.com".to_string()),
                None,
            )
            .unwrap();

        let page = ledger.query(&user.user_id, None, 10).unwrap();
        assert_eq!(page.count, 2);
        // Newest first
        assert_eq!(page.transactions[0].transaction_id, tx.transaction_id);
        assert_eq!(page.transactions[0].amount, dec!(0.05));
        assert_eq!(
            page.transactions[0].related_entity_id.as_deref(),
            Some("example.com")
        );
        assert_eq!(
            page.transactions[0].description.as_deref(),
            Some("Blocked 5 trackers on example.com")
        );
    }

    #[test]
    fn test_append_rejects_non_positive_amount() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();

        let result = ledger.append(&user.user_id, TxKind::Earn, Decimal::ZERO, None, None, None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = ledger.append(&user.user_id, TxKind::Spend, dec!(-1), None, None, None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_append_unknown_user() {
        let ledger = test_ledger();
        let result = ledger.append(
            &UserId::new("fc_fid_ghost"),
            TxKind::Earn,
            dec!(1),
            None,
            None,
            None,
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_direction_only_for_transfers() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();

        let result = ledger.append(
            &user.user_id,
            TxKind::Earn,
            dec!(1),
            None,
            None,
            Some(TransferDirection::Inbound),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        // Transfers default to outbound
        let tx = ledger
            .append(&user.user_id, TxKind::Transfer, dec!(2), None, None, None)
            .unwrap();
        assert_eq!(tx.direction, Some(TransferDirection::Outbound));
        assert_eq!(ledger.balance_of(&user.user_id).unwrap(), dec!(8));
    }

    #[test]
    fn test_balance_folds_signed_amounts() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();
        let id = &user.user_id;

        ledger.append(id, TxKind::Earn, dec!(5), None, None, None).unwrap();
        ledger.append(id, TxKind::Spend, dec!(3), None, None, None).unwrap();
        ledger
            .append(id, TxKind::Transfer, dec!(2), None, None, Some(TransferDirection::Inbound))
            .unwrap();
        ledger
            .append(id, TxKind::Transfer, dec!(1), None, None, Some(TransferDirection::Outbound))
            .unwrap();

        // 10 + 5 - 3 + 2 - 1
        assert_eq!(ledger.balance_of(id).unwrap(), dec!(13));
        assert_eq!(ledger.recompute_balance(id).unwrap(), dec!(13));
    }

    #[test]
    fn test_query_filter_and_limit() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();
        let id = &user.user_id;

        for _ in 0..3 {
            ledger.append(id, TxKind::Earn, dec!(1), None, None, None).unwrap();
        }
        ledger.append(id, TxKind::Spend, dec!(2), None, None, None).unwrap();

        let page = ledger.query(id, Some(TxKind::Spend), 10).unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.totals.spent, dec!(2));
        assert_eq!(page.totals.earned, Decimal::ZERO);

        // Limit bounds the page, totals follow the page
        let page = ledger.query(id, Some(TxKind::Earn), 2).unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.totals.earned, dec!(2));
    }

    #[test]
    fn test_update_user_merges() {
        let ledger = test_ledger();
        let user = ledger.register_user(ADDR, None).unwrap();

        let flags = DataSharingFlags {
            anonymized_browsing: true,
            ..Default::default()
        };
        let updated = ledger.update_user(&user.user_id, None, Some(flags)).unwrap();

        assert!(updated.data_sharing_flags.anonymized_browsing);
        // Untouched section keeps its defaults
        assert_eq!(
            updated.privacy_settings.blocking_level,
            crate::types::BlockingLevel::Standard
        );
    }
}
