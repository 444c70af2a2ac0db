//! Engagement aggregator
//!
//! Turns raw "site visited / trackers blocked" events into idempotent
//! per-(user, site) counters and mints the matching ledger entries. The site
//! upsert and the mint run inside one account write lock: no reader can see
//! the counter updated without the ledger entry, or the other way around.

use crate::config::EarningConfig;
use crate::notifications::NotificationCenter;
use crate::store::AccountStore;
use crate::types::{
    NotificationKind, TokenTransaction, TrackedSite, TxKind, UserId, VisitReceipt,
};
use crate::{Error, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Engagement aggregator over the shared account repository
#[derive(Debug, Clone)]
pub struct Engagement {
    store: AccountStore,
    notifications: NotificationCenter,
    rate: Decimal,
}

impl Engagement {
    /// Create an aggregator over a store
    pub fn new(store: AccountStore, notifications: NotificationCenter, earning: &EarningConfig) -> Self {
        Self {
            store,
            notifications,
            rate: earning.tracker_blocked_rate,
        }
    }

    /// Record a site visit with blocked trackers
    ///
    /// Upserts the (user, site) row — the counter is incremented, never
    /// duplicated — refreshes `last_visit`, and mints an `earn` entry of
    /// `blocked_count × rate` with the site URL as the related entity. A
    /// count of zero or less (or none) counts as one blocked tracker.
    ///
    /// All validation happens before any mutation; the upsert and the mint
    /// are all-or-nothing.
    pub fn record_visit(
        &self,
        user_id: &UserId,
        site_url: &str,
        blocked_count: Option<i64>,
    ) -> Result<VisitReceipt> {
        if user_id.is_blank() {
            return Err(Error::InvalidArgument("User ID is required".to_string()));
        }
        if site_url.trim().is_empty() {
            return Err(Error::InvalidArgument("Site URL is required".to_string()));
        }

        let effective_count = match blocked_count {
            Some(n) if n > 0 => n as u64,
            _ => 1,
        };
        let tokens_earned = Decimal::from(effective_count) * self.rate;

        let handle = self.store.account(user_id)?;
        let site = {
            let mut account = handle.write();

            let now = Utc::now();
            let site = account
                .sites
                .entry(site_url.to_string())
                .and_modify(|site| {
                    site.blocked_trackers_count += effective_count;
                    site.last_visit = now;
                })
                .or_insert_with(|| TrackedSite {
                    user_id: user_id.clone(),
                    site_url: site_url.to_string(),
                    blocked_trackers_count: effective_count,
                    last_visit: now,
                    user_consent: true,
                })
                .clone();

            account.apply_transaction(TokenTransaction {
                transaction_id: self.store.next_transaction_id(),
                user_id: user_id.clone(),
                kind: TxKind::Earn,
                direction: None,
                amount: tokens_earned,
                timestamp: now,
                description: Some(format!(
                    "Blocked {} trackers on {}",
                    effective_count, site_url
                )),
                related_entity_id: Some(site_url.to_string()),
            });

            site
        };

        info!(
            "Recorded visit to {} for user {}: {} blocked, {} earned",
            site_url, user_id, effective_count, tokens_earned
        );

        // Balance-affecting event; failure here must not undo the visit
        let message = format!(
            "Earned {} TT tokens for blocking trackers!",
            tokens_earned
        );
        if let Err(e) = self
            .notifications
            .create(user_id, NotificationKind::TokenUpdate, &message)
        {
            warn!("Failed to create token update notification: {}", e);
        }

        Ok(VisitReceipt {
            tokens_earned,
            site,
        })
    }

    /// List a user's tracked sites, most recently visited first
    pub fn list_sites(&self, user_id: &UserId) -> Result<Vec<TrackedSite>> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();

        let mut sites: Vec<TrackedSite> = account.sites.values().cloned().collect();
        sites.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use rust_decimal_macros::dec;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn setup() -> (Ledger, Engagement, UserId) {
        let store = AccountStore::new();
        let earning = EarningConfig::default();
        let ledger = Ledger::new(store.clone(), &earning);
        let notifications = NotificationCenter::new(store.clone());
        let engagement = Engagement::new(store, notifications, &earning);
        let user = ledger.register_user(ADDR, None).unwrap();
        (ledger, engagement, user.user_id)
    }

    #[test]
    fn test_visit_mints_at_rate() {
        // Welcome bonus 10, then 5 trackers at 0.01
        let (ledger, engagement, user) = setup();

        let receipt = engagement.record_visit(&user, "a.com", Some(5)).unwrap();
        assert_eq!(receipt.tokens_earned, dec!(0.05));
        assert_eq!(receipt.site.blocked_trackers_count, 5);
        assert_eq!(ledger.balance_of(&user).unwrap(), dec!(10.05));

        let page = ledger.query(&user, Some(TxKind::Earn), 1).unwrap();
        assert_eq!(page.transactions[0].related_entity_id.as_deref(), Some("a.com"));
        assert_eq!(page.transactions[0].amount, dec!(0.05));
    }

    #[test]
    fn test_repeat_visits_update_same_row() {
        let (_, engagement, user) = setup();

        engagement.record_visit(&user, "news-site.com", Some(3)).unwrap();
        let receipt = engagement.record_visit(&user, "news-site.com", Some(4)).unwrap();

        assert_eq!(receipt.site.blocked_trackers_count, 7);
        assert_eq!(engagement.list_sites(&user).unwrap().len(), 1);
    }

    #[test]
    fn test_default_count_applies_per_call() {
        let (ledger, engagement, user) = setup();

        engagement.record_visit(&user, "a.com", None).unwrap();
        engagement.record_visit(&user, "a.com", Some(0)).unwrap();
        engagement.record_visit(&user, "a.com", Some(-3)).unwrap();

        let sites = engagement.list_sites(&user).unwrap();
        assert_eq!(sites[0].blocked_trackers_count, 3);
        assert_eq!(ledger.balance_of(&user).unwrap(), dec!(10.03));
    }

    #[test]
    fn test_validation_before_mutation() {
        let (ledger, engagement, user) = setup();

        let result = engagement.record_visit(&user, "  ", Some(5));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = engagement.record_visit(&UserId::new(""), "a.com", Some(5));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        // Nothing minted, nothing recorded
        assert_eq!(ledger.balance_of(&user).unwrap(), dec!(10));
        assert!(engagement.list_sites(&user).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let (_, engagement, _) = setup();
        let result = engagement.record_visit(&UserId::new("fc_fid_ghost"), "a.com", Some(1));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_sites_ordered_by_last_visit() {
        let (_, engagement, user) = setup();

        engagement.record_visit(&user, "first.com", Some(1)).unwrap();
        engagement.record_visit(&user, "second.com", Some(1)).unwrap();
        engagement.record_visit(&user, "first.com", Some(1)).unwrap();

        let sites = engagement.list_sites(&user).unwrap();
        assert_eq!(sites[0].site_url, "first.com");
        assert_eq!(sites[1].site_url, "second.com");
    }

    #[test]
    fn test_visit_creates_token_update_notification() {
        let (_, engagement, user) = setup();
        let notifications = engagement.notifications.clone();

        engagement.record_visit(&user, "a.com", Some(5)).unwrap();

        let unread = notifications.list(&user, true).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::TokenUpdate);
    }
}
