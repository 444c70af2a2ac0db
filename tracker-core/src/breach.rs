//! Breach-check gateway
//!
//! Privacy-preserving lookup against an external breach-intelligence
//! provider. The raw email never leaves the process: it is hashed locally
//! (SHA-1, uppercase hex, for range-protocol compatibility), only a short
//! prefix of the hash is disclosed, and the returned candidate set is
//! matched against the full hash suffix locally.
//!
//! Provider unavailability is a distinct failure (`GatewayUnavailable`) and
//! is never conflated with an empty result.

use crate::config::BreachConfig;
use crate::notifications::NotificationCenter;
use crate::store::AccountStore;
use crate::types::{BreachReport, NotificationKind, RangeCandidate, UserId};
use crate::{Error, Result};
use async_trait::async_trait;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// SHA-1 of the lower-cased, trimmed email, uppercase hex
pub fn email_hash(email: &str) -> String {
    let digest = Sha1::digest(email.trim().to_lowercase().as_bytes());
    hex::encode_upper(digest)
}

/// Range provider seam
///
/// Implementations receive only a hash prefix and return every candidate
/// sharing it; they never see the full hash.
#[async_trait]
pub trait BreachProvider: Send + Sync {
    /// Candidates whose hashes start with `prefix`
    async fn candidates(&self, prefix: &str) -> Result<Vec<RangeCandidate>>;
}

/// HTTP range provider
///
/// Queries a HaveIBeenPwned-style endpoint: `GET {base}/range/{prefix}`
/// returning a JSON array of candidates.
pub struct HttpRangeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRangeProvider {
    /// Build a provider from configuration
    pub fn new(config: &BreachConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl fmt::Debug for HttpRangeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRangeProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl BreachProvider for HttpRangeProvider {
    async fn candidates(&self, prefix: &str) -> Result<Vec<RangeCandidate>> {
        let url = format!("{}/range/{}", self.base_url, prefix);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::GatewayUnavailable(format!("Range request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::GatewayUnavailable(format!(
                "Range request returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::GatewayUnavailable(format!("Invalid range response: {}", e)))
    }
}

/// Fixed-candidate provider for tests and offline operation
#[derive(Debug, Default)]
pub struct StaticRangeProvider {
    by_prefix: HashMap<String, Vec<RangeCandidate>>,
}

impl StaticRangeProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register candidates for a prefix
    pub fn with_candidates(mut self, prefix: &str, candidates: Vec<RangeCandidate>) -> Self {
        self.by_prefix.insert(prefix.to_string(), candidates);
        self
    }
}

#[async_trait]
impl BreachProvider for StaticRangeProvider {
    async fn candidates(&self, prefix: &str) -> Result<Vec<RangeCandidate>> {
        Ok(self.by_prefix.get(prefix).cloned().unwrap_or_default())
    }
}

/// Breach-check gateway
#[derive(Clone)]
pub struct BreachGateway {
    provider: Arc<dyn BreachProvider>,
    store: AccountStore,
    notifications: NotificationCenter,
    timeout: Duration,
    prefix_len: usize,
}

impl fmt::Debug for BreachGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreachGateway")
            .field("timeout", &self.timeout)
            .field("prefix_len", &self.prefix_len)
            .finish()
    }
}

impl BreachGateway {
    /// Create a gateway over a provider
    pub fn new(
        provider: Arc<dyn BreachProvider>,
        store: AccountStore,
        notifications: NotificationCenter,
        config: &BreachConfig,
    ) -> Self {
        Self {
            provider,
            store,
            notifications,
            timeout: Duration::from_millis(config.timeout_ms),
            prefix_len: config.hash_prefix_len,
        }
    }

    /// Check an email against the breach feed
    ///
    /// At most one provider attempt; the call is bounded by the configured
    /// timeout and safe to cancel (no state is touched before the result).
    pub async fn check(&self, email: &str) -> Result<Vec<BreachReport>> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidArgument(
                "A valid email address is required".to_string(),
            ));
        }

        let hash = email_hash(email);
        let (prefix, suffix) = hash.split_at(self.prefix_len);

        let candidates = tokio::time::timeout(self.timeout, self.provider.candidates(prefix))
            .await
            .map_err(|_| Error::GatewayUnavailable("Range lookup timed out".to_string()))??;

        let reports: Vec<BreachReport> = candidates
            .into_iter()
            .filter(|c| c.suffix.eq_ignore_ascii_case(suffix))
            .flat_map(|c| c.reports)
            .collect();

        info!(
            "Breach check for prefix {} returned {} matching reports",
            prefix,
            reports.len()
        );

        Ok(reports)
    }

    /// Check an email and notify the user on hits
    ///
    /// The notification is created strictly after a result (including an
    /// empty one) is obtained; a caller that drops this future mid-flight
    /// leaves no partial notification behind.
    pub async fn check_and_notify(
        &self,
        user_id: &UserId,
        email: &str,
    ) -> Result<Vec<BreachReport>> {
        if !self.store.contains(user_id) {
            return Err(Error::NotFound(format!("User not found: {}", user_id)));
        }

        let reports = self.check(email).await?;

        if !reports.is_empty() {
            let message = format!(
                "Data breach detected! Your email was found in {} breach(es). Check your account security.",
                reports.len()
            );
            if let Err(e) =
                self.notifications
                    .create(user_id, NotificationKind::DataBreach, &message)
            {
                warn!("Failed to create breach notification: {}", e);
            }
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EarningConfig;
    use crate::ledger::Ledger;
    use chrono::NaiveDate;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn report(name: &str) -> BreachReport {
        BreachReport {
            name: name.to_string(),
            title: name.to_string(),
            domain: format!("{}.com", name.to_lowercase()),
            breach_date: NaiveDate::from_ymd_opt(2013, 10, 4).unwrap(),
            data_classes: vec!["Email addresses".to_string(), "Passwords".to_string()],
            is_verified: true,
            is_sensitive: false,
        }
    }

    fn gateway_with(provider: Arc<dyn BreachProvider>) -> (BreachGateway, UserId) {
        let store = AccountStore::new();
        let ledger = Ledger::new(store.clone(), &EarningConfig::default());
        let user = ledger.register_user(ADDR, None).unwrap();
        let notifications = NotificationCenter::new(store.clone());
        let gateway = BreachGateway::new(
            provider,
            store,
            notifications,
            &BreachConfig::default(),
        );
        (gateway, user.user_id)
    }

    #[test]
    fn test_email_hash_normalizes() {
        let hash = email_hash("  Alice@Example.COM ");
        assert_eq!(hash, email_hash("alice@example.com"));
        assert_eq!(hash.len(), 40);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_only_exact_suffix_matches() {
        let email = "alice@example.com";
        let hash = email_hash(email);
        let (prefix, suffix) = hash.split_at(5);

        // Two candidates share the prefix; only one matches the full suffix
        let provider = StaticRangeProvider::new().with_candidates(
            prefix,
            vec![
                RangeCandidate {
                    suffix: suffix.to_string(),
                    reports: vec![report("Adobe")],
                },
                RangeCandidate {
                    suffix: format!("{}X", &suffix[..suffix.len() - 1]),
                    reports: vec![report("LinkedIn")],
                },
            ],
        );

        let (gateway, _) = gateway_with(Arc::new(provider));
        let reports = gateway.check(email).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].name, "Adobe");
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_not_error() {
        let (gateway, _) = gateway_with(Arc::new(StaticRangeProvider::new()));
        let reports = gateway.check("alice@example.com").await.unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let (gateway, _) = gateway_with(Arc::new(StaticRangeProvider::new()));
        assert!(matches!(
            gateway.check("   ").await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.check("not-an-email").await,
            Err(Error::InvalidArgument(_))
        ));
    }

    struct FailingProvider;

    #[async_trait]
    impl BreachProvider for FailingProvider {
        async fn candidates(&self, _prefix: &str) -> Result<Vec<RangeCandidate>> {
            Err(Error::GatewayUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_unavailable_and_silent() {
        let (gateway, user) = gateway_with(Arc::new(FailingProvider));

        let result = gateway.check_and_notify(&user, "alice@example.com").await;
        assert!(matches!(result, Err(Error::GatewayUnavailable(_))));

        // Failure never produces a notification
        let unread = gateway.notifications.list(&user, true).unwrap();
        assert!(unread.is_empty());
    }

    struct SlowProvider;

    #[async_trait]
    impl BreachProvider for SlowProvider {
        async fn candidates(&self, _prefix: &str) -> Result<Vec<RangeCandidate>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let store = AccountStore::new();
        let notifications = NotificationCenter::new(store.clone());
        let config = BreachConfig {
            timeout_ms: 50,
            ..Default::default()
        };
        let gateway = BreachGateway::new(Arc::new(SlowProvider), store, notifications, &config);

        let result = gateway.check("alice@example.com").await;
        assert!(matches!(result, Err(Error::GatewayUnavailable(_))));
    }

    #[tokio::test]
    async fn test_hits_create_breach_notification() {
        let email = "alice@example.com";
        let hash = email_hash(email);
        let (prefix, suffix) = hash.split_at(5);

        let provider = StaticRangeProvider::new().with_candidates(
            prefix,
            vec![RangeCandidate {
                suffix: suffix.to_string(),
                reports: vec![report("Adobe"), report("LinkedIn")],
            }],
        );

        let (gateway, user) = gateway_with(Arc::new(provider));
        let reports = gateway.check_and_notify(&user, email).await.unwrap();
        assert_eq!(reports.len(), 2);

        let unread = gateway.notifications.list(&user, true).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::DataBreach);
        assert!(unread[0].message.contains("2 breach(es)"));
    }

    #[tokio::test]
    async fn test_no_hits_no_notification() {
        let (gateway, user) = gateway_with(Arc::new(StaticRangeProvider::new()));
        let reports = gateway.check_and_notify(&user, "alice@example.com").await.unwrap();
        assert!(reports.is_empty());

        let unread = gateway.notifications.list(&user, true).unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_http_provider_round_trip() {
        let server = httpmock::MockServer::start_async().await;

        let email = "alice@example.com";
        let hash = email_hash(email);
        let (prefix, suffix) = hash.split_at(5);

        let body = serde_json::json!([{
            "suffix": suffix,
            "reports": [{
                "name": "Adobe",
                "title": "Adobe",
                "domain": "adobe.com",
                "breachDate": "2013-10-04",
                "dataClasses": ["Email addresses", "Passwords"],
                "isVerified": true,
                "isSensitive": false,
            }],
        }]);

        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET)
                    .path(format!("/range/{}", prefix));
                then.status(200).json_body(body.clone());
            })
            .await;

        let config = BreachConfig {
            base_url: server.base_url(),
            ..Default::default()
        };
        let provider = HttpRangeProvider::new(&config).unwrap();
        let candidates = provider.candidates(prefix).await.unwrap();
        mock.assert_async().await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].reports[0].name, "Adobe");
    }

    #[tokio::test]
    async fn test_http_provider_error_status_is_unavailable() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET);
                then.status(503);
            })
            .await;

        let config = BreachConfig {
            base_url: server.base_url(),
            ..Default::default()
        };
        let provider = HttpRangeProvider::new(&config).unwrap();
        let result = provider.candidates("ABCDE").await;
        assert!(matches!(result, Err(Error::GatewayUnavailable(_))));
    }
}
