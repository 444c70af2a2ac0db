//! Core types for the token engine
//!
//! All types are designed for:
//! - Stable wire names (camelCase serde, consumed by polling clients)
//! - Exact arithmetic (Decimal for token amounts)
//! - Closed kinds (invalid variants rejected at the boundary, never stored)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier (Farcaster FID namespace, opaque to the core)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh ID in the FID namespace
    pub fn generate() -> Self {
        Self(format!("fc_fid_{}", Uuid::new_v4().simple()))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger transaction identifier
///
/// Strictly increasing across the whole store; assigned by the repository,
/// never by callers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wrap a raw sequence number
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Raw sequence number
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

/// Transaction kind (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Tokens credited to the user
    Earn,
    /// Tokens debited from the user
    Spend,
    /// Tokens moved between users; sign depends on direction
    Transfer,
}

impl TxKind {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            TxKind::Earn => "earn",
            TxKind::Spend => "spend",
            TxKind::Transfer => "transfer",
        }
    }

    /// Parse from wire code
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "earn" => Some(TxKind::Earn),
            "spend" => Some(TxKind::Spend),
            "transfer" => Some(TxKind::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Direction of a transfer relative to the recorded user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Tokens arriving from another party
    Inbound,
    /// Tokens leaving toward another party
    Outbound,
}

impl TransferDirection {
    /// Parse from wire code
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inbound" => Some(TransferDirection::Inbound),
            "outbound" => Some(TransferDirection::Outbound),
            _ => None,
        }
    }
}

/// Immutable ledger entry
///
/// The ledger of these entries is the sole source of truth for a user's
/// balance; no update or delete operation exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransaction {
    /// Unique, strictly increasing id
    pub transaction_id: TransactionId,

    /// Owning user
    pub user_id: UserId,

    /// Transaction kind
    #[serde(rename = "type")]
    pub kind: TxKind,

    /// Transfer direction; present iff kind is `Transfer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<TransferDirection>,

    /// Token amount (always positive; sign derives from kind/direction)
    pub amount: Decimal,

    /// Append timestamp
    pub timestamp: DateTime<Utc>,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Related entity (site URL for engagement mints, counterparty for transfers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

impl TokenTransaction {
    /// Signed contribution of this entry to the owner's balance
    pub fn signed_amount(&self) -> Decimal {
        match (self.kind, self.direction) {
            (TxKind::Earn, _) => self.amount,
            (TxKind::Spend, _) => -self.amount,
            (TxKind::Transfer, Some(TransferDirection::Inbound)) => self.amount,
            (TxKind::Transfer, _) => -self.amount,
        }
    }
}

/// Per-(user, site) engagement counter
///
/// Unique per (user, site); upserted on every visit, never duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSite {
    /// Owning user
    pub user_id: UserId,

    /// Site URL (upsert key together with the user)
    pub site_url: String,

    /// Monotonic count of blocked trackers on this site
    pub blocked_trackers_count: u64,

    /// Last visit timestamp
    pub last_visit: DateTime<Utc>,

    /// Whether the user consented to tracking protection on this site
    pub user_consent: bool,
}

/// Notification kind (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// Email found in a data breach
    DataBreach,
    /// Balance-affecting ledger event
    TokenUpdate,
    /// Privacy feature or settings alert
    PrivacyAlert,
}

impl NotificationKind {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            NotificationKind::DataBreach => "dataBreach",
            NotificationKind::TokenUpdate => "tokenUpdate",
            NotificationKind::PrivacyAlert => "privacyAlert",
        }
    }

    /// Parse from wire code
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dataBreach" => Some(NotificationKind::DataBreach),
            "tokenUpdate" => Some(NotificationKind::TokenUpdate),
            "privacyAlert" => Some(NotificationKind::PrivacyAlert),
            _ => None,
        }
    }
}

/// User-facing notification
///
/// Created once; only `read` mutates, one way (false → true).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique id
    pub notification_id: Uuid,

    /// Owning user
    pub user_id: UserId,

    /// Notification kind
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Message shown to the user
    pub message: String,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Acknowledgment flag
    pub read: bool,
}

/// Tracker blocking strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockingLevel {
    /// Blocks known malicious trackers only
    Basic,
    /// Blocks most advertising and analytics trackers
    Standard,
    /// Blocks all trackers
    Strict,
}

/// Per-user privacy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    /// Blocking strictness
    pub blocking_level: BlockingLevel,
    /// Allow analytics trackers
    pub allow_analytics: bool,
    /// Allow social media trackers
    pub allow_social: bool,
    /// Allow advertising trackers
    pub allow_advertising: bool,
    /// Allow fingerprinting trackers
    pub allow_fingerprinting: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            blocking_level: BlockingLevel::Standard,
            allow_analytics: false,
            allow_social: false,
            allow_advertising: false,
            allow_fingerprinting: false,
        }
    }
}

/// Opt-in data sharing flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSharingFlags {
    /// Share anonymized browsing data
    pub anonymized_browsing: bool,
    /// Share attention data
    pub attention_data: bool,
    /// Share performance metrics
    pub performance_metrics: bool,
}

/// User record
///
/// The token balance is derived from the ledger and intentionally absent
/// here; it is attached at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier
    pub user_id: UserId,

    /// Ethereum address supplied at registration
    pub eth_address: String,

    /// SHA-256 hash of the registration email; raw email is never stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_hash: Option<String>,

    /// Privacy settings
    pub privacy_settings: PrivacySettings,

    /// Data sharing opt-ins
    pub data_sharing_flags: DataSharingFlags,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// A breach record returned by the gateway
///
/// Carries no user identifiers; the raw email never reaches this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachReport {
    /// Source name (stable key of the breach)
    pub name: String,
    /// Display title
    pub title: String,
    /// Breached domain
    pub domain: String,
    /// Date of the breach
    pub breach_date: NaiveDate,
    /// Data classes exposed in the breach
    pub data_classes: Vec<String>,
    /// Verified by the provider
    pub is_verified: bool,
    /// Contains sensitive data classes
    pub is_sensitive: bool,
}

/// One candidate row of a k-anonymity range response
///
/// `suffix` is the remainder of a SHA-1 hash sharing the queried prefix; the
/// gateway compares it locally and never sends the full hash out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeCandidate {
    /// Hash suffix (uppercase hex, 35 chars for a 5-char prefix)
    pub suffix: String,
    /// Breach records attached to this suffix
    pub reports: Vec<BreachReport>,
}

/// Per-kind totals over a queried page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    /// Sum of `earn` amounts in the page
    pub earned: Decimal,
    /// Sum of `spend` amounts in the page
    pub spent: Decimal,
    /// Sum of `transfer` amounts in the page (absolute)
    pub transferred: Decimal,
}

/// Result of a ledger query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    /// Matching transactions, newest first
    pub transactions: Vec<TokenTransaction>,
    /// Totals over the returned transactions (not the full ledger)
    pub totals: LedgerTotals,
    /// Number of returned transactions
    pub count: usize,
}

/// Receipt for a recorded site visit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReceipt {
    /// Tokens minted for this visit
    pub tokens_earned: Decimal,
    /// Site row after the upsert
    pub site: TrackedSite,
}
