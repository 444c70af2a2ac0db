//! Tracker Tokens Core
//!
//! Accounting and engagement-event engine: an append-only token ledger with
//! derived balances, idempotent per-(user, site) engagement counters that
//! mint ledger entries, a notification center, and a privacy-preserving
//! breach-check gateway.
//!
//! # Architecture
//!
//! - **Ledger as truth**: balances are derived from immutable transactions;
//!   the running balance is a cache that must agree with the fold
//! - **Per-user boundary**: one lock per account covers every combined
//!   mutation, so partial states are never observable
//! - **Closed kinds**: transaction and notification kinds are enums;
//!   invalid variants are rejected at the boundary, never stored
//! - **k-anonymity**: breach lookups disclose only a hash prefix; exact
//!   matching happens locally

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod breach;
pub mod config;
pub mod engagement;
pub mod error;
pub mod ledger;
pub mod notifications;
pub mod store;
pub mod types;

// Re-exports
pub use breach::{BreachGateway, BreachProvider, HttpRangeProvider, StaticRangeProvider};
pub use config::{BreachConfig, Config, EarningConfig};
pub use engagement::Engagement;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use notifications::NotificationCenter;
pub use store::AccountStore;
pub use types::{
    BlockingLevel, BreachReport, DataSharingFlags, LedgerPage, LedgerTotals, Notification,
    NotificationKind, PrivacySettings, RangeCandidate, TokenTransaction, TrackedSite,
    TransactionId, TransferDirection, TxKind, User, UserId, VisitReceipt,
};
