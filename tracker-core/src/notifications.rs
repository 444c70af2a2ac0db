//! Notification center
//!
//! Creates, lists, and transitions notifications. The state machine is
//! deliberately tiny: `{unread, read}`, one transition, one way.
//! Acknowledgment is permanent; there is no path back to unread.

use crate::store::AccountStore;
use crate::types::{Notification, NotificationKind, UserId};
use crate::{Error, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Notification center over the shared account repository
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    store: AccountStore,
}

impl NotificationCenter {
    /// Create a center over a store
    pub fn new(store: AccountStore) -> Self {
        Self { store }
    }

    /// Create a notification
    ///
    /// Assigns a unique id and the current timestamp; starts unread.
    pub fn create(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        message: &str,
    ) -> Result<Notification> {
        if message.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "Notification message is required".to_string(),
            ));
        }

        let handle = self.store.account(user_id)?;
        let mut account = handle.write();

        let notification = Notification {
            notification_id: Uuid::new_v4(),
            user_id: user_id.clone(),
            kind,
            message: message.to_string(),
            timestamp: Utc::now(),
            read: false,
        };
        account.notifications.push(notification.clone());
        // Indexed before the account lock is released so a caller that holds
        // the returned id can immediately mark it read
        self.store
            .index_notification(notification.notification_id, user_id.clone());

        info!(
            "Created {} notification {} for user {}",
            notification.kind.code(),
            notification.notification_id,
            user_id
        );

        Ok(notification)
    }

    /// List a user's notifications, newest first
    pub fn list(&self, user_id: &UserId, unread_only: bool) -> Result<Vec<Notification>> {
        let handle = self.store.account(user_id)?;
        let account = handle.read();

        let notifications: Vec<Notification> = account
            .notifications
            .iter()
            .rev()
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();

        Ok(notifications)
    }

    /// Acknowledge a notification
    ///
    /// Idempotent: acknowledging an already-read notification is a no-op
    /// that returns the current record. `read = false` is also a no-op since
    /// the reverse transition does not exist.
    pub fn mark_read(&self, notification_id: &Uuid, read: bool) -> Result<Notification> {
        let owner = self
            .store
            .notification_owner(notification_id)
            .ok_or_else(|| Error::NotFound(format!("Notification not found: {}", notification_id)))?;

        let handle = self.store.account(&owner)?;
        let mut account = handle.write();

        let notification = account
            .notifications
            .iter_mut()
            .find(|n| n.notification_id == *notification_id)
            .ok_or_else(|| {
                Error::Internal(format!(
                    "Notification index out of sync for {}",
                    notification_id
                ))
            })?;

        if read && !notification.read {
            notification.read = true;
            info!("Marked notification {} read", notification_id);
        }

        Ok(notification.clone())
    }
}
