// Wire models for the Tracker Tokens gateway
// Field names are normative for client compatibility (camelCase)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracker_core::{
    BreachReport, DataSharingFlags, Error, NotificationKind, PrivacySettings, TransferDirection,
    TxKind, User,
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensQuery {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub related_entity_id: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTrackersRequest {
    pub user_id: Option<String>,
    pub site_url: Option<String>,
    pub blocked_trackers_count: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTrackersResponse {
    pub success: bool,
    pub tokens_earned: Decimal,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    pub user_id: Option<String>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotificationRequest {
    pub notification_id: Option<Uuid>,
    pub read: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachCheckRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachCheckResponse {
    pub breaches: Vec<BreachReport>,
    pub checked: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub eth_address: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: Option<String>,
    pub privacy_settings: Option<PrivacySettings>,
    pub data_sharing_flags: Option<DataSharingFlags>,
}

// User record with the derived balance attached
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub token_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

// Kinds are a closed set: unknown strings are rejected here, never stored
pub fn parse_kind(kind: &str) -> Result<TxKind, Error> {
    TxKind::parse(kind)
        .ok_or_else(|| Error::InvalidArgument(format!("Invalid transaction type: {}", kind)))
}

pub fn parse_kind_filter(kind: Option<&str>) -> Result<Option<TxKind>, Error> {
    match kind {
        None | Some("all") => Ok(None),
        Some(k) => parse_kind(k).map(Some),
    }
}

pub fn parse_notification_kind(kind: &str) -> Result<NotificationKind, Error> {
    NotificationKind::parse(kind)
        .ok_or_else(|| Error::InvalidArgument(format!("Invalid notification type: {}", kind)))
}

pub fn parse_direction(direction: Option<&str>) -> Result<Option<TransferDirection>, Error> {
    match direction {
        None => Ok(None),
        Some(d) => TransferDirection::parse(d)
            .map(Some)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid transfer direction: {}", d))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_filter() {
        assert_eq!(parse_kind_filter(None).unwrap(), None);
        assert_eq!(parse_kind_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_kind_filter(Some("earn")).unwrap(), Some(TxKind::Earn));
        assert!(parse_kind_filter(Some("mint")).is_err());
    }

    #[test]
    fn test_unknown_notification_kind_rejected() {
        assert!(parse_notification_kind("dataBreach").is_ok());
        assert!(parse_notification_kind("databreach").is_err());
        assert!(parse_notification_kind("spam").is_err());
    }
}
