// Route handlers for the Tracker Tokens gateway
// Thin delegation to tracker-core; all invariants live in the engine

use crate::error::ApiError;
use crate::metrics::METRICS;
use crate::models::{
    parse_direction, parse_kind, parse_kind_filter, parse_notification_kind, BreachCheckRequest,
    BreachCheckResponse, BreachQuery, CreateNotificationRequest, CreateTransactionRequest,
    HealthResponse, NotificationsQuery, RecordTrackersRequest, RecordTrackersResponse,
    RegisterUserRequest, SitesQuery, TokensQuery, UpdateNotificationRequest, UpdateUserRequest,
    UserQuery, UserResponse,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::prelude::ToPrimitive;
use tracker_core::{
    BreachReport, Error, LedgerPage, Notification, TokenTransaction, TrackedSite, UserId,
};
use tracing::info;

fn require<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| Error::InvalidArgument(message.to_string()).into())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "tracker-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn metrics_export() -> Result<String, ApiError> {
    METRICS
        .export()
        .map_err(|e| Error::Internal(format!("Failed to export metrics: {}", e)).into())
}

// GET /tokens?userId&type&limit
pub async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<TokensQuery>,
) -> Result<Json<LedgerPage>, ApiError> {
    METRICS.http_requests_total.inc();

    let user_id = UserId::new(require(query.user_id, "User ID required")?);
    let kind = parse_kind_filter(query.kind.as_deref())?;
    let limit = query.limit.unwrap_or(10);

    let page = state.ledger.query(&user_id, kind, limit)?;
    Ok(Json(page))
}

// POST /tokens
pub async fn create_token_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TokenTransaction>), ApiError> {
    METRICS.http_requests_total.inc();

    let missing = "User ID, type, and amount required";
    let user_id = UserId::new(require(body.user_id, missing)?);
    let kind = parse_kind(&require(body.kind, missing)?)?;
    let amount = require(body.amount, missing)?;
    let direction = parse_direction(body.direction.as_deref())?;

    let tx = state.ledger.append(
        &user_id,
        kind,
        amount,
        body.description,
        body.related_entity_id,
        direction,
    )?;
    METRICS.transactions_appended_total.inc();

    Ok((StatusCode::CREATED, Json(tx)))
}

// POST /trackers
pub async fn record_trackers(
    State(state): State<AppState>,
    Json(body): Json<RecordTrackersRequest>,
) -> Result<Json<RecordTrackersResponse>, ApiError> {
    METRICS.http_requests_total.inc();

    let missing = "User ID and site URL required";
    let user_id = UserId::new(require(body.user_id, missing)?);
    let site_url = require(body.site_url, missing)?;

    let receipt = state
        .engagement
        .record_visit(&user_id, &site_url, body.blocked_trackers_count)?;

    METRICS.visits_recorded_total.inc();
    METRICS
        .tokens_minted_total
        .inc_by(receipt.tokens_earned.to_f64().unwrap_or(0.0));

    let blocked = body.blocked_trackers_count.filter(|n| *n > 0).unwrap_or(1);
    Ok(Json(RecordTrackersResponse {
        success: true,
        tokens_earned: receipt.tokens_earned,
        message: format!(
            "Blocked {} trackers and earned {} TT",
            blocked, receipt.tokens_earned
        ),
    }))
}

// GET /trackers?userId
pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SitesQuery>,
) -> Result<Json<Vec<TrackedSite>>, ApiError> {
    METRICS.http_requests_total.inc();

    let user_id = UserId::new(require(query.user_id, "User ID required")?);
    let sites = state.engagement.list_sites(&user_id)?;
    Ok(Json(sites))
}

// GET /notifications?userId&unreadOnly
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    METRICS.http_requests_total.inc();

    let user_id = UserId::new(require(query.user_id, "User ID required")?);
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications = state.notifications.list(&user_id, unread_only)?;
    Ok(Json(notifications))
}

// POST /notifications
pub async fn create_notification(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    METRICS.http_requests_total.inc();

    let missing = "User ID, type, and message required";
    let user_id = UserId::new(require(body.user_id, missing)?);
    let kind = parse_notification_kind(&require(body.kind, missing)?)?;
    let message = require(body.message, missing)?;

    let notification = state.notifications.create(&user_id, kind, &message)?;
    METRICS.notifications_created_total.inc();

    Ok((StatusCode::CREATED, Json(notification)))
}

// PUT /notifications
pub async fn update_notification(
    State(state): State<AppState>,
    Json(body): Json<UpdateNotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    METRICS.http_requests_total.inc();

    let notification_id = require(body.notification_id, "Notification ID required")?;
    let read = body.read.unwrap_or(true);

    let notification = state.notifications.mark_read(&notification_id, read)?;
    Ok(Json(notification))
}

// GET /breach-check?email
pub async fn breach_check(
    State(state): State<AppState>,
    Query(query): Query<BreachQuery>,
) -> Result<Json<Vec<BreachReport>>, ApiError> {
    METRICS.http_requests_total.inc();
    METRICS.breach_checks_total.inc();

    let email = require(query.email, "Email parameter required")?;
    let reports = state.breach.check(&email).await?;
    if !reports.is_empty() {
        METRICS.breach_hits_total.inc();
    }

    Ok(Json(reports))
}

// POST /breach-check
pub async fn breach_check_and_notify(
    State(state): State<AppState>,
    Json(body): Json<BreachCheckRequest>,
) -> Result<Json<BreachCheckResponse>, ApiError> {
    METRICS.http_requests_total.inc();
    METRICS.breach_checks_total.inc();

    let missing = "User ID and email required";
    let user_id = UserId::new(require(body.user_id, missing)?);
    let email = require(body.email, missing)?;

    let breaches = state.breach.check_and_notify(&user_id, &email).await?;
    if !breaches.is_empty() {
        METRICS.breach_hits_total.inc();
    }

    let message = if breaches.is_empty() {
        "No data breaches found for this email.".to_string()
    } else {
        format!("Found {} data breach(es) for this email.", breaches.len())
    };

    Ok(Json(BreachCheckResponse {
        breaches,
        checked: true,
        message,
    }))
}

// POST /users
pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    METRICS.http_requests_total.inc();

    let eth_address = require(body.eth_address, "Ethereum address required")?;
    let user = state
        .ledger
        .register_user(&eth_address, body.email.as_deref())?;
    let token_balance = state.ledger.balance_of(&user.user_id)?;

    info!("Registered user {}", user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user,
            token_balance,
        }),
    ))
}

// GET /users?userId
pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    METRICS.http_requests_total.inc();

    let user_id = UserId::new(require(query.user_id, "User ID required")?);
    let user = state.ledger.get_user(&user_id)?;
    let token_balance = state.ledger.balance_of(&user_id)?;

    Ok(Json(UserResponse {
        user,
        token_balance,
    }))
}

// PUT /users
pub async fn update_user(
    State(state): State<AppState>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    METRICS.http_requests_total.inc();

    let user_id = UserId::new(require(body.user_id, "User ID required")?);
    let user = state
        .ledger
        .update_user(&user_id, body.privacy_settings, body.data_sharing_flags)?;
    let token_balance = state.ledger.balance_of(&user_id)?;

    Ok(Json(UserResponse {
        user,
        token_balance,
    }))
}
