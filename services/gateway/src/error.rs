// HTTP error mapping for the Tracker Tokens gateway
//
// InvalidArgument and NotFound surface their message; Internal failures are
// logged with context and returned as an opaque generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(tracker_core::Error);

impl From<tracker_core::Error> for ApiError {
    fn from(err: tracker_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use tracker_core::Error;

        let status = self.status();
        let message = match &self.0 {
            Error::InvalidArgument(msg)
            | Error::NotFound(msg)
            | Error::GatewayUnavailable(msg) => msg.clone(),
            other => {
                error!("Internal error: {}", other);
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use tracker_core::Error;

        match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
