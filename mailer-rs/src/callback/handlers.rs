//! Callback request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::oauth::OAuthFlow;

/// Shared callback state
pub struct CallbackState {
    pub flow: OAuthFlow,
    /// Signalled once a token has been persisted
    pub authorized: Notify,
}

impl CallbackState {
    pub fn new(flow: OAuthFlow) -> Self {
        Self {
            flow,
            authorized: Notify::new(),
        }
    }
}

/// Query string sent by the provider's redirect
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizedResponse {
    pub status: &'static str,
    pub message: &'static str,
}

fn reject(status: StatusCode, msg: &str) -> axum::response::Response {
    (status, Json(ApiError::new(msg))).into_response()
}

/// Health check
pub async fn health() -> &'static str {
    "ok"
}

/// Complete the authorization with the code from the redirect
pub async fn authorization_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> axum::response::Response {
    if let Some(denied) = params.error {
        warn!("Authorization denied by provider: {}", denied);
        return reject(StatusCode::BAD_REQUEST, &format!("authorization denied: {}", denied));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("Unable to receive code");
        return reject(StatusCode::BAD_REQUEST, "missing authorization code");
    };

    let pending = match state.flow.pending() {
        Ok(Some(pending)) => pending,
        Ok(None) => {
            warn!("Callback received but no authorization is pending");
            return reject(StatusCode::CONFLICT, "no authorization is pending");
        }
        Err(e) => {
            error!("Unable to read pending authorization: {}", e);
            return reject(StatusCode::INTERNAL_SERVER_ERROR, "unable to read pending authorization");
        }
    };

    let Some(csrf_state) = params.state.filter(|s| !s.is_empty()) else {
        warn!("Callback without state parameter");
        return reject(StatusCode::BAD_REQUEST, "missing state parameter");
    };

    if pending.csrf_state != csrf_state {
        warn!("Callback state does not match pending authorization");
        return reject(StatusCode::BAD_REQUEST, "state mismatch");
    }

    match state.flow.complete(&code, &csrf_state).await {
        Ok(_) => {
            info!("Token received and stored");
            state.authorized.notify_one();
            (
                StatusCode::OK,
                Json(AuthorizedResponse {
                    status: "authorized",
                    message: "Token saved. You can close this window.",
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Unable to retrieve token: {}", e);
            reject(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}
