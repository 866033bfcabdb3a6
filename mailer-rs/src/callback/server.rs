//! Callback server - receives the OAuth2 redirect

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::callback::handlers::{self, CallbackState};
use crate::oauth::{OAuthFlow, CALLBACK_PATH};

pub struct CallbackServer {
    state: Arc<CallbackState>,
    addr: String,
}

impl CallbackServer {
    pub fn new(flow: OAuthFlow, addr: String) -> Self {
        Self {
            state: Arc::new(CallbackState::new(flow)),
            addr,
        }
    }

    pub fn state(&self) -> Arc<CallbackState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        Router::new()
            .route(CALLBACK_PATH, get(handlers::authorization_callback))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until a token has been stored
    pub async fn run(&self) -> std::io::Result<()> {
        let router = self.router();

        info!("Waiting for authorization callback on http://{}{}", self.addr, CALLBACK_PATH);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        let state = self.state.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { state.authorized.notified().await })
            .await?;

        info!("Callback server stopped");
        Ok(())
    }
}
