//! OAuth2 authorization for the Gmail API
//!
//! - [`client_secret`]: the registered OAuth client
//! - [`store`]: token and pending-state files
//! - [`flow`]: the two-phase authorization code handshake
//! - [`http_client`]: `reqwest` adapter for the token exchange

pub mod client_secret;
pub mod flow;
pub mod http_client;
pub mod store;

pub use client_secret::ClientSecret;
pub use flow::{Authorization, OAuthFlow, PendingAuthorization, CALLBACK_PATH, GMAIL_SEND_SCOPE};
pub use store::{JsonFile, StoredToken, TokenStore};
