//! HTTP endpoint completing the OAuth2 authorization (phase 2)

pub mod handlers;
pub mod server;

pub use handlers::CallbackState;
pub use server::CallbackServer;
