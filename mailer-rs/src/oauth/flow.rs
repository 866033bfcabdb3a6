//! Two-phase authorization code handshake
//!
//! Phase 1 ([`OAuthFlow::begin`]) produces an authorization URL and records the
//! CSRF state and PKCE verifier on disk. Phase 2 ([`OAuthFlow::complete`]) runs
//! when the provider redirects back with a code: it checks the state, exchanges
//! the code and persists the token. The two phases may run in different
//! processes.

use crate::config::OAuthConfig;
use crate::error::{MailerError, Result};
use crate::oauth::client_secret::ClientSecret;
use crate::oauth::http_client::async_http_client;
use crate::oauth::store::{JsonFile, StoredToken, TokenStore};
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret as OAuthClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Scope allowing the application to send mail only
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Path the callback server listens on
pub const CALLBACK_PATH: &str = "/oauth/callback";

type ConfiguredClient = BasicClient<
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

/// Phase-1 artifact awaiting the callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub auth_url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Outcome of looking for usable credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// No token yet; the user must visit the URL
    Pending(PendingAuthorization),
    Authorized(StoredToken),
}

pub struct OAuthFlow {
    client: ConfiguredClient,
    tokens: TokenStore,
    pending: JsonFile<PendingAuthorization>,
}

impl OAuthFlow {
    /// # Errors
    /// Returns [`MailerError::Config`] if an endpoint or the redirect URI is not a valid URL
    pub fn new(
        secret: &ClientSecret,
        redirect_uri: &str,
        tokens: TokenStore,
        pending: JsonFile<PendingAuthorization>,
    ) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
            .set_client_secret(OAuthClientSecret::new(secret.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(secret.auth_uri.clone())
                    .map_err(|e| MailerError::Config(format!("invalid auth URI: {}", e)))?,
            )
            .set_token_uri(
                TokenUrl::new(secret.token_uri.clone())
                    .map_err(|e| MailerError::Config(format!("invalid token URI: {}", e)))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string())
                    .map_err(|e| MailerError::Config(format!("invalid redirect URI: {}", e)))?,
            );

        Ok(Self {
            client,
            tokens,
            pending,
        })
    }

    /// Build the flow from the `[oauth]` configuration section
    ///
    /// The redirect URI is, in order: `oauth.redirect_uri`, the first URI in the
    /// client secret file, or the local callback address.
    pub fn from_config(config: &OAuthConfig) -> Result<Self> {
        let secret = ClientSecret::from_file(&config.credentials_path)?;

        let redirect_uri = config
            .redirect_uri
            .clone()
            .or_else(|| secret.redirect_uris.first().cloned())
            .unwrap_or_else(|| format!("http://{}{}", config.callback_addr, CALLBACK_PATH));

        Self::new(
            &secret,
            &redirect_uri,
            TokenStore::new(&config.token_path),
            JsonFile::new(&config.pending_path),
        )
    }

    /// Use the stored token if there is one, otherwise the pending
    /// authorization, starting phase 1 only when neither exists
    pub fn authorize(&self) -> Result<Authorization> {
        if let Some(token) = self.tokens.load()? {
            return Ok(Authorization::Authorized(token));
        }

        info!("No token at {}", self.tokens.path().display());
        let pending = match self.pending()? {
            Some(pending) => pending,
            None => self.begin()?,
        };
        Ok(Authorization::Pending(pending))
    }

    /// A token ready for API calls
    ///
    /// # Errors
    /// - [`MailerError::AuthorizationRequired`] when no token is stored; the
    ///   authorization URL is printed and recorded for the callback
    /// - [`MailerError::Authentication`] when the stored token has expired
    pub fn access_token(&self) -> Result<StoredToken> {
        match self.authorize()? {
            Authorization::Authorized(token) if token.is_expired() => {
                warn!("Token at {} has expired", self.tokens.path().display());
                Err(MailerError::Authentication(format!(
                    "token expired; delete {} and authorize again",
                    self.tokens.path().display()
                )))
            }
            Authorization::Authorized(token) => Ok(token),
            Authorization::Pending(pending) => {
                println!(
                    "Go to the following link in your browser to authorize access:\n{}",
                    pending.auth_url
                );
                Err(MailerError::AuthorizationRequired {
                    auth_url: pending.auth_url,
                })
            }
        }
    }

    /// Phase 1: issue an authorization URL and persist the pending state
    pub fn begin(&self) -> Result<PendingAuthorization> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_SEND_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        let pending = PendingAuthorization {
            auth_url: auth_url.to_string(),
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };
        self.pending.save(&pending)?;

        Ok(pending)
    }

    /// The recorded phase-1 state, if any
    pub fn pending(&self) -> Result<Option<PendingAuthorization>> {
        self.pending.load()
    }

    /// Whether a token is already stored
    pub fn has_token(&self) -> Result<bool> {
        Ok(self.tokens.load()?.is_some())
    }

    /// Phase 2: exchange `code` and persist the resulting token
    ///
    /// # Errors
    /// - [`MailerError::Authentication`] when no authorization is pending, the
    ///   state does not match, or the token endpoint rejects the code
    pub async fn complete(&self, code: &str, state: &str) -> Result<StoredToken> {
        let pending = self.pending.load()?.ok_or_else(|| {
            MailerError::Authentication("no authorization is pending".to_string())
        })?;

        if pending.csrf_state != state {
            return Err(MailerError::Authentication(
                "authorization state does not match".to_string(),
            ));
        }

        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
            .request_async(&async_http_client)
            .await
            .map_err(|e| MailerError::Authentication(format!("token exchange failed: {}", e)))?;

        let token = StoredToken {
            access_token: response.access_token().secret().clone(),
            token_type: "Bearer".to_string(),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expiry: response
                .expires_in()
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
        };

        self.tokens.save(&token)?;
        self.pending.remove()?;
        info!("Authorization complete, token saved to {}", self.tokens.path().display());

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secret() -> ClientSecret {
        ClientSecret {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            redirect_uris: vec![],
        }
    }

    fn flow(dir: &TempDir) -> OAuthFlow {
        OAuthFlow::new(
            &secret(),
            "http://127.0.0.1:8080/oauth/callback",
            TokenStore::new(dir.path().join("token.json")),
            JsonFile::new(dir.path().join("pending.json")),
        )
        .unwrap()
    }

    #[test]
    fn test_begin_builds_url_and_persists_state() {
        let dir = TempDir::new().unwrap();
        let flow = flow(&dir);

        let pending = flow.begin().unwrap();

        assert!(pending.auth_url.starts_with("https://accounts.google.com/o/oauth2/auth"));
        assert!(pending.auth_url.contains("client_id=client-id"));
        assert!(pending.auth_url.contains("access_type=offline"));
        assert!(pending.auth_url.contains("gmail.send"));
        assert!(pending.auth_url.contains("code_challenge="));
        assert!(pending
            .auth_url
            .contains(&format!("state={}", pending.csrf_state)));
        assert_eq!(flow.pending().unwrap(), Some(pending));
    }

    #[test]
    fn test_authorize_without_token_is_pending() {
        let dir = TempDir::new().unwrap();
        let flow = flow(&dir);

        assert!(matches!(flow.authorize().unwrap(), Authorization::Pending(_)));
        assert!(!flow.has_token().unwrap());
    }

    #[test]
    fn test_authorize_reuses_pending_state() {
        let dir = TempDir::new().unwrap();
        let flow = flow(&dir);

        let Authorization::Pending(first) = flow.authorize().unwrap() else {
            panic!("expected pending authorization");
        };
        let Authorization::Pending(second) = flow.authorize().unwrap() else {
            panic!("expected pending authorization");
        };

        assert_eq!(first, second);
        assert_eq!(flow.pending().unwrap(), Some(first));
    }

    #[test]
    fn test_access_token_without_token_fails() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            flow(&dir).access_token(),
            Err(MailerError::AuthorizationRequired { .. })
        ));
    }

    #[test]
    fn test_access_token_with_stored_token() {
        let dir = TempDir::new().unwrap();
        let flow = flow(&dir);
        let token = StoredToken {
            access_token: "stored".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: Some(Utc::now() + chrono::Duration::hours(1)),
        };
        TokenStore::new(dir.path().join("token.json")).save(&token).unwrap();

        assert_eq!(flow.access_token().unwrap(), token);
        assert!(flow.pending().unwrap().is_none());
    }

    #[test]
    fn test_expired_token_is_authentication_error() {
        let dir = TempDir::new().unwrap();
        TokenStore::new(dir.path().join("token.json"))
            .save(&StoredToken {
                access_token: "old".to_string(),
                token_type: "Bearer".to_string(),
                refresh_token: None,
                expiry: Some(Utc::now() - chrono::Duration::hours(1)),
            })
            .unwrap();

        assert!(matches!(
            flow(&dir).access_token(),
            Err(MailerError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_without_pending_fails() {
        let dir = TempDir::new().unwrap();

        let result = flow(&dir).complete("code", "state").await;
        assert!(matches!(result, Err(MailerError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_complete_with_wrong_state_fails() {
        let dir = TempDir::new().unwrap();
        let flow = flow(&dir);
        flow.begin().unwrap();

        let result = flow.complete("code", "forged-state").await;
        assert!(matches!(result, Err(MailerError::Authentication(_))));
        assert!(!flow.has_token().unwrap());
        assert!(flow.pending().unwrap().is_some());
    }

    #[test]
    fn test_invalid_redirect_uri() {
        let dir = TempDir::new().unwrap();
        let result = OAuthFlow::new(
            &secret(),
            "not a url",
            TokenStore::new(dir.path().join("token.json")),
            JsonFile::new(dir.path().join("pending.json")),
        );
        assert!(matches!(result, Err(MailerError::Config(_))));
    }
}
