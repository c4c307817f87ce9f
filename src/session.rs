//! Session and login handling.
//!
//! [`SessionManager`] is the only component that can change the [`Session`]. Everything
//! else receives an immutable snapshot (or a `watch` receiver) and passes it explicitly
//! to the requests that need a token.

use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::types::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};

/// Authentication state
///
/// The token is non-empty if and only if the session is authenticated. Sessions are
/// replaced as a whole, never patched field by field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session without credentials
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// An authenticated session holding `token`
    ///
    /// An empty token yields an unauthenticated session.
    pub fn authenticated(token: impl Into<String>, at: DateTime<Utc>) -> Self {
        let token = token.into();
        if token.is_empty() {
            return Self::default();
        }
        Self {
            token: Some(token),
            authenticated_at: Some(at),
        }
    }

    /// Whether requests can be made with this session
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Bearer token, if authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// When the login that produced this session completed
    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }
}

/// Credentials body for the login endpoint
#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "UserName")]
    user_name: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

/// Token payload returned by a successful login
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent requests
    pub access_token: String,
    /// Token type (normally "Bearer")
    pub token_type: String,
    /// Lifetime of the access token, in seconds
    pub expires_in: i64,
    /// Token that can be exchanged for a new access token
    pub refresh_token: String,
}

/// Owns the session and performs logins
///
/// Cloning is cheap; all clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    http_client: reqwest::Client,
    config: Arc<Config>,
    session_tx: Arc<watch::Sender<Session>>,
    /// Held for the whole login so at most one is in flight
    login_gate: Arc<Mutex<()>>,
    event_tx: broadcast::Sender<Event>,
}

impl SessionManager {
    /// Create a manager with an unauthenticated session
    pub fn new(config: Arc<Config>, http_client: reqwest::Client) -> Self {
        let (session_tx, _rx) = watch::channel(Session::unauthenticated());
        let (event_tx, _rx) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            http_client,
            config,
            session_tx: Arc::new(session_tx),
            login_gate: Arc::new(Mutex::new(())),
            event_tx,
        }
    }

    /// Build a manager with its own HTTP client from `config`
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let http_client = crate::http::build_client(&config.http)?;
        Ok(Self::new(Arc::new(config), http_client))
    }

    /// Log in with the given credentials
    ///
    /// On success the session becomes authenticated and the change is published to
    /// every [`subscribe_session`](Self::subscribe_session) receiver. On failure the session
    /// is left exactly as it was.
    ///
    /// Concurrent calls are serialized: a second call waits for the first to finish.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<(), AuthError> {
        let _gate = self.login_gate.lock().await;

        let url = self
            .config
            .login_url()
            .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url = %url, "Sending login request");

        let response = self
            .http_client
            .post(url)
            .json(&LoginRequest {
                user_name: username,
                password,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Login request failed");
                AuthError::Transport(e)
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Login rejected");
            return Err(AuthError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(AuthError::Transport)?;
        let token: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "Login response could not be decoded");
            AuthError::Decoding(e.to_string())
        })?;

        if token.access_token.is_empty() {
            return Err(AuthError::Decoding("empty access_token".to_string()));
        }

        let now = Utc::now();
        self.session_tx
            .send_replace(Session::authenticated(token.access_token, now));

        tracing::info!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Login succeeded"
        );
        self.event_tx.send(Event::LoggedIn { at: now }).ok();

        Ok(())
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session_tx.borrow().clone()
    }

    /// Whether the current session is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.session_tx.borrow().is_authenticated()
    }

    /// Live, read-only view of the session
    pub fn subscribe_session(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    pub(crate) fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub(crate) fn http_client(&self) -> reqwest::Client {
        self.http_client.clone()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<Event> {
        self.event_tx.clone()
    }
}
