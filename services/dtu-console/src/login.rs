//! Authentication against the device

use std::sync::Arc;

use crate::auth::{basic_auth_headers, basic_token};
use crate::error::{ApiError, ConsoleError, NormalizedError};
use crate::interceptor::{error_message, parse_body};
use crate::io::{join_url, HttpClient};
use crate::store::{CredentialStore, Session};

/// Endpoint that checks Basic-auth credentials
pub const AUTHENTICATE_PATH: &str = "/api/security/authenticate";

/// Login/logout against the device's security API
pub struct LoginFlow {
    base_url: String,
    http: Arc<dyn HttpClient>,
    store: CredentialStore,
}

impl std::fmt::Debug for LoginFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LoginFlow {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>, store: CredentialStore) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
            store,
        }
    }

    /// Check the supplied credentials with the device and store the session
    /// on success
    pub async fn login(&self, username: &str, password: &str) -> crate::Result<Session> {
        let url = join_url(&self.base_url, AUTHENTICATE_PATH);
        let token = basic_token(username, password);
        tracing::debug!("Authenticating '{}' against {}", username, url);

        let response = self.http.get(&url, basic_auth_headers(&token)).await?;

        if response.status == 401 {
            tracing::info!("Device rejected credentials for '{}'", username);
            self.logout();
            return Err(ConsoleError::InvalidCredentials);
        }

        let data = parse_body(&response.body);

        if !response.is_success() {
            let message = data
                .ok()
                .flatten()
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| response.status_text());
            tracing::warn!("Login failed with status {}: {}", response.status, message);
            return Err(ApiError::Server(NormalizedError {
                message,
                status: response.status,
            })
            .into());
        }

        let data = data.map_err(|e| ApiError::Parse(e.to_string()))?;
        let mut extra = match data {
            Some(serde_json::Value::Object(map)) => map,
            Some(other) => {
                tracing::debug!("Ignoring non-object authentication payload: {}", other);
                serde_json::Map::new()
            }
            None => serde_json::Map::new(),
        };
        extra.remove("authdata");

        let session = Session {
            auth_data: token,
            extra,
        };
        self.store.set(&session);
        tracing::info!("Logged in as '{}'", username);
        Ok(session)
    }

    /// Drop the stored session; safe to call when already logged out
    pub fn logout(&self) {
        if self.store.get().is_some() {
            tracing::info!("Logging out");
        }
        self.store.clear();
    }

    /// End the session stored at `epoch`; returns `false` without touching
    /// the store when a newer session has replaced it
    pub fn end_session(&self, epoch: u64) -> bool {
        let ended = self.store.clear_if_current(epoch);
        if ended {
            tracing::info!("Logging out");
        }
        ended
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.get().is_some()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }
}
