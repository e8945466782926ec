//! Single classification point for every API response
//!
//! Each response is classified exactly once into success, forced logout on
//! 401, or a [`NormalizedError`] routed to the error view. Forced logout is
//! armed once per stored session: concurrent 401s for the same session only
//! reject their call, and a fresh login re-arms it. A 401 for a session that
//! has since been replaced leaves the new session alone.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{ApiError, NormalizedError};
use crate::events::{ConsoleEvent, EventBus};
use crate::io::HttpResponse;
use crate::login::LoginFlow;
use crate::navigation::{Navigator, Route};

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip navigation to the error view; the call still rejects
    pub ignore_errors: bool,
}

impl RequestOptions {
    pub fn ignore_errors() -> Self {
        Self {
            ignore_errors: true,
        }
    }
}

/// Parse a response body; empty bodies parse to `None`
pub fn parse_body(body: &str) -> Result<Option<Value>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body).map(Some)
}

/// The `message` field of a device error payload
pub fn error_message(data: &Value) -> Option<String> {
    data.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

pub struct ResponseInterceptor {
    login: Arc<LoginFlow>,
    bus: EventBus,
    navigator: Arc<dyn Navigator>,
    /// Session epoch whose forced logout has already run
    handled_epoch: Mutex<Option<u64>>,
}

impl std::fmt::Debug for ResponseInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseInterceptor")
            .field("login", &self.login)
            .finish()
    }
}

impl ResponseInterceptor {
    pub fn new(login: Arc<LoginFlow>, bus: EventBus, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            login,
            bus,
            navigator,
            handled_epoch: Mutex::new(None),
        }
    }

    /// Classify `response` for a call that originated from view path `origin`
    pub fn classify(
        &self,
        response: &HttpResponse,
        origin: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let epoch = self.login.store().session_epoch();
        self.classify_at(response, epoch, origin, options)
    }

    /// Like [`classify`](Self::classify) for a request sent while session
    /// `epoch` was stored
    pub fn classify_at(
        &self,
        response: &HttpResponse,
        epoch: u64,
        origin: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let data = parse_body(&response.body);

        if response.is_success() {
            return data.map_err(|e| {
                tracing::debug!("Unparseable body with status {}: {}", response.status, e);
                ApiError::Parse(e.to_string())
            });
        }

        if response.status == 401 {
            self.force_logout(epoch, origin);
            return Err(ApiError::Unauthorized);
        }

        let message = data
            .ok()
            .flatten()
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| response.status_text());
        let error = NormalizedError {
            message,
            status: response.status,
        };
        tracing::debug!("Request from {} failed: {}", origin, error);

        if !options.ignore_errors {
            self.navigator.navigate(Route::Error {
                message: error.message.clone(),
                status: error.status,
            });
        }

        Err(ApiError::Server(error))
    }

    fn force_logout(&self, epoch: u64, origin: &str) {
        {
            let mut handled = self
                .handled_epoch
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *handled == Some(epoch) {
                tracing::debug!("Session already terminated, ignoring 401 from {}", origin);
                return;
            }
            if !self.login.end_session(epoch) {
                tracing::debug!("Session replaced since the request from {}", origin);
                return;
            }
            *handled = Some(epoch);
        }

        tracing::info!("Device answered 401, session terminated");
        self.bus.publish(ConsoleEvent::LoggedOut);
        self.navigator.navigate(Route::Login {
            return_url: origin.to_string(),
        });
    }
}
