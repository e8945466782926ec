//! Request header and credential URL construction

use base64::prelude::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;

use crate::store::CredentialStore;

/// Header the device uses to tell API calls apart from page navigation
pub const REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Path of the live-data WebSocket endpoint
pub const LIVE_DATA_PATH: &str = "/livedata";

/// `base64(username:password)`
pub fn basic_token(username: &str, password: &str) -> String {
    BASE64_STANDARD.encode(format!("{}:{}", username, password))
}

/// Split a Basic token back into `(username, password)`
pub fn decode_token(token: &str) -> Option<(String, String)> {
    let bytes = BASE64_STANDARD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Headers for an API call authenticated with the given token
pub fn basic_auth_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
    match HeaderValue::from_str(&format!("Basic {}", token)) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(e) => tracing::warn!("Omitting Authorization header: {}", e),
    }
    headers
}

/// Headers for an API call on behalf of the stored session, if any
pub fn build_auth_headers(store: &CredentialStore) -> HeaderMap {
    match store.get() {
        Some(session) => basic_auth_headers(&session.auth_data),
        None => {
            let mut headers = HeaderMap::new();
            headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
            headers
        }
    }
}

/// `user:pass@` userinfo prefix for endpoints that cannot carry headers;
/// empty when logged out or when the stored token is not decodable
pub fn build_embedded_credential_url(store: &CredentialStore) -> String {
    let Some(session) = store.get() else {
        return String::new();
    };
    let Some((user, pass)) = decode_token(&session.auth_data) else {
        tracing::warn!("Stored credential token is not decodable");
        return String::new();
    };

    // Url percent-encodes userinfo for us
    let Ok(mut url) = Url::parse("ws://localhost/") else {
        return String::new();
    };
    if url.set_username(&user).is_err() || url.set_password(Some(&pass)).is_err() {
        return String::new();
    }
    let password = url.password().unwrap_or_default();
    format!("{}:{}@", url.username(), password)
}

/// WebSocket URL of the live-data endpoint with embedded credentials
pub fn live_data_url(base_url: &str, store: &CredentialStore) -> crate::Result<String> {
    let mut url = Url::parse(base_url).map_err(|e| {
        crate::ConsoleError::Config(format!("Invalid device URL '{}': {}", base_url, e))
    })?;

    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|_| {
        crate::ConsoleError::Config(format!("Cannot derive WebSocket URL from '{}'", base_url))
    })?;
    url.set_path(LIVE_DATA_PATH);
    url.set_query(None);

    let host = url.host_str().unwrap_or_default().to_string();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    Ok(format!(
        "{}://{}{}{}{}",
        url.scheme(),
        build_embedded_credential_url(store),
        host,
        port,
        url.path()
    ))
}
