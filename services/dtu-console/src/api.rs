//! Authenticated API calls routed through the response interceptor

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::build_auth_headers;
use crate::error::ApiError;
use crate::interceptor::{RequestOptions, ResponseInterceptor};
use crate::io::{join_url, HttpClient};
use crate::store::CredentialStore;

/// Issues API calls on behalf of a view
///
/// `origin` is the view path the call was made from; it becomes the return
/// URL when the device forces a logout.
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    store: CredentialStore,
    interceptor: Arc<ResponseInterceptor>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        http: Arc<dyn HttpClient>,
        store: CredentialStore,
        interceptor: Arc<ResponseInterceptor>,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
            store,
            interceptor,
        }
    }

    pub async fn get(
        &self,
        path: &str,
        origin: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let url = join_url(&self.base_url, path);
        let epoch = self.store.session_epoch();
        let response = self
            .http
            .get(&url, build_auth_headers(&self.store))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        self.interceptor
            .classify_at(&response, epoch, origin, options)
    }

    /// GET and deserialize the body into `T`; an empty body is a parse error
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        origin: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let data = self
            .get(path, origin, options)
            .await?
            .ok_or_else(|| ApiError::Parse(format!("Empty response from {}", path)))?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// POST a JSON document in the `data` form field, the device's
    /// convention for saving configuration
    pub async fn post_data(
        &self,
        path: &str,
        data: &Value,
        origin: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ApiError> {
        let url = join_url(&self.base_url, path);
        let payload = data.to_string();
        let epoch = self.store.session_epoch();
        let response = self
            .http
            .post_form(
                &url,
                build_auth_headers(&self.store),
                &[("data", payload.as_str())],
            )
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        self.interceptor
            .classify_at(&response, epoch, origin, options)
    }
}
