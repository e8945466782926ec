//! Navigation contract with the view router

use reqwest::Url;

/// Views the runtime can send the user to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Login view, returning to `return_url` after authentication
    Login { return_url: String },
    /// Generic error view
    Error { message: String, status: u16 },
}

impl Route {
    /// Router path including query parameters, e.g. `/login?returnUrl=%2Fsettings`
    pub fn path(&self) -> String {
        let (path, params): (&str, Vec<(&str, String)>) = match self {
            Route::Login { return_url } => ("/login", vec![("returnUrl", return_url.clone())]),
            Route::Error { message, status } => (
                "/error",
                vec![
                    ("status", status.to_string()),
                    ("message", message.to_string()),
                ],
            ),
        };

        match Url::parse_with_params(&format!("http://localhost{}", path), &params) {
            Ok(url) => match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            },
            Err(_) => path.to_string(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Router seam; the runtime never renders views itself
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator for headless use that only records the transition in the log
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        match &route {
            Route::Login { .. } => tracing::info!("Session ended, login required: {}", route),
            Route::Error { message, status } => {
                tracing::error!("Request failed with status {}: {}", status, message)
            }
        }
    }
}
