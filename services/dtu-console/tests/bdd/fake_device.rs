//! In-process stand-in for the DTU's HTTP API

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use dtu_console::auth::basic_token;
use dtu_console::io::{HttpClient, HttpResponse};
use dtu_console::ConsoleError;
use reqwest::header::{HeaderMap, AUTHORIZATION};

pub const BASE_URL: &str = "http://dtu.test";

#[derive(Debug, Default)]
pub struct FakeDevice {
    credentials: Mutex<Option<(String, String)>>,
    routes: Mutex<HashMap<String, HttpResponse>>,
    unreachable: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeDevice {
    pub fn accept(&self, username: &str, password: &str) {
        *self.credentials.lock().unwrap() = Some((username.to_string(), password.to_string()));
    }

    /// Serve `response` for `path` (including any query string)
    pub fn route(&self, path: &str, response: HttpResponse) {
        self.unreachable.lock().unwrap().remove(path);
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn make_unreachable(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(path.to_string());
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    fn respond(&self, url: &str, headers: &HeaderMap) -> dtu_console::Result<HttpResponse> {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        self.requests.lock().unwrap().push(path.clone());

        if self.unreachable.lock().unwrap().contains(&path) {
            return Err(ConsoleError::Http(format!(
                "GET {} failed: connection refused",
                url
            )));
        }

        if path == "/api/security/authenticate" {
            let expected = self
                .credentials
                .lock()
                .unwrap()
                .as_ref()
                .map(|(user, pass)| format!("Basic {}", basic_token(user, pass)));
            let given = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            return Ok(match (expected, given) {
                (Some(expected), Some(given)) if expected == given => HttpResponse::new(
                    200,
                    r#"{"type":"success","message":"Authentication successfull!"}"#,
                ),
                _ => HttpResponse::new(401, ""),
            });
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(404, "")))
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeDevice {
    async fn get(&self, url: &str, headers: HeaderMap) -> dtu_console::Result<HttpResponse> {
        self.respond(url, &headers)
    }

    async fn post_form(
        &self,
        url: &str,
        headers: HeaderMap,
        _params: &[(&str, &str)],
    ) -> dtu_console::Result<HttpResponse> {
        self.respond(url, &headers)
    }
}
