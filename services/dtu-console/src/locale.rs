//! Locale catalogs: bundled, discovered from the device, and cached
//!
//! The known-locale list only ever grows within a session. The persisted
//! preference is written only after the chosen catalog is usable, so it
//! never points at a code whose catalog failed to load; load failures fall
//! back to [`DEFAULT_LOCALE`] silently.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::{HeaderValue, ETAG, IF_NONE_MATCH};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::build_auth_headers;
use crate::events::{ConsoleEvent, EventBus};
use crate::format::FormatTemplates;
use crate::io::{join_url, HttpClient};
use crate::store::CredentialStore;

/// Locale used when nothing else can be loaded
pub const DEFAULT_LOCALE: &str = "en";

/// Lists locales the device can serve beyond the bundled ones
pub const LANGUAGES_PATH: &str = "/api/i18n/languages";

/// Serves a single catalog, `?code=<code>`
pub const LANGUAGE_PATH: &str = "/api/i18n/language";

const BUNDLED: [(&str, &str, &str); 3] = [
    ("en", "English", include_str!("../locales/en.json")),
    ("de", "Deutsch", include_str!("../locales/de.json")),
    ("fr", "Français", include_str!("../locales/fr.json")),
];

/// Entry of the device's language list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleDescriptor {
    pub code: String,
    pub name: String,
}

/// A loaded locale: messages plus the shared formatting templates
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    pub code: String,
    pub display_name: String,
    pub messages: HashMap<String, String>,
    pub formats: Arc<FormatTemplates>,
}

#[derive(Debug, Deserialize)]
struct LanguagePayload {
    webapp: Value,
}

/// Catalog persisted alongside the `ETag` the device served it with
#[derive(Debug, Serialize, Deserialize)]
struct CachedCatalog {
    etag: String,
    messages: HashMap<String, String>,
}

fn cache_key(code: &str) -> String {
    format!("i18n.{}", code)
}

/// Flatten nested message objects into dotted keys
pub fn flatten_messages(value: &Value) -> HashMap<String, String> {
    fn walk(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    walk(&path, child, out);
                }
            }
            Value::String(s) => {
                out.insert(prefix.to_string(), s.clone());
            }
            Value::Number(n) => {
                out.insert(prefix.to_string(), n.to_string());
            }
            Value::Bool(b) => {
                out.insert(prefix.to_string(), b.to_string());
            }
            Value::Null | Value::Array(_) => {}
        }
    }

    let mut out = HashMap::new();
    walk("", value, &mut out);
    out
}

/// Strategy for picking the first-run locale
pub trait LanguageNegotiator: Send + Sync {
    /// Two-letter language code the host prefers, if any
    fn preferred_language(&self) -> Option<String>;
}

/// Primary language subtag of a tag such as `de-AT` or `fr_FR.UTF-8`
pub fn primary_language(tag: &str) -> Option<String> {
    let primary = tag
        .split(['-', '_', '.', '@'])
        .next()?
        .trim()
        .to_ascii_lowercase();
    let valid =
        (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    valid.then_some(primary)
}

/// Reads the POSIX locale environment (`LC_ALL`, `LC_MESSAGES`, `LANG`)
#[derive(Debug, Default)]
pub struct EnvLanguageNegotiator;

impl LanguageNegotiator for EnvLanguageNegotiator {
    fn preferred_language(&self) -> Option<String> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .and_then(|value| primary_language(&value))
    }
}

/// Always prefers the same language
#[derive(Debug, Clone)]
pub struct FixedLanguage(pub String);

impl LanguageNegotiator for FixedLanguage {
    fn preferred_language(&self) -> Option<String> {
        primary_language(&self.0)
    }
}

/// Active locale and catalog registry
pub struct LocaleManager {
    base_url: String,
    http: Arc<dyn HttpClient>,
    store: CredentialStore,
    negotiator: Arc<dyn LanguageNegotiator>,
    bus: Option<EventBus>,
    formats: Arc<FormatTemplates>,
    active: String,
    known: Vec<LocaleDescriptor>,
    loaded: HashMap<String, LocaleCatalog>,
}

impl std::fmt::Debug for LocaleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleManager")
            .field("active", &self.active)
            .field("known", &self.known)
            .finish()
    }
}

impl LocaleManager {
    /// Manager seeded with the bundled catalogs, default locale active
    pub fn new(
        base_url: &str,
        http: Arc<dyn HttpClient>,
        store: CredentialStore,
        negotiator: Arc<dyn LanguageNegotiator>,
    ) -> Self {
        let formats = Arc::new(FormatTemplates::canonical());
        let mut known = Vec::new();
        let mut loaded = HashMap::new();

        for (code, name, source) in BUNDLED {
            let messages = match serde_json::from_str::<Value>(source) {
                Ok(value) => flatten_messages(&value),
                Err(e) => {
                    tracing::error!("Bundled catalog '{}' is invalid: {}", code, e);
                    HashMap::new()
                }
            };
            known.push(LocaleDescriptor {
                code: code.to_string(),
                name: name.to_string(),
            });
            loaded.insert(
                code.to_string(),
                LocaleCatalog {
                    code: code.to_string(),
                    display_name: name.to_string(),
                    messages,
                    formats: Arc::clone(&formats),
                },
            );
        }

        Self {
            base_url: base_url.to_string(),
            http,
            store,
            negotiator,
            bus: None,
            formats,
            active: DEFAULT_LOCALE.to_string(),
            known,
            loaded,
        }
    }

    /// Publish [`ConsoleEvent::LocaleChanged`] on `bus` when switching
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Discover device locales, then restore or pick the active locale
    pub async fn initialize(&mut self) -> String {
        match self.fetch_available().await {
            Ok(available) => self.merge_known(available),
            Err(e) => tracing::warn!("Using bundled locales only: {}", e),
        }

        let target = match self.store.locale_preference() {
            Some(code) => {
                tracing::debug!("Restoring persisted locale '{}'", code);
                code
            }
            None => {
                let negotiated = self.negotiator.preferred_language();
                tracing::debug!("No persisted locale, host prefers {:?}", negotiated);
                negotiated.unwrap_or_else(|| self.default_code().to_string())
            }
        };

        self.set_locale(&target).await
    }

    /// Switch to `code`, loading its catalog if needed; returns the locale
    /// that is actually active afterwards
    pub async fn set_locale(&mut self, code: &str) -> String {
        let code = code.trim().to_ascii_lowercase();

        if !self.loaded.contains_key(&code) {
            match self.load_catalog(&code).await {
                Ok(messages) => self.register(&code, messages),
                Err(e) => {
                    tracing::warn!("Locale '{}' unavailable, falling back: {}", code, e);
                    let fallback = self.default_code().to_string();
                    self.activate(&fallback);
                    return fallback;
                }
            }
        }

        self.activate(&code);
        code
    }

    pub fn active_locale(&self) -> &str {
        &self.active
    }

    pub fn known_locales(&self) -> &[LocaleDescriptor] {
        &self.known
    }

    pub fn is_loaded(&self, code: &str) -> bool {
        self.loaded.contains_key(code)
    }

    pub fn catalog(&self, code: &str) -> Option<&LocaleCatalog> {
        self.loaded.get(code)
    }

    /// First bundled entry
    pub fn default_code(&self) -> &str {
        self.known
            .first()
            .map(|l| l.code.as_str())
            .unwrap_or(DEFAULT_LOCALE)
    }

    /// Message for `key` in the active locale, then the default locale,
    /// then the key itself
    pub fn translate(&self, key: &str) -> String {
        [self.active.as_str(), self.default_code()]
            .iter()
            .filter_map(|code| self.loaded.get(*code))
            .find_map(|catalog| catalog.messages.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Formatting templates of the active locale
    pub fn formats(&self) -> Arc<FormatTemplates> {
        self.loaded
            .get(&self.active)
            .map(|c| Arc::clone(&c.formats))
            .unwrap_or_else(|| Arc::clone(&self.formats))
    }

    fn merge_known(&mut self, available: Vec<LocaleDescriptor>) {
        for descriptor in available {
            let code = descriptor.code.trim().to_ascii_lowercase();
            if code.is_empty() || self.known.iter().any(|l| l.code == code) {
                continue;
            }
            tracing::debug!("Discovered locale '{}' ({})", code, descriptor.name);
            self.known.push(LocaleDescriptor {
                code,
                name: descriptor.name,
            });
        }
    }

    fn register(&mut self, code: &str, messages: HashMap<String, String>) {
        let display_name = match self.known.iter().find(|l| l.code == code) {
            Some(descriptor) => descriptor.name.clone(),
            None => {
                self.known.push(LocaleDescriptor {
                    code: code.to_string(),
                    name: code.to_string(),
                });
                code.to_string()
            }
        };

        tracing::info!(
            "Registered locale '{}' with {} messages",
            code,
            messages.len()
        );
        self.loaded.insert(
            code.to_string(),
            LocaleCatalog {
                code: code.to_string(),
                display_name,
                messages,
                formats: Arc::clone(&self.formats),
            },
        );
    }

    fn activate(&mut self, code: &str) {
        let changed = self.active != code;
        self.active = code.to_string();
        self.store.set_locale_preference(code);

        if changed {
            tracing::debug!("Active locale is now '{}'", code);
            if let Some(bus) = &self.bus {
                bus.publish(ConsoleEvent::LocaleChanged(code.to_string()));
            }
        }
    }

    async fn fetch_available(&self) -> crate::Result<Vec<LocaleDescriptor>> {
        let url = join_url(&self.base_url, LANGUAGES_PATH);
        let response = self.http.get(&url, build_auth_headers(&self.store)).await?;
        if !response.is_success() {
            return Err(crate::ConsoleError::Locale(format!(
                "{} answered {}",
                LANGUAGES_PATH, response.status
            )));
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn load_catalog(&self, code: &str) -> crate::Result<HashMap<String, String>> {
        let url =
            Url::parse_with_params(&join_url(&self.base_url, LANGUAGE_PATH), &[("code", code)])
                .map_err(|e| crate::ConsoleError::Config(format!("Invalid device URL: {}", e)))?;

        let cached: Option<CachedCatalog> = self.store.load_json(&cache_key(code));
        let mut headers = build_auth_headers(&self.store);
        if let Some(cached) = &cached {
            if let Ok(etag) = HeaderValue::from_str(&cached.etag) {
                headers.insert(IF_NONE_MATCH, etag);
            }
        }

        let response = self.http.get(url.as_str(), headers).await?;

        if response.status == 304 {
            return match cached {
                Some(cached) => {
                    tracing::debug!("Catalog '{}' unchanged, using cache", code);
                    Ok(cached.messages)
                }
                None => Err(crate::ConsoleError::Locale(format!(
                    "Unexpected 304 for uncached locale '{}'",
                    code
                ))),
            };
        }

        if !response.is_success() {
            return Err(crate::ConsoleError::Locale(format!(
                "{} answered {} for '{}'",
                LANGUAGE_PATH, response.status, code
            )));
        }

        let payload: LanguagePayload = serde_json::from_str(&response.body)?;
        let messages = flatten_messages(&payload.webapp);

        if let Some(etag) = response.header(ETAG.as_str()) {
            self.store.save_json(
                &cache_key(code),
                &CachedCatalog {
                    etag: etag.to_string(),
                    messages: messages.clone(),
                },
            );
        }

        Ok(messages)
    }
}
