//! DTU Console - client runtime for the DTU administration console
//!
//! Owns the session lifecycle, classifies every API response in one place
//! and manages locale catalogs with graceful fallback.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod interceptor;
pub mod io;
pub mod locale;
pub mod login;
pub mod navigation;
pub mod store;

pub use config::{load_config, Config};
pub use error::{ApiError, ConsoleError, NormalizedError, Result};

use std::sync::Arc;

use crate::api::ApiClient;
use crate::events::EventBus;
use crate::interceptor::ResponseInterceptor;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::locale::{EnvLanguageNegotiator, FixedLanguage, LanguageNegotiator, LocaleManager};
use crate::login::LoginFlow;
use crate::navigation::{LogNavigator, Navigator};
use crate::store::{CredentialStore, FileStore, KeyValueStore};

/// Wires the runtime components together
pub struct ConsoleBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    backend: Option<Arc<dyn KeyValueStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    negotiator: Option<Arc<dyn LanguageNegotiator>>,
    bus: Option<EventBus>,
}

impl ConsoleBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            backend: None,
            navigator: None,
            negotiator: None,
            bus: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_storage(mut self, backend: Arc<dyn KeyValueStore>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn with_language_negotiator(mut self, negotiator: Arc<dyn LanguageNegotiator>) -> Self {
        self.negotiator = Some(negotiator);
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> Result<Console> {
        self.config.validate()?;
        let base_url = self.config.device.base_url.clone();

        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(FileStore::open(&self.config.storage.path)),
        };
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LogNavigator));
        let preferred = &self.config.locale.preferred;
        let negotiator: Arc<dyn LanguageNegotiator> = match (self.negotiator, preferred) {
            (Some(negotiator), _) => negotiator,
            (None, Some(preferred)) => Arc::new(FixedLanguage(preferred.clone())),
            (None, None) => Arc::new(EnvLanguageNegotiator),
        };
        let bus = self.bus.unwrap_or_default();

        let store = CredentialStore::new(backend);
        let login = Arc::new(LoginFlow::new(&base_url, Arc::clone(&http), store.clone()));
        let interceptor = Arc::new(ResponseInterceptor::new(
            Arc::clone(&login),
            bus.clone(),
            navigator,
        ));
        let api = ApiClient::new(&base_url, Arc::clone(&http), store.clone(), interceptor);
        let locale = LocaleManager::new(&base_url, http, store.clone(), negotiator)
            .with_event_bus(bus.clone());

        tracing::debug!("Console wired for {}", base_url);
        Ok(Console {
            config: self.config,
            store,
            bus,
            login,
            api,
            locale,
        })
    }
}

/// The assembled runtime shared by every view
#[derive(Debug)]
pub struct Console {
    config: Config,
    store: CredentialStore,
    bus: EventBus,
    login: Arc<LoginFlow>,
    api: ApiClient,
    locale: LocaleManager,
}

impl Console {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn login(&self) -> &LoginFlow {
        &self.login
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn locale(&self) -> &LocaleManager {
        &self.locale
    }

    pub fn locale_mut(&mut self) -> &mut LocaleManager {
        &mut self.locale
    }

    /// WebSocket URL of the live-data endpoint for the current session
    pub fn live_data_url(&self) -> Result<String> {
        auth::live_data_url(&self.config.device.base_url, &self.store)
    }
}
