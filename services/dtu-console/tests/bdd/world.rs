//! BDD test world for the DTU console

use std::sync::{Arc, Mutex};

use cucumber::World;
use dtu_console::events::ConsoleEvent;
use dtu_console::locale::{FixedLanguage, LocaleDescriptor};
use dtu_console::navigation::{Navigator, Route};
use dtu_console::store::{MemoryStore, Session};
use dtu_console::{ApiError, Config, Console, ConsoleBuilder};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::fake_device::{FakeDevice, BASE_URL};

/// Navigator that remembers every route it was asked to show
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

#[derive(Debug, Default, World)]
pub struct ConsoleWorld {
    pub device: Arc<FakeDevice>,
    pub storage: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub console: Option<Console>,
    pub events: Option<broadcast::Receiver<ConsoleEvent>>,
    pub languages: Vec<LocaleDescriptor>,

    pub login_result: Option<dtu_console::Result<Session>>,
    pub api_result: Option<Result<Option<Value>, ApiError>>,
    pub locale_result: Option<String>,
}

impl ConsoleWorld {
    /// The console, built on first use against the fake device
    pub fn console(&mut self) -> &mut Console {
        if self.console.is_none() {
            let mut config = Config::default();
            config.device.base_url = BASE_URL.to_string();
            let console = ConsoleBuilder::new(config)
                .with_http_client(self.device.clone())
                .with_storage(self.storage.clone())
                .with_navigator(self.navigator.clone())
                .with_language_negotiator(Arc::new(FixedLanguage("en-US".to_string())))
                .build()
                .expect("console should build");
            self.console = Some(console);
        }
        self.console.as_mut().expect("console just built")
    }

    /// Drop the in-memory runtime, keeping persisted storage
    pub fn reload(&mut self) {
        self.console = None;
        self.events = None;
    }
}
