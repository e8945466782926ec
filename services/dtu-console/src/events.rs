//! Process-wide publish/subscribe for console events

use tokio::sync::broadcast;

/// Events published to interested UI subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// The device rejected the session and it has been cleared
    LoggedOut,
    /// The active locale switched to the given code
    LocaleChanged(String),
}

impl std::fmt::Display for ConsoleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleEvent::LoggedOut => write!(f, "logged-out"),
            ConsoleEvent::LocaleChanged(code) => write!(f, "locale-changed({})", code),
        }
    }
}

/// Broadcast bus; clones publish to the same subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConsoleEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: ConsoleEvent) -> usize {
        tracing::debug!("Publishing {}", event);
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.sender.subscribe()
    }
}
