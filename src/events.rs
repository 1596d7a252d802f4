//! Backup lifecycle events
//!
//! A small typed hook registry published around backup and restore steps.
//! Subscribers are registered explicitly at startup; the core never depends
//! on any subscriber being present.

use tracing::debug;

/// Lifecycle events published by backup/restore operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DbBackupStarted { database: String },
    DbBackupCompleted { database: String, path: String },
    DbRestoreStarted { database: String, path: String },
    DbRestoreCompleted { database: String },
    MediaBackupStarted,
    MediaBackupCompleted,
    MediaRestoreStarted,
    MediaRestoreCompleted,
}

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

/// Registry of event subscribers
#[derive(Default)]
pub struct Hooks {
    subscribers: Vec<Subscriber>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber called for every published event
    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Publish an event to all subscribers, in registration order
    pub fn publish(&self, event: &Event) {
        debug!(?event, "publishing event");
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }
}
