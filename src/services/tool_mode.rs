use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use super::pubsub::{ListenerSet, Subscription};

/// Change notification; listeners read the new value with [`ToolModeStore::get`].
pub type ToolModeListener = Arc<dyn Fn() + Send + Sync>;

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    Avatar,
    Model,
    Camera,
}

impl ToolMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolMode::Avatar => "avatar",
            ToolMode::Model => "model",
            ToolMode::Camera => "camera",
        }
    }

    /// Lenient parse used for config values and untyped payloads.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "avatar" => Some(ToolMode::Avatar),
            "model" => Some(ToolMode::Model),
            "camera" => Some(ToolMode::Camera),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active interaction tool, observable by the scene and the UI.
///
/// The watch channel holds the only copy of the value, so `get()` and `watch()` never
/// disagree. Listeners take no arguments: after a re-entrant `set`, `get()` already
/// reflects the latest value for every listener still to run.
#[derive(Clone)]
pub struct ToolModeStore {
    inner: Arc<Inner>,
}

struct Inner {
    current: watch::Sender<ToolMode>,
    listeners: ListenerSet<dyn Fn() + Send + Sync>,
}

impl ToolModeStore {
    pub fn new(initial: ToolMode) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: watch::Sender::new(initial),
                listeners: ListenerSet::new("tool-mode"),
            }),
        }
    }

    pub fn get(&self) -> ToolMode {
        *self.inner.current.borrow()
    }

    /// Store `mode`, then notify every listener before returning.
    pub fn set(&self, mode: ToolMode) {
        let prev = self.inner.current.send_replace(mode);
        if prev != mode {
            log::debug!("Tool mode changed: {} -> {}", prev, mode);
        }
        self.inner.listeners.notify();
    }

    pub fn subscribe(&self, listener: ToolModeListener) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Reactive accessor for async consumers; already holds the current mode.
    pub fn watch(&self) -> watch::Receiver<ToolMode> {
        self.inner.current.subscribe()
    }
}
