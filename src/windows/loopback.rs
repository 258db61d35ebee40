//! In-process window host: applies bridge commands to a [`HostWindowState`] and publishes
//! the resulting host events. Used for headless runs and for exercising the full
//! bridge → dispatcher → host path in tests.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use super::bridge_types::HostCommand;
use super::dispatch::HostTransport;
use super::error::TransportError;
use super::host_state::{ContextPanelEffect, HostEffects, HostWindowState, PointerProbe};

const EVENT_CAPACITY: usize = 64;

/// Notifications the host pushes back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum HostEvent {
    ClickThroughState(bool),
    ContextPanelOpened,
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::ClickThroughState(_) => crate::EVT_CLICK_THROUGH_STATE,
            HostEvent::ContextPanelOpened => crate::EVT_CONTEXT_PANEL_OPENED,
        }
    }
}

#[derive(Clone)]
pub struct LoopbackHost {
    state: Arc<Mutex<HostWindowState>>,
    events: broadcast::Sender<HostEvent>,
}

impl LoopbackHost {
    pub fn new(state: HostWindowState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> HostWindowState {
        self.lock().clone()
    }

    /// Cursor moved over (or near) the avatar window; the host's click-through gate.
    pub fn pointer_moved(&self, pointer: PointerProbe) {
        let changed = self.lock().update_pointer(pointer);
        if let Some(value) = changed {
            self.publish(HostEvent::ClickThroughState(value));
        }
    }

    pub fn pointer_left(&self) {
        let changed = self.lock().clear_pointer();
        if let Some(value) = changed {
            self.publish(HostEvent::ClickThroughState(value));
        }
    }

    fn publish_effects(&self, effects: HostEffects) {
        if let Some(value) = effects.click_through {
            self.publish(HostEvent::ClickThroughState(value));
        }
        if let Some(ContextPanelEffect::Shown { .. }) = effects.context_panel {
            self.publish(HostEvent::ContextPanelOpened);
        }
    }

    fn publish(&self, event: HostEvent) {
        log::trace!("Loopback host event: {}", event.name());
        // No receivers is fine: events are informational.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, HostWindowState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HostTransport for LoopbackHost {
    async fn send(&mut self, command: HostCommand) -> Result<(), TransportError> {
        let effects = self.lock().apply(&command)?;
        self.publish_effects(effects);
        Ok(())
    }
}
