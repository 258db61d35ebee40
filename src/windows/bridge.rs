//! One-way command surface towards the native window host.
//!
//! Every method enqueues a [`HostCommand`] on an ordered channel and returns immediately.
//! Nothing is awaited and no result is reported back: delivery failures are the
//! dispatcher's concern (see `dispatch.rs`), and the host is the authority on rejecting
//! bad values. Commands are never validated or reordered here.

use tokio::sync::mpsc;

use super::bridge_types::{AvatarInteractionBounds, HostCommand, InteractionMode, SkinMode};

pub type HostCommandReceiver = mpsc::UnboundedReceiver<HostCommand>;

#[derive(Clone)]
pub struct WindowInteractionBridge {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl WindowInteractionBridge {
    /// Create a bridge together with the receiving end for a dispatcher.
    pub fn channel() -> (Self, HostCommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// `false` once the receiving side is gone; commands sent after that are dropped.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn set_skin_mode(&self, skin: SkinMode) {
        self.send(HostCommand::SetSkinMode { skin });
    }

    pub fn open_context_panel(&self) {
        self.send(HostCommand::OpenContextPanel);
    }

    pub fn hide_context_panel(&self) {
        self.send(HostCommand::HideContextPanel);
    }

    pub fn scale_avatar_window(&self, factor: f64) {
        self.send(HostCommand::ScaleAvatarWindow { factor });
    }

    pub fn fit_avatar_window_to_aspect(&self, aspect: f64) {
        self.send(HostCommand::FitAvatarWindowToAspect { aspect });
    }

    pub fn set_interaction_mode(&self, mode: InteractionMode) {
        self.send(HostCommand::SetInteractionMode { mode });
    }

    /// `None` clears the hit-test region: full click-through regardless of interaction mode.
    pub fn set_avatar_interaction_bounds(&self, bounds: Option<AvatarInteractionBounds>) {
        if let Some(b) = bounds.as_ref().filter(|b| !b.is_well_formed()) {
            log::debug!("Forwarding malformed interaction bounds to host: {:?}", b);
        }
        self.send(HostCommand::SetAvatarInteractionBounds { bounds });
    }

    pub fn send(&self, command: HostCommand) {
        log::trace!("Host command queued: {}", command.name());
        if let Err(err) = self.tx.send(command) {
            log::debug!(
                "Host command dropped (dispatcher gone): {}",
                err.0.name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(rx: &mut HostCommandReceiver) -> Vec<HostCommand> {
        let mut out = Vec::new();
        while let Ok(command) = rx.try_recv() {
            out.push(command);
        }
        out
    }

    #[test]
    fn bounds_commands_keep_call_order_and_payload() {
        let (bridge, mut rx) = WindowInteractionBridge::channel();
        bridge.set_avatar_interaction_bounds(None);
        bridge.set_avatar_interaction_bounds(Some(AvatarInteractionBounds::new(
            10.0, 10.0, 100.0, 50.0,
        )));

        assert_eq!(
            collect(&mut rx),
            vec![
                HostCommand::SetAvatarInteractionBounds { bounds: None },
                HostCommand::SetAvatarInteractionBounds {
                    bounds: Some(AvatarInteractionBounds {
                        left: 10.0,
                        top: 10.0,
                        right: 100.0,
                        bottom: 50.0,
                    }),
                },
            ]
        );
    }

    #[test]
    fn every_command_is_forwarded_unvalidated() {
        let (bridge, mut rx) = WindowInteractionBridge::channel();
        let clone = bridge.clone();

        bridge.set_skin_mode(SkinMode::Vrm);
        clone.open_context_panel();
        bridge.scale_avatar_window(-2.0);
        clone.fit_avatar_window_to_aspect(0.0);
        bridge.set_interaction_mode(InteractionMode::Passive);
        clone.set_avatar_interaction_bounds(Some(AvatarInteractionBounds::new(
            50.0, 50.0, 10.0, 10.0,
        )));
        bridge.hide_context_panel();

        let names: Vec<_> = collect(&mut rx).iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "set_skin_mode",
                "open_context_panel",
                "scale_avatar_window",
                "fit_avatar_window_to_aspect",
                "set_interaction_mode",
                "set_avatar_interaction_bounds",
                "hide_context_panel",
            ]
        );
    }

    #[test]
    fn send_after_receiver_dropped_is_silent() {
        let (bridge, rx) = WindowInteractionBridge::channel();
        assert!(bridge.is_connected());
        drop(rx);
        assert!(!bridge.is_connected());
        bridge.set_interaction_mode(InteractionMode::HoverActivate);
    }
}
