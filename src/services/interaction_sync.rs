use smallvec::SmallVec;

use super::pointer_queue::PointerInputEvent;
use super::tool_mode::ToolMode;
use crate::windows::bridge::WindowInteractionBridge;
use crate::windows::bridge_types::{AvatarInteractionBounds, HostCommand, InteractionMode};

/// What the scene wants the window host to do after looking at a frame's input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionIntent {
    pub interaction_mode: InteractionMode,
    pub bounds: Option<AvatarInteractionBounds>,
}

impl InteractionIntent {
    pub fn passive() -> Self {
        Self {
            interaction_mode: InteractionMode::Passive,
            bounds: None,
        }
    }
}

/// The 3D scene side of the frame loop (picking, gizmos, camera controls).
pub trait SceneHitTester {
    fn hit_test(&mut self, events: &[PointerInputEvent], tool_mode: ToolMode)
    -> InteractionIntent;
}

impl<F> SceneHitTester for F
where
    F: FnMut(&[PointerInputEvent], ToolMode) -> InteractionIntent,
{
    fn hit_test(
        &mut self,
        events: &[PointerInputEvent],
        tool_mode: ToolMode,
    ) -> InteractionIntent {
        self(events, tool_mode)
    }
}

/// Forwards interaction intents to the host, skipping values the host already has.
pub struct InteractionSync {
    bridge: WindowInteractionBridge,
    sent_mode: Option<InteractionMode>,
    sent_bounds: Option<Option<AvatarInteractionBounds>>,
}

impl InteractionSync {
    pub fn new(bridge: WindowInteractionBridge) -> Self {
        Self {
            bridge,
            sent_mode: None,
            sent_bounds: None,
        }
    }

    /// Commands needed to move the host to `intent`: mode first, then bounds.
    pub fn plan(&mut self, intent: InteractionIntent) -> SmallVec<[HostCommand; 2]> {
        let mut commands = SmallVec::new();
        if self.sent_mode != Some(intent.interaction_mode) {
            self.sent_mode = Some(intent.interaction_mode);
            commands.push(HostCommand::SetInteractionMode {
                mode: intent.interaction_mode,
            });
        }
        if self.sent_bounds != Some(intent.bounds) {
            self.sent_bounds = Some(intent.bounds);
            commands.push(HostCommand::SetAvatarInteractionBounds {
                bounds: intent.bounds,
            });
        }
        commands
    }

    pub fn apply(&mut self, intent: InteractionIntent) -> usize {
        let commands = self.plan(intent);
        let sent = commands.len();
        for command in commands {
            self.bridge.send(command);
        }
        sent
    }

    /// Forget what was sent; the next intent goes out in full (host restarted, window
    /// recreated).
    pub fn reset(&mut self) {
        self.sent_mode = None;
        self.sent_bounds = None;
    }
}
