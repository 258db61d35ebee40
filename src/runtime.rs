//! Composition root: builds the interaction services once and runs the per-frame tick.

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::services::config::RuntimeConfig;
use crate::services::interaction_sync::{InteractionSync, SceneHitTester};
use crate::services::pointer_queue::PointerEventQueue;
use crate::services::stage::{AvatarStageController, StageMounter};
use crate::services::tool_mode::ToolModeStore;
use crate::windows::bridge::WindowInteractionBridge;
use crate::windows::dispatch::{DispatchStats, HostDispatcher, HostTransport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub drained: usize,
    pub commands_sent: usize,
}

pub struct AvatarRuntime {
    config: RuntimeConfig,
    pointer_queue: PointerEventQueue,
    tool_mode: ToolModeStore,
    bridge: WindowInteractionBridge,
    sync: InteractionSync,
}

impl AvatarRuntime {
    pub fn new(config: RuntimeConfig, bridge: WindowInteractionBridge) -> Self {
        log::info!(
            "Avatar runtime init (tool_mode={}, pointer_queue_capacity={}, default_model={})",
            config.default_tool_mode,
            config.pointer_queue_capacity,
            config.default_model_url
        );
        Self {
            pointer_queue: PointerEventQueue::with_capacity(config.pointer_queue_capacity),
            tool_mode: ToolModeStore::new(config.default_tool_mode),
            sync: InteractionSync::new(bridge.clone()),
            bridge,
            config,
        }
    }

    /// Build the runtime and spawn a dispatcher that feeds `transport`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_transport<T: HostTransport>(
        config: RuntimeConfig,
        transport: T,
    ) -> (Self, JoinHandle<DispatchStats>) {
        let (bridge, rx) = WindowInteractionBridge::channel();
        let dispatcher = HostDispatcher::new(rx, transport).spawn();
        (Self::new(config, bridge), dispatcher)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn pointer_queue(&self) -> &PointerEventQueue {
        &self.pointer_queue
    }

    pub fn tool_mode(&self) -> &ToolModeStore {
        &self.tool_mode
    }

    pub fn bridge(&self) -> &WindowInteractionBridge {
        &self.bridge
    }

    pub fn stage<M: StageMounter>(&self, mounter: M) -> AvatarStageController<M> {
        AvatarStageController::new(mounter, self.pointer_queue.clone(), &self.config)
    }

    /// One render-loop step: drain input, let the scene hit-test it, push the outcome to
    /// the host.
    pub fn tick<S: SceneHitTester + ?Sized>(&mut self, scene: &mut S) -> TickReport {
        let batch = self.pointer_queue.drain();
        let intent = scene.hit_test(&batch, self.tool_mode.get());
        let commands_sent = self.sync.apply(intent);
        if commands_sent > 0 {
            log::trace!(
                "Tick: drained={} intent={:?} commands_sent={}",
                batch.len(),
                intent,
                commands_sent
            );
        }
        TickReport {
            drained: batch.len(),
            commands_sent,
        }
    }

    /// Resend the full interaction state on the next tick.
    pub fn resync(&mut self) {
        self.sync.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::interaction_sync::InteractionIntent;
    use crate::services::pointer_queue::{PointerEventKind, PointerInputEvent, test_event};
    use crate::services::tool_mode::ToolMode;
    use crate::windows::anchor_layout::{Rect, WorkArea};
    use crate::windows::bridge::HostCommandReceiver;
    use crate::windows::bridge_types::{AvatarInteractionBounds, HostCommand, InteractionMode};
    use crate::windows::host_state::{HostWindowState, PointerProbe};
    use crate::windows::loopback::{HostEvent, LoopbackHost};

    const AVATAR_BOUNDS: AvatarInteractionBounds = AvatarInteractionBounds {
        left: 10.0,
        top: 10.0,
        right: 100.0,
        bottom: 50.0,
    };

    /// Hovering is active in avatar mode once the pointer has been seen; other tools
    /// leave the window passive.
    #[derive(Default)]
    struct FakeScene {
        batches: Vec<usize>,
        seen_pointer: bool,
    }

    impl SceneHitTester for FakeScene {
        fn hit_test(
            &mut self,
            events: &[PointerInputEvent],
            tool_mode: ToolMode,
        ) -> InteractionIntent {
            self.batches.push(events.len());
            self.seen_pointer |= !events.is_empty();
            if tool_mode == ToolMode::Avatar && self.seen_pointer {
                InteractionIntent {
                    interaction_mode: InteractionMode::HoverActivate,
                    bounds: Some(AVATAR_BOUNDS),
                }
            } else {
                InteractionIntent::passive()
            }
        }
    }

    fn drain(rx: &mut HostCommandReceiver) -> Vec<HostCommand> {
        let mut out = Vec::new();
        while let Ok(c) = rx.try_recv() {
            out.push(c);
        }
        out
    }

    #[test]
    fn tick_drains_once_and_syncs_host() {
        let (bridge, mut rx) = WindowInteractionBridge::channel();
        let mut runtime = AvatarRuntime::new(RuntimeConfig::default(), bridge);
        let mut scene = FakeScene::default();

        let first = runtime.tick(&mut scene);
        assert_eq!(first.drained, 0);
        assert_eq!(first.commands_sent, 2);

        runtime
            .pointer_queue()
            .push(test_event(PointerEventKind::PointerMove, 1.0));
        runtime
            .pointer_queue()
            .push(test_event(PointerEventKind::PointerMove, 2.0));
        let second = runtime.tick(&mut scene);
        assert_eq!(second.drained, 2);
        assert_eq!(second.commands_sent, 2);

        let third = runtime.tick(&mut scene);
        assert_eq!(third, TickReport::default());
        assert_eq!(scene.batches, vec![0, 2, 0]);

        assert_eq!(
            drain(&mut rx),
            vec![
                HostCommand::SetInteractionMode {
                    mode: InteractionMode::Passive
                },
                HostCommand::SetAvatarInteractionBounds { bounds: None },
                HostCommand::SetInteractionMode {
                    mode: InteractionMode::HoverActivate
                },
                HostCommand::SetAvatarInteractionBounds {
                    bounds: Some(AVATAR_BOUNDS)
                },
            ]
        );
    }

    #[test]
    fn tool_mode_switch_changes_intent() {
        let (bridge, mut rx) = WindowInteractionBridge::channel();
        let mut runtime = AvatarRuntime::new(RuntimeConfig::default(), bridge);
        let mut scene = FakeScene::default();

        runtime
            .pointer_queue()
            .push(test_event(PointerEventKind::PointerDown, 1.0));
        runtime.tick(&mut scene);
        drain(&mut rx);

        runtime.tool_mode().set(ToolMode::Camera);
        let report = runtime.tick(&mut scene);
        assert_eq!(report.commands_sent, 2);
        assert_eq!(
            drain(&mut rx)[0],
            HostCommand::SetInteractionMode {
                mode: InteractionMode::Passive
            }
        );
    }

    #[test]
    fn closures_work_as_scenes() {
        let (bridge, _rx) = WindowInteractionBridge::channel();
        let mut runtime = AvatarRuntime::new(RuntimeConfig::default(), bridge);
        let mut scene = |_: &[PointerInputEvent], _: ToolMode| -> InteractionIntent {
            InteractionIntent::passive()
        };
        assert_eq!(runtime.tick(&mut scene).commands_sent, 2);
        assert_eq!(runtime.tick(&mut scene).commands_sent, 0);
        runtime.resync();
        assert_eq!(runtime.tick(&mut scene).commands_sent, 2);
    }

    #[test]
    fn default_tool_mode_comes_from_config() {
        let (bridge, _rx) = WindowInteractionBridge::channel();
        let config = RuntimeConfig {
            default_tool_mode: ToolMode::Camera,
            pointer_queue_capacity: 4,
            ..Default::default()
        };
        let runtime = AvatarRuntime::new(config, bridge);
        assert_eq!(runtime.tool_mode().get(), ToolMode::Camera);
        assert_eq!(runtime.pointer_queue().capacity(), 4);
    }

    #[tokio::test]
    async fn end_to_end_with_loopback_host() {
        let host = LoopbackHost::new(HostWindowState::new(
            Rect {
                left: 0.0,
                top: 0.0,
                width: 400.0,
                height: 600.0,
            },
            WorkArea {
                left: 0.0,
                top: 0.0,
                right: 1920.0,
                bottom: 1080.0,
                scale_factor: 1.0,
            },
        ));
        let mut events = host.subscribe();
        let (mut runtime, dispatcher) =
            AvatarRuntime::with_transport(RuntimeConfig::default(), host.clone());
        let mut scene = FakeScene::default();

        runtime
            .bridge()
            .set_skin_mode(crate::windows::bridge_types::SkinMode::Vrm);
        runtime
            .pointer_queue()
            .push(test_event(PointerEventKind::PointerMove, 1.0));
        runtime.tick(&mut scene);
        drop(runtime);

        let stats = dispatcher.await.unwrap();
        assert_eq!(stats.delivered, 3);
        assert_eq!(events.recv().await.unwrap(), HostEvent::ClickThroughState(true));

        host.pointer_moved(PointerProbe {
            x: 50.0,
            y: 20.0,
            pressed: false,
        });
        assert_eq!(events.recv().await.unwrap(), HostEvent::ClickThroughState(false));
        assert_eq!(host.snapshot().bounds(), Some(AVATAR_BOUNDS));
    }
}
