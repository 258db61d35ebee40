//! Avatar interaction runtime.
//!
//! The UI side of a desktop avatar: pointer input is buffered in a bounded queue and drained
//! once per rendered frame, the active tool is held in a small observable store, and every
//! window-level effect (click-through, panel visibility, window geometry) is requested from
//! the window host through a fire-and-forget command bridge.

pub mod runtime;
pub mod services;
pub mod windows;

pub use runtime::{AvatarRuntime, TickReport};
pub use services::config::RuntimeConfig;
pub use services::interaction_sync::{InteractionIntent, SceneHitTester};
pub use services::pointer_queue::{PointerEventKind, PointerEventQueue, PointerInputEvent};
pub use services::stage::{AvatarStageController, StageMounter, StageProps};
pub use services::tool_mode::{ToolMode, ToolModeListener, ToolModeStore};
pub use windows::bridge::WindowInteractionBridge;
pub use windows::bridge_types::{AvatarInteractionBounds, HostCommand, InteractionMode, SkinMode};
pub use windows::dispatch::{HostDispatcher, HostTransport, JsonLinesTransport};
pub use windows::error::TransportError;

/// Host → UI: avatar window click-through changed (payload: `bool`).
pub const EVT_CLICK_THROUGH_STATE: &str = "click-through-state";
/// Host → context panel: panel was shown and should focus its input.
pub const EVT_CONTEXT_PANEL_OPENED: &str = "context-panel-opened";
/// Host → UI: global cursor position sample for head/eye tracking.
pub const EVT_GLOBAL_CURSOR_GAZE: &str = "global-cursor-gaze";
