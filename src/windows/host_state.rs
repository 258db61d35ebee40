//! Host-side model of the avatar window: what the bridge commands mean once they arrive.
//!
//! This is the state a window host keeps to decide, for every cursor position, whether the
//! avatar window should swallow pointer input or let it pass through to the desktop.

use serde::Serialize;

use super::anchor_layout::{
    ResizeLimits, Rect, Size, WorkArea, fit_aspect_target, place_context_panel,
    resize_rect_bottom_center, scale_rect_bottom_center,
};
use super::bridge_types::{AvatarInteractionBounds, HostCommand, InteractionMode, SkinMode};
use super::error::TransportError;

pub const EDGE_MARGIN: f64 = 12.0;
pub const CONTEXT_PANEL_SIZE: Size = Size {
    width: 380.0,
    height: 520.0,
};
const AVATAR_LIMITS: ResizeLimits = ResizeLimits {
    min_size: Size {
        width: 180.0,
        height: 240.0,
    },
    edge_margin: EDGE_MARGIN,
};
const FIT_ASPECT_MIN: f64 = 0.05;
const FIT_ASPECT_MAX: f64 = 20.0;
const FIT_ASPECT_TOLERANCE: f64 = 0.04;

/// Cursor position relative to the avatar window (window-local pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerProbe {
    pub x: f64,
    pub y: f64,
    /// Primary button (or the host's interact modifier) held.
    pub pressed: bool,
}

/// Observable consequences of applying a command, for the host to act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEffects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_through: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_rect: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_panel: Option<ContextPanelEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ContextPanelEffect {
    Shown { x: i32, y: i32 },
    Moved { x: i32, y: i32 },
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostWindowState {
    skin: SkinMode,
    context_open: bool,
    interaction_mode: InteractionMode,
    bounds: Option<AvatarInteractionBounds>,
    click_through: bool,
    avatar_rect: Rect,
    work_area: WorkArea,
    last_pointer: Option<PointerProbe>,
}

impl HostWindowState {
    pub fn new(avatar_rect: Rect, work_area: WorkArea) -> Self {
        Self {
            skin: SkinMode::Off,
            context_open: false,
            interaction_mode: InteractionMode::HoldToInteract,
            bounds: None,
            click_through: false,
            avatar_rect,
            work_area,
            last_pointer: None,
        }
    }

    pub fn skin(&self) -> SkinMode {
        self.skin
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction_mode
    }

    pub fn bounds(&self) -> Option<AvatarInteractionBounds> {
        self.bounds
    }

    pub fn is_context_open(&self) -> bool {
        self.context_open
    }

    pub fn is_click_through(&self) -> bool {
        self.click_through
    }

    pub fn avatar_rect(&self) -> Rect {
        self.avatar_rect
    }

    /// Keep the model in sync with a window the user moved or resized directly.
    pub fn set_window_geometry(&mut self, avatar_rect: Rect, work_area: WorkArea) -> HostEffects {
        self.avatar_rect = avatar_rect;
        self.work_area = work_area;
        HostEffects {
            context_panel: self.reposition_context_panel(),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, command: &HostCommand) -> Result<HostEffects, TransportError> {
        let mut effects = HostEffects::default();
        match *command {
            HostCommand::SetSkinMode { skin } => {
                if skin == self.skin {
                    return Ok(effects);
                }
                self.skin = skin;
                if self.context_open {
                    self.context_open = false;
                    effects.context_panel = Some(ContextPanelEffect::Hidden);
                }
                // The VRM avatar must not block the desktop until the gate says otherwise.
                effects.click_through = self.set_click_through(skin == SkinMode::Vrm);
            }
            HostCommand::OpenContextPanel => {
                let (x, y) = self.context_panel_origin();
                self.context_open = true;
                effects.context_panel = Some(ContextPanelEffect::Shown { x, y });
            }
            HostCommand::HideContextPanel => {
                if self.context_open {
                    self.context_open = false;
                    effects.context_panel = Some(ContextPanelEffect::Hidden);
                }
            }
            HostCommand::ScaleAvatarWindow { factor } => {
                if self.skin != SkinMode::Vrm {
                    return Ok(effects);
                }
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(TransportError::rejected(
                        command.name(),
                        "Invalid scale factor",
                    ));
                }
                let next = scale_rect_bottom_center(
                    self.avatar_rect,
                    factor,
                    self.work_area,
                    AVATAR_LIMITS,
                );
                self.resize_avatar(next, &mut effects);
            }
            HostCommand::FitAvatarWindowToAspect { aspect } => {
                if self.skin != SkinMode::Vrm {
                    return Ok(effects);
                }
                if !aspect.is_finite() || aspect <= 0.0 {
                    return Err(TransportError::rejected(
                        command.name(),
                        "Invalid aspect ratio",
                    ));
                }
                let scale = self.work_area.scale_factor;
                if scale <= 0.0 {
                    return Ok(effects);
                }
                let current_logical = Size {
                    width: self.avatar_rect.width / scale,
                    height: self.avatar_rect.height / scale,
                };
                let target = fit_aspect_target(
                    current_logical,
                    aspect.clamp(FIT_ASPECT_MIN, FIT_ASPECT_MAX),
                    FIT_ASPECT_TOLERANCE,
                    AVATAR_LIMITS.min_size,
                );
                if let Some(target) = target {
                    let next = resize_rect_bottom_center(
                        self.avatar_rect,
                        target,
                        self.work_area,
                        AVATAR_LIMITS,
                    );
                    self.resize_avatar(next, &mut effects);
                }
            }
            HostCommand::SetInteractionMode { mode } => {
                self.interaction_mode = mode;
                effects.click_through = self.reevaluate();
            }
            HostCommand::SetAvatarInteractionBounds { bounds } => {
                self.bounds = match bounds {
                    Some(b) if !b.is_well_formed() => {
                        log::warn!("Rejecting malformed interaction bounds {:?}; clearing", b);
                        None
                    }
                    other => other,
                };
                effects.click_through = self.reevaluate();
            }
        }
        Ok(effects)
    }

    /// Feed the latest cursor position. Returns the new click-through state on change.
    pub fn update_pointer(&mut self, pointer: PointerProbe) -> Option<bool> {
        self.last_pointer = Some(pointer);
        self.reevaluate()
    }

    pub fn clear_pointer(&mut self) -> Option<bool> {
        self.last_pointer = None;
        self.reevaluate()
    }

    /// Whether input should pass through the window for the given cursor state.
    pub fn desired_click_through(&self, pointer: Option<PointerProbe>) -> bool {
        if self.skin != SkinMode::Vrm {
            return false;
        }
        let over_avatar = match (self.bounds, pointer) {
            (Some(bounds), Some(p)) => bounds.contains(p.x, p.y),
            _ => false,
        };
        let pressed = pointer.is_some_and(|p| p.pressed);
        match self.interaction_mode {
            InteractionMode::Passive => true,
            InteractionMode::HoverActivate => !over_avatar,
            InteractionMode::HoldToInteract => !(over_avatar && pressed),
        }
    }

    fn reevaluate(&mut self) -> Option<bool> {
        let desired = self.desired_click_through(self.last_pointer);
        self.set_click_through(desired)
    }

    fn set_click_through(&mut self, value: bool) -> Option<bool> {
        if self.click_through == value {
            return None;
        }
        self.click_through = value;
        log::debug!("Avatar click-through updated (ignore_cursor_events={})", value);
        Some(value)
    }

    fn resize_avatar(&mut self, next: Rect, effects: &mut HostEffects) {
        if next == self.avatar_rect {
            return;
        }
        self.avatar_rect = next;
        effects.avatar_rect = Some(next);
        effects.context_panel = self.reposition_context_panel();
    }

    fn reposition_context_panel(&self) -> Option<ContextPanelEffect> {
        if self.skin != SkinMode::Vrm || !self.context_open {
            return None;
        }
        let (x, y) = self.context_panel_origin();
        Some(ContextPanelEffect::Moved { x, y })
    }

    fn context_panel_origin(&self) -> (i32, i32) {
        let scale = self.work_area.scale_factor.max(0.0);
        let panel = Size {
            width: CONTEXT_PANEL_SIZE.width * scale,
            height: CONTEXT_PANEL_SIZE.height * scale,
        };
        place_context_panel(self.avatar_rect, panel, self.work_area, EDGE_MARGIN, EDGE_MARGIN)
    }
}
