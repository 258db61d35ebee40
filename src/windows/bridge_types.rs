use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinMode {
    Off,
    Vrm,
}

/// How the host routes pointer input that lands on the avatar window.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    /// Never deliver; click-through everywhere.
    Passive,
    /// Deliver while the cursor is inside the interaction bounds.
    HoverActivate,
    /// Deliver only while a press is held inside the interaction bounds.
    HoldToInteract,
}

/// Hit-test rectangle in window-local pixels.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarInteractionBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl AvatarInteractionBounds {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Finite edges with `left <= right` and `top <= bottom`.
    pub fn is_well_formed(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
            && self.left <= self.right
            && self.top <= self.bottom
    }

    /// Edge-inclusive containment test in the same coordinate space as the rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A single command for the native window host.
///
/// Wire shape: `{"command": "<snake_case id>", "args": {...}}`; unit commands carry no args.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum HostCommand {
    SetSkinMode { skin: SkinMode },
    OpenContextPanel,
    HideContextPanel,
    ScaleAvatarWindow { factor: f64 },
    FitAvatarWindowToAspect { aspect: f64 },
    SetInteractionMode { mode: InteractionMode },
    SetAvatarInteractionBounds { bounds: Option<AvatarInteractionBounds> },
}

impl HostCommand {
    pub fn name(&self) -> &'static str {
        match self {
            HostCommand::SetSkinMode { .. } => "set_skin_mode",
            HostCommand::OpenContextPanel => "open_context_panel",
            HostCommand::HideContextPanel => "hide_context_panel",
            HostCommand::ScaleAvatarWindow { .. } => "scale_avatar_window",
            HostCommand::FitAvatarWindowToAspect { .. } => "fit_avatar_window_to_aspect",
            HostCommand::SetInteractionMode { .. } => "set_interaction_mode",
            HostCommand::SetAvatarInteractionBounds { .. } => "set_avatar_interaction_bounds",
        }
    }
}
