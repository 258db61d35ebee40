//! Avatar stage: the 3D canvas plus its debug overlay, mounted only while enabled.
//!
//! Two states. Entering `Enabled` constructs the canvas (fed by the pointer queue) and the
//! overlay; leaving it drops both, which is where the renderer releases GPU resources.
//! Prop updates that compare equal do no render work.

use super::config::RuntimeConfig;
use super::pointer_queue::PointerEventQueue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageProps {
    pub enabled: bool,
    pub url: Option<String>,
    pub idle_motion_url: Option<String>,
    pub class_name: Option<String>,
}

/// Resolved canvas inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSpec {
    pub model_url: String,
    pub idle_motion_url: Option<String>,
    pub class_name: Option<String>,
}

/// Renderer-side construction of the stage children.
///
/// Dropping a `Canvas` or `Overlay` must release whatever it acquired.
pub trait StageMounter {
    type Canvas;
    type Overlay;

    fn mount_canvas(&mut self, spec: &CanvasSpec, input: PointerEventQueue) -> Self::Canvas;

    fn update_canvas(&mut self, canvas: &mut Self::Canvas, spec: &CanvasSpec);

    fn mount_debug_overlay(&mut self) -> Self::Overlay;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageUpdate {
    /// No render work: equal props, still disabled, or the same resolved canvas.
    Suppressed,
    Mounted,
    Rerendered,
    Unmounted,
}

enum StageState<C, O> {
    Disabled,
    Enabled {
        spec: CanvasSpec,
        canvas: C,
        overlay: Option<O>,
    },
}

pub struct AvatarStageController<M: StageMounter> {
    mounter: M,
    input: PointerEventQueue,
    default_model_url: String,
    debug_overlay: bool,
    props: StageProps,
    state: StageState<M::Canvas, M::Overlay>,
}

impl<M: StageMounter> AvatarStageController<M> {
    pub fn new(mounter: M, input: PointerEventQueue, config: &RuntimeConfig) -> Self {
        Self {
            mounter,
            input,
            default_model_url: config.default_model_url.clone(),
            debug_overlay: config.debug_overlay,
            props: StageProps::default(),
            state: StageState::Disabled,
        }
    }

    pub fn props(&self) -> &StageProps {
        &self.props
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, StageState::Enabled { .. })
    }

    pub fn spec(&self) -> Option<&CanvasSpec> {
        match &self.state {
            StageState::Enabled { spec, .. } => Some(spec),
            StageState::Disabled => None,
        }
    }

    pub fn canvas(&self) -> Option<&M::Canvas> {
        match &self.state {
            StageState::Enabled { canvas, .. } => Some(canvas),
            StageState::Disabled => None,
        }
    }

    pub fn overlay(&self) -> Option<&M::Overlay> {
        match &self.state {
            StageState::Enabled { overlay, .. } => overlay.as_ref(),
            StageState::Disabled => None,
        }
    }

    pub fn mounter(&self) -> &M {
        &self.mounter
    }

    /// Caller URL, or the configured default when omitted or blank.
    pub fn resolve_model_url(&self, url: Option<&str>) -> String {
        url.map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.default_model_url)
            .to_string()
    }

    pub fn update(&mut self, props: StageProps) -> StageUpdate {
        if props == self.props {
            return StageUpdate::Suppressed;
        }
        self.props = props;
        let enabled = self.props.enabled;

        if !self.is_enabled() {
            if !enabled {
                return StageUpdate::Suppressed;
            }
            self.enter_enabled();
            return StageUpdate::Mounted;
        }
        if !enabled {
            self.exit_enabled();
            return StageUpdate::Unmounted;
        }

        let next = self.current_spec();
        let StageState::Enabled { spec, canvas, .. } = &mut self.state else {
            return StageUpdate::Suppressed;
        };
        if next == *spec {
            return StageUpdate::Suppressed;
        }
        self.mounter.update_canvas(canvas, &next);
        *spec = next;
        StageUpdate::Rerendered
    }

    fn current_spec(&self) -> CanvasSpec {
        CanvasSpec {
            model_url: self.resolve_model_url(self.props.url.as_deref()),
            idle_motion_url: self.props.idle_motion_url.clone(),
            class_name: self.props.class_name.clone(),
        }
    }

    fn enter_enabled(&mut self) {
        let spec = self.current_spec();
        let canvas = self.mounter.mount_canvas(&spec, self.input.clone());
        let overlay = self
            .debug_overlay
            .then(|| self.mounter.mount_debug_overlay());
        log::debug!(
            "Avatar stage mounted (model={}, debug_overlay={})",
            spec.model_url,
            overlay.is_some()
        );
        self.state = StageState::Enabled {
            spec,
            canvas,
            overlay,
        };
    }

    fn exit_enabled(&mut self) {
        if let StageState::Enabled {
            canvas, overlay, ..
        } = std::mem::replace(&mut self.state, StageState::Disabled)
        {
            drop(overlay);
            drop(canvas);
            log::debug!("Avatar stage unmounted");
        }
    }
}
