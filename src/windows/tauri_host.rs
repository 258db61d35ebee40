//! Native window host backed by Tauri webview windows.

use std::sync::{Arc, Mutex, MutexGuard};

use tauri::{AppHandle, Emitter, Manager, Runtime, WebviewWindow};

use super::anchor_layout::{PhysicalBox, Rect, WorkArea};
use super::bridge_types::HostCommand;
use super::dispatch::HostTransport;
use super::error::TransportError;
use super::host_state::{
    CONTEXT_PANEL_SIZE, ContextPanelEffect, HostEffects, HostWindowState, PointerProbe,
};

pub const AVATAR_WINDOW_LABEL: &str = "avatar";
pub const CONTEXT_WINDOW_LABEL: &str = "context";

/// Log plugin with the levels the avatar host ships with.
pub fn log_plugin<R: Runtime>() -> tauri::plugin::TauriPlugin<R> {
    tauri_plugin_log::Builder::new()
        .level(log::LevelFilter::Info)
        .level_for("avatar_runtime", log::LevelFilter::Debug)
        .build()
}

#[derive(Clone)]
pub struct TauriWindowHost<R: Runtime> {
    app: AppHandle<R>,
    state: Arc<Mutex<HostWindowState>>,
}

impl<R: Runtime> TauriWindowHost<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        let initial = app
            .get_webview_window(AVATAR_WINDOW_LABEL)
            .and_then(|w| current_window_rect(&w).map(|rect| (rect, work_area_for(&w))));
        let (rect, work_area) = initial.unwrap_or((
            Rect {
                left: 0.0,
                top: 0.0,
                width: 420.0,
                height: 720.0,
            },
            WorkArea {
                left: 0.0,
                top: 0.0,
                right: 1920.0,
                bottom: 1080.0,
                scale_factor: 1.0,
            },
        ));
        Self {
            app,
            state: Arc::new(Mutex::new(HostWindowState::new(rect, work_area))),
        }
    }

    pub fn snapshot(&self) -> HostWindowState {
        self.lock().clone()
    }

    /// Feed a cursor sample (window-local physical pixels) from the global cursor hook.
    pub fn pointer_moved(&self, pointer: PointerProbe) {
        let changed = self.lock().update_pointer(pointer);
        if let Some(value) = changed {
            self.apply_click_through(value);
        }
    }

    pub fn pointer_left(&self) {
        let changed = self.lock().clear_pointer();
        if let Some(value) = changed {
            self.apply_click_through(value);
        }
    }

    fn avatar(&self) -> Result<WebviewWindow<R>, TransportError> {
        self.app
            .get_webview_window(AVATAR_WINDOW_LABEL)
            .ok_or(TransportError::Closed)
    }

    fn apply(&self, command: &HostCommand) -> Result<(), TransportError> {
        let avatar = self.avatar()?;
        let effects = {
            let mut state = self.lock();
            if let Some(rect) = current_window_rect(&avatar) {
                // The user may have dragged the window since the last command.
                let work_area = work_area_for(&avatar);
                state.set_window_geometry(rect, work_area);
            }
            state.apply(command)?
        };
        self.apply_effects(command, &avatar, effects)
    }

    fn apply_effects(
        &self,
        command: &HostCommand,
        avatar: &WebviewWindow<R>,
        effects: HostEffects,
    ) -> Result<(), TransportError> {
        if let Some(rect) = effects.avatar_rect {
            apply_window_rect(avatar, rect);
        }
        match effects.context_panel {
            Some(ContextPanelEffect::Shown { x, y }) => {
                let context = self.context_window(command)?;
                set_physical_position(&context, x, y);
                let _ = context.show();
                let _ = context.set_focus();
                let _ = context.emit(crate::EVT_CONTEXT_PANEL_OPENED, ());
            }
            Some(ContextPanelEffect::Moved { x, y }) => {
                if let Some(context) = self.app.get_webview_window(CONTEXT_WINDOW_LABEL) {
                    set_physical_position(&context, x, y);
                }
            }
            Some(ContextPanelEffect::Hidden) => {
                if let Some(context) = self.app.get_webview_window(CONTEXT_WINDOW_LABEL) {
                    let _ = context.hide();
                }
            }
            None => {}
        }
        if let Some(value) = effects.click_through {
            self.apply_click_through(value);
        }
        Ok(())
    }

    fn context_window(&self, command: &HostCommand) -> Result<WebviewWindow<R>, TransportError> {
        if let Some(window) = self.app.get_webview_window(CONTEXT_WINDOW_LABEL) {
            return Ok(window);
        }
        tauri::WebviewWindowBuilder::new(
            &self.app,
            CONTEXT_WINDOW_LABEL,
            tauri::WebviewUrl::App("index.html?window=context".into()),
        )
        .title("avatar-context")
        .inner_size(CONTEXT_PANEL_SIZE.width, CONTEXT_PANEL_SIZE.height)
        .resizable(true)
        .decorations(false)
        .shadow(true)
        .always_on_top(true)
        .skip_taskbar(true)
        .visible(false)
        .build()
        .map_err(|e| {
            TransportError::rejected(
                command.name(),
                format!("Failed to create context window: {e}"),
            )
        })
    }

    fn apply_click_through(&self, value: bool) {
        let Some(window) = self.app.get_webview_window(AVATAR_WINDOW_LABEL) else {
            return;
        };
        let _ = window.set_ignore_cursor_events(value);
        let _ = window.set_focusable(!value);
        let _ = window.emit(crate::EVT_CLICK_THROUGH_STATE, value);
    }

    fn lock(&self) -> MutexGuard<'_, HostWindowState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: Runtime> HostTransport for TauriWindowHost<R> {
    async fn send(&mut self, command: HostCommand) -> Result<(), TransportError> {
        self.apply(&command)
    }
}

/// Outer frame of `window`, falling back to the client area when the frame is unknown.
fn current_window_rect<R: Runtime>(window: &WebviewWindow<R>) -> Option<Rect> {
    let origin = match window.outer_position() {
        Ok(pos) => pos,
        Err(_) => window.inner_position().ok()?,
    };
    let size = match window.outer_size() {
        Ok(size) => size,
        Err(_) => window.inner_size().ok()?,
    };
    Some(Rect::from_physical(origin.x, origin.y, size.width, size.height))
}

fn work_area_for<R: Runtime>(window: &WebviewWindow<R>) -> WorkArea {
    let monitor = window
        .current_monitor()
        .ok()
        .flatten()
        .or_else(|| window.primary_monitor().ok().flatten());

    let Some(monitor) = monitor else {
        return WorkArea::from_frame(Rect::from_physical(0, 0, 1920, 1080), 1.0);
    };
    let (origin, size) = (monitor.position(), monitor.size());
    WorkArea::from_frame(
        Rect::from_physical(origin.x, origin.y, size.width, size.height),
        monitor.scale_factor(),
    )
}

fn apply_window_rect<R: Runtime>(window: &WebviewWindow<R>, rect: Rect) {
    let PhysicalBox {
        x,
        y,
        width,
        height,
    } = rect.to_physical();
    let _ = window.set_size(tauri::Size::Physical(tauri::PhysicalSize { width, height }));
    set_physical_position(window, x, y);
}

fn set_physical_position<R: Runtime>(window: &WebviewWindow<R>, x: i32, y: i32) {
    let _ = window.set_position(tauri::Position::Physical(tauri::PhysicalPosition { x, y }));
}
