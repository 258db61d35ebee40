//! Window geometry used by the host model: context panel anchoring and bottom-center
//! anchored resizing of the avatar window.
//!
//! All inputs are physical pixels in virtual desktop coordinates. Logical sizes (margins,
//! minimum sizes) are converted with the work area's scale factor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer window placement as native window APIs take it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn from_physical(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: f64::from(x),
            top: f64::from(y),
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Rounded to whole pixels; degenerate sizes become 1 px.
    pub fn to_physical(&self) -> PhysicalBox {
        PhysicalBox {
            x: self.left.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32,
            y: self.top.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32,
            width: self.width.round().clamp(1.0, f64::from(u32::MAX)) as u32,
            height: self.height.round().clamp(1.0, f64::from(u32::MAX)) as u32,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width * 0.5
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height * 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub scale_factor: f64,
}

impl WorkArea {
    /// Monitor frame `frame` (physical px) with its DPI scale factor.
    pub fn from_frame(frame: Rect, scale_factor: f64) -> Self {
        Self {
            left: frame.left,
            top: frame.top,
            right: frame.right(),
            bottom: frame.bottom(),
            scale_factor,
        }
    }

    fn px(&self, logical: f64) -> f64 {
        (logical * self.scale_factor.max(0.0)).max(0.0)
    }

    /// Top-left bounds for a box of `width`×`height` kept `margin` px inside the area.
    fn origin_range(&self, width: f64, height: f64, margin: f64) -> (f64, f64, f64, f64) {
        let min_x = self.left + margin;
        let max_x = (self.right - margin - width).max(min_x);
        let min_y = self.top + margin;
        let max_y = (self.bottom - margin - height).max(min_y);
        (min_x, max_x, min_y, max_y)
    }
}

/// Minimum avatar window size and the margin kept from the work area edges (logical px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_size: Size,
    pub edge_margin: f64,
}

/// Position a context panel next to the avatar: right side preferred, left side when it
/// would overflow, vertically centered on the avatar, always inside the work area.
pub fn place_context_panel(
    avatar: Rect,
    panel: Size,
    work_area: WorkArea,
    gap_logical_px: f64,
    edge_margin_logical_px: f64,
) -> (i32, i32) {
    let gap = work_area.px(gap_logical_px);
    let margin = work_area.px(edge_margin_logical_px);
    let (min_x, max_x, min_y, max_y) = work_area.origin_range(panel.width, panel.height, margin);

    let mut x = avatar.right() + gap;
    if x > max_x {
        x = avatar.left - gap - panel.width;
    }
    let x = x.clamp(min_x, max_x);
    let y = (avatar.center_y() - panel.height * 0.5).clamp(min_y, max_y);

    (x.round() as i32, y.round() as i32)
}

/// Scale `current` by `factor`, keeping its bottom-center point fixed.
///
/// The factor is clamped so the result stays within the minimum size and the work area.
pub fn scale_rect_bottom_center(
    current: Rect,
    factor: f64,
    work_area: WorkArea,
    limits: ResizeLimits,
) -> Rect {
    let current_w = current.width.max(1.0);
    let current_h = current.height.max(1.0);
    let (min_w, min_h, max_w, max_h) = size_range(work_area, limits);

    let min_factor = (min_w / current_w).max(min_h / current_h);
    let max_factor = (max_w / current_w).min(max_h / current_h);
    let factor = factor.clamp(min_factor, max_factor.max(min_factor));

    let width = (current_w * factor).round().clamp(min_w, max_w);
    let height = (current_h * factor).round().clamp(min_h, max_h);
    anchor_bottom_center(current, width, height, work_area, limits)
}

/// Resize `current` to `target_logical` (logical px), keeping its bottom-center point fixed.
pub fn resize_rect_bottom_center(
    current: Rect,
    target_logical: Size,
    work_area: WorkArea,
    limits: ResizeLimits,
) -> Rect {
    let (min_w, min_h, max_w, max_h) = size_range(work_area, limits);
    let width = work_area.px(target_logical.width).round().clamp(min_w, max_w);
    let height = work_area.px(target_logical.height).round().clamp(min_h, max_h);
    anchor_bottom_center(current, width, height, work_area, limits)
}

/// Logical target size that brings `current_logical` to `aspect` (width / height), or
/// `None` when it is already within `tolerance` (relative).
///
/// Too narrow windows keep their width and lose height; too wide windows keep their height
/// and lose width.
pub fn fit_aspect_target(
    current_logical: Size,
    aspect: f64,
    tolerance: f64,
    min_size: Size,
) -> Option<Size> {
    let width = current_logical.width.max(1.0);
    let height = current_logical.height.max(1.0);
    let current_aspect = width / height;

    if current_aspect < aspect * (1.0 - tolerance) {
        Some(Size {
            width,
            height: (width / aspect).max(min_size.height),
        })
    } else if current_aspect > aspect * (1.0 + tolerance) {
        Some(Size {
            width: (height * aspect).max(min_size.width),
            height,
        })
    } else {
        None
    }
}

fn size_range(work_area: WorkArea, limits: ResizeLimits) -> (f64, f64, f64, f64) {
    let margin = work_area.px(limits.edge_margin);
    let min_w = work_area.px(limits.min_size.width).max(1.0);
    let min_h = work_area.px(limits.min_size.height).max(1.0);
    let max_w = (work_area.right - work_area.left - 2.0 * margin).max(min_w);
    let max_h = (work_area.bottom - work_area.top - 2.0 * margin).max(min_h);
    (min_w, min_h, max_w, max_h)
}

fn anchor_bottom_center(
    current: Rect,
    width: f64,
    height: f64,
    work_area: WorkArea,
    limits: ResizeLimits,
) -> Rect {
    let margin = work_area.px(limits.edge_margin);
    let (min_x, max_x, min_y, max_y) = work_area.origin_range(width, height, margin);
    Rect {
        left: (current.center_x() - width * 0.5).clamp(min_x, max_x),
        top: (current.bottom() - height).clamp(min_y, max_y),
        width,
        height,
    }
}
