//! Viewport/Scroll Controller: zoom, snapped scrolling, drag scrolling,
//! edge auto-scroll and animated recentering.
//!
//! Offsets live in scaled extent space (pixels of the zoomed map), so a
//! viewport point `p` sits over world point `(p + offset) / scale`.

use bevy::prelude::*;

use crate::grid::{sector_midpoint, viewport_to_world, GridDimensions, MapLocation, SECTOR_SIZE};
use crate::scene::animation::ease_in_out;
use crate::scene::labels::STAR_NAME_FONT_SIZE;
use crate::scene::ViewTransform;

// =============================================================================
// Constants
// =============================================================================

pub const MAX_SCALE_FACTOR: f32 = 2.0;
pub const ZOOM_INCREMENT: f32 = 0.1;
pub const ZOOM_CLOSE: f32 = 0.8;
pub const ZOOM_WIDE: f32 = 0.2;
/// Keeps the scale usable before the first layout reports a viewport size.
const MIN_SCALE_FLOOR: f32 = 0.05;
pub const AUTO_SCROLL_BAND: f32 = 16.0;
pub const AUTO_SCROLL_FIRST_SECS: f32 = 1.0;
pub const AUTO_SCROLL_REPEAT_SECS: f32 = 0.2;
pub const RECENTER_SECS: f32 = 0.5;
pub const MIN_VISIBLE_FONT_SIZE: f32 = 8.0;

const EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// Sector the view centres on for this quadrant.
    pub fn focus(self, dims: GridDimensions) -> MapLocation {
        let (w, h) = (dims.width, dims.height);
        let location = match self {
            Quadrant::NorthWest => MapLocation::new(w / 4 + 1, h / 4 + 1),
            Quadrant::NorthEast => MapLocation::new(3 * w / 4 + 1, h / 4 + 1),
            Quadrant::SouthWest => MapLocation::new(w / 4 + 1, 3 * h / 4 - 1),
            Quadrant::SouthEast => MapLocation::new(3 * w / 4 - 1, 3 * h / 4 - 1),
        };
        dims.clamp(location)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Recenter {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    start_point: Vec2,
    start_offset: Vec2,
}

/// Which edges the pointer is resting on: -1 towards the origin, +1 away.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScrollEdges {
    pub horizontal: i8,
    pub vertical: i8,
}

impl ScrollEdges {
    pub fn is_none(&self) -> bool {
        self.horizontal == 0 && self.vertical == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct AutoScroll {
    edges: ScrollEdges,
    elapsed: f32,
    fired: bool,
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportController {
    scale: f32,
    offset: Vec2,
    viewport: Vec2,
    dims: GridDimensions,
    /// Last snapped request per axis; unset until the first snapped scroll.
    last_request: [Option<f32>; 2],
    recenter: Option<Recenter>,
    drag: Option<Drag>,
    auto_scroll: Option<AutoScroll>,
}

impl ViewportController {
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            viewport: Vec2::ZERO,
            dims,
            last_request: [None; 2],
            recenter: None,
            drag: None,
            auto_scroll: None,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Instantaneous offset; hit testing uses this even mid-animation.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub fn scaled_extent(&self) -> Vec2 {
        self.dims.extent() * self.scale
    }

    /// The scale at which the whole map exactly fits the viewport.
    pub fn min_scale(&self) -> f32 {
        let extent = self.dims.extent();
        let fit = (self.viewport.x / extent.x).max(self.viewport.y / extent.y);
        fit.clamp(MIN_SCALE_FLOOR, MAX_SCALE_FACTOR)
    }

    pub fn max_offset(&self) -> Vec2 {
        (self.scaled_extent() - self.viewport).max(Vec2::ZERO)
    }

    fn clamp_offset(&self, offset: Vec2) -> Vec2 {
        offset.clamp(Vec2::ZERO, self.max_offset())
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport = size.max(Vec2::ZERO);
        self.scale = self.scale.clamp(self.min_scale(), MAX_SCALE_FACTOR);
        self.offset = self.clamp_offset(self.offset);
        self.recenter = None;
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            offset: self.visible_offset(),
            scale: self.scale,
        }
    }

    pub fn hit_transform(&self) -> ViewTransform {
        ViewTransform {
            offset: self.offset,
            scale: self.scale,
        }
    }

    pub fn to_world(&self, point: Vec2) -> Vec2 {
        viewport_to_world(point, self.offset, self.scale)
    }

    pub fn star_names_visible(&self) -> bool {
        STAR_NAME_FONT_SIZE * self.scale >= MIN_VISIBLE_FONT_SIZE
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    pub fn can_zoom_in(&self) -> bool {
        self.scale < MAX_SCALE_FACTOR - EPSILON
    }

    pub fn can_zoom_out(&self) -> bool {
        self.scale > self.min_scale() + EPSILON
    }

    /// One increment in; `anchor` is a viewport point that stays put.
    pub fn zoom_in(&mut self, anchor: Option<Vec2>) {
        let base = snap_to_increment(self.scale);
        self.set_scale(base + ZOOM_INCREMENT, anchor);
    }

    pub fn zoom_out(&mut self, anchor: Option<Vec2>) {
        let base = snap_to_increment(self.scale);
        self.set_scale(base - ZOOM_INCREMENT, anchor);
    }

    pub fn zoom_close(&mut self, anchor: Option<Vec2>) {
        self.set_scale(ZOOM_CLOSE, anchor);
    }

    pub fn zoom_wide(&mut self, anchor: Option<Vec2>) {
        self.set_scale(ZOOM_WIDE, anchor);
    }

    /// Rescales around `anchor` (the viewport centre when absent), keeping the
    /// world point under it fixed unless the offset clamp intervenes.
    pub fn set_scale(&mut self, scale: f32, anchor: Option<Vec2>) {
        let scale = scale.clamp(self.min_scale(), MAX_SCALE_FACTOR);
        let anchor = anchor.unwrap_or(self.viewport / 2.0);
        let world = viewport_to_world(anchor, self.offset, self.scale);

        self.scale = scale;
        self.offset = self.clamp_offset(world * scale - anchor);
        self.recenter = None;
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    pub fn set_horizontal_offset(&mut self, offset: f32, snap_to_grid: bool) {
        let value = if snap_to_grid {
            self.snapped(offset, 0)
        } else {
            offset
        };
        self.offset.x = value.clamp(0.0, self.max_offset().x);
        self.recenter = None;
    }

    pub fn set_vertical_offset(&mut self, offset: f32, snap_to_grid: bool) {
        let value = if snap_to_grid {
            self.snapped(offset, 1)
        } else {
            offset
        };
        self.offset.y = value.clamp(0.0, self.max_offset().y);
        self.recenter = None;
    }

    /// Rounds onto a cell boundary; when scrolling forward, pulls back by the
    /// partial cell the viewport edge would otherwise cut.
    fn snapped(&mut self, request: f32, axis: usize) -> f32 {
        let cell = SECTOR_SIZE * self.scale;
        let mut value = (request / cell).floor() * cell;
        if request.rem_euclid(cell) > 1.0 {
            value += cell;
        }
        let last = self.last_request[axis].unwrap_or(self.offset[axis]);
        if request > last {
            value -= self.viewport[axis].rem_euclid(cell);
        }
        self.last_request[axis] = Some(request);
        value
    }

    pub fn line_step(&self) -> f32 {
        SECTOR_SIZE * self.scale + self.scale
    }

    pub fn line_left(&mut self) {
        self.set_horizontal_offset(self.offset.x - self.line_step(), true);
    }

    pub fn line_right(&mut self) {
        self.set_horizontal_offset(self.offset.x + self.line_step(), true);
    }

    pub fn line_up(&mut self) {
        self.set_vertical_offset(self.offset.y - self.line_step(), true);
    }

    pub fn line_down(&mut self) {
        self.set_vertical_offset(self.offset.y + self.line_step(), true);
    }

    pub fn page_left(&mut self) {
        self.set_horizontal_offset(self.offset.x - self.viewport.x, true);
    }

    pub fn page_right(&mut self) {
        self.set_horizontal_offset(self.offset.x + self.viewport.x, true);
    }

    pub fn page_up(&mut self) {
        self.set_vertical_offset(self.offset.y - self.viewport.y, true);
    }

    pub fn page_down(&mut self) {
        self.set_vertical_offset(self.offset.y + self.viewport.y, true);
    }

    pub fn begin_drag(&mut self, point: Vec2) {
        self.drag = Some(Drag {
            start_point: point,
            start_offset: self.offset,
        });
        self.recenter = None;
    }

    pub fn drag_to(&mut self, point: Vec2) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.offset = self.clamp_offset(drag.start_offset - (point - drag.start_point));
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // =========================================================================
    // Recentering
    // =========================================================================

    pub fn center_on_point(&mut self, world: Vec2, animate: bool) {
        let target = self.clamp_offset(world * self.scale - self.viewport / 2.0);
        self.recenter = animate.then(|| Recenter {
            from: self.visible_offset(),
            to: target,
            elapsed: 0.0,
        });
        self.offset = target;
    }

    pub fn scroll_to_sector(&mut self, location: MapLocation) {
        self.center_on_point(sector_midpoint(self.dims.clamp(location)), true);
    }

    pub fn center_on_quadrant(&mut self, quadrant: Quadrant) {
        self.scroll_to_sector(quadrant.focus(self.dims));
    }

    /// Offset to paint with; trails `offset()` while a recenter animates.
    pub fn visible_offset(&self) -> Vec2 {
        match self.recenter {
            Some(anim) => {
                let t = ease_in_out(anim.elapsed / RECENTER_SECS);
                anim.from.lerp(anim.to, t)
            }
            None => self.offset,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.recenter.is_some()
    }

    // =========================================================================
    // Auto-scroll
    // =========================================================================

    /// Re-evaluates the edge band for a pointer at `point` (viewport pixels).
    pub fn update_auto_scroll(&mut self, point: Vec2) -> ScrollEdges {
        let band = AUTO_SCROLL_BAND * self.scale;
        let edge = |value: f32, size: f32| -> i8 {
            if value < band {
                -1
            } else if value > size - band {
                1
            } else {
                0
            }
        };
        let edges = ScrollEdges {
            horizontal: edge(point.x, self.viewport.x),
            vertical: edge(point.y, self.viewport.y),
        };

        if edges.is_none() {
            self.auto_scroll = None;
        } else if self.auto_scroll.map(|scroll| scroll.edges) != Some(edges) {
            self.auto_scroll = Some(AutoScroll {
                edges,
                ..Default::default()
            });
        }
        edges
    }

    pub fn stop_auto_scroll(&mut self) {
        self.auto_scroll = None;
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_some()
    }

    /// Advances the recenter animation and the auto-scroll timer. Returns true
    /// when the view moved.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut moved = false;

        if let Some(anim) = self.recenter.as_mut() {
            anim.elapsed += dt.max(0.0);
            moved = true;
            if anim.elapsed >= RECENTER_SECS {
                self.recenter = None;
            }
        }

        let Some(mut scroll) = self.auto_scroll else {
            return moved;
        };
        scroll.elapsed += dt.max(0.0);
        loop {
            let interval = if scroll.fired {
                AUTO_SCROLL_REPEAT_SECS
            } else {
                AUTO_SCROLL_FIRST_SECS
            };
            if scroll.elapsed < interval {
                break;
            }
            scroll.elapsed -= interval;
            scroll.fired = true;
            self.scroll_towards(scroll.edges);
            moved = true;
        }
        self.auto_scroll = Some(scroll);
        moved
    }

    fn scroll_towards(&mut self, edges: ScrollEdges) {
        match edges.horizontal {
            -1 => self.line_left(),
            1 => self.line_right(),
            _ => {}
        }
        match edges.vertical {
            -1 => self.line_up(),
            1 => self.line_down(),
            _ => {}
        }
    }
}

/// Rounds to one decimal when the scale drifted off the zoom increment.
fn snap_to_increment(scale: f32) -> f32 {
    let rounded = (scale * 10.0).round() / 10.0;
    if (scale - rounded).abs() > EPSILON {
        rounded
    } else {
        scale
    }
}

// =============================================================================
// Tests
// =============================================================================
