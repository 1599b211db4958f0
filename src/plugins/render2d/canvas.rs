//! Canvas backend that turns panel paint calls into gizmo strokes plus lists
//! of sprites and labels for the pooled entities.

use bevy::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use unicode_width::UnicodeWidthStr;

use crate::scene::layers::TextAlign;
use crate::scene::labels::{line_height, GLYPH_WIDTH_RATIO};
use crate::scene::Canvas;
use crate::theme::{Dash, Fill, IconId, Stroke};

const STRIPE_SPACING: f32 = 6.0;
const DOT_LENGTH: f32 = 2.0;
const DOT_GAP: f32 = 3.0;
const DASH_LENGTH: f32 = 6.0;
const DASH_GAP: f32 = 4.0;
const PLACEHOLDER_ICON: Color = Color::srgb(0.55, 0.55, 0.6);

/// Fleet icon images keyed by icon id; `None` marks a missing file.
#[derive(Resource, Debug, Default)]
pub struct IconAtlas {
    handles: HashMap<String, Option<Handle<Image>>>,
}

impl IconAtlas {
    pub fn insert(&mut self, key: &str, handle: Option<Handle<Image>>) {
        self.handles.insert(key.to_string(), handle);
    }

    pub fn get(&self, icon: &IconId) -> Option<&Handle<Image>> {
        self.handles.get(&icon.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, icon: &IconId) -> bool {
        self.handles.contains_key(&icon.0)
    }
}

pub fn icon_asset_path(key: &str) -> String {
    format!("icons/{}.png", key)
}

/// Looks for the icon under `assets/`; missing files fall back to a placeholder.
pub fn load_icon(asset_server: &AssetServer, key: &str) -> Option<Handle<Image>> {
    let path = icon_asset_path(key);
    if Path::new("assets").join(&path).exists() {
        Some(asset_server.load(path))
    } else {
        warn!("Fleet icon '{}' not found, using placeholder", key);
        None
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDraw {
    pub center: Vec2,
    pub size: Vec2,
    pub color: Color,
    pub image: Option<Handle<Image>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextDraw {
    pub center: Vec2,
    pub text: String,
    pub font_size: f32,
    pub color: Color,
}

/// Splits a polyline into the dash pieces to draw. `phase` shifts the pattern
/// along the line.
pub fn dash_segments(points: &[Vec2], dash: Dash, phase: f32) -> Vec<(Vec2, Vec2)> {
    let (on, off) = match dash {
        Dash::Solid => {
            return points.windows(2).map(|pair| (pair[0], pair[1])).collect();
        }
        Dash::Dotted => (DOT_LENGTH, DOT_GAP),
        Dash::Dashed | Dash::Sweep => (DASH_LENGTH, DASH_GAP),
    };
    let period = on + off;
    let mut out = Vec::new();
    // Distance into the pattern at the start of the current segment.
    let mut cursor = (phase * period).rem_euclid(period);

    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let length = start.distance(end);
        if length <= f32::EPSILON {
            continue;
        }
        let direction = (end - start) / length;
        let mut travelled = 0.0;
        while travelled < length {
            let in_period = (cursor + travelled).rem_euclid(period);
            if in_period < on {
                let piece = (on - in_period).min(length - travelled);
                out.push((
                    start + direction * travelled,
                    start + direction * (travelled + piece),
                ));
                travelled += piece;
            } else {
                travelled += period - in_period;
            }
        }
        cursor = (cursor + length).rem_euclid(period);
    }
    out
}

/// One frame of painting. Coordinates arrive in viewport pixels (y down) and
/// leave in world units centred on the camera.
pub struct FrameCanvas<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    atlas: &'a IconAtlas,
    window: Vec2,
    pub sprites: Vec<SpriteDraw>,
    pub texts: Vec<TextDraw>,
}

impl<'a, 'w, 's> FrameCanvas<'a, 'w, 's> {
    pub fn new(gizmos: &'a mut Gizmos<'w, 's>, atlas: &'a IconAtlas, window: Vec2) -> Self {
        Self {
            gizmos,
            atlas,
            window,
            sprites: Vec::new(),
            texts: Vec::new(),
        }
    }

    fn to_world(&self, point: Vec2) -> Vec2 {
        viewport_to_camera(point, self.window)
    }

    fn push_rect(&mut self, rect: Rect, color: Color, image: Option<Handle<Image>>) {
        self.sprites.push(SpriteDraw {
            center: self.to_world(rect.center()),
            size: rect.size(),
            color,
            image,
        });
    }
}

pub fn viewport_to_camera(point: Vec2, window: Vec2) -> Vec2 {
    Vec2::new(point.x - window.x / 2.0, window.y / 2.0 - point.y)
}

impl Canvas for FrameCanvas<'_, '_, '_> {
    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        match fill {
            Fill::Solid(color) => self.push_rect(rect, color, None),
            Fill::Striped { base, stripe } => {
                self.push_rect(rect, base, None);
                let mut y = rect.min.y + STRIPE_SPACING / 2.0;
                while y < rect.max.y {
                    let from = self.to_world(Vec2::new(rect.min.x, y));
                    let to = self.to_world(Vec2::new(rect.max.x, y));
                    self.gizmos.line_2d(from, to, stripe);
                    y += STRIPE_SPACING;
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Vec2], stroke: Stroke, dash_phase: f32) {
        for (from, to) in dash_segments(points, stroke.dash, dash_phase) {
            let from = self.to_world(from);
            let to = self.to_world(to);
            self.gizmos.line_2d(from, to, stroke.color);
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke) {
        let center = self.to_world(center);
        self.gizmos.circle_2d(center, radius, stroke.color);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let center = self.to_world(center);
        let mut r = radius;
        while r > 0.0 {
            self.gizmos.circle_2d(center, r, color);
            r -= 1.0;
        }
    }

    fn draw_text(
        &mut self,
        origin: Vec2,
        lines: &[String],
        font_size: f32,
        color: Color,
        align: TextAlign,
        width: f32,
        background: Option<Color>,
    ) {
        if lines.is_empty() {
            return;
        }
        let height = line_height(font_size) * lines.len() as f32;
        let block = Rect::from_corners(origin, origin + Vec2::new(width, height));
        if let Some(background) = background {
            self.push_rect(block, background, None);
        }
        let center = match align {
            TextAlign::Center => block.center(),
            // Labels are centred on their text, so shift by the estimated run.
            TextAlign::Left => {
                let longest = lines.iter().map(|line| line.width()).max().unwrap_or(0);
                let run = longest as f32 * font_size * GLYPH_WIDTH_RATIO;
                Vec2::new(origin.x + run.min(width) / 2.0, block.center().y)
            }
        };
        self.texts.push(TextDraw {
            center: self.to_world(center),
            text: lines.join("\n"),
            font_size,
            color,
        });
    }

    fn draw_icon(&mut self, rect: Rect, icon: &IconId) {
        match self.atlas.get(icon).cloned() {
            Some(handle) => self.push_rect(rect, Color::WHITE, Some(handle)),
            None => {
                self.push_rect(rect, PLACEHOLDER_ICON, None);
                let outline = [
                    rect.min,
                    Vec2::new(rect.max.x, rect.min.y),
                    rect.max,
                    Vec2::new(rect.min.x, rect.max.y),
                    rect.min,
                ];
                self.stroke_polyline(&outline, Stroke::solid(Color::WHITE, 1.0), 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "expected {} to be close to {}", a, b);
    }

    #[test]
    fn viewport_origin_maps_to_top_left() {
        let point = viewport_to_camera(Vec2::ZERO, Vec2::new(800.0, 600.0));
        assert_eq!(point, Vec2::new(-400.0, 300.0));
        let center = viewport_to_camera(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
        assert_eq!(center, Vec2::ZERO);
    }

    #[test]
    fn solid_polyline_keeps_every_segment() {
        let points = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let segments = dash_segments(&points, Dash::Solid, 0.0);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn dashes_cover_the_on_part_of_each_period() {
        let points = [Vec2::ZERO, Vec2::new(20.0, 0.0)];
        let segments = dash_segments(&points, Dash::Dashed, 0.0);
        assert_eq!(segments.len(), 2);
        assert_close(segments[0].0.x, 0.0);
        assert_close(segments[0].1.x, 6.0);
        assert_close(segments[1].0.x, 10.0);
        assert_close(segments[1].1.x, 16.0);
    }

    #[test]
    fn phase_shifts_the_dash_pattern() {
        let points = [Vec2::ZERO, Vec2::new(20.0, 0.0)];
        let segments = dash_segments(&points, Dash::Sweep, 0.5);
        // Half a period in: only the tail of the first dash is left.
        assert_close(segments[0].0.x, 0.0);
        assert_close(segments[0].1.x, 1.0);
        assert_close(segments[1].0.x, 5.0);
        assert_close(segments[1].1.x, 11.0);
    }

    #[test]
    fn missing_icon_is_not_resolved() {
        let mut atlas = IconAtlas::default();
        atlas.insert("terran", None);
        assert!(atlas.contains(&IconId::new("terran")));
        assert!(atlas.get(&IconId::new("terran")).is_none());
        assert!(!atlas.contains(&IconId::new("kessari")));
    }
}
