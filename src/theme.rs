//! Immutable paint resources: pens, fills, colours and icon keys.
//!
//! Built once from the civilization catalog and handed to the panel, so the
//! engine never reaches for global brush caches.

use bevy::color::Alpha;
use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::civs::{CivCatalog, CivId};
use crate::model::StarType;

// =============================================================================
// Primitives
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dash {
    Solid,
    Dotted,
    Dashed,
    /// Dashes that march along the line, driven by the scan sweep clock.
    Sweep,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub dash: Dash,
}

impl Stroke {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: Dash::Solid,
        }
    }

    pub fn with_dash(mut self, dash: Dash) -> Self {
        self.dash = dash;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Diagonal stripes over a base colour.
    Striped { base: Color, stripe: Color },
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct IconId(pub String);

impl IconId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

/// Per-civilization paint set.
#[derive(Clone, Debug, PartialEq)]
pub struct CivStyle {
    pub color: Color,
    pub is_empire: bool,
    pub border: Stroke,
    pub colony_fill: Color,
    pub colony_name: Color,
    pub icon: IconId,
}

// =============================================================================
// Theme
// =============================================================================

pub const DEFAULT_ICON: &str = "fleet_default";
pub const UNKNOWN_ICON: &str = "fleet_unknown";
pub const MULTI_ICON: &str = "fleet_multi";

const FILL_ALPHA: u8 = 63;

#[derive(Clone, Debug)]
pub struct Theme {
    civs: BTreeMap<CivId, CivStyle>,
    pub minor_border: Stroke,
    pub minor_fill: Color,
    pub fog: Color,
    pub disputed: Fill,
    pub grid_line: Color,
    pub axis_line: Color,
    pub scan: Stroke,
    pub route: Stroke,
    pub route_warning: Stroke,
    pub trade_line: Stroke,
    pub trade_draft_valid: Stroke,
    pub trade_draft_invalid: Stroke,
    pub selection: Stroke,
    pub ship_range: Stroke,
    pub text: Color,
    pub label_box: Color,
    pub trade_glyph: Color,
    pub trade_glyph_full: Color,
    pub trade_glyph_unused: Color,
    pub distress: Color,
    pub default_icon: IconId,
    pub unknown_icon: IconId,
    pub multi_icon: IconId,
}

impl Theme {
    pub fn from_catalog(catalog: &CivCatalog) -> Self {
        let mut civs = BTreeMap::new();

        for civ in catalog.iter() {
            let (r, g, b) = civ.color;
            let color = Color::srgb_u8(r, g, b);
            let icon = match &civ.icon {
                Some(key) if !key.is_empty() => IconId::new(key.clone()),
                _ => {
                    warn!(
                        "No fleet icon for {} ({}), using {}",
                        civ.short_name, civ.id, DEFAULT_ICON
                    );
                    IconId::new(DEFAULT_ICON)
                }
            };
            civs.insert(
                civ.id,
                CivStyle {
                    color,
                    is_empire: civ.is_empire,
                    border: Stroke::solid(Color::srgba_u8(r, g, b, FILL_ALPHA), 2.0),
                    colony_fill: Color::srgba_u8(r, g, b, FILL_ALPHA),
                    colony_name: lighten(civ.color),
                    icon,
                },
            );
        }

        info!("Theme built for {} civilizations", civs.len());

        Self {
            civs,
            minor_border: Stroke::solid(Color::srgba_u8(127, 127, 127, 127), 2.0),
            minor_fill: Color::srgba_u8(127, 127, 127, FILL_ALPHA),
            fog: Color::srgba_u8(0x33, 0x33, 0x33, 0x66),
            disputed: Fill::Striped {
                base: Color::srgba_u8(127, 127, 127, 40),
                stripe: Color::srgba_u8(210, 210, 210, 90),
            },
            grid_line: Color::srgba_u8(0x3F, 0x3F, 0x3F, 0x5F),
            axis_line: Color::WHITE,
            scan: Stroke::solid(Color::srgba(0.45, 0.8, 1.0, 0.55), 1.0).with_dash(Dash::Sweep),
            route: Stroke::solid(Color::WHITE, 3.0).with_dash(Dash::Dotted),
            route_warning: Stroke::solid(Color::srgb(0.95, 0.2, 0.2), 3.0).with_dash(Dash::Dotted),
            trade_line: Stroke::solid(Color::srgb_u8(210, 180, 140), 2.0).with_dash(Dash::Dashed),
            trade_draft_valid: Stroke::solid(Color::srgb(0.2, 0.9, 0.3), 2.0),
            trade_draft_invalid: Stroke::solid(Color::srgb(0.95, 0.2, 0.2), 2.0),
            selection: Stroke::solid(Color::WHITE, 2.0),
            ship_range: Stroke::solid(Color::srgb(1.0, 0.9, 0.2), 1.0).with_dash(Dash::Dashed),
            text: Color::WHITE,
            label_box: Color::srgba(0.0, 0.0, 0.0, 0.7),
            trade_glyph: Color::srgb(1.0, 0.9, 0.2),
            trade_glyph_full: Color::srgb(0.2, 0.9, 0.3),
            trade_glyph_unused: Color::srgb(0.95, 0.2, 0.2),
            distress: Color::srgb(1.0, 0.25, 0.2),
            default_icon: IconId::new(DEFAULT_ICON),
            unknown_icon: IconId::new(UNKNOWN_ICON),
            multi_icon: IconId::new(MULTI_ICON),
        }
    }

    pub fn civ(&self, id: CivId) -> Option<&CivStyle> {
        self.civs.get(&id)
    }

    pub fn civ_color(&self, id: CivId) -> Color {
        self.civ(id).map_or(self.text, |style| style.color)
    }

    /// Empire border pen, or the grey minor-race pen.
    pub fn border_for(&self, owner: CivId) -> Stroke {
        match self.civ(owner) {
            Some(style) if style.is_empire => style.border,
            _ => self.minor_border,
        }
    }

    pub fn fill_for(&self, owner: CivId) -> Color {
        match self.civ(owner) {
            Some(style) if style.is_empire => style.colony_fill,
            _ => self.minor_fill,
        }
    }

    /// Every icon the grid can draw, without duplicates.
    pub fn icon_ids(&self) -> Vec<IconId> {
        let mut ids = vec![
            self.default_icon.clone(),
            self.unknown_icon.clone(),
            self.multi_icon.clone(),
        ];
        for style in self.civs.values() {
            if !ids.contains(&style.icon) {
                ids.push(style.icon.clone());
            }
        }
        ids
    }

    pub fn icon_for(&self, owner: CivId) -> IconId {
        self.civ(owner)
            .map_or_else(|| self.default_icon.clone(), |style| style.icon.clone())
    }

    pub fn star_color(&self, star: StarType) -> Color {
        let (r, g, b) = match star {
            StarType::White => (255, 255, 255),
            StarType::Blue => (120, 160, 255),
            StarType::Yellow => (255, 230, 100),
            StarType::Orange => (255, 160, 60),
            StarType::Red => (230, 70, 50),
            StarType::Nebula => (190, 110, 220),
            StarType::Wormhole => (90, 200, 255),
            StarType::NeutronStar => (200, 220, 255),
            StarType::RadioPulsar => (160, 255, 200),
            StarType::XRayPulsar => (220, 255, 160),
            StarType::Quasar => (255, 120, 255),
            StarType::BlackHole => (60, 40, 70),
        };
        Color::srgb_u8(r, g, b)
    }

    pub fn star_radius(&self, star: StarType) -> f32 {
        match star {
            StarType::Nebula => 16.0,
            StarType::Wormhole | StarType::BlackHole => 9.0,
            StarType::Quasar => 8.0,
            _ => 6.0,
        }
    }
}

/// Civ colour mixed with mid grey, readable on the dark map.
pub fn lighten(color: (u8, u8, u8)) -> Color {
    let mix = |c: u8| ((c as u16 + 128).min(255)) as u8;
    Color::srgb_u8(mix(color.0), mix(color.1), mix(color.2))
}

pub fn with_opacity(color: Color, opacity: f32) -> Color {
    let alpha = color.alpha() * opacity.clamp(0.0, 1.0);
    color.with_alpha(alpha)
}

// =============================================================================
// Tests
// =============================================================================
