//! Per-cell composition: backdrop grid, borders, fills, scan lines, stars and
//! the small glyphs drawn inside a sector.

use bevy::prelude::*;

use crate::civs::CivId;
use crate::grid::{sector_midpoint, sector_origin, GridDimensions, MapLocation, Side, SECTOR_SIZE};
use crate::model::StarType;
use crate::perception::{is_disputed, perceived_owner};
use crate::scene::labels::{wrap_label, STAR_NAME_FONT_SIZE};
use crate::scene::layers::{Layer, SceneLayers, Shape, TextAlign};
use crate::scene::SceneContext;
use crate::theme::{Fill, Stroke};

pub const GLYPH_FONT_SIZE: f32 = 11.0;
const NAME_INSET: f32 = 3.0;
const NAME_BASELINE: f32 = 48.0;
const STATION_GLYPH_OFFSET: Vec2 = Vec2::new(4.0, 28.0);
const TRADE_GLYPH_OFFSET: Vec2 = Vec2::new(44.0, 28.0);

/// Grid lines on every row and column plus the two centre axes.
pub fn build_backdrop(ctx: &SceneContext, layers: &mut SceneLayers) {
    let dims = ctx.galaxy.dimensions();
    let extent = dims.extent();
    let grid = Stroke::solid(ctx.theme.grid_line, 1.0);

    for x in 0..=dims.width {
        let px = x as f32 * SECTOR_SIZE;
        layers.push(Layer::Backdrop, line(Vec2::new(px, 0.0), Vec2::new(px, extent.y), grid));
    }
    for y in 0..=dims.height {
        let py = y as f32 * SECTOR_SIZE;
        layers.push(Layer::Backdrop, line(Vec2::new(0.0, py), Vec2::new(extent.x, py), grid));
    }

    let axis = Stroke::solid(ctx.theme.axis_line, 1.0);
    let mid_x = (dims.width / 2) as f32 * SECTOR_SIZE;
    let mid_y = (dims.height / 2) as f32 * SECTOR_SIZE;
    layers.push(Layer::Backdrop, line(Vec2::new(mid_x, 0.0), Vec2::new(mid_x, extent.y), axis));
    layers.push(Layer::Backdrop, line(Vec2::new(0.0, mid_y), Vec2::new(extent.x, mid_y), axis));
}

/// Borders, sector contents and star names, one pass over every cell.
pub fn build_sectors(ctx: &SceneContext, layers: &mut SceneLayers) {
    let galaxy = ctx.galaxy;
    let dims = galaxy.dimensions();
    let viewer = ctx.viewer;

    for location in dims.locations() {
        let origin = sector_origin(location);

        if !galaxy.is_scanned(viewer, location) {
            layers.push(
                Layer::Sectors,
                Shape::Rect {
                    min: origin,
                    size: Vec2::splat(SECTOR_SIZE),
                    fill: Some(Fill::Solid(ctx.theme.fog)),
                    stroke: None,
                },
            );
            continue;
        }

        let owner = perceived_owner(galaxy, location, viewer);
        push_borders(ctx, layers, location, owner);

        let system = galaxy.system_at(location);
        let has_colony = system.is_some_and(|system| system.colony.is_some());
        let fill = if !has_colony && is_disputed(galaxy, location, viewer) {
            Some(ctx.theme.disputed)
        } else {
            owner.map(|owner| Fill::Solid(ctx.theme.fill_for(owner)))
        };
        if let Some(fill) = fill {
            layers.push(
                Layer::Sectors,
                Shape::Rect {
                    min: origin,
                    size: Vec2::splat(SECTOR_SIZE),
                    fill: Some(fill),
                    stroke: None,
                },
            );
        }

        let strength = galaxy.scan_strength(viewer, location);
        if strength > 0 {
            let scanned = |neighbor: MapLocation| galaxy.scan_strength(viewer, neighbor) > 0;
            for side in outline_sides(location, dims, scanned) {
                let (from, to) = side.segment(location);
                layers.push(Layer::Sectors, line(from, to, ctx.theme.scan));
            }
        }

        if let Some(system) = system {
            layers.push(
                Layer::Sectors,
                Shape::Star {
                    center: sector_midpoint(location),
                    star: system.star_type,
                    radius: ctx.theme.star_radius(system.star_type),
                    color: ctx.theme.star_color(system.star_type),
                },
            );

            if ctx.options.show_star_names
                && galaxy.is_explored(viewer, location)
                && system.star_type.is_nameable()
            {
                push_star_name(ctx, layers, location, origin);
            }
        }

        if let Some(station) = galaxy.station_at(location) {
            if station.owner == viewer || strength > 0 {
                let color = if galaxy.contact_made(viewer, station.owner) {
                    ctx.theme.civ_color(station.owner)
                } else {
                    ctx.theme.text
                };
                layers.push(Layer::Sectors, glyph(origin + STATION_GLYPH_OFFSET, "S".to_string(), color));
            }
        }

        let status = galaxy.trade_route_status(location);
        if status.is_displayable() && owner == Some(viewer) {
            debug!(
                "Trade routes at {}: {} possible, {} assigned, {} unused",
                location, status.indicator, status.assigned, status.unused
            );
            let color = if status.unused > 0 {
                ctx.theme.trade_glyph_unused
            } else if status.assigned == status.indicator {
                ctx.theme.trade_glyph_full
            } else {
                ctx.theme.trade_glyph
            };
            layers.push(
                Layer::Sectors,
                glyph(origin + TRADE_GLYPH_OFFSET, format!("T:{}", status.indicator), color),
            );
        }
    }
}

/// Sides of `location` that bound the region described by `inside`. West and
/// north are always drawn; east and south only at the map edge or where the
/// neighbour falls outside the region, so shared edges are drawn once.
pub fn outline_sides(
    location: MapLocation,
    dims: GridDimensions,
    inside: impl Fn(MapLocation) -> bool,
) -> Vec<Side> {
    let mut sides = vec![Side::West, Side::North];
    if location.x == dims.width - 1 || !inside(location.neighbor(Side::East)) {
        sides.push(Side::East);
    }
    if location.y == dims.height - 1 || !inside(location.neighbor(Side::South)) {
        sides.push(Side::South);
    }
    sides
}

fn push_borders(
    ctx: &SceneContext,
    layers: &mut SceneLayers,
    location: MapLocation,
    owner: Option<CivId>,
) {
    let Some(owner) = owner else {
        return;
    };
    let dims = ctx.galaxy.dimensions();
    let pen = ctx.theme.border_for(owner);

    for side in Side::ALL {
        let neighbor = location.neighbor(side);
        let differs = !dims.contains(neighbor)
            || perceived_owner(ctx.galaxy, neighbor, ctx.viewer) != Some(owner);
        if differs {
            let (from, to) = side.segment(location);
            layers.push(Layer::Borders, line(from, to, pen));
        }
    }
}

fn push_star_name(ctx: &SceneContext, layers: &mut SceneLayers, location: MapLocation, origin: Vec2) {
    let Some(system) = ctx.galaxy.system_at(location) else {
        return;
    };
    let label = match system.star_type {
        StarType::Nebula => format!("{} Nebula", system.name),
        StarType::Wormhole => format!("{} Wormhole", system.name),
        _ => system.name.clone(),
    };
    let width = SECTOR_SIZE - 2.0 * NAME_INSET;
    let lines = wrap_label(&label, width, STAR_NAME_FONT_SIZE, 2);
    if lines.is_empty() {
        return;
    }
    let top = if lines.len() > 1 { -2.0 } else { 4.0 };

    let color = match (system.colony, system.owner) {
        (Some(_), Some(owner))
            if ctx.galaxy.civilizations().is_empire(owner)
                && (owner == ctx.viewer || ctx.galaxy.contact_made(ctx.viewer, owner)) =>
        {
            ctx.theme
                .civ(owner)
                .map_or(ctx.theme.text, |style| style.colony_name)
        }
        _ => ctx.theme.text,
    };

    layers.push(
        Layer::StarNames,
        Shape::Text {
            origin: origin + Vec2::new(NAME_INSET, NAME_BASELINE + top),
            width,
            lines,
            font_size: STAR_NAME_FONT_SIZE,
            color,
            align: TextAlign::Center,
            background: None,
        },
    );
}

fn line(from: Vec2, to: Vec2, stroke: Stroke) -> Shape {
    Shape::Line { from, to, stroke }
}

fn glyph(origin: Vec2, text: String, color: Color) -> Shape {
    Shape::Text {
        origin,
        width: SECTOR_SIZE / 2.0,
        lines: vec![text],
        font_size: GLYPH_FONT_SIZE,
        color,
        align: TextAlign::Left,
        background: None,
    }
}
