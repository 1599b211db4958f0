//! Overlays rebuilt on every update: fleet routes, trade lines, the selection
//! box, plus the ship-range outline for the selected fleet.

use bevy::prelude::*;

use crate::grid::{sector_midpoint, sector_origin, MapLocation};
use crate::model::{Fleet, FleetId};
use crate::scene::layers::{Layer, SceneLayers, Shape, TextAlign};
use crate::scene::sectors::{outline_sides, GLYPH_FONT_SIZE};
use crate::scene::{Overlays, SceneContext};

const SELECTION_INSET: f32 = 2.0;
const SELECTION_SIZE: f32 = 69.0;
const ETA_BOX_WIDTH: f32 = 44.0;
const ETA_OFFSET: Vec2 = Vec2::new(-22.0, 10.0);

pub fn build_routes(ctx: &SceneContext, overlays: &Overlays, layers: &mut SceneLayers) {
    layers.clear(Layer::Routes);

    let drafting: Option<FleetId> = overlays.route_draft.map(|(fleet, _)| fleet);
    for fleet in ctx.galaxy.fleets() {
        if fleet.owner != ctx.viewer || fleet.route.is_empty() || Some(fleet.id) == drafting {
            continue;
        }
        push_route(ctx, layers, fleet, &fleet.route);
    }

    if let Some((fleet_id, draft)) = overlays.route_draft {
        let path = draft.display_path();
        if let Some(fleet) = ctx.galaxy.fleet(fleet_id) {
            if !path.is_empty() {
                push_route(ctx, layers, fleet, path);
            }
        }
    }
}

fn push_route(ctx: &SceneContext, layers: &mut SceneLayers, fleet: &Fleet, path: &[MapLocation]) {
    let Some(&last) = path.last() else {
        return;
    };

    let out_of_range = path
        .iter()
        .any(|&step| ctx.galaxy.fuel_range(ctx.viewer, step) > fleet.range);
    let stroke = if out_of_range {
        ctx.theme.route_warning
    } else {
        ctx.theme.route
    };

    let points = std::iter::once(sector_midpoint(fleet.location))
        .chain(path.iter().map(|&step| sector_midpoint(step)))
        .collect();
    layers.push(Layer::Routes, Shape::Polyline { points, stroke });

    if let Some(turns) = fleet.eta(path.len()) {
        layers.push(
            Layer::Routes,
            Shape::Text {
                origin: sector_midpoint(last) + ETA_OFFSET,
                width: ETA_BOX_WIDTH,
                lines: vec![format!("ETA {}", turns)],
                font_size: GLYPH_FONT_SIZE,
                color: ctx.theme.text,
                align: TextAlign::Center,
                background: Some(ctx.theme.label_box),
            },
        );
    }
}

pub fn build_trade_lines(ctx: &SceneContext, overlays: &Overlays, layers: &mut SceneLayers) {
    layers.clear(Layer::TradeLines);

    if ctx.options.show_trade_routes {
        for route in ctx.galaxy.trade_routes() {
            let Some(source) = ctx.galaxy.colony(route.source_colony) else {
                continue;
            };
            if source.owner != ctx.viewer {
                continue;
            }
            let Some(target) = route.target_colony.and_then(|id| ctx.galaxy.colony(id)) else {
                continue;
            };
            layers.push(
                Layer::TradeLines,
                Shape::Line {
                    from: sector_midpoint(source.location),
                    to: sector_midpoint(target.location),
                    stroke: ctx.theme.trade_line,
                },
            );
        }
    }

    if let Some(draft) = overlays.trade_draft {
        let stroke = if draft.valid {
            ctx.theme.trade_draft_valid
        } else {
            ctx.theme.trade_draft_invalid
        };
        layers.push(
            Layer::TradeLines,
            Shape::Line {
                from: draft.source,
                to: draft.end,
                stroke,
            },
        );
    }
}

pub fn build_selection(ctx: &SceneContext, selected: Option<MapLocation>, layers: &mut SceneLayers) {
    layers.clear(Layer::Selection);

    let Some(location) = selected else {
        return;
    };
    layers.push(
        Layer::Selection,
        Shape::Rect {
            min: sector_origin(location) + Vec2::splat(SELECTION_INSET),
            size: Vec2::splat(SELECTION_SIZE),
            fill: None,
            stroke: Some(ctx.theme.selection),
        },
    );
}

/// Outline of every cell the fleet can reach on its fuel.
pub fn build_ship_range(ctx: &SceneContext, fleet: Option<&Fleet>, layers: &mut SceneLayers) {
    layers.clear(Layer::ShipRange);

    let Some(fleet) = fleet else {
        return;
    };
    let dims = ctx.galaxy.dimensions();
    let in_range = |location: MapLocation| {
        dims.contains(location) && ctx.galaxy.fuel_range(ctx.viewer, location) <= fleet.range
    };

    for location in dims.locations().filter(|&location| in_range(location)) {
        for side in outline_sides(location, dims, in_range) {
            let (from, to) = side.segment(location);
            layers.push(
                Layer::ShipRange,
                Shape::Line {
                    from,
                    to,
                    stroke: ctx.theme.ship_range,
                },
            );
        }
    }
}
