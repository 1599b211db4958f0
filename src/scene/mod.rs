//! Scene Compositor: turns the galaxy view into retained layers of shapes and
//! paints them through a backend agnostic [`Canvas`].

pub mod animation;
pub mod labels;
pub mod layers;
pub mod overlays;
pub mod sectors;

use bevy::prelude::*;

use crate::civs::CivId;
use crate::fleets::{build_indicators, FleetIndicator, FLEET_ICON_SIZE};
use crate::grid::{world_to_viewport, MapLocation};
use crate::interaction::{RouteDraft, TradeLineDraft};
use crate::model::{Fleet, FleetId, GalaxyView};
use crate::theme::{with_opacity, Dash, Fill, IconId, Stroke, Theme};

use animation::{AmbientAnimations, ClockState};
use layers::{Layer, SceneLayers, Shape, TextAlign};

const DISTRESS_RING_WIDTH: f32 = 2.0;

// =============================================================================
// Inputs
// =============================================================================

/// View toggles the player can flip at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GridOptions {
    pub show_fleets: bool,
    pub show_star_names: bool,
    pub show_trade_routes: bool,
    pub animate: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            show_fleets: true,
            show_star_names: true,
            show_trade_routes: true,
            animate: true,
        }
    }
}

pub struct SceneContext<'a> {
    pub galaxy: &'a dyn GalaxyView,
    pub theme: &'a Theme,
    pub viewer: CivId,
    pub options: GridOptions,
}

/// Interaction state that feeds the per-update overlays.
#[derive(Clone, Copy, Default)]
pub struct Overlays<'a> {
    pub selected_sector: Option<MapLocation>,
    pub route_draft: Option<(FleetId, &'a RouteDraft)>,
    pub trade_draft: Option<&'a TradeLineDraft>,
}

/// Offset and scale that map world space into the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn apply(&self, world: Vec2) -> Vec2 {
        world_to_viewport(world, self.offset, self.scale)
    }
}

/// Drawing backend. Coordinates are viewport pixels, y down.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, fill: Fill);
    fn stroke_polyline(&mut self, points: &[Vec2], stroke: Stroke, dash_phase: f32);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        origin: Vec2,
        lines: &[String],
        font_size: f32,
        color: Color,
        align: TextAlign,
        width: f32,
        background: Option<Color>,
    );
    fn draw_icon(&mut self, rect: Rect, icon: &IconId);
}

// =============================================================================
// Compositor
// =============================================================================

#[derive(Debug, Default)]
pub struct SceneCompositor {
    layers: SceneLayers,
    indicators: Vec<FleetIndicator>,
    animations: Option<AmbientAnimations>,
    revision: u64,
}

impl SceneCompositor {
    pub fn new(animate: bool) -> Self {
        Self {
            animations: animate.then(AmbientAnimations::new),
            ..Default::default()
        }
    }

    /// Single composition entry point. Sector-derived layers are only rebuilt
    /// when asked; routes, trade lines and the selection always are.
    pub fn update(&mut self, ctx: &SceneContext, rebuild_sectors: bool, overlays: &Overlays) {
        if rebuild_sectors {
            for layer in [
                Layer::Backdrop,
                Layer::Borders,
                Layer::Sectors,
                Layer::StarNames,
                Layer::FleetIcons,
            ] {
                self.layers.clear(layer);
            }
            sectors::build_backdrop(ctx, &mut self.layers);
            sectors::build_sectors(ctx, &mut self.layers);
            self.rebuild_indicators(ctx);
        }

        self.refresh_routes(ctx, overlays);
        self.refresh_trade_lines(ctx, overlays);
        self.refresh_selection(ctx, overlays.selected_sector);
        self.revision += 1;
    }

    fn rebuild_indicators(&mut self, ctx: &SceneContext) {
        for indicator in self.indicators.iter_mut() {
            indicator.dispose();
        }
        self.indicators.clear();

        if !ctx.options.show_fleets {
            return;
        }
        self.indicators = build_indicators(ctx.galaxy, ctx.theme, ctx.viewer);
        for indicator in self.indicators.iter_mut() {
            if !ctx.options.animate {
                indicator.pause();
            }
            self.layers.push(
                Layer::FleetIcons,
                Shape::Icon {
                    min: indicator.origin,
                    size: FLEET_ICON_SIZE,
                    icon: indicator.icon.clone(),
                },
            );
        }
    }

    pub fn refresh_routes(&mut self, ctx: &SceneContext, overlays: &Overlays) {
        overlays::build_routes(ctx, overlays, &mut self.layers);
    }

    pub fn refresh_trade_lines(&mut self, ctx: &SceneContext, overlays: &Overlays) {
        overlays::build_trade_lines(ctx, overlays, &mut self.layers);
    }

    pub fn refresh_selection(&mut self, ctx: &SceneContext, selected: Option<MapLocation>) {
        overlays::build_selection(ctx, selected, &mut self.layers);
    }

    pub fn rebuild_ship_range(&mut self, ctx: &SceneContext, fleet: Option<&Fleet>) {
        overlays::build_ship_range(ctx, fleet, &mut self.layers);
    }

    /// Creates or drops the shared star and sweep clocks, and pauses or resumes
    /// every distress ring to match.
    pub fn set_animations_enabled(&mut self, enabled: bool) {
        if enabled {
            if self.animations.is_none() {
                self.animations = Some(AmbientAnimations::new());
            }
            self.indicators.iter_mut().for_each(FleetIndicator::resume);
        } else {
            self.animations = None;
            self.indicators.iter_mut().for_each(FleetIndicator::pause);
        }
    }

    pub fn animations_enabled(&self) -> bool {
        self.animations.is_some()
    }

    pub fn pause(&mut self) {
        if let Some(animations) = self.animations.as_mut() {
            animations.pause();
        }
        self.indicators.iter_mut().for_each(FleetIndicator::pause);
    }

    pub fn resume(&mut self) {
        if let Some(animations) = self.animations.as_mut() {
            animations.resume();
        }
        self.indicators.iter_mut().for_each(FleetIndicator::resume);
    }

    pub fn stop_animations(&mut self) {
        if let Some(animations) = self.animations.as_mut() {
            animations.stop();
        }
        self.indicators.iter_mut().for_each(FleetIndicator::stop);
    }

    /// Stopped clocks never run again; this swaps in fresh ones.
    pub fn restart_animations(&mut self) {
        if self.animations.is_some() {
            self.animations = Some(AmbientAnimations::new());
        }
    }

    /// Drops every shape and disposes every indicator.
    pub fn clear(&mut self) {
        self.layers.clear_all();
        for indicator in self.indicators.iter_mut() {
            indicator.dispose();
        }
        self.indicators.clear();
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(animations) = self.animations.as_mut() {
            animations.tick(dt);
        }
        for indicator in self.indicators.iter_mut() {
            indicator.tick(dt);
        }
    }

    pub fn layers(&self) -> &SceneLayers {
        &self.layers
    }

    pub fn indicators(&self) -> &[FleetIndicator] {
        &self.indicators
    }

    pub fn animation_state(&self) -> Option<ClockState> {
        self.animations.as_ref().map(AmbientAnimations::state)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // =========================================================================
    // Painting
    // =========================================================================

    pub fn paint(
        &self,
        canvas: &mut dyn Canvas,
        theme: &Theme,
        transform: &ViewTransform,
        star_names_visible: bool,
    ) {
        let sweep = self
            .animations
            .as_ref()
            .map_or(0.0, AmbientAnimations::sweep_phase);

        for (layer, shapes) in self.layers.iter() {
            if layer == Layer::StarNames && !star_names_visible {
                continue;
            }
            let opacity = layer.opacity();
            for shape in shapes {
                self.paint_shape(canvas, transform, shape, opacity, sweep);
            }
            if layer == Layer::FleetIcons {
                self.paint_distress(canvas, theme, transform);
            }
        }
    }

    fn paint_shape(
        &self,
        canvas: &mut dyn Canvas,
        transform: &ViewTransform,
        shape: &Shape,
        opacity: f32,
        sweep: f32,
    ) {
        let scale = transform.scale;
        match shape {
            Shape::Line { from, to, stroke } => {
                let points = [transform.apply(*from), transform.apply(*to)];
                canvas.stroke_polyline(&points, scaled(*stroke, scale, opacity), dash_phase(*stroke, sweep));
            }
            Shape::Polyline { points, stroke } => {
                let points: Vec<Vec2> = points.iter().map(|&p| transform.apply(p)).collect();
                canvas.stroke_polyline(&points, scaled(*stroke, scale, opacity), dash_phase(*stroke, sweep));
            }
            Shape::Rect {
                min,
                size,
                fill,
                stroke,
            } => {
                let a = transform.apply(*min);
                let b = transform.apply(*min + *size);
                if let Some(fill) = fill {
                    canvas.fill_rect(Rect::from_corners(a, b), faded_fill(*fill, opacity));
                }
                if let Some(stroke) = stroke {
                    let outline = [a, Vec2::new(b.x, a.y), b, Vec2::new(a.x, b.y), a];
                    canvas.stroke_polyline(&outline, scaled(*stroke, scale, opacity), 0.0);
                }
            }
            Shape::Star {
                center,
                star,
                radius,
                color,
            } => {
                let (star_scale, star_opacity) = self
                    .animations
                    .as_ref()
                    .map_or((1.0, 1.0), |anim| (anim.star_scale(*star), anim.star_opacity(*star)));
                canvas.fill_circle(
                    transform.apply(*center),
                    radius * star_scale * scale,
                    with_opacity(*color, star_opacity * opacity),
                );
            }
            Shape::Text {
                origin,
                width,
                lines,
                font_size,
                color,
                align,
                background,
            } => {
                canvas.draw_text(
                    transform.apply(*origin),
                    lines,
                    font_size * scale,
                    with_opacity(*color, opacity),
                    *align,
                    width * scale,
                    background.map(|bg| with_opacity(bg, opacity)),
                );
            }
            Shape::Icon { min, size, icon } => {
                let a = transform.apply(*min);
                let b = transform.apply(*min + Vec2::splat(*size));
                canvas.draw_icon(Rect::from_corners(a, b), icon);
            }
        }
    }

    fn paint_distress(&self, canvas: &mut dyn Canvas, theme: &Theme, transform: &ViewTransform) {
        for indicator in &self.indicators {
            let Some(ring) = indicator.distress.as_ref() else {
                continue;
            };
            let stroke = Stroke::solid(
                with_opacity(theme.distress, ring.alpha()),
                DISTRESS_RING_WIDTH * transform.scale,
            );
            canvas.stroke_circle(
                transform.apply(indicator.center()),
                ring.radius() * transform.scale,
                stroke,
            );
        }
    }
}

fn scaled(stroke: Stroke, scale: f32, opacity: f32) -> Stroke {
    Stroke {
        color: with_opacity(stroke.color, opacity),
        width: stroke.width * scale,
        dash: stroke.dash,
    }
}

fn dash_phase(stroke: Stroke, sweep: f32) -> f32 {
    match stroke.dash {
        Dash::Sweep => sweep,
        _ => 0.0,
    }
}

fn faded_fill(fill: Fill, opacity: f32) -> Fill {
    match fill {
        Fill::Solid(color) => Fill::Solid(with_opacity(color, opacity)),
        Fill::Striped { base, stripe } => Fill::Striped {
            base: with_opacity(base, opacity),
            stripe: with_opacity(stripe, opacity),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::civs::CivCatalog;
    use crate::grid::{sector_origin, Side};
    use crate::model::{
        Colony, ColonyId, StarSystem, StarType, Station, TradeRoute, TradeRouteId, TradeRouteStatus,
    };
    use crate::snapshot::{test_civs, test_fleet, GalaxySnapshot};

    const VIEWER: CivId = CivId(1);
    const RIVAL: CivId = CivId(2);

    /// Canvas that records what would have been drawn.
    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub lines: usize,
        pub rects: usize,
        pub circles: Vec<(Vec2, f32)>,
        pub rings: usize,
        pub texts: Vec<String>,
        pub icons: Vec<IconId>,
    }

    impl Canvas for RecordingCanvas {
        fn fill_rect(&mut self, _rect: Rect, _fill: Fill) {
            self.rects += 1;
        }

        fn stroke_polyline(&mut self, _points: &[Vec2], _stroke: Stroke, _dash_phase: f32) {
            self.lines += 1;
        }

        fn stroke_circle(&mut self, _center: Vec2, _radius: f32, _stroke: Stroke) {
            self.rings += 1;
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, _color: Color) {
            self.circles.push((center, radius));
        }

        fn draw_text(
            &mut self,
            _origin: Vec2,
            lines: &[String],
            _font_size: f32,
            _color: Color,
            _align: TextAlign,
            _width: f32,
            _background: Option<Color>,
        ) {
            self.texts.push(lines.join(" "));
        }

        fn draw_icon(&mut self, _rect: Rect, icon: &IconId) {
            self.icons.push(icon.clone());
        }
    }

    fn galaxy() -> GalaxySnapshot {
        let mut galaxy = GalaxySnapshot::new(6, 6, test_civs());
        galaxy.add_sensor(VIEWER, MapLocation::new(1, 1), 2, 2);
        galaxy.add_system(StarSystem {
            location: MapLocation::new(1, 1),
            name: "Sol".to_string(),
            star_type: StarType::Yellow,
            owner: Some(VIEWER),
            colony: None,
        });
        galaxy.add_system(StarSystem {
            location: MapLocation::new(2, 1),
            name: "Vega".to_string(),
            star_type: StarType::Blue,
            owner: Some(VIEWER),
            colony: None,
        });
        // Hidden: far outside the sensor range.
        galaxy.add_system(StarSystem {
            location: MapLocation::new(5, 5),
            name: "Dis".to_string(),
            star_type: StarType::Red,
            owner: Some(RIVAL),
            colony: None,
        });
        galaxy.explore(VIEWER, MapLocation::new(2, 1));
        galaxy
    }

    fn theme() -> Theme {
        Theme::from_catalog(&CivCatalog::new(test_civs()))
    }

    fn compose(galaxy: &GalaxySnapshot, theme: &Theme) -> SceneCompositor {
        let ctx = SceneContext {
            galaxy,
            theme,
            viewer: VIEWER,
            options: GridOptions::default(),
        };
        let mut compositor = SceneCompositor::new(true);
        compositor.update(&ctx, true, &Overlays::default());
        compositor
    }

    fn border_segments(compositor: &SceneCompositor) -> Vec<(Vec2, Vec2)> {
        compositor
            .layers()
            .shapes(Layer::Borders)
            .iter()
            .filter_map(|shape| match shape {
                Shape::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn update_twice_is_identical() {
        let galaxy = galaxy();
        let theme = theme();
        let ctx = SceneContext {
            galaxy: &galaxy,
            theme: &theme,
            viewer: VIEWER,
            options: GridOptions::default(),
        };
        let mut compositor = SceneCompositor::new(true);
        compositor.update(&ctx, true, &Overlays::default());
        let first = compositor.layers().clone();
        compositor.update(&ctx, true, &Overlays::default());
        assert_eq!(&first, compositor.layers());
        assert_eq!(compositor.revision(), 2);
    }

    #[test]
    fn shared_edge_between_same_owner_is_not_drawn() {
        let galaxy = galaxy();
        let theme = theme();
        let compositor = compose(&galaxy, &theme);
        let segments = border_segments(&compositor);

        let shared = Side::East.segment(MapLocation::new(1, 1));
        assert!(!segments.contains(&shared));
        assert!(!segments.contains(&Side::West.segment(MapLocation::new(2, 1))));
        // Each of the two cells has three outward edges.
        assert_eq!(segments.len(), 6);
    }

    #[test]
    fn neighbouring_owners_each_draw_their_own_edge() {
        let mut galaxy = GalaxySnapshot::new(6, 6, test_civs());
        galaxy.add_sensor(VIEWER, MapLocation::new(1, 1), 2, 2);
        galaxy.add_contact(VIEWER, RIVAL);
        for (x, name, owner) in [(1, "Sol", VIEWER), (2, "Altair", RIVAL)] {
            galaxy.add_system(StarSystem {
                location: MapLocation::new(x, 1),
                name: name.to_string(),
                star_type: StarType::Yellow,
                owner: Some(owner),
                colony: None,
            });
        }
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        // Both sides of the shared edge cover the same points; the pen tells
        // which cell drew each one.
        let count = |segment: (Vec2, Vec2), owner: CivId| {
            let pen = theme.border_for(owner);
            compositor
                .layers()
                .shapes(Layer::Borders)
                .iter()
                .filter(|shape| {
                    matches!(shape, Shape::Line { from, to, stroke }
                        if (*from, *to) == segment && *stroke == pen)
                })
                .count()
        };
        assert_eq!(count(Side::East.segment(MapLocation::new(1, 1)), VIEWER), 1);
        assert_eq!(count(Side::West.segment(MapLocation::new(2, 1)), RIVAL), 1);
        assert_eq!(border_segments(&compositor).len(), 8);
    }

    #[test]
    fn unscanned_sector_is_fogged_without_borders() {
        let galaxy = galaxy();
        let theme = theme();
        let compositor = compose(&galaxy, &theme);
        let hidden = MapLocation::new(5, 5);

        let fog = compositor
            .layers()
            .shapes(Layer::Sectors)
            .iter()
            .filter(|shape| {
                matches!(shape, Shape::Rect { min, fill: Some(Fill::Solid(color)), .. }
                    if *min == sector_origin(hidden) && *color == theme.fog)
            })
            .count();
        assert_eq!(fog, 1);

        let hidden_edges: Vec<(Vec2, Vec2)> = Side::ALL.iter().map(|side| side.segment(hidden)).collect();
        assert!(border_segments(&compositor)
            .iter()
            .all(|segment| !hidden_edges.contains(segment)));
        let stars = compositor
            .layers()
            .shapes(Layer::Sectors)
            .iter()
            .filter(|shape| matches!(shape, Shape::Star { .. }))
            .count();
        assert_eq!(stars, 2);
    }

    #[test]
    fn star_names_need_exploration() {
        let galaxy = galaxy();
        let theme = theme();
        let compositor = compose(&galaxy, &theme);
        let names: Vec<&Vec<String>> = compositor
            .layers()
            .shapes(Layer::StarNames)
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text { lines, .. } => Some(lines),
                _ => None,
            })
            .collect();
        // Sol has a sensor on it and counts as explored.
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|lines| lines[0] == "Vega"));
    }

    #[test]
    fn disputed_sector_gets_striped_fill() {
        let mut galaxy = galaxy();
        galaxy.add_contact(VIEWER, RIVAL);
        galaxy.add_claim(MapLocation::new(0, 2), VIEWER, 3);
        galaxy.add_claim(MapLocation::new(0, 2), RIVAL, 2);
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        let striped = compositor
            .layers()
            .shapes(Layer::Sectors)
            .iter()
            .filter(|shape| matches!(shape, Shape::Rect { fill: Some(Fill::Striped { .. }), .. }))
            .count();
        assert_eq!(striped, 1);
    }

    #[test]
    fn station_and_trade_glyphs() {
        let mut galaxy = galaxy();
        galaxy.add_station(Station {
            location: MapLocation::new(2, 2),
            owner: RIVAL,
            name: "Outpost".to_string(),
        });
        galaxy.set_trade_status(
            MapLocation::new(1, 1),
            TradeRouteStatus {
                indicator: 2,
                assigned: 2,
                unused: 0,
            },
        );
        galaxy.set_trade_status(
            MapLocation::new(2, 2),
            TradeRouteStatus {
                indicator: 99,
                assigned: 0,
                unused: 0,
            },
        );
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        let glyphs: Vec<(String, Color)> = compositor
            .layers()
            .shapes(Layer::Sectors)
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text { lines, color, .. } => Some((lines.join(""), *color)),
                _ => None,
            })
            .collect();
        assert!(glyphs.contains(&("S".to_string(), theme.text)));
        assert!(glyphs.contains(&("T:2".to_string(), theme.trade_glyph_full)));
        assert_eq!(glyphs.len(), 2);
    }

    #[test]
    fn routes_are_drawn_for_viewer_fleets_with_eta() {
        let mut galaxy = galaxy();
        let mut fleet = test_fleet(1, VIEWER, MapLocation::new(0, 0));
        fleet.route = vec![MapLocation::new(1, 1), MapLocation::new(2, 2), MapLocation::new(3, 3)];
        galaxy.add_fleet(fleet);
        let mut foreign = test_fleet(2, RIVAL, MapLocation::new(1, 1));
        foreign.route = vec![MapLocation::new(2, 1)];
        galaxy.add_fleet(foreign);
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        let routes = compositor.layers().shapes(Layer::Routes);
        assert_eq!(routes.len(), 2);
        match &routes[0] {
            Shape::Polyline { points, stroke } => {
                assert_eq!(points.len(), 4);
                // No supply anywhere, so every step is beyond fuel range.
                assert_eq!(*stroke, theme.route_warning);
            }
            other => panic!("unexpected shape {:?}", other),
        }
        match &routes[1] {
            Shape::Text { lines, .. } => assert_eq!(lines, &vec!["ETA 2".to_string()]),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn route_draft_replaces_committed_route() {
        let mut galaxy = galaxy();
        galaxy.add_supply(VIEWER, MapLocation::new(1, 1));
        let mut fleet = test_fleet(1, VIEWER, MapLocation::new(1, 1));
        fleet.route = vec![MapLocation::new(2, 2)];
        galaxy.add_fleet(fleet);
        let theme = theme();
        let ctx = SceneContext {
            galaxy: &galaxy,
            theme: &theme,
            viewer: VIEWER,
            options: GridOptions::default(),
        };
        let draft = RouteDraft {
            waypoints: vec![MapLocation::new(1, 2)],
            path: vec![MapLocation::new(1, 2)],
            preview: Some(vec![MapLocation::new(1, 2), MapLocation::new(1, 3)]),
            last_sector: None,
        };
        let overlays = Overlays {
            route_draft: Some((FleetId(1), &draft)),
            ..Default::default()
        };
        let mut compositor = SceneCompositor::new(false);
        compositor.update(&ctx, false, &overlays);

        match &compositor.layers().shapes(Layer::Routes)[0] {
            Shape::Polyline { points, stroke } => {
                assert_eq!(points.len(), 3);
                assert_eq!(*stroke, theme.route);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn trade_lines_follow_option_and_draft() {
        let mut galaxy = galaxy();
        galaxy.add_colony(Colony {
            id: ColonyId(1),
            owner: VIEWER,
            location: MapLocation::new(1, 1),
            name: "Earth".to_string(),
            facilities: Vec::new(),
        });
        galaxy.add_colony(Colony {
            id: ColonyId(2),
            owner: VIEWER,
            location: MapLocation::new(2, 1),
            name: "Vega II".to_string(),
            facilities: Vec::new(),
        });
        galaxy.add_trade_route(TradeRoute {
            id: TradeRouteId(1),
            source_colony: ColonyId(1),
            target_colony: Some(ColonyId(2)),
        });
        let theme = theme();
        let mut options = GridOptions::default();
        let draft = TradeLineDraft {
            route: TradeRouteId(1),
            source: Vec2::new(108.0, 108.0),
            end: Vec2::new(10.0, 10.0),
            hovered_colony: None,
            valid: false,
        };
        let overlays = Overlays {
            trade_draft: Some(&draft),
            ..Default::default()
        };

        let mut compositor = SceneCompositor::new(false);
        let ctx = SceneContext {
            galaxy: &galaxy,
            theme: &theme,
            viewer: VIEWER,
            options,
        };
        compositor.update(&ctx, false, &overlays);
        assert_eq!(compositor.layers().shapes(Layer::TradeLines).len(), 2);

        options.show_trade_routes = false;
        let ctx = SceneContext { options, ..ctx };
        compositor.update(&ctx, false, &overlays);
        let lines = compositor.layers().shapes(Layer::TradeLines);
        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], Shape::Line { stroke, .. } if *stroke == theme.trade_draft_invalid));
    }

    #[test]
    fn selection_box_is_inset() {
        let galaxy = galaxy();
        let theme = theme();
        let ctx = SceneContext {
            galaxy: &galaxy,
            theme: &theme,
            viewer: VIEWER,
            options: GridOptions::default(),
        };
        let mut compositor = SceneCompositor::new(false);
        compositor.refresh_selection(&ctx, Some(MapLocation::new(1, 0)));
        let selection = compositor.layers().shapes(Layer::Selection);
        assert_eq!(
            selection,
            &[Shape::Rect {
                min: Vec2::new(74.0, 2.0),
                size: Vec2::splat(69.0),
                fill: None,
                stroke: Some(theme.selection),
            }]
        );
    }

    #[test]
    fn ship_range_outlines_reachable_cells() {
        let mut galaxy = galaxy();
        galaxy.add_supply(VIEWER, MapLocation::new(0, 0));
        let theme = theme();
        let ctx = SceneContext {
            galaxy: &galaxy,
            theme: &theme,
            viewer: VIEWER,
            options: GridOptions::default(),
        };
        let mut fleet = test_fleet(1, VIEWER, MapLocation::new(0, 0));
        fleet.range = 0;
        let mut compositor = SceneCompositor::new(false);
        compositor.rebuild_ship_range(&ctx, Some(&fleet));
        assert_eq!(compositor.layers().shapes(Layer::ShipRange).len(), 4);
        compositor.rebuild_ship_range(&ctx, None);
        assert!(compositor.layers().shapes(Layer::ShipRange).is_empty());
    }

    #[test]
    fn animation_flag_drops_shared_clocks() {
        let mut compositor = SceneCompositor::new(true);
        assert!(compositor.animations_enabled());
        compositor.set_animations_enabled(false);
        assert!(!compositor.animations_enabled());
        assert_eq!(compositor.animation_state(), None);
        compositor.set_animations_enabled(true);
        assert_eq!(compositor.animation_state(), Some(ClockState::Running));
        compositor.stop_animations();
        assert_eq!(compositor.animation_state(), Some(ClockState::Stopped));
    }

    #[test]
    fn paint_hides_star_names_when_too_small() {
        let galaxy = galaxy();
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        let mut canvas = RecordingCanvas::default();
        compositor.paint(&mut canvas, &theme, &ViewTransform::default(), true);
        assert!(canvas.texts.iter().any(|text| text == "Vega"));
        assert_eq!(canvas.circles.len(), 2);

        let mut canvas = RecordingCanvas::default();
        compositor.paint(&mut canvas, &theme, &ViewTransform::default(), false);
        assert!(canvas.texts.is_empty());
    }

    #[test]
    fn distress_ring_painted_with_indicator() {
        let mut galaxy = galaxy();
        let mut fleet = test_fleet(1, VIEWER, MapLocation::new(1, 1));
        fleet.in_distress = true;
        galaxy.add_fleet(fleet);
        let theme = theme();
        let compositor = compose(&galaxy, &theme);

        let mut canvas = RecordingCanvas::default();
        compositor.paint(
            &mut canvas,
            &theme,
            &ViewTransform {
                offset: Vec2::new(10.0, 0.0),
                scale: 0.5,
            },
            true,
        );
        assert_eq!(canvas.icons, vec![IconId::new("terran")]);
        assert_eq!(canvas.rings, 1);
    }
}
