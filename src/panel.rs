//! The galaxy grid control: composes the viewport, the scene, fleet
//! indicators and the interaction state machine behind `layout`, `paint`,
//! `hit_test` and `tick`.

use bevy::prelude::*;

use crate::bus::{
    Notification, NotificationBus, NotificationKind, ObserverHandle, SectorObservers, Subscription,
};
use crate::civs::CivId;
use crate::fleets::FleetIndicator;
use crate::grid::{screen_to_sector, sector_midpoint, GridDimensions, MapLocation};
use crate::interaction::{InputMode, InteractionController, Services};
use crate::model::{FleetId, GalaxyView, Pathfinder, TradeRouteId};
use crate::perception::perceived_owner;
use crate::scene::animation::ClockState;
use crate::scene::layers::SceneLayers;
use crate::scene::{Canvas, GridOptions, Overlays, SceneCompositor, SceneContext};
use crate::theme::Theme;
use crate::viewport::{Quadrant, ViewportController};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Modifiers {
    /// Held to add waypoints without committing, or to drag-scroll.
    pub ctrl: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HitTarget {
    FleetIndicator(usize),
    Sector(MapLocation),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelEvent {
    /// A colony sector of the viewer was double clicked.
    SectorDoubleClicked(MapLocation),
}

#[derive(Resource)]
pub struct GalaxyGridPanel {
    theme: Theme,
    viewer: CivId,
    options: GridOptions,
    viewport: ViewportController,
    compositor: SceneCompositor,
    interaction: InteractionController,
    selected_sector: Option<MapLocation>,
    hovered_sector: Option<MapLocation>,
    selected_observers: SectorObservers,
    hovered_observers: SectorObservers,
    subscription: Option<Subscription>,
    loaded: bool,
    visible: bool,
    events: Vec<PanelEvent>,
}

impl GalaxyGridPanel {
    pub fn new(theme: Theme, viewer: CivId, dims: GridDimensions, options: GridOptions) -> Self {
        Self {
            theme,
            viewer,
            options,
            viewport: ViewportController::new(dims),
            compositor: SceneCompositor::new(options.animate),
            interaction: InteractionController::new(viewer),
            selected_sector: None,
            hovered_sector: None,
            selected_observers: SectorObservers::default(),
            hovered_observers: SectorObservers::default(),
            subscription: None,
            loaded: false,
            visible: true,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // Control surface
    // =========================================================================

    /// Takes whatever space the host offers.
    pub fn layout(&mut self, available: Vec2) -> Vec2 {
        if available != self.viewport.viewport() {
            self.viewport.set_viewport_size(available);
        }
        available
    }

    pub fn paint(&self, canvas: &mut dyn Canvas) {
        if !self.loaded || !self.visible {
            return;
        }
        let star_names = self.options.show_star_names && self.viewport.star_names_visible();
        self.compositor
            .paint(canvas, &self.theme, &self.viewport.transform(), star_names);
    }

    /// What lies under a viewport point. `None` outside the map.
    pub fn hit_test(&self, point: Vec2) -> Option<HitTarget> {
        let size = self.viewport.viewport();
        if point.x < 0.0 || point.y < 0.0 || point.x > size.x || point.y > size.y {
            return None;
        }
        let world = self.viewport.to_world(point);
        let extent = self.viewport.dimensions().extent();
        if world.x < 0.0 || world.y < 0.0 || world.x >= extent.x || world.y >= extent.y {
            return None;
        }

        if let Some(index) = self
            .compositor
            .indicators()
            .iter()
            .rposition(|indicator| indicator.contains(world))
        {
            return Some(HitTarget::FleetIndicator(index));
        }
        Some(HitTarget::Sector(screen_to_sector(world, self.viewport.dimensions())))
    }

    fn hit_sector(&self, hit: HitTarget) -> MapLocation {
        match hit {
            HitTarget::Sector(location) => location,
            HitTarget::FleetIndicator(index) => self
                .compositor
                .indicators()
                .get(index)
                .map_or(MapLocation::new(0, 0), |indicator| indicator.location),
        }
    }

    /// Per-frame work: pending refresh requests, viewport animation and
    /// clocks. Returns true when the panel should be repainted.
    pub fn tick(&mut self, dt: f32, galaxy: &dyn GalaxyView, bus: &mut NotificationBus) -> bool {
        if !self.loaded {
            return false;
        }

        let refresh = self.subscription.as_ref().is_some_and(|sub| {
            bus.take(sub)
                .iter()
                .any(|notification| *notification == Notification::ScreenRefreshRequired)
        });
        if refresh {
            self.refresh(galaxy, bus);
        }

        let moved = self.viewport.tick(dt);
        if self.visible {
            self.compositor.tick(dt);
        }
        refresh || moved || self.visible
    }

    /// Full recomposition after the game state changed.
    pub fn refresh(&mut self, galaxy: &dyn GalaxyView, bus: &mut NotificationBus) {
        self.interaction.revalidate(galaxy, bus);
        self.recompose(galaxy, true);
        self.refresh_ship_range(galaxy);
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    pub fn pointer_pressed(
        &mut self,
        point: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        click_count: u32,
        services: &mut Services,
    ) -> bool {
        if !self.loaded {
            return false;
        }
        let galaxy = services.galaxy;

        match button {
            PointerButton::Left => {}
            PointerButton::Right => {
                if self.interaction.mode() == InputMode::Default {
                    return false;
                }
                self.interaction.set_mode(InputMode::Default, services.bus);
                self.after_mode_exit(galaxy);
                return true;
            }
            PointerButton::Middle => return false,
        }

        let hit = self.hit_test(point);
        let previous_fleet = self.interaction.selected_fleet();

        if self.interaction.mode() == InputMode::Default {
            if modifiers.ctrl && previous_fleet.is_none() {
                self.viewport.begin_drag(point);
                return true;
            }

            if let Some(HitTarget::FleetIndicator(index)) = hit {
                if let Some(click) = self.compositor.indicators().get(index).map(FleetIndicator::click) {
                    self.set_selected_sector(Some(click.sector), galaxy);
                    if click.fleet.is_some() {
                        self.set_selected_fleet(click.fleet, galaxy, services.bus);
                    }
                    return click.handled;
                }
            }

            if click_count >= 2 {
                if let Some(sector) = hit.map(|hit| self.hit_sector(hit)) {
                    self.viewport.scroll_to_sector(sector);
                    let own_colony = galaxy
                        .colony_at(sector)
                        .is_some_and(|colony| colony.owner == self.viewer);
                    if own_colony {
                        info!("Colony sector {} double clicked", sector);
                        self.events.push(PanelEvent::SectorDoubleClicked(sector));
                    }
                }
                return true;
            }
        }

        let sector = hit.map(|hit| self.hit_sector(hit));
        let outcome = self.interaction.press(sector, modifiers.ctrl, services);

        if let Some(sector) = outcome.select_sector {
            self.set_selected_sector(Some(sector), galaxy);
        }
        if outcome.mode_changed {
            self.after_mode_exit(galaxy);
        } else {
            self.refresh_overlays(galaxy, outcome.routes_changed, outcome.trade_changed);
        }
        if previous_fleet != self.interaction.selected_fleet() {
            self.refresh_ship_range(galaxy);
        }
        true
    }

    pub fn pointer_moved(
        &mut self,
        point: Vec2,
        galaxy: &dyn GalaxyView,
        pathfinder: &dyn Pathfinder,
    ) -> bool {
        if !self.loaded {
            return false;
        }
        if self.viewport.is_dragging() {
            return self.viewport.drag_to(point);
        }

        let hovered = self.hit_test(point).map(|hit| self.hit_sector(hit));
        if hovered != self.hovered_sector {
            self.hovered_sector = hovered;
            self.hovered_observers.notify(hovered);
        }

        if self.interaction.mode() == InputMode::Default {
            return false;
        }
        self.viewport.update_auto_scroll(point);

        let world = self.viewport.to_world(point);
        let outcome = self.interaction.hover(hovered, world, galaxy, pathfinder);
        self.refresh_overlays(galaxy, outcome.routes_changed, outcome.trade_changed);
        outcome.routes_changed || outcome.trade_changed
    }

    pub fn pointer_released(&mut self, _point: Vec2, button: PointerButton) {
        if button == PointerButton::Left && self.viewport.is_dragging() {
            self.viewport.end_drag();
        }
    }

    pub fn pointer_left(&mut self) {
        self.viewport.stop_auto_scroll();
        if self.hovered_sector.take().is_some() {
            self.hovered_observers.notify(None);
        }
    }

    /// Wheel up zooms in around the pointer.
    pub fn wheel(&mut self, delta: f32, point: Vec2) -> bool {
        let before = self.viewport.scale();
        if delta > 0.0 {
            self.viewport.zoom_in(Some(point));
        } else if delta < 0.0 {
            self.viewport.zoom_out(Some(point));
        }
        before != self.viewport.scale()
    }

    pub fn capture_lost(&mut self, galaxy: &dyn GalaxyView, bus: &mut NotificationBus) {
        self.viewport.end_drag();
        if self.interaction.capture_lost(bus) {
            self.after_mode_exit(galaxy);
        }
        self.viewport.stop_auto_scroll();
    }

    fn after_mode_exit(&mut self, galaxy: &dyn GalaxyView) {
        self.viewport.stop_auto_scroll();
        self.refresh_overlays(galaxy, true, true);
        self.refresh_ship_range(galaxy);
    }

    // =========================================================================
    // Setters
    // =========================================================================

    pub fn set_selected_sector(&mut self, sector: Option<MapLocation>, galaxy: &dyn GalaxyView) {
        let sector = sector.map(|sector| self.viewport.dimensions().clamp(sector));
        if sector == self.selected_sector {
            return;
        }
        self.selected_sector = sector;
        self.selected_observers.notify(sector);
        if self.loaded {
            let ctx = SceneContext {
                galaxy,
                theme: &self.theme,
                viewer: self.viewer,
                options: self.options,
            };
            self.compositor.refresh_selection(&ctx, sector);
        }
    }

    pub fn set_selected_fleet(
        &mut self,
        fleet: Option<FleetId>,
        galaxy: &dyn GalaxyView,
        bus: &mut NotificationBus,
    ) {
        if self.interaction.select_fleet(fleet, galaxy, bus) {
            self.refresh_ship_range(galaxy);
            self.refresh_overlays(galaxy, true, true);
        }
    }

    pub fn set_selected_trade_route(
        &mut self,
        route: Option<TradeRouteId>,
        galaxy: &dyn GalaxyView,
        bus: &mut NotificationBus,
    ) {
        let previous_fleet = self.interaction.selected_fleet();
        if self.interaction.select_trade_route(route, galaxy, bus) {
            if previous_fleet != self.interaction.selected_fleet() {
                self.refresh_ship_range(galaxy);
            }
            self.refresh_overlays(galaxy, true, true);
        }
    }

    pub fn set_options(&mut self, options: GridOptions, galaxy: &dyn GalaxyView) {
        if options == self.options {
            return;
        }
        if options.animate != self.options.animate {
            self.compositor.set_animations_enabled(options.animate);
        }
        self.options = options;
        self.recompose(galaxy, true);
    }

    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.options.animate = enabled;
        self.compositor.set_animations_enabled(enabled);
    }

    /// Hidden panels keep their layers but pause every clock.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.compositor.resume();
        } else {
            self.compositor.pause();
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Anchor for keyboard zoom: the selected sector when one is on screen.
    fn zoom_anchor(&self) -> Option<Vec2> {
        self.selected_sector
            .map(|sector| self.viewport.hit_transform().apply(sector_midpoint(sector)))
    }

    pub fn zoom_in(&mut self) {
        let anchor = self.zoom_anchor();
        self.viewport.zoom_in(anchor);
    }

    pub fn zoom_out(&mut self) {
        let anchor = self.zoom_anchor();
        self.viewport.zoom_out(anchor);
    }

    pub fn zoom_close(&mut self) {
        let anchor = self.zoom_anchor();
        self.viewport.zoom_close(anchor);
    }

    pub fn zoom_wide(&mut self) {
        let anchor = self.zoom_anchor();
        self.viewport.zoom_wide(anchor);
    }

    pub fn center_on_quadrant(&mut self, quadrant: Quadrant) {
        self.viewport.center_on_quadrant(quadrant);
    }

    pub fn center_on_home(&mut self, galaxy: &dyn GalaxyView) {
        match galaxy.home_sector(self.viewer) {
            Some(home) => self.viewport.scroll_to_sector(home),
            None => warn!("No home sector known for {}", self.viewer),
        }
    }

    pub fn scroll_to_sector(&mut self, sector: MapLocation) {
        self.viewport.scroll_to_sector(sector);
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    // =========================================================================
    // Observers and read-outs
    // =========================================================================

    pub fn observe_selected_sector(
        &mut self,
        callback: impl FnMut(Option<MapLocation>) + Send + Sync + 'static,
    ) -> ObserverHandle {
        self.selected_observers.observe(callback)
    }

    pub fn observe_hovered_sector(
        &mut self,
        callback: impl FnMut(Option<MapLocation>) + Send + Sync + 'static,
    ) -> ObserverHandle {
        self.hovered_observers.observe(callback)
    }

    pub fn unobserve_selected_sector(&mut self, handle: ObserverHandle) -> bool {
        self.selected_observers.unobserve(handle)
    }

    pub fn unobserve_hovered_sector(&mut self, handle: ObserverHandle) -> bool {
        self.hovered_observers.unobserve(handle)
    }

    pub fn can_zoom_in(&self) -> bool {
        self.viewport.can_zoom_in()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.viewport.can_zoom_out()
    }

    pub fn input_mode(&self) -> InputMode {
        self.interaction.mode()
    }

    pub fn selected_sector(&self) -> Option<MapLocation> {
        self.selected_sector
    }

    pub fn hovered_sector(&self) -> Option<MapLocation> {
        self.hovered_sector
    }

    pub fn selected_fleet(&self) -> Option<FleetId> {
        self.interaction.selected_fleet()
    }

    pub fn selected_trade_route(&self) -> Option<TradeRouteId> {
        self.interaction.selected_trade_route()
    }

    pub fn options(&self) -> GridOptions {
        self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn layers(&self) -> &SceneLayers {
        self.compositor.layers()
    }

    pub fn animation_state(&self) -> Option<ClockState> {
        self.compositor.animation_state()
    }

    pub fn indicators(&self) -> &[FleetIndicator] {
        self.compositor.indicators()
    }

    /// Tooltip of the fleet indicator under a viewport point.
    pub fn tooltip_at(&self, point: Vec2) -> Option<&str> {
        match self.hit_test(point)? {
            HitTarget::FleetIndicator(index) => self
                .compositor
                .indicators()
                .get(index)
                .and_then(|indicator| indicator.tooltip.as_deref()),
            HitTarget::Sector(_) => None,
        }
    }

    /// Who the viewer believes owns the selected sector.
    pub fn selected_sector_allegiance(&self, galaxy: &dyn GalaxyView) -> Option<String> {
        let sector = self.selected_sector?;
        if !galaxy.is_scanned(self.viewer, sector) {
            return None;
        }
        let text = match perceived_owner(galaxy, sector, self.viewer) {
            Some(owner) => galaxy
                .civilizations()
                .short_name(owner)
                .map_or_else(|| format!("Civ {}", owner.0), str::to_string),
            None => "no owner".to_string(),
        };
        Some(text)
    }

    pub fn take_events(&mut self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn load(&mut self, bus: &mut NotificationBus, galaxy: &dyn GalaxyView) {
        if self.loaded {
            return;
        }
        self.subscription = Some(bus.subscribe(&[NotificationKind::ScreenRefreshRequired]));
        self.loaded = true;
        self.compositor.restart_animations();
        if self.visible {
            self.compositor.resume();
        }
        self.recompose(galaxy, true);
        self.refresh_ship_range(galaxy);
        info!(
            "Galaxy grid loaded: {}x{} sectors",
            self.viewport.dimensions().width,
            self.viewport.dimensions().height
        );
    }

    pub fn unload(&mut self, bus: &mut NotificationBus) {
        if !self.loaded {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            bus.unsubscribe(subscription);
        }
        self.interaction.set_mode(InputMode::Default, bus);
        self.viewport.stop_auto_scroll();
        self.viewport.end_drag();
        self.compositor.stop_animations();
        self.compositor.clear();
        self.selected_observers.clear();
        self.hovered_observers.clear();
        self.loaded = false;
        info!("Galaxy grid unloaded");
    }

    // =========================================================================
    // Composition helpers
    // =========================================================================

    fn recompose(&mut self, galaxy: &dyn GalaxyView, rebuild_sectors: bool) {
        if !self.loaded {
            return;
        }
        let ctx = SceneContext {
            galaxy,
            theme: &self.theme,
            viewer: self.viewer,
            options: self.options,
        };
        let overlays = Overlays {
            selected_sector: self.selected_sector,
            route_draft: self.interaction.route_overlay(),
            trade_draft: self.interaction.trade_draft(),
        };
        self.compositor.update(&ctx, rebuild_sectors, &overlays);
    }

    fn refresh_overlays(&mut self, galaxy: &dyn GalaxyView, routes: bool, trade: bool) {
        if !self.loaded || !(routes || trade) {
            return;
        }
        let ctx = SceneContext {
            galaxy,
            theme: &self.theme,
            viewer: self.viewer,
            options: self.options,
        };
        let overlays = Overlays {
            selected_sector: self.selected_sector,
            route_draft: self.interaction.route_overlay(),
            trade_draft: self.interaction.trade_draft(),
        };
        if routes {
            self.compositor.refresh_routes(&ctx, &overlays);
        }
        if trade {
            self.compositor.refresh_trade_lines(&ctx, &overlays);
        }
    }

    fn refresh_ship_range(&mut self, galaxy: &dyn GalaxyView) {
        if !self.loaded {
            return;
        }
        let fleet = self
            .interaction
            .selected_fleet()
            .and_then(|id| galaxy.fleet(id));
        let ctx = SceneContext {
            galaxy,
            theme: &self.theme,
            viewer: self.viewer,
            options: self.options,
        };
        self.compositor.rebuild_ship_range(&ctx, fleet);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civs::CivCatalog;
    use crate::interaction::tests::{RecordedOrders, ScriptedPrompt};
    use crate::model::{Colony, ColonyId, StarSystem, StarType, TradeRoute};
    use crate::scene::tests::RecordingCanvas;
    use crate::snapshot::{test_civs, test_fleet, GalaxySnapshot};
    use std::sync::{Arc, Mutex};

    const VIEWER: CivId = CivId(1);

    struct Harness {
        galaxy: GalaxySnapshot,
        orders: RecordedOrders,
        prompt: ScriptedPrompt,
        bus: NotificationBus,
        panel: GalaxyGridPanel,
    }

    impl Harness {
        fn new() -> Self {
            let mut galaxy = GalaxySnapshot::new(10, 10, test_civs());
            galaxy.add_sensor(VIEWER, MapLocation::new(2, 2), 3, 2);
            galaxy.add_system(StarSystem {
                location: MapLocation::new(2, 2),
                name: "Sol".to_string(),
                star_type: StarType::Yellow,
                owner: None,
                colony: None,
            });
            galaxy.add_colony(Colony {
                id: ColonyId(1),
                owner: VIEWER,
                location: MapLocation::new(2, 2),
                name: "Earth".to_string(),
                facilities: Vec::new(),
            });
            galaxy.add_fleet(test_fleet(1, VIEWER, MapLocation::new(1, 1)));

            let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));
            let mut panel = GalaxyGridPanel::new(
                theme,
                VIEWER,
                galaxy.dimensions(),
                GridOptions::default(),
            );
            panel.layout(Vec2::new(360.0, 360.0));
            let mut bus = NotificationBus::default();
            panel.load(&mut bus, &galaxy);

            Self {
                galaxy,
                orders: RecordedOrders::default(),
                prompt: ScriptedPrompt {
                    answer: true,
                    asked: 0,
                },
                bus,
                panel,
            }
        }

        fn press(&mut self, point: Vec2, button: PointerButton, ctrl: bool, clicks: u32) -> bool {
            let mut services = Services {
                galaxy: &self.galaxy,
                pathfinder: &self.galaxy,
                orders: &mut self.orders,
                prompt: &mut self.prompt,
                bus: &mut self.bus,
            };
            self.panel
                .pointer_pressed(point, button, Modifiers { ctrl }, clicks, &mut services)
        }
    }

    fn sector_point(x: i32, y: i32) -> Vec2 {
        // Lower left corner of the sector, clear of any fleet icon row.
        Vec2::new(x as f32 * 72.0 + 6.0, y as f32 * 72.0 + 66.0)
    }

    #[test]
    fn load_subscribes_and_unload_releases_everything() {
        let mut harness = Harness::new();
        assert!(harness.panel.is_loaded());
        assert_eq!(harness.bus.subscriber_count(), 1);
        assert!(!harness.panel.layers().is_empty());
        assert_eq!(harness.panel.indicators().len(), 1);

        harness.panel.unload(&mut harness.bus);
        assert_eq!(harness.bus.subscriber_count(), 0);
        assert!(harness.panel.layers().is_empty());
        assert!(harness.panel.indicators().is_empty());
        assert_eq!(harness.panel.animation_state(), Some(ClockState::Stopped));
    }

    #[test]
    fn reload_restarts_animations() {
        let mut harness = Harness::new();
        harness.panel.unload(&mut harness.bus);
        harness.panel.load(&mut harness.bus, &harness.galaxy);
        assert_eq!(harness.panel.animation_state(), Some(ClockState::Running));
    }

    #[test]
    fn paint_is_empty_until_loaded() {
        let galaxy = GalaxySnapshot::new(4, 4, test_civs());
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));
        let mut panel = GalaxyGridPanel::new(theme, VIEWER, galaxy.dimensions(), GridOptions::default());
        panel.layout(Vec2::new(200.0, 200.0));

        let mut canvas = RecordingCanvas::default();
        panel.paint(&mut canvas);
        assert_eq!(canvas.lines + canvas.rects, 0);

        let mut bus = NotificationBus::default();
        panel.load(&mut bus, &galaxy);
        panel.paint(&mut canvas);
        assert!(canvas.lines > 0);
    }

    #[test]
    fn hit_test_maps_points_to_sectors() {
        let harness = Harness::new();
        assert_eq!(
            harness.panel.hit_test(sector_point(3, 0)),
            Some(HitTarget::Sector(MapLocation::new(3, 0)))
        );
        assert_eq!(harness.panel.hit_test(Vec2::new(-1.0, 5.0)), None);
        assert_eq!(harness.panel.hit_test(Vec2::new(5.0, 400.0)), None);

        let icon = harness.panel.indicators()[0].center();
        assert_eq!(
            harness.panel.hit_test(icon),
            Some(HitTarget::FleetIndicator(0))
        );
    }

    #[test]
    fn indicator_click_selects_sector_and_fleet() {
        let mut harness = Harness::new();
        let icon = harness.panel.indicators()[0].center();

        assert!(harness.press(icon, PointerButton::Left, false, 1));
        assert_eq!(harness.panel.selected_sector(), Some(MapLocation::new(1, 1)));
        assert_eq!(harness.panel.selected_fleet(), Some(crate::model::FleetId(1)));
        assert_eq!(harness.panel.input_mode(), InputMode::FleetMovement);
    }

    #[test]
    fn right_click_leaves_fleet_movement() {
        let mut harness = Harness::new();
        let route_sub = harness
            .bus
            .subscribe(&[NotificationKind::FleetRouteUpdated]);
        let icon = harness.panel.indicators()[0].center();
        harness.press(icon, PointerButton::Left, false, 1);

        assert!(harness.press(sector_point(5, 5), PointerButton::Right, false, 1));
        assert_eq!(harness.panel.input_mode(), InputMode::Default);
        assert_eq!(harness.panel.selected_fleet(), None);
        assert_eq!(harness.bus.take(&route_sub).len(), 1);
        assert!(!harness.press(sector_point(5, 5), PointerButton::Right, false, 1));
    }

    #[test]
    fn plain_click_selects_sector_and_notifies_observers() {
        let mut harness = Harness::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = harness.panel.observe_selected_sector(move |sector| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(sector);
            }
        });

        harness.press(sector_point(4, 3), PointerButton::Left, false, 1);
        harness.press(sector_point(4, 3), PointerButton::Left, false, 1);
        assert_eq!(harness.panel.selected_sector(), Some(MapLocation::new(4, 3)));

        assert!(harness.panel.unobserve_selected_sector(handle));
        harness.press(sector_point(0, 4), PointerButton::Left, false, 1);
        assert_eq!(
            seen.lock().map(|seen| seen.clone()).unwrap_or_default(),
            vec![Some(MapLocation::new(4, 3))]
        );
    }

    #[test]
    fn selected_sector_is_clamped_into_the_grid() {
        let mut harness = Harness::new();
        harness
            .panel
            .set_selected_sector(Some(MapLocation::new(40, -3)), &harness.galaxy);
        assert_eq!(harness.panel.selected_sector(), Some(MapLocation::new(9, 0)));
    }

    #[test]
    fn double_click_on_own_colony_raises_event() {
        let mut harness = Harness::new();
        harness.press(sector_point(2, 2), PointerButton::Left, false, 2);
        assert_eq!(
            harness.panel.take_events(),
            vec![PanelEvent::SectorDoubleClicked(MapLocation::new(2, 2))]
        );
        assert!(harness.panel.viewport().is_animating());

        harness.press(sector_point(4, 0), PointerButton::Left, false, 2);
        assert!(harness.panel.take_events().is_empty());
    }

    #[test]
    fn ctrl_drag_scrolls_the_view() {
        let mut harness = Harness::new();
        harness.press(Vec2::new(200.0, 200.0), PointerButton::Left, true, 1);
        assert!(harness.panel.viewport().is_dragging());
        assert_eq!(harness.panel.selected_sector(), None);

        harness
            .panel
            .pointer_moved(Vec2::new(150.0, 120.0), &harness.galaxy, &harness.galaxy);
        assert_eq!(harness.panel.viewport().offset(), Vec2::new(50.0, 80.0));

        harness
            .panel
            .pointer_released(Vec2::new(150.0, 120.0), PointerButton::Left);
        assert!(!harness.panel.viewport().is_dragging());
    }

    #[test]
    fn hover_tracks_sector_and_clears_on_leave() {
        let mut harness = Harness::new();
        harness
            .panel
            .pointer_moved(sector_point(3, 1), &harness.galaxy, &harness.galaxy);
        assert_eq!(harness.panel.hovered_sector(), Some(MapLocation::new(3, 1)));

        harness.panel.pointer_left();
        assert_eq!(harness.panel.hovered_sector(), None);
    }

    #[test]
    fn hovered_sector_observers_see_changes_until_removed() {
        let mut harness = Harness::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = harness.panel.observe_hovered_sector(move |sector| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(sector);
            }
        });

        harness
            .panel
            .pointer_moved(sector_point(3, 1), &harness.galaxy, &harness.galaxy);
        harness.panel.pointer_left();
        assert!(harness.panel.unobserve_hovered_sector(handle));
        harness
            .panel
            .pointer_moved(sector_point(0, 0), &harness.galaxy, &harness.galaxy);

        assert_eq!(
            seen.lock().map(|seen| seen.clone()).unwrap_or_default(),
            vec![Some(MapLocation::new(3, 1)), None]
        );
    }

    #[test]
    fn selecting_own_trade_route_starts_trade_mode() {
        let mut harness = Harness::new();
        harness.galaxy.add_trade_route(TradeRoute {
            id: TradeRouteId(1),
            source_colony: ColonyId(1),
            target_colony: None,
        });

        harness.panel.set_selected_trade_route(
            Some(TradeRouteId(1)),
            &harness.galaxy,
            &mut harness.bus,
        );
        assert_eq!(harness.panel.selected_trade_route(), Some(TradeRouteId(1)));
        assert_eq!(harness.panel.input_mode(), InputMode::TradeRoute);

        harness
            .panel
            .set_selected_trade_route(Some(TradeRouteId(9)), &harness.galaxy, &mut harness.bus);
        assert_eq!(harness.panel.selected_trade_route(), None);
        assert_eq!(harness.panel.input_mode(), InputMode::Default);
    }

    #[test]
    fn edge_hover_auto_scrolls_only_while_moving_a_fleet() {
        let mut harness = Harness::new();
        harness
            .panel
            .pointer_moved(Vec2::new(355.0, 100.0), &harness.galaxy, &harness.galaxy);
        assert!(!harness.panel.viewport().is_auto_scrolling());

        let icon = harness.panel.indicators()[0].center();
        harness.press(icon, PointerButton::Left, false, 1);
        harness
            .panel
            .pointer_moved(Vec2::new(355.0, 100.0), &harness.galaxy, &harness.galaxy);
        assert!(harness.panel.viewport().is_auto_scrolling());

        harness.panel.capture_lost(&harness.galaxy, &mut harness.bus);
        assert_eq!(harness.panel.input_mode(), InputMode::Default);
        assert!(!harness.panel.viewport().is_auto_scrolling());
    }

    #[test]
    fn refresh_request_drops_vanished_fleet() {
        let mut harness = Harness::new();
        harness
            .panel
            .set_selected_fleet(Some(crate::model::FleetId(1)), &harness.galaxy, &mut harness.bus);
        assert_eq!(harness.panel.selected_fleet(), Some(crate::model::FleetId(1)));

        harness.galaxy.fleets.clear();
        harness.bus.publish(Notification::ScreenRefreshRequired);
        assert!(harness.panel.tick(0.1, &harness.galaxy, &mut harness.bus));
        assert_eq!(harness.panel.selected_fleet(), None);
        assert!(harness.panel.indicators().is_empty());
    }

    #[test]
    fn allegiance_text_follows_perception() {
        let mut harness = Harness::new();
        assert_eq!(harness.panel.selected_sector_allegiance(&harness.galaxy), None);

        harness
            .panel
            .set_selected_sector(Some(MapLocation::new(2, 2)), &harness.galaxy);
        assert_eq!(
            harness.panel.selected_sector_allegiance(&harness.galaxy).as_deref(),
            Some("Terrans")
        );

        harness
            .panel
            .set_selected_sector(Some(MapLocation::new(4, 4)), &harness.galaxy);
        assert_eq!(
            harness.panel.selected_sector_allegiance(&harness.galaxy).as_deref(),
            Some("no owner")
        );

        harness
            .panel
            .set_selected_sector(Some(MapLocation::new(9, 9)), &harness.galaxy);
        assert_eq!(harness.panel.selected_sector_allegiance(&harness.galaxy), None);
    }

    #[test]
    fn center_on_home_needs_a_known_home() {
        let mut harness = Harness::new();
        harness.panel.center_on_home(&harness.galaxy);
        assert!(!harness.panel.viewport().is_animating());

        harness.galaxy.set_home(VIEWER, MapLocation::new(8, 8));
        harness.panel.center_on_home(&harness.galaxy);
        assert!(harness.panel.viewport().is_animating());
    }

    #[test]
    fn hiding_pauses_and_showing_resumes() {
        let mut harness = Harness::new();
        harness.panel.set_visible(false);
        assert_eq!(harness.panel.animation_state(), Some(ClockState::Paused));
        harness.panel.set_visible(true);
        assert_eq!(harness.panel.animation_state(), Some(ClockState::Running));
    }

    #[test]
    fn wheel_zooms_around_pointer() {
        let mut harness = Harness::new();
        let before = harness.panel.viewport().scale();
        assert!(harness.panel.wheel(1.0, Vec2::new(100.0, 100.0)));
        assert!(harness.panel.viewport().scale() > before);
        assert!(harness.panel.wheel(-1.0, Vec2::new(100.0, 100.0)));
        assert!(!harness.panel.wheel(0.0, Vec2::new(100.0, 100.0)));
    }
}
