//! Interaction State Machine: Default, FleetMovement and TradeRoute modes,
//! waypoint accumulation, hover previews and trade-line drafting.

use bevy::prelude::*;

use crate::bus::{Notification, NotificationBus};
use crate::civs::CivId;
use crate::grid::{sector_midpoint, MapLocation};
use crate::model::{
    ColonyId, ConfirmPrompt, FleetId, GalaxyView, Order, OrderSink, Pathfinder, TradeRouteId,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum InputMode {
    #[default]
    Default,
    FleetMovement,
    TradeRoute,
}

/// Everything outside the grid that input handling talks to.
pub struct Services<'a> {
    pub galaxy: &'a dyn GalaxyView,
    pub pathfinder: &'a dyn Pathfinder,
    pub orders: &'a mut dyn OrderSink,
    pub prompt: &'a mut dyn ConfirmPrompt,
    pub bus: &'a mut NotificationBus,
}

/// Route being built in FleetMovement mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteDraft {
    pub waypoints: Vec<MapLocation>,
    /// Path for the clicked waypoints; this is what gets committed.
    pub path: Vec<MapLocation>,
    /// Path through the waypoints plus the hovered sector.
    pub preview: Option<Vec<MapLocation>>,
    pub last_sector: Option<MapLocation>,
}

impl RouteDraft {
    pub fn display_path(&self) -> &[MapLocation] {
        self.preview.as_deref().unwrap_or(&self.path)
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.path.is_empty() && self.preview.is_none()
    }

    pub fn clear(&mut self) {
        *self = RouteDraft::default();
    }
}

/// Rubber-band line from a trade route's source colony to the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct TradeLineDraft {
    pub route: TradeRouteId,
    pub source: Vec2,
    pub end: Vec2,
    pub hovered_colony: Option<ColonyId>,
    pub valid: bool,
}

/// What a press changed, so the panel knows which layers to recompose.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PressOutcome {
    pub select_sector: Option<MapLocation>,
    pub routes_changed: bool,
    pub trade_changed: bool,
    pub mode_changed: bool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HoverOutcome {
    pub routes_changed: bool,
    pub trade_changed: bool,
}

#[derive(Clone, Debug)]
pub struct InteractionController {
    mode: InputMode,
    viewer: CivId,
    selected_fleet: Option<FleetId>,
    selected_trade_route: Option<TradeRouteId>,
    route_draft: RouteDraft,
    trade_draft: Option<TradeLineDraft>,
    captured: bool,
}

impl InteractionController {
    pub fn new(viewer: CivId) -> Self {
        Self {
            mode: InputMode::Default,
            viewer,
            selected_fleet: None,
            selected_trade_route: None,
            route_draft: RouteDraft::default(),
            trade_draft: None,
            captured: false,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn viewer(&self) -> CivId {
        self.viewer
    }

    pub fn selected_fleet(&self) -> Option<FleetId> {
        self.selected_fleet
    }

    pub fn selected_trade_route(&self) -> Option<TradeRouteId> {
        self.selected_trade_route
    }

    pub fn route_draft(&self) -> &RouteDraft {
        &self.route_draft
    }

    pub fn trade_draft(&self) -> Option<&TradeLineDraft> {
        self.trade_draft.as_ref()
    }

    /// Draft to draw, paired with the fleet it belongs to.
    pub fn route_overlay(&self) -> Option<(FleetId, &RouteDraft)> {
        match (self.mode, self.selected_fleet) {
            (InputMode::FleetMovement, Some(fleet)) => Some((fleet, &self.route_draft)),
            _ => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Selects a fleet. Fleets the viewer does not own are silently refused.
    /// Returns true when the selection changed.
    pub fn select_fleet(
        &mut self,
        fleet: Option<FleetId>,
        galaxy: &dyn GalaxyView,
        bus: &mut NotificationBus,
    ) -> bool {
        let fleet = fleet
            .and_then(|id| galaxy.fleet(id))
            .filter(|fleet| fleet.owner == self.viewer);
        let coerced = fleet.map(|fleet| fleet.id);
        if coerced == self.selected_fleet {
            return false;
        }

        if self.mode != InputMode::Default {
            self.set_mode(InputMode::Default, bus);
        }
        self.selected_fleet = coerced;

        if let Some(fleet) = fleet {
            if fleet.stranded {
                info!("Fleet {} is stranded, staying in default mode", fleet.id.0);
            } else {
                self.set_mode(InputMode::FleetMovement, bus);
            }
        }
        true
    }

    /// Selects a trade route. Routes whose source colony is not the viewer's
    /// are silently refused.
    pub fn select_trade_route(
        &mut self,
        route: Option<TradeRouteId>,
        galaxy: &dyn GalaxyView,
        bus: &mut NotificationBus,
    ) -> bool {
        let source = route
            .and_then(|id| galaxy.trade_route(id))
            .and_then(|route| galaxy.colony(route.source_colony).map(|colony| (route.id, colony)))
            .filter(|(_, colony)| colony.owner == self.viewer);
        let coerced = source.map(|(id, _)| id);
        if coerced == self.selected_trade_route {
            return false;
        }

        if self.mode != InputMode::Default {
            self.set_mode(InputMode::Default, bus);
        }
        self.selected_trade_route = coerced;

        if let Some((route, colony)) = source {
            let anchor = sector_midpoint(colony.location);
            self.trade_draft = Some(TradeLineDraft {
                route,
                source: anchor,
                end: anchor,
                hovered_colony: None,
                valid: false,
            });
            self.set_mode(InputMode::TradeRoute, bus);
        }
        true
    }

    /// Drops selections that no longer resolve against the galaxy.
    pub fn revalidate(&mut self, galaxy: &dyn GalaxyView, bus: &mut NotificationBus) -> bool {
        let mut changed = false;
        if let Some(id) = self.selected_fleet {
            if galaxy.fleet(id).is_none() {
                changed |= self.select_fleet(None, galaxy, bus);
            }
        }
        if let Some(id) = self.selected_trade_route {
            if galaxy.trade_route(id).is_none() {
                changed |= self.select_trade_route(None, galaxy, bus);
            }
        }
        changed
    }

    // =========================================================================
    // Modes
    // =========================================================================

    pub fn set_mode(&mut self, mode: InputMode, bus: &mut NotificationBus) {
        if mode == self.mode {
            return;
        }

        match self.mode {
            InputMode::FleetMovement => {
                if let Some(fleet) = self.selected_fleet.take() {
                    bus.publish(Notification::FleetRouteUpdated(fleet));
                }
                self.route_draft.clear();
                self.captured = false;
            }
            InputMode::TradeRoute => {
                self.selected_trade_route = None;
                self.trade_draft = None;
                self.captured = false;
            }
            InputMode::Default => {}
        }

        self.mode = mode;
        match mode {
            InputMode::FleetMovement => {
                self.route_draft.clear();
                self.captured = true;
            }
            InputMode::TradeRoute => {
                self.captured = true;
            }
            InputMode::Default => {}
        }
        info!("Grid input mode: {:?}", mode);
    }

    pub fn capture_lost(&mut self, bus: &mut NotificationBus) -> bool {
        self.captured = false;
        if self.mode == InputMode::Default {
            return false;
        }
        self.set_mode(InputMode::Default, bus);
        true
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    /// Left press on `hit` (`None` when the press landed outside the grid).
    pub fn press(
        &mut self,
        hit: Option<MapLocation>,
        modifier: bool,
        services: &mut Services,
    ) -> PressOutcome {
        match self.mode {
            InputMode::Default => PressOutcome {
                select_sector: hit,
                ..Default::default()
            },
            InputMode::FleetMovement => self.press_fleet_movement(hit, modifier, services),
            InputMode::TradeRoute => self.press_trade_route(hit, services),
        }
    }

    fn abort(&mut self, bus: &mut NotificationBus) -> PressOutcome {
        self.set_mode(InputMode::Default, bus);
        PressOutcome {
            routes_changed: true,
            trade_changed: true,
            mode_changed: true,
            ..Default::default()
        }
    }

    fn press_fleet_movement(
        &mut self,
        hit: Option<MapLocation>,
        modifier: bool,
        services: &mut Services,
    ) -> PressOutcome {
        let galaxy = services.galaxy;
        let (Some(sector), Some(fleet)) = (hit, self.selected_fleet.and_then(|id| galaxy.fleet(id)))
        else {
            return self.abort(services.bus);
        };

        let mut outcome = PressOutcome::default();
        if self.route_draft.waypoints.last() != Some(&sector) {
            self.route_draft.waypoints.push(sector);
            // An unreachable waypoint empties the path, so a following commit
            // cannot fall back to the route computed for fewer waypoints.
            self.route_draft.path = services
                .pathfinder
                .find_path(fleet, &self.route_draft.waypoints);
            self.route_draft.preview = None;
            outcome.routes_changed = true;
        }

        if modifier {
            return outcome;
        }

        let path = self.route_draft.path.clone();
        if !path.is_empty() {
            let confirmed =
                !fleet.cancels_order_on_route_change
                    || services.prompt.confirm_route_change(fleet, &path);
            if confirmed {
                info!("Fleet {} routed through {} sectors", fleet.id.0, path.len());
                services.orders.submit(Order::SetFleetRoute {
                    fleet: fleet.id,
                    route: path,
                });
            } else {
                info!("Route change for fleet {} awaits confirmation", fleet.id.0);
            }
        }

        self.set_mode(InputMode::Default, services.bus);
        outcome.routes_changed = true;
        outcome.mode_changed = true;
        outcome
    }

    fn press_trade_route(&mut self, hit: Option<MapLocation>, services: &mut Services) -> PressOutcome {
        let galaxy = services.galaxy;
        let (Some(sector), Some(route)) = (
            hit,
            self.selected_trade_route.and_then(|id| galaxy.trade_route(id)),
        ) else {
            return self.abort(services.bus);
        };

        let target = galaxy
            .colony_at(sector)
            .filter(|colony| galaxy.is_valid_trade_target(route, colony));

        match target {
            Some(colony) => {
                info!("Trade route {} set to {}", route.id.0, colony.name);
                services.orders.submit(Order::SetTradeRoute {
                    route: route.id,
                    target: colony.id,
                });
                services
                    .bus
                    .publish(Notification::TradeRouteEstablished(route.id));
            }
            None if route.target_colony.is_some() => {
                info!("Trade route {} cancelled", route.id.0);
                services
                    .orders
                    .submit(Order::CancelTradeRoute { route: route.id });
                services
                    .bus
                    .publish(Notification::TradeRouteCancelled(route.id));
            }
            None => {}
        }

        self.set_mode(InputMode::Default, services.bus);
        PressOutcome {
            trade_changed: true,
            mode_changed: true,
            ..Default::default()
        }
    }

    /// Pointer moved over `sector` at world point `world`.
    pub fn hover(
        &mut self,
        sector: Option<MapLocation>,
        world: Vec2,
        galaxy: &dyn GalaxyView,
        pathfinder: &dyn Pathfinder,
    ) -> HoverOutcome {
        match self.mode {
            InputMode::Default => HoverOutcome::default(),
            InputMode::FleetMovement => {
                if sector == self.route_draft.last_sector {
                    return HoverOutcome::default();
                }
                self.route_draft.last_sector = sector;
                self.route_draft.preview = match (
                    sector,
                    self.selected_fleet.and_then(|id| galaxy.fleet(id)),
                ) {
                    (Some(sector), Some(fleet)) => {
                        let mut candidate = self.route_draft.waypoints.clone();
                        if candidate.last() != Some(&sector) {
                            candidate.push(sector);
                        }
                        Some(pathfinder.find_path(fleet, &candidate)).filter(|path| !path.is_empty())
                    }
                    _ => None,
                };
                HoverOutcome {
                    routes_changed: true,
                    ..Default::default()
                }
            }
            InputMode::TradeRoute => {
                let route = self.selected_trade_route.and_then(|id| galaxy.trade_route(id));
                let Some(draft) = self.trade_draft.as_mut() else {
                    return HoverOutcome::default();
                };
                let colony = sector.and_then(|sector| galaxy.colony_at(sector));
                match colony {
                    Some(colony) => {
                        draft.end = sector_midpoint(colony.location);
                        draft.hovered_colony = Some(colony.id);
                        draft.valid =
                            route.is_some_and(|route| galaxy.is_valid_trade_target(route, colony));
                    }
                    None => {
                        draft.end = world;
                        draft.hovered_colony = None;
                        draft.valid = false;
                    }
                }
                HoverOutcome {
                    trade_changed: true,
                    ..Default::default()
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
