//! Read and command interfaces onto the externally owned game state.
//!
//! The grid never owns simulation data. Everything it draws comes through
//! [`GalaxyView`], routes come from a [`Pathfinder`], and every change the
//! player makes leaves through an [`OrderSink`].

use crate::civs::{CivCatalog, CivId};
use crate::grid::{GridDimensions, MapLocation};

// =============================================================================
// Identifiers
// =============================================================================

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub struct FleetId(pub u32);

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub struct ColonyId(pub u32);

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub struct TradeRouteId(pub u32);

// =============================================================================
// Map contents
// =============================================================================

#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub enum StarType {
    White,
    Blue,
    Yellow,
    Orange,
    Red,
    Nebula,
    Wormhole,
    NeutronStar,
    RadioPulsar,
    XRayPulsar,
    Quasar,
    BlackHole,
}

impl StarType {
    pub const ALL: [StarType; 12] = [
        StarType::White,
        StarType::Blue,
        StarType::Yellow,
        StarType::Orange,
        StarType::Red,
        StarType::Nebula,
        StarType::Wormhole,
        StarType::NeutronStar,
        StarType::RadioPulsar,
        StarType::XRayPulsar,
        StarType::Quasar,
        StarType::BlackHole,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn supports_planets(self) -> bool {
        self <= StarType::Red
    }

    /// Ordinary stars, nebulae and wormholes carry a name label.
    pub fn is_nameable(self) -> bool {
        self <= StarType::Wormhole
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StarSystem {
    pub location: MapLocation,
    pub name: String,
    pub star_type: StarType,
    #[serde(default)]
    pub owner: Option<CivId>,
    #[serde(default)]
    pub colony: Option<ColonyId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Station {
    pub location: MapLocation,
    pub owner: CivId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Facility {
    pub name: String,
    pub total: u32,
    pub active: u32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Colony {
    pub id: ColonyId,
    pub owner: CivId,
    pub location: MapLocation,
    pub name: String,
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fleet {
    pub id: FleetId,
    pub owner: CivId,
    pub location: MapLocation,
    #[serde(default)]
    pub name: String,
    pub ship_count: u32,
    /// Sectors per turn.
    pub speed: u32,
    /// Furthest fuel range the fleet can operate in.
    pub range: u32,
    #[serde(default)]
    pub in_distress: bool,
    /// A stranded fleet cannot move at all.
    #[serde(default)]
    pub stranded: bool,
    #[serde(default)]
    pub route: Vec<MapLocation>,
    /// Changing the route would cancel whatever the fleet is currently doing.
    #[serde(default)]
    pub cancels_order_on_route_change: bool,
}

impl Fleet {
    /// Turns needed to walk `steps` sectors, `None` when the fleet cannot move.
    pub fn eta(&self, steps: usize) -> Option<u32> {
        if self.ship_count == 0 || self.speed == 0 {
            return None;
        }
        Some((steps as u32).div_ceil(self.speed))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeRoute {
    pub id: TradeRouteId,
    pub source_colony: ColonyId,
    #[serde(default)]
    pub target_colony: Option<ColonyId>,
}

/// Trade-route capacity at a sector: how many routes it could run and how
/// many are in use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeRouteStatus {
    pub indicator: u32,
    pub assigned: u32,
    pub unused: u32,
}

impl TradeRouteStatus {
    /// 0 means no routes and 99 is the simulation's "not applicable" marker.
    pub fn is_displayable(&self) -> bool {
        self.indicator != 0 && self.indicator != 99
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Claim {
    pub owner: CivId,
    pub weight: u32,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Order {
    SetFleetRoute {
        fleet: FleetId,
        route: Vec<MapLocation>,
    },
    SetTradeRoute {
        route: TradeRouteId,
        target: ColonyId,
    },
    CancelTradeRoute {
        route: TradeRouteId,
    },
    ScrapShip {
        fleet: FleetId,
    },
    RedeployShip {
        fleet: FleetId,
    },
}

impl Order {
    pub fn label(&self) -> String {
        match self {
            Order::SetFleetRoute { fleet, route } => {
                format!("Set route for fleet {} ({} steps)", fleet.0, route.len())
            }
            Order::SetTradeRoute { route, target } => {
                format!("Trade route {} -> colony {}", route.0, target.0)
            }
            Order::CancelTradeRoute { route } => format!("Trade route {} cancelled", route.0),
            Order::ScrapShip { fleet } => format!("Scrap ship from fleet {}", fleet.0),
            Order::RedeployShip { fleet } => format!("Redeploy ship from fleet {}", fleet.0),
        }
    }
}

// =============================================================================
// Collaborator Interfaces
// =============================================================================

/// Snapshot of the simulation as seen through the grid.
pub trait GalaxyView {
    fn dimensions(&self) -> GridDimensions;
    fn civilizations(&self) -> &CivCatalog;
    fn system_at(&self, location: MapLocation) -> Option<&StarSystem>;
    fn station_at(&self, location: MapLocation) -> Option<&Station>;
    fn colony(&self, id: ColonyId) -> Option<&Colony>;
    fn colonies(&self) -> Vec<&Colony>;
    fn fleet(&self, id: FleetId) -> Option<&Fleet>;
    fn fleets(&self) -> Vec<&Fleet>;
    fn trade_route(&self, id: TradeRouteId) -> Option<&TradeRoute>;
    fn trade_routes(&self) -> Vec<&TradeRoute>;
    fn trade_route_status(&self, location: MapLocation) -> TradeRouteStatus;
    fn claims_at(&self, location: MapLocation) -> Vec<Claim>;
    fn contact_made(&self, civ: CivId, other: CivId) -> bool;
    fn is_scanned(&self, viewer: CivId, location: MapLocation) -> bool;
    fn is_explored(&self, viewer: CivId, location: MapLocation) -> bool;
    fn scan_strength(&self, viewer: CivId, location: MapLocation) -> i32;
    fn fuel_range(&self, viewer: CivId, location: MapLocation) -> u32;
    fn is_valid_trade_target(&self, route: &TradeRoute, colony: &Colony) -> bool;
    fn home_sector(&self, viewer: CivId) -> Option<MapLocation>;

    fn colony_at(&self, location: MapLocation) -> Option<&Colony> {
        self.system_at(location)
            .and_then(|system| system.colony)
            .and_then(|id| self.colony(id))
            .or_else(|| {
                self.colonies()
                    .into_iter()
                    .find(|colony| colony.location == location)
            })
    }

    fn is_fleet_presence_known(&self, viewer: CivId, fleet: &Fleet) -> bool {
        fleet.owner == viewer || self.is_scanned(viewer, fleet.location)
    }
}

pub trait Pathfinder {
    /// Route through every waypoint in order; empty when no route exists.
    fn find_path(&self, fleet: &Fleet, waypoints: &[MapLocation]) -> Vec<MapLocation>;
}

pub trait OrderSink {
    fn submit(&mut self, order: Order);
}

pub trait ConfirmPrompt {
    /// Asked before replacing a route that would cancel the fleet's current order.
    fn confirm_route_change(&mut self, fleet: &Fleet, route: &[MapLocation]) -> bool;
}

// =============================================================================
// Tests
// =============================================================================
