//! In-memory galaxy used by the host app.
//!
//! The grid treats the simulation as an external service. This snapshot plays
//! that role for the standalone app: it is loaded from RON, answers every
//! [`GalaxyView`] query, provides a straight-line [`Pathfinder`], and applies the
//! orders the grid submits.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::civs::{CivCatalog, CivId, Civilization};
use crate::grid::{GridDimensions, MapLocation};
use crate::model::{
    Claim, Colony, ColonyId, Fleet, FleetId, GalaxyView, Order, Pathfinder, StarSystem, Station,
    TradeRoute, TradeRouteId, TradeRouteStatus,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SensorSite {
    pub location: MapLocation,
    pub range: u32,
    pub strength: i32,
}

/// What one civilization knows about the map.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CivMapData {
    pub civ: CivId,
    #[serde(default)]
    pub sensors: Vec<SensorSite>,
    #[serde(default)]
    pub explored: Vec<MapLocation>,
    /// Supply points; fuel range is the distance to the nearest one.
    #[serde(default)]
    pub supply: Vec<MapLocation>,
    #[serde(default)]
    pub home: Option<MapLocation>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClaimEntry {
    pub location: MapLocation,
    pub owner: CivId,
    pub weight: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeStatusEntry {
    pub location: MapLocation,
    pub indicator: u32,
    #[serde(default)]
    pub assigned: u32,
    #[serde(default)]
    pub unused: u32,
}

#[derive(Clone, Debug, Default)]
struct SnapshotIndex {
    systems: HashMap<MapLocation, usize>,
    stations: HashMap<MapLocation, usize>,
    colonies: HashMap<ColonyId, usize>,
    trade_status: HashMap<MapLocation, TradeRouteStatus>,
}

#[derive(Resource, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GalaxySnapshot {
    pub width: i32,
    pub height: i32,
    pub viewer: CivId,
    pub civilizations: Vec<Civilization>,
    #[serde(default)]
    pub systems: Vec<StarSystem>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub colonies: Vec<Colony>,
    #[serde(default)]
    pub fleets: Vec<Fleet>,
    #[serde(default)]
    pub trade_routes: Vec<TradeRoute>,
    #[serde(default)]
    pub trade_status: Vec<TradeStatusEntry>,
    #[serde(default)]
    pub claims: Vec<ClaimEntry>,
    #[serde(default)]
    pub contacts: Vec<(CivId, CivId)>,
    #[serde(default)]
    pub map_data: Vec<CivMapData>,
    #[serde(skip)]
    catalog: CivCatalog,
    #[serde(skip)]
    index: SnapshotIndex,
}

impl Default for GalaxySnapshot {
    fn default() -> Self {
        Self::new(1, 1, Vec::new())
    }
}

impl GalaxySnapshot {
    pub fn new(width: i32, height: i32, civilizations: Vec<Civilization>) -> Self {
        let dims = GridDimensions::new(width, height);
        let viewer = civilizations.first().map_or(CivId(1), |civ| civ.id);
        let mut snapshot = Self {
            width: dims.width,
            height: dims.height,
            viewer,
            civilizations,
            systems: Vec::new(),
            stations: Vec::new(),
            colonies: Vec::new(),
            fleets: Vec::new(),
            trade_routes: Vec::new(),
            trade_status: Vec::new(),
            claims: Vec::new(),
            contacts: Vec::new(),
            map_data: Vec::new(),
            catalog: CivCatalog::default(),
            index: SnapshotIndex::default(),
        };
        snapshot.reindex();
        snapshot
    }

    pub fn from_ron(contents: &str) -> Result<Self, String> {
        let mut snapshot = ron::de::from_str::<GalaxySnapshot>(contents)
            .map_err(|error| format!("RON parse error: {}", error))?;
        let dims = GridDimensions::new(snapshot.width, snapshot.height);
        snapshot.width = dims.width;
        snapshot.height = dims.height;
        snapshot.reindex();
        Ok(snapshot)
    }

    pub fn to_ron(&self) -> Result<String, String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|error| format!("RON write error: {}", error))
    }

    /// Rebuilds the lookup tables; call after editing the public vectors directly.
    pub fn reindex(&mut self) {
        self.catalog = CivCatalog::new(self.civilizations.iter().cloned());
        self.index.systems = self
            .systems
            .iter()
            .enumerate()
            .map(|(i, system)| (system.location, i))
            .collect();
        self.index.stations = self
            .stations
            .iter()
            .enumerate()
            .map(|(i, station)| (station.location, i))
            .collect();
        self.index.colonies = self
            .colonies
            .iter()
            .enumerate()
            .map(|(i, colony)| (colony.id, i))
            .collect();
        self.index.trade_status = self
            .trade_status
            .iter()
            .map(|entry| {
                (
                    entry.location,
                    TradeRouteStatus {
                        indicator: entry.indicator,
                        assigned: entry.assigned,
                        unused: entry.unused,
                    },
                )
            })
            .collect();
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn add_system(&mut self, system: StarSystem) {
        self.systems.push(system);
        self.reindex();
    }

    pub fn add_station(&mut self, station: Station) {
        self.stations.push(station);
        self.reindex();
    }

    /// Adds the colony and links it to the system at its location, if any.
    pub fn add_colony(&mut self, colony: Colony) {
        if let Some(system) = self
            .systems
            .iter_mut()
            .find(|system| system.location == colony.location)
        {
            system.colony = Some(colony.id);
            system.owner = Some(colony.owner);
        }
        self.colonies.push(colony);
        self.reindex();
    }

    pub fn add_fleet(&mut self, fleet: Fleet) {
        self.fleets.push(fleet);
    }

    pub fn add_trade_route(&mut self, route: TradeRoute) {
        self.trade_routes.push(route);
    }

    pub fn set_trade_status(&mut self, location: MapLocation, status: TradeRouteStatus) {
        self.trade_status.retain(|entry| entry.location != location);
        self.trade_status.push(TradeStatusEntry {
            location,
            indicator: status.indicator,
            assigned: status.assigned,
            unused: status.unused,
        });
        self.reindex();
    }

    pub fn add_claim(&mut self, location: MapLocation, owner: CivId, weight: u32) {
        self.claims.push(ClaimEntry {
            location,
            owner,
            weight,
        });
    }

    pub fn add_contact(&mut self, civ: CivId, other: CivId) {
        self.contacts.push((civ, other));
    }

    pub fn add_sensor(&mut self, civ: CivId, location: MapLocation, range: u32, strength: i32) {
        self.map_data_mut(civ).sensors.push(SensorSite {
            location,
            range,
            strength,
        });
    }

    pub fn explore(&mut self, civ: CivId, location: MapLocation) {
        self.map_data_mut(civ).explored.push(location);
    }

    pub fn add_supply(&mut self, civ: CivId, location: MapLocation) {
        self.map_data_mut(civ).supply.push(location);
    }

    pub fn set_home(&mut self, civ: CivId, location: MapLocation) {
        self.map_data_mut(civ).home = Some(location);
    }

    fn map_data_mut(&mut self, civ: CivId) -> &mut CivMapData {
        let index = match self.map_data.iter().position(|data| data.civ == civ) {
            Some(index) => index,
            None => {
                self.map_data.push(CivMapData {
                    civ,
                    ..Default::default()
                });
                self.map_data.len() - 1
            }
        };
        &mut self.map_data[index]
    }

    fn map_data(&self, civ: CivId) -> Option<&CivMapData> {
        self.map_data.iter().find(|data| data.civ == civ)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Applies an order the way the turn processor would, returning a log line.
    pub fn apply_order(&mut self, order: &Order) -> Result<String, String> {
        match order {
            Order::SetFleetRoute { fleet, route } => {
                let target = self.fleet_mut(*fleet)?;
                target.route = route.clone();
                Ok(format!("Fleet {} route set ({} steps)", fleet.0, route.len()))
            }
            Order::SetTradeRoute { route, target } => {
                let entry = self.trade_route_mut(*route)?;
                entry.target_colony = Some(*target);
                Ok(format!("Trade route {} now serves colony {}", route.0, target.0))
            }
            Order::CancelTradeRoute { route } => {
                let entry = self.trade_route_mut(*route)?;
                entry.target_colony = None;
                Ok(format!("Trade route {} cancelled", route.0))
            }
            Order::ScrapShip { fleet } => {
                let target = self.fleet_mut(*fleet)?;
                if target.ship_count == 0 {
                    return Err(format!("Fleet {} has no ships to scrap", fleet.0));
                }
                target.ship_count -= 1;
                let remaining = target.ship_count;
                if remaining == 0 {
                    self.fleets.retain(|entry| entry.id != *fleet);
                }
                Ok(format!("Scrapped a ship from fleet {} ({} left)", fleet.0, remaining))
            }
            Order::RedeployShip { fleet } => {
                let next_id = FleetId(self.fleets.iter().map(|f| f.id.0).max().unwrap_or(0) + 1);
                let source = self.fleet_mut(*fleet)?;
                if source.ship_count < 2 {
                    return Err(format!("Fleet {} cannot spare a ship", fleet.0));
                }
                source.ship_count -= 1;
                let detachment = Fleet {
                    id: next_id,
                    name: format!("{} detachment", source.name),
                    ship_count: 1,
                    route: Vec::new(),
                    in_distress: false,
                    cancels_order_on_route_change: false,
                    ..source.clone()
                };
                self.fleets.push(detachment);
                Ok(format!("Redeployed a ship from fleet {} as fleet {}", fleet.0, next_id.0))
            }
        }
    }

    fn fleet_mut(&mut self, id: FleetId) -> Result<&mut Fleet, String> {
        self.fleets
            .iter_mut()
            .find(|fleet| fleet.id == id)
            .ok_or_else(|| format!("Unknown fleet {}", id.0))
    }

    fn trade_route_mut(&mut self, id: TradeRouteId) -> Result<&mut TradeRoute, String> {
        self.trade_routes
            .iter_mut()
            .find(|route| route.id == id)
            .ok_or_else(|| format!("Unknown trade route {}", id.0))
    }
}

impl GalaxyView for GalaxySnapshot {
    fn dimensions(&self) -> GridDimensions {
        GridDimensions::new(self.width, self.height)
    }

    fn civilizations(&self) -> &CivCatalog {
        &self.catalog
    }

    fn system_at(&self, location: MapLocation) -> Option<&StarSystem> {
        self.index
            .systems
            .get(&location)
            .and_then(|&i| self.systems.get(i))
    }

    fn station_at(&self, location: MapLocation) -> Option<&Station> {
        self.index
            .stations
            .get(&location)
            .and_then(|&i| self.stations.get(i))
    }

    fn colony(&self, id: ColonyId) -> Option<&Colony> {
        self.index
            .colonies
            .get(&id)
            .and_then(|&i| self.colonies.get(i))
    }

    fn colonies(&self) -> Vec<&Colony> {
        self.colonies.iter().collect()
    }

    fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.iter().find(|fleet| fleet.id == id)
    }

    fn fleets(&self) -> Vec<&Fleet> {
        self.fleets.iter().collect()
    }

    fn trade_route(&self, id: TradeRouteId) -> Option<&TradeRoute> {
        self.trade_routes.iter().find(|route| route.id == id)
    }

    fn trade_routes(&self) -> Vec<&TradeRoute> {
        self.trade_routes.iter().collect()
    }

    fn trade_route_status(&self, location: MapLocation) -> TradeRouteStatus {
        self.index
            .trade_status
            .get(&location)
            .copied()
            .unwrap_or_default()
    }

    fn claims_at(&self, location: MapLocation) -> Vec<Claim> {
        self.claims
            .iter()
            .filter(|entry| entry.location == location)
            .map(|entry| Claim {
                owner: entry.owner,
                weight: entry.weight,
            })
            .collect()
    }

    fn contact_made(&self, civ: CivId, other: CivId) -> bool {
        civ == other
            || self
                .contacts
                .iter()
                .any(|&(a, b)| (a == civ && b == other) || (a == other && b == civ))
    }

    fn is_scanned(&self, viewer: CivId, location: MapLocation) -> bool {
        self.scan_strength(viewer, location) > 0
    }

    fn is_explored(&self, viewer: CivId, location: MapLocation) -> bool {
        self.map_data(viewer).is_some_and(|data| {
            data.explored.contains(&location)
                || data.sensors.iter().any(|sensor| sensor.location == location)
        })
    }

    fn scan_strength(&self, viewer: CivId, location: MapLocation) -> i32 {
        if !self.dimensions().contains(location) {
            return 0;
        }
        self.map_data(viewer).map_or(0, |data| {
            data.sensors
                .iter()
                .filter(|sensor| sensor.location.chebyshev_distance(location) <= sensor.range)
                .map(|sensor| sensor.strength.max(1))
                .max()
                .unwrap_or(0)
        })
    }

    fn fuel_range(&self, viewer: CivId, location: MapLocation) -> u32 {
        self.map_data(viewer)
            .and_then(|data| {
                data.supply
                    .iter()
                    .map(|supply| supply.chebyshev_distance(location))
                    .min()
            })
            .unwrap_or(u32::MAX)
    }

    fn is_valid_trade_target(&self, route: &TradeRoute, colony: &Colony) -> bool {
        match self.colony(route.source_colony) {
            Some(source) => {
                source.id != colony.id && self.contact_made(source.owner, colony.owner)
            }
            None => false,
        }
    }

    fn home_sector(&self, viewer: CivId) -> Option<MapLocation> {
        self.map_data(viewer)
            .and_then(|data| data.home)
            .or_else(|| {
                self.colonies
                    .iter()
                    .find(|colony| colony.owner == viewer)
                    .map(|colony| colony.location)
            })
    }
}

impl Pathfinder for GalaxySnapshot {
    fn find_path(&self, fleet: &Fleet, waypoints: &[MapLocation]) -> Vec<MapLocation> {
        if fleet.stranded {
            return Vec::new();
        }
        let dims = self.dimensions();
        let mut path = Vec::new();
        let mut current = fleet.location;

        for &waypoint in waypoints {
            if !dims.contains(waypoint) {
                return Vec::new();
            }
            while current != waypoint {
                current = MapLocation::new(
                    current.x + (waypoint.x - current.x).signum(),
                    current.y + (waypoint.y - current.y).signum(),
                );
                path.push(current);
            }
        }

        path
    }
}

#[cfg(test)]
pub fn test_civs() -> Vec<Civilization> {
    vec![
        Civilization {
            id: CivId(1),
            short_name: "Terrans".to_string(),
            color: (60, 120, 255),
            is_empire: true,
            icon: Some("terran".to_string()),
        },
        Civilization {
            id: CivId(2),
            short_name: "Kessari".to_string(),
            color: (230, 60, 60),
            is_empire: true,
            icon: Some("kessari".to_string()),
        },
        Civilization {
            id: CivId(3),
            short_name: "Ossians".to_string(),
            color: (80, 200, 90),
            is_empire: true,
            icon: None,
        },
        Civilization {
            id: CivId(7),
            short_name: "Vori".to_string(),
            color: (160, 160, 160),
            is_empire: false,
            icon: None,
        },
    ]
}

#[cfg(test)]
pub fn test_fleet(id: u32, owner: CivId, location: MapLocation) -> Fleet {
    Fleet {
        id: FleetId(id),
        owner,
        location,
        name: format!("Fleet {}", id),
        ship_count: 2,
        speed: 2,
        range: 3,
        in_distress: false,
        stranded: false,
        route: Vec::new(),
        cancels_order_on_route_change: false,
    }
}

// =============================================================================
// Tests
// =============================================================================
