//! Sector grid geometry and the coordinate mapper.
//!
//! World space is the unscaled extent of the galaxy: sector `(x, y)` covers
//! `[x * SECTOR_SIZE, (x + 1) * SECTOR_SIZE)` horizontally, y grows downward.
//! Viewport space is what the host window sees: `world * scale - offset`.

use bevy::prelude::*;

// =============================================================================
// Constants
// =============================================================================

/// Edge length of one sector cell in world units.
pub const SECTOR_SIZE: f32 = 72.0;

/// Upper bound for either grid dimension accepted from a scenario.
pub const MAX_GRID_DIMENSION: i32 = 256;

// =============================================================================
// Types
// =============================================================================

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub struct MapLocation {
    pub x: i32,
    pub y: i32,
}

impl MapLocation {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbor(self, side: Side) -> MapLocation {
        let (dx, dy) = side.delta();
        MapLocation::new(self.x + dx, self.y + dy)
    }

    /// King-move distance, which is what one turn of fleet movement covers.
    pub fn chebyshev_distance(self, other: MapLocation) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }
}

impl std::fmt::Display for MapLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal side of a cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    West,
    North,
    East,
    South,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::West, Side::North, Side::East, Side::South];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Side::West => (-1, 0),
            Side::North => (0, -1),
            Side::East => (1, 0),
            Side::South => (0, 1),
        }
    }

    /// World-space segment for this side of the given cell.
    pub fn segment(self, location: MapLocation) -> (Vec2, Vec2) {
        let min = sector_origin(location);
        let max = min + Vec2::splat(SECTOR_SIZE);
        match self {
            Side::West => (min, Vec2::new(min.x, max.y)),
            Side::North => (min, Vec2::new(max.x, min.y)),
            Side::East => (Vec2::new(max.x, min.y), max),
            Side::South => (Vec2::new(min.x, max.y), max),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridDimensions {
    pub width: i32,
    pub height: i32,
}

impl GridDimensions {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.clamp(1, MAX_GRID_DIMENSION),
            height: height.clamp(1, MAX_GRID_DIMENSION),
        }
    }

    pub fn contains(&self, location: MapLocation) -> bool {
        location.x >= 0 && location.y >= 0 && location.x < self.width && location.y < self.height
    }

    /// Unscaled pixel size of the full map.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * SECTOR_SIZE,
            self.height as f32 * SECTOR_SIZE,
        )
    }

    /// Every location, x outer and y inner. Composition relies on this order.
    pub fn locations(&self) -> impl Iterator<Item = MapLocation> {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |y| MapLocation::new(x, y)))
    }

    pub fn clamp(&self, location: MapLocation) -> MapLocation {
        MapLocation::new(
            location.x.clamp(0, self.width - 1),
            location.y.clamp(0, self.height - 1),
        )
    }
}

// =============================================================================
// Coordinate Mapper
// =============================================================================

/// Maps a world-space point to the sector under it, clamped onto the grid.
pub fn screen_to_sector(point: Vec2, dims: GridDimensions) -> MapLocation {
    let x = (point.x / SECTOR_SIZE).floor();
    let y = (point.y / SECTOR_SIZE).floor();
    // NaN casts to 0 and infinities saturate, so the clamp below always holds.
    dims.clamp(MapLocation::new(x as i32, y as i32))
}

pub fn sector_origin(location: MapLocation) -> Vec2 {
    Vec2::new(
        location.x as f32 * SECTOR_SIZE,
        location.y as f32 * SECTOR_SIZE,
    )
}

pub fn sector_midpoint(location: MapLocation) -> Vec2 {
    sector_origin(location) + Vec2::splat(SECTOR_SIZE / 2.0)
}

pub fn viewport_to_world(point: Vec2, offset: Vec2, scale: f32) -> Vec2 {
    (point + offset) / scale
}

pub fn world_to_viewport(point: Vec2, offset: Vec2, scale: f32) -> Vec2 {
    point * scale - offset
}

// =============================================================================
// Tests
// =============================================================================
