//! Fleet indicators: grouping known fleets per sector and owner, packing them
//! into a row of icons, and the distress ring.

use bevy::prelude::*;
use std::collections::BTreeMap;
use taffy::prelude::{
    length, AvailableSpace, Display, FlexDirection, Rect as BoxEdges, Size as BoxSize, Style,
    TaffyTree,
};

use crate::civs::CivId;
use crate::grid::{sector_origin, MapLocation, SECTOR_SIZE};
use crate::model::{Fleet, FleetId, GalaxyView};
use crate::scene::animation::{AnimationClock, ClockState};
use crate::theme::{IconId, Theme};
use crate::viewport::MAX_SCALE_FACTOR;

// =============================================================================
// Constants
// =============================================================================

pub const FLEET_ICON_SIZE: f32 = 20.0;
pub const FLEET_ICON_SPACING: f32 = 3.0;
pub const DISTRESS_PULSE_SECS: f32 = 1.0;
pub const DISTRESS_REPEAT_SECS: f32 = 3.0;

/// Widest row of icons at the largest zoom, so rows never need re-layout.
pub fn max_row_width() -> f32 {
    SECTOR_SIZE * MAX_SCALE_FACTOR + FLEET_ICON_SPACING
}

// =============================================================================
// Indicators
// =============================================================================

/// Pulsing ring drawn around an indicator with a fleet in trouble.
#[derive(Clone, Debug, PartialEq)]
pub struct DistressRing {
    clock: AnimationClock,
}

impl Default for DistressRing {
    fn default() -> Self {
        Self {
            clock: AnimationClock::new(DISTRESS_PULSE_SECS).repeat_every(DISTRESS_REPEAT_SECS),
        }
    }
}

impl DistressRing {
    pub fn radius(&self) -> f32 {
        let from = FLEET_ICON_SIZE / 2.0;
        let to = SECTOR_SIZE / 2.0;
        from + (to - from) * self.clock.progress()
    }

    pub fn alpha(&self) -> f32 {
        1.0 - self.clock.progress()
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndicatorClick {
    pub sector: MapLocation,
    pub fleet: Option<FleetId>,
    /// Always set; keeps the press from reaching generic sector selection.
    pub handled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FleetIndicator {
    pub location: MapLocation,
    pub origin: Vec2,
    pub owners: Vec<CivId>,
    pub fleets: Vec<FleetId>,
    pub viewer_fleets: Vec<FleetId>,
    pub icon: IconId,
    pub tooltip: Option<String>,
    pub distress: Option<DistressRing>,
}

impl FleetIndicator {
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.origin + Vec2::splat(FLEET_ICON_SIZE))
    }

    pub fn center(&self) -> Vec2 {
        self.origin + Vec2::splat(FLEET_ICON_SIZE / 2.0)
    }

    pub fn contains(&self, world: Vec2) -> bool {
        self.rect().contains(world)
    }

    pub fn is_merged(&self) -> bool {
        self.owners.len() > 1
    }

    pub fn click(&self) -> IndicatorClick {
        IndicatorClick {
            sector: self.location,
            fleet: self.viewer_fleets.first().copied(),
            handled: true,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(ring) = self.distress.as_mut() {
            ring.clock.tick(dt);
        }
    }

    pub fn pause(&mut self) {
        if let Some(ring) = self.distress.as_mut() {
            ring.clock.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(ring) = self.distress.as_mut() {
            ring.clock.resume();
        }
    }

    pub fn stop(&mut self) {
        if let Some(ring) = self.distress.as_mut() {
            ring.clock.stop();
        }
    }

    /// Stops the ring for good; the indicator is about to be dropped.
    pub fn dispose(&mut self) {
        self.stop();
        self.distress = None;
    }
}

// =============================================================================
// Grouping and packing
// =============================================================================

type OwnerGroups = BTreeMap<CivId, Vec<FleetId>>;

/// Known fleets keyed by sector, then by owner. Both levels are ordered.
pub fn group_known_fleets(galaxy: &dyn GalaxyView, viewer: CivId) -> BTreeMap<MapLocation, OwnerGroups> {
    let mut groups: BTreeMap<MapLocation, OwnerGroups> = BTreeMap::new();
    for fleet in galaxy.fleets() {
        if !galaxy.is_fleet_presence_known(viewer, fleet) {
            continue;
        }
        groups
            .entry(fleet.location)
            .or_default()
            .entry(fleet.owner)
            .or_default()
            .push(fleet.id);
    }
    groups
}

/// One icon slot: either a single owner or everything that overflowed.
#[derive(Clone, Debug, PartialEq)]
pub struct IconGroup {
    pub owners: Vec<CivId>,
    pub fleets: Vec<FleetId>,
}

/// Packs owner groups left to right; once the next icon would run past the
/// row limit, the remaining owners collapse into one group.
pub fn pack_row(owners: OwnerGroups) -> Vec<IconGroup> {
    let limit = max_row_width();
    let mut consumed = 0.0;
    let mut packed = Vec::new();
    let mut iter = owners.into_iter();

    while let Some((owner, fleets)) = iter.next() {
        if consumed + FLEET_ICON_SIZE > limit {
            let mut merged = IconGroup {
                owners: vec![owner],
                fleets,
            };
            for (owner, fleets) in iter.by_ref() {
                merged.owners.push(owner);
                merged.fleets.extend(fleets);
            }
            packed.push(merged);
            break;
        }
        packed.push(IconGroup {
            owners: vec![owner],
            fleets,
        });
        consumed += FLEET_ICON_SIZE + FLEET_ICON_SPACING;
    }

    packed
}

/// Icon offsets inside the cell, from a flex row with padding and gap.
pub fn layout_row(tree: &mut TaffyTree<()>, count: usize) -> taffy::TaffyResult<Vec<Vec2>> {
    tree.clear();

    let icon_style = Style {
        size: BoxSize {
            width: length(FLEET_ICON_SIZE),
            height: length(FLEET_ICON_SIZE),
        },
        flex_shrink: 0.0,
        ..Default::default()
    };
    let leaves = (0..count)
        .map(|_| tree.new_leaf(icon_style.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let row = tree.new_with_children(
        Style {
            display: Display::Flex,
            flex_direction: FlexDirection::Row,
            gap: BoxSize {
                width: length(FLEET_ICON_SPACING),
                height: length(0.0),
            },
            padding: BoxEdges {
                left: length(FLEET_ICON_SPACING),
                right: length(0.0),
                top: length(FLEET_ICON_SPACING),
                bottom: length(0.0),
            },
            ..Default::default()
        },
        &leaves,
    )?;

    tree.compute_layout(
        row,
        BoxSize {
            width: AvailableSpace::MaxContent,
            height: AvailableSpace::MaxContent,
        },
    )?;

    leaves
        .iter()
        .map(|&leaf| {
            tree.layout(leaf)
                .map(|layout| Vec2::new(layout.location.x, layout.location.y))
        })
        .collect()
}

/// Builds every indicator for the current galaxy view.
pub fn build_indicators(galaxy: &dyn GalaxyView, theme: &Theme, viewer: CivId) -> Vec<FleetIndicator> {
    let mut tree: TaffyTree<()> = TaffyTree::new();
    let mut indicators = Vec::new();

    for (location, owners) in group_known_fleets(galaxy, viewer) {
        let packed = pack_row(owners);
        let offsets = match layout_row(&mut tree, packed.len()) {
            Ok(offsets) => offsets,
            Err(err) => {
                warn!("Fleet icon layout failed at {}: {}", location, err);
                continue;
            }
        };

        let origin = sector_origin(location);
        for (group, offset) in packed.into_iter().zip(offsets) {
            indicators.push(make_indicator(galaxy, theme, viewer, location, origin + offset, group));
        }
    }

    indicators
}

fn make_indicator(
    galaxy: &dyn GalaxyView,
    theme: &Theme,
    viewer: CivId,
    location: MapLocation,
    origin: Vec2,
    group: IconGroup,
) -> FleetIndicator {
    let fleets: Vec<&Fleet> = group
        .fleets
        .iter()
        .filter_map(|&id| galaxy.fleet(id))
        .collect();
    let viewer_fleets: Vec<FleetId> = fleets
        .iter()
        .filter(|fleet| fleet.owner == viewer)
        .map(|fleet| fleet.id)
        .collect();
    let in_distress = fleets
        .iter()
        .any(|fleet| fleet.owner == viewer && fleet.in_distress);

    let icon = match group.owners.as_slice() {
        [owner] if *owner == viewer => theme.icon_for(viewer),
        [owner] if galaxy.contact_made(viewer, *owner) => theme.icon_for(*owner),
        [_] => theme.unknown_icon.clone(),
        _ => theme.multi_icon.clone(),
    };

    let tooltip = (!viewer_fleets.is_empty()).then(|| {
        let ships: u32 = fleets.iter().map(|fleet| fleet.ship_count).sum();
        let mut text = format!(
            "{} {}, {} {}",
            fleets.len(),
            plural(fleets.len() as u32, "fleet"),
            ships,
            plural(ships, "ship")
        );
        if in_distress {
            text.push_str("\nFleet in distress");
        }
        text
    });

    FleetIndicator {
        location,
        origin,
        owners: group.owners,
        fleets: group.fleets,
        viewer_fleets,
        icon,
        tooltip,
        distress: in_distress.then(DistressRing::default),
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{}s", noun)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civs::{CivCatalog, Civilization};
    use crate::snapshot::{test_civs, test_fleet, GalaxySnapshot};

    const VIEWER: CivId = CivId(1);

    fn assert_close(a: f32, b: f32) {
        let diff = (a - b).abs();
        assert!(diff < 1e-4, "expected {} close to {}", a, b);
    }

    fn crowded_civs(count: u32) -> Vec<Civilization> {
        (1..=count)
            .map(|id| Civilization {
                id: CivId(id),
                short_name: format!("Civ {}", id),
                color: (100, 100, 100),
                is_empire: true,
                icon: Some(format!("civ{}", id)),
            })
            .collect()
    }

    fn scanned_galaxy(civs: Vec<Civilization>) -> GalaxySnapshot {
        let mut galaxy = GalaxySnapshot::new(4, 4, civs);
        galaxy.add_sensor(VIEWER, MapLocation::new(1, 1), 3, 2);
        galaxy
    }

    #[test]
    fn overflowing_owners_merge_into_one_indicator() {
        let mut galaxy = scanned_galaxy(crowded_civs(9));
        let here = MapLocation::new(1, 1);
        for id in 1..=9 {
            galaxy.add_fleet(test_fleet(id, CivId(id), here));
        }
        let theme = Theme::from_catalog(&CivCatalog::new(crowded_civs(9)));

        let indicators = build_indicators(&galaxy, &theme, VIEWER);

        let merged: Vec<&FleetIndicator> = indicators.iter().filter(|i| i.is_merged()).collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(indicators.len(), 7);
        assert_eq!(merged[0].owners, vec![CivId(7), CivId(8), CivId(9)]);
        assert_eq!(merged[0].icon, theme.multi_icon);

        for (i, a) in indicators.iter().enumerate() {
            for b in indicators.iter().skip(i + 1) {
                assert!(a.rect().intersect(b.rect()).is_empty());
            }
        }
    }

    #[test]
    fn row_is_padded_and_spaced() {
        let mut tree = TaffyTree::new();
        let offsets = layout_row(&mut tree, 3).unwrap();
        assert_close(offsets[0].x, 3.0);
        assert_close(offsets[0].y, 3.0);
        assert_close(offsets[1].x, 26.0);
        assert_close(offsets[2].x, 49.0);
    }

    #[test]
    fn pack_row_keeps_six_singles() {
        let owners: OwnerGroups = (1..=6).map(|id| (CivId(id), vec![FleetId(id)])).collect();
        let packed = pack_row(owners);
        assert_eq!(packed.len(), 6);
        assert!(packed.iter().all(|group| group.owners.len() == 1));
    }

    #[test]
    fn icon_depends_on_contact() {
        let mut galaxy = scanned_galaxy(test_civs());
        galaxy.add_fleet(test_fleet(1, VIEWER, MapLocation::new(0, 0)));
        galaxy.add_fleet(test_fleet(2, CivId(2), MapLocation::new(1, 0)));
        galaxy.add_fleet(test_fleet(3, CivId(3), MapLocation::new(2, 0)));
        galaxy.add_contact(VIEWER, CivId(2));
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));

        let indicators = build_indicators(&galaxy, &theme, VIEWER);
        let icon_at = |x: i32| {
            indicators
                .iter()
                .find(|i| i.location == MapLocation::new(x, 0))
                .map(|i| i.icon.clone())
        };
        assert_eq!(icon_at(0), Some(IconId::new("terran")));
        assert_eq!(icon_at(1), Some(IconId::new("kessari")));
        assert_eq!(icon_at(2), Some(theme.unknown_icon.clone()));
    }

    #[test]
    fn unscanned_foreign_fleets_are_hidden() {
        let mut galaxy = scanned_galaxy(test_civs());
        galaxy.add_fleet(test_fleet(1, CivId(2), MapLocation::new(3, 3)));
        galaxy.add_fleet(test_fleet(2, CivId(2), MapLocation::new(3, 3)));
        let mut dark = GalaxySnapshot::new(4, 4, test_civs());
        dark.add_fleet(test_fleet(1, CivId(2), MapLocation::new(3, 3)));
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));

        let seen = build_indicators(&galaxy, &theme, VIEWER);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].fleets, vec![FleetId(1), FleetId(2)]);
        assert!(build_indicators(&dark, &theme, VIEWER).is_empty());
    }

    #[test]
    fn tooltip_and_distress_only_for_viewer_fleets() {
        let mut galaxy = scanned_galaxy(test_civs());
        let mut own = test_fleet(1, VIEWER, MapLocation::new(1, 1));
        own.in_distress = true;
        let mut other = test_fleet(2, CivId(2), MapLocation::new(2, 2));
        other.in_distress = true;
        galaxy.add_fleet(own);
        galaxy.add_fleet(other);
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));

        let indicators = build_indicators(&galaxy, &theme, VIEWER);
        let own = &indicators[0];
        assert_eq!(
            own.tooltip.as_deref(),
            Some("1 fleet, 2 ships\nFleet in distress")
        );
        assert!(own.distress.is_some());
        let other = &indicators[1];
        assert!(other.tooltip.is_none());
        assert!(other.distress.is_none());
    }

    #[test]
    fn click_selects_first_viewer_fleet_and_is_handled() {
        let mut galaxy = scanned_galaxy(test_civs());
        galaxy.add_fleet(test_fleet(4, VIEWER, MapLocation::new(1, 1)));
        galaxy.add_fleet(test_fleet(5, VIEWER, MapLocation::new(1, 1)));
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));

        let indicators = build_indicators(&galaxy, &theme, VIEWER);
        let click = indicators[0].click();
        assert_eq!(click.sector, MapLocation::new(1, 1));
        assert_eq!(click.fleet, Some(FleetId(4)));
        assert!(click.handled);
        assert!(indicators[0].contains(Vec2::new(72.0 + 10.0, 72.0 + 10.0)));
    }

    #[test]
    fn distress_ring_grows_fades_and_waits() {
        let mut ring = DistressRing::default();
        assert_close(ring.radius(), 10.0);
        assert_close(ring.alpha(), 1.0);
        ring.clock.tick(0.5);
        assert_close(ring.radius(), 23.0);
        assert_close(ring.alpha(), 0.5);
        ring.clock.tick(1.0);
        assert_close(ring.radius(), 36.0);
        assert_close(ring.alpha(), 0.0);
    }

    #[test]
    fn dispose_stops_and_drops_ring() {
        let mut galaxy = scanned_galaxy(test_civs());
        let mut fleet = test_fleet(1, VIEWER, MapLocation::new(1, 1));
        fleet.in_distress = true;
        galaxy.add_fleet(fleet);
        let theme = Theme::from_catalog(&CivCatalog::new(test_civs()));

        let mut indicators = build_indicators(&galaxy, &theme, VIEWER);
        indicators[0].pause();
        assert_eq!(
            indicators[0].distress.as_ref().map(DistressRing::state),
            Some(ClockState::Paused)
        );
        indicators[0].dispose();
        assert!(indicators[0].distress.is_none());
    }
}
