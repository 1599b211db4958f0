//! Perceived ownership under fog of war.
//!
//! Everything here is a pure function of the current [`GalaxyView`]; callers may
//! ask the same question any number of times during one composition pass.

use crate::civs::CivId;
use crate::grid::MapLocation;
use crate::model::{Claim, GalaxyView};

/// Owner of `location` as the `viewer` understands it.
pub fn perceived_owner(
    galaxy: &dyn GalaxyView,
    location: MapLocation,
    viewer: CivId,
) -> Option<CivId> {
    if !galaxy.dimensions().contains(location) || !galaxy.is_scanned(viewer, location) {
        return None;
    }

    match actual_owner(galaxy, location) {
        Some(owner)
            if owner == viewer
                || galaxy.is_explored(viewer, location)
                || galaxy.contact_made(viewer, owner) =>
        {
            Some(owner)
        }
        _ => claimed_owner(galaxy, location, viewer),
    }
}

/// System owner, falling back to the station owner.
pub fn actual_owner(galaxy: &dyn GalaxyView, location: MapLocation) -> Option<CivId> {
    galaxy
        .system_at(location)
        .and_then(|system| system.owner)
        .or_else(|| galaxy.station_at(location).map(|station| station.owner))
}

/// Claims the viewer knows about: its own, and those of civilizations it has met.
/// Strongest claim first, ties broken by owner id.
pub fn known_claims(galaxy: &dyn GalaxyView, location: MapLocation, viewer: CivId) -> Vec<Claim> {
    let mut claims: Vec<Claim> = galaxy
        .claims_at(location)
        .into_iter()
        .filter(|claim| claim.owner == viewer || galaxy.contact_made(viewer, claim.owner))
        .collect();
    claims.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.owner.cmp(&b.owner)));
    claims
}

/// The single known claimant; no answer when nobody or several civilizations claim it.
pub fn claimed_owner(galaxy: &dyn GalaxyView, location: MapLocation, viewer: CivId) -> Option<CivId> {
    match known_claims(galaxy, location, viewer).as_slice() {
        [only] => Some(only.owner),
        _ => None,
    }
}

pub fn is_disputed(galaxy: &dyn GalaxyView, location: MapLocation, viewer: CivId) -> bool {
    known_claims(galaxy, location, viewer).len() >= 2
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StarSystem, StarType, Station};
    use crate::snapshot::{test_civs, GalaxySnapshot};

    const VIEWER: CivId = CivId(1);
    const RIVAL: CivId = CivId(2);
    const STRANGER: CivId = CivId(3);

    fn galaxy() -> GalaxySnapshot {
        let mut galaxy = GalaxySnapshot::new(6, 6, test_civs());
        galaxy.add_sensor(VIEWER, MapLocation::new(2, 2), 2, 1);
        galaxy
    }

    fn owned_system(location: MapLocation, owner: CivId) -> StarSystem {
        StarSystem {
            location,
            name: "Kether".to_string(),
            star_type: StarType::Yellow,
            owner: Some(owner),
            colony: None,
        }
    }

    #[test]
    fn own_system_is_always_visible() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(3, 3);
        galaxy.add_system(owned_system(here, VIEWER));
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), Some(VIEWER));
    }

    #[test]
    fn stranger_owner_hidden_until_explored_or_contacted() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(3, 3);
        galaxy.add_system(owned_system(here, STRANGER));
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), None);

        galaxy.explore(VIEWER, here);
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), Some(STRANGER));
    }

    #[test]
    fn contact_reveals_owner() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(1, 1);
        galaxy.add_system(owned_system(here, RIVAL));
        galaxy.add_contact(VIEWER, RIVAL);
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), Some(RIVAL));
    }

    #[test]
    fn station_owner_used_without_system() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(2, 1);
        galaxy.add_station(Station {
            location: here,
            owner: VIEWER,
            name: "Outpost".to_string(),
        });
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), Some(VIEWER));
    }

    #[test]
    fn single_known_claim_is_best_guess() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(2, 3);
        galaxy.add_contact(VIEWER, RIVAL);
        galaxy.add_claim(here, RIVAL, 5);
        galaxy.add_claim(here, STRANGER, 9);
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), Some(RIVAL));
        assert!(!is_disputed(&galaxy, here, VIEWER));
    }

    #[test]
    fn two_known_claims_are_disputed() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(2, 3);
        galaxy.add_contact(VIEWER, RIVAL);
        galaxy.add_claim(here, RIVAL, 5);
        galaxy.add_claim(here, VIEWER, 7);
        assert_eq!(perceived_owner(&galaxy, here, VIEWER), None);
        assert!(is_disputed(&galaxy, here, VIEWER));
        let claims = known_claims(&galaxy, here, VIEWER);
        assert_eq!(claims[0].owner, VIEWER);
    }

    #[test]
    fn unscanned_sector_has_no_perceived_owner() {
        let mut galaxy = galaxy();
        let far = MapLocation::new(5, 5);
        galaxy.add_system(owned_system(far, VIEWER));
        galaxy.add_claim(far, VIEWER, 3);
        assert!(!galaxy.is_scanned(VIEWER, far));
        assert_eq!(perceived_owner(&galaxy, far, VIEWER), None);
    }

    #[test]
    fn repeated_queries_agree() {
        let mut galaxy = galaxy();
        let here = MapLocation::new(2, 2);
        galaxy.add_claim(here, VIEWER, 1);
        let first = perceived_owner(&galaxy, here, VIEWER);
        let second = perceived_owner(&galaxy, here, VIEWER);
        assert_eq!(first, second);
    }
}
