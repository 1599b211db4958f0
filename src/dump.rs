//! Plain-text dump of the galaxy for debugging: one two-character cell per
//! sector (owner, star) followed by a legend and the colony facility list.

use crate::civs::CivId;
use crate::grid::MapLocation;
use crate::model::{Facility, GalaxyView, StarType};
use crate::perception::actual_owner;

const FACILITY_PLACEHOLDER: &str = "    <facility unavailable>";

/// Highest civilization id that still gets its own digit.
const LAST_DIGIT_CIV: u32 = 6;

pub fn owner_char(owner: Option<CivId>) -> char {
    match owner {
        None => '.',
        Some(CivId(id)) if id > LAST_DIGIT_CIV => 'M',
        Some(CivId(id)) => char::from_digit(id, 10).unwrap_or('M'),
    }
}

pub fn star_char(star: Option<StarType>) -> char {
    match star {
        None => '.',
        Some(StarType::BlackHole) => 'b',
        Some(StarType::NeutronStar) => 'n',
        Some(StarType::RadioPulsar) => 'r',
        Some(StarType::XRayPulsar) => 'x',
        Some(StarType::Wormhole) => 'w',
        Some(StarType::White) => 'W',
        Some(StarType::Blue) => 'B',
        Some(StarType::Yellow) => 'Y',
        Some(StarType::Orange) => 'O',
        Some(StarType::Red) => 'R',
        Some(StarType::Nebula) => 'N',
        Some(StarType::Quasar) => 'Q',
    }
}

pub fn format_facility(facility: &Facility) -> Result<String, String> {
    if facility.active > facility.total {
        return Err(format!(
            "{}: {} active of {} built",
            facility.name, facility.active, facility.total
        ));
    }
    Ok(format!(
        "    {:<20} {:>3}/{:<3}",
        facility.name, facility.active, facility.total
    ))
}

pub fn render_map(galaxy: &dyn GalaxyView) -> String {
    let dims = galaxy.dimensions();
    let half_width = dims.width / 2;
    let half_height = dims.height / 2;
    let mut out = format!("Galaxy {}x{}\n", dims.width, dims.height);

    for y in 0..dims.height {
        if y == half_height && dims.height > 1 {
            for x in 0..dims.width {
                if x == half_width && dims.width > 1 {
                    out.push('+');
                }
                out.push_str("--");
            }
            out.push('\n');
        }
        for x in 0..dims.width {
            if x == half_width && dims.width > 1 {
                out.push('|');
            }
            let location = MapLocation::new(x, y);
            out.push(owner_char(actual_owner(galaxy, location)));
            out.push(star_char(
                galaxy.system_at(location).map(|system| system.star_type),
            ));
        }
        out.push('\n');
    }

    out.push_str("\nLegend:\n");
    for civ in galaxy.civilizations().iter() {
        out.push_str(&format!(
            "  {} = {}\n",
            owner_char(Some(civ.id)),
            civ.short_name
        ));
    }
    out.push_str("  b black hole, n neutron star, r radio pulsar, x x-ray pulsar, w wormhole\n");

    let mut colonies = galaxy.colonies();
    colonies.sort_by_key(|colony| colony.id);
    if !colonies.is_empty() {
        out.push_str("\nColonies:\n");
    }
    for colony in colonies {
        let owner = galaxy
            .civilizations()
            .short_name(colony.owner)
            .unwrap_or("?");
        out.push_str(&format!("  {} {} [{}]\n", colony.name, colony.location, owner));
        for facility in &colony.facilities {
            match format_facility(facility) {
                Ok(line) => out.push_str(&line),
                Err(reason) => {
                    bevy::log::warn!("Facility line skipped: {}", reason);
                    out.push_str(FACILITY_PLACEHOLDER);
                }
            }
            out.push('\n');
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
