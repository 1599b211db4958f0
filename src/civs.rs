//! Civilization catalog used for ownership, colours and fleet icons.

use std::collections::BTreeMap;

/// Highest id that belongs to a playable empire; everything above is a minor race.
pub const LAST_EMPIRE_ID: u32 = 6;

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize,
    serde::Deserialize,
)]
pub struct CivId(pub u32);

impl std::fmt::Display for CivId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Civilization {
    pub id: CivId,
    pub short_name: String,
    /// sRGB colour used for fills, borders and labels.
    pub color: (u8, u8, u8),
    #[serde(default)]
    pub is_empire: bool,
    /// Asset key for the fleet icon; `None` falls back to the default icon.
    #[serde(default)]
    pub icon: Option<String>,
}

impl Civilization {
    pub fn is_minor_race(&self) -> bool {
        !self.is_empire
    }
}

/// Read-only table of every civilization in the game, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct CivCatalog {
    civs: BTreeMap<CivId, Civilization>,
}

impl CivCatalog {
    pub fn new(civs: impl IntoIterator<Item = Civilization>) -> Self {
        Self {
            civs: civs.into_iter().map(|civ| (civ.id, civ)).collect(),
        }
    }

    pub fn get(&self, id: CivId) -> Option<&Civilization> {
        self.civs.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Civilization> {
        self.civs.values()
    }

    pub fn len(&self) -> usize {
        self.civs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.civs.is_empty()
    }

    pub fn short_name(&self, id: CivId) -> Option<&str> {
        self.get(id).map(|civ| civ.short_name.as_str())
    }

    /// Unknown ids count as empires so they are never drawn with minor-race styling.
    pub fn is_empire(&self, id: CivId) -> bool {
        self.get(id).map_or(true, |civ| civ.is_empire)
    }
}

// =============================================================================
// Tests
// =============================================================================
