use bevy::ecs::message::{Message, MessageWriter};
use bevy::prelude::*;

use crate::plugins::core::{EventLog, GameState, GridSettings, InputBindings, SETTINGS_PATH};
use crate::snapshot::GalaxySnapshot;
use std::fs;
use std::path::Path;

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ScenarioLoaded>()
            .add_systems(
                OnEnter(GameState::Loading),
                (load_settings, load_scenario).chain(),
            )
            .add_systems(Update, finish_loading.run_if(in_state(GameState::Loading)))
            .add_systems(
                Update,
                (handle_save_request, handle_load_request).run_if(in_state(GameState::InGame)),
            );
    }
}

/// A new galaxy replaced the previous one; the grid must be rebuilt.
#[derive(Message)]
pub struct ScenarioLoaded;

pub const SAVE_PATH: &str = "saves/galaxy.ron";

pub const SAMPLE_RON: &str = r#"#![enable(unwrap_newtypes)]
(
    width: 16,
    height: 12,
    viewer: 1,
    civilizations: [
        (id: 1, short_name: "Terrans", color: (60, 120, 255), is_empire: true, icon: Some("terran")),
        (id: 2, short_name: "Kessari", color: (230, 60, 60), is_empire: true, icon: Some("kessari")),
        (id: 3, short_name: "Ossians", color: (80, 200, 90), is_empire: true),
        (id: 7, short_name: "Vori", color: (170, 160, 140), is_empire: false),
    ],
    systems: [
        (location: (x: 3, y: 3), name: "Sol", star_type: Yellow, owner: Some(1), colony: Some(1)),
        (location: (x: 5, y: 2), name: "Alpha Centauri", star_type: Orange, owner: Some(1), colony: Some(2)),
        (location: (x: 6, y: 5), name: "Cygnus Veil", star_type: Nebula),
        (location: (x: 2, y: 7), name: "Tarsis", star_type: Red),
        (location: (x: 8, y: 4), name: "Kessar", star_type: Blue, owner: Some(2), colony: Some(3)),
        (location: (x: 10, y: 6), name: "Vor", star_type: White, owner: Some(7), colony: Some(4)),
        (location: (x: 7, y: 8), name: "Gate", star_type: Wormhole),
        (location: (x: 12, y: 9), name: "Ossia", star_type: Yellow, owner: Some(3), colony: Some(5)),
        (location: (x: 9, y: 1), name: "Maw", star_type: BlackHole),
        (location: (x: 4, y: 9), name: "Lighthouse", star_type: RadioPulsar),
    ],
    stations: [
        (location: (x: 4, y: 4), owner: 1, name: "Outpost Sentinel"),
        (location: (x: 8, y: 6), owner: 2, name: "Kessari Watch"),
    ],
    colonies: [
        (
            id: 1,
            owner: 1,
            location: (x: 3, y: 3),
            name: "Earth",
            facilities: [
                (name: "Shipyard", total: 2, active: 2),
                (name: "Research Lab", total: 4, active: 3),
            ],
        ),
        (id: 2, owner: 1, location: (x: 5, y: 2), name: "Proxima"),
        (id: 3, owner: 2, location: (x: 8, y: 4), name: "Kessar Prime"),
        (id: 4, owner: 7, location: (x: 10, y: 6), name: "Vori Hold"),
        (id: 5, owner: 3, location: (x: 12, y: 9), name: "Ossia"),
    ],
    fleets: [
        (id: 1, owner: 1, location: (x: 3, y: 3), name: "Home Guard", ship_count: 4, speed: 2, range: 3),
        (id: 2, owner: 1, location: (x: 3, y: 3), name: "Survey", ship_count: 1, speed: 3, range: 5),
        (
            id: 3,
            owner: 1,
            location: (x: 6, y: 5),
            name: "Vanguard",
            ship_count: 3,
            speed: 2,
            range: 3,
            route: [(x: 7, y: 5), (x: 8, y: 5)],
            cancels_order_on_route_change: true,
        ),
        (id: 4, owner: 2, location: (x: 7, y: 4), name: "Raiders", ship_count: 5, speed: 2, range: 4),
        (id: 5, owner: 1, location: (x: 2, y: 7), name: "Lost Patrol", ship_count: 1, speed: 1, range: 2, in_distress: true),
        (id: 6, owner: 1, location: (x: 5, y: 2), name: "Freighters", ship_count: 2, speed: 1, range: 2, stranded: true),
    ],
    trade_routes: [
        (id: 1, source_colony: 1),
        (id: 2, source_colony: 2, target_colony: Some(1)),
    ],
    trade_status: [
        (location: (x: 3, y: 3), indicator: 2, assigned: 1, unused: 1),
        (location: (x: 5, y: 2), indicator: 1, assigned: 1, unused: 0),
    ],
    claims: [
        (location: (x: 6, y: 3), owner: 1, weight: 3),
        (location: (x: 6, y: 3), owner: 2, weight: 3),
        (location: (x: 7, y: 3), owner: 2, weight: 4),
        (location: (x: 4, y: 2), owner: 1, weight: 5),
    ],
    contacts: [(1, 2)],
    map_data: [
        (
            civ: 1,
            sensors: [
                (location: (x: 3, y: 3), range: 4, strength: 3),
                (location: (x: 6, y: 5), range: 2, strength: 1),
            ],
            explored: [(x: 5, y: 2), (x: 6, y: 5), (x: 2, y: 7)],
            supply: [(x: 3, y: 3), (x: 5, y: 2)],
            home: Some((x: 3, y: 3)),
        ),
    ],
)
"#;

// =============================================================================
// Loading
// =============================================================================

fn load_settings(mut commands: Commands, mut log: ResMut<EventLog>) {
    match read_settings(Path::new(SETTINGS_PATH)) {
        Ok(Some(settings)) => {
            info!("Loaded settings from {}", SETTINGS_PATH);
            commands.insert_resource(settings);
        }
        Ok(None) => info!("No settings at {}, using defaults", SETTINGS_PATH),
        Err(error) => {
            error!("Settings load failed: {}", error);
            log.push(format!("Settings load failed: {}", error));
        }
    }
}

fn load_scenario(mut commands: Commands, settings: Res<GridSettings>, mut log: ResMut<EventLog>) {
    let path = Path::new(&settings.scenario_path);
    match scenario_or_sample(path) {
        Ok((galaxy, source)) => {
            let line = format!(
                "Loaded {} ({}x{}, {} fleets)",
                source,
                galaxy.width,
                galaxy.height,
                galaxy.fleets.len()
            );
            info!("{}", line);
            log.push(line);
            commands.insert_resource(galaxy);
        }
        Err(error) => {
            error!("Scenario load failed: {}", error);
            log.push(format!("Scenario load failed: {}", error));
        }
    }
}

/// Reads the scenario at `path`, falling back to the built-in sample when the
/// file is missing or broken.
pub fn scenario_or_sample(path: &Path) -> Result<(GalaxySnapshot, String), String> {
    match read_snapshot(path) {
        Ok(Some(galaxy)) => Ok((galaxy, path.display().to_string())),
        Ok(None) => GalaxySnapshot::from_ron(SAMPLE_RON)
            .map(|galaxy| (galaxy, "sample scenario".to_string())),
        Err(error) => {
            warn!("{}: {}, using sample scenario", path.display(), error);
            GalaxySnapshot::from_ron(SAMPLE_RON)
                .map(|galaxy| (galaxy, "sample scenario".to_string()))
        }
    }
}

fn finish_loading(
    galaxy: Option<Res<GalaxySnapshot>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if galaxy.is_some() {
        next_state.set(GameState::InGame);
    }
}

// =============================================================================
// Save / load requests
// =============================================================================

fn handle_save_request(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    galaxy: Res<GalaxySnapshot>,
    settings: Res<GridSettings>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.save) {
        return;
    }

    let config = ron::ser::PrettyConfig::default();
    match ron::ser::to_string_pretty(&*settings, config) {
        Ok(serialized) => match write_file(Path::new(SETTINGS_PATH), &serialized) {
            Ok(()) => info!("Settings saved to {}", SETTINGS_PATH),
            Err(error) => {
                error!("Settings write failed: {}", error);
                log.push(format!("Settings write failed: {}", error));
            }
        },
        Err(error) => {
            error!("Settings save failed: {}", error);
            log.push(format!("Settings save failed: {}", error));
        }
    }

    match galaxy.to_ron() {
        Ok(serialized) => match write_file(Path::new(SAVE_PATH), &serialized) {
            Ok(()) => {
                info!("Galaxy saved ({} bytes)", serialized.len());
                log.push(format!("Saved to {}", SAVE_PATH));
            }
            Err(error) => {
                error!("Save write failed: {}", error);
                log.push(format!("Save write failed: {}", error));
            }
        },
        Err(error) => {
            error!("Save failed: {}", error);
            log.push(format!("Save failed: {}", error));
        }
    }
}

fn handle_load_request(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut commands: Commands,
    mut loaded: MessageWriter<ScenarioLoaded>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.load) {
        return;
    }

    match read_snapshot(Path::new(SAVE_PATH)) {
        Ok(Some(galaxy)) => {
            let line = format!(
                "Loaded galaxy from {} ({} systems, {} fleets)",
                SAVE_PATH,
                galaxy.systems.len(),
                galaxy.fleets.len()
            );
            info!("{}", line);
            log.push(line);
            commands.insert_resource(galaxy);
            loaded.write(ScenarioLoaded);
        }
        Ok(None) => {
            warn!("No save at {}", SAVE_PATH);
            log.push(format!("No save at {}", SAVE_PATH));
        }
        Err(error) => {
            error!("Load failed: {}", error);
            log.push(format!("Load failed: {}", error));
        }
    }
}

// =============================================================================
// Files
// =============================================================================

pub fn read_settings(path: &Path) -> Result<Option<GridSettings>, String> {
    if !path.exists() {
        return Ok(None);
    }

    match fs::read_to_string(path) {
        Ok(contents) => match ron::de::from_str::<GridSettings>(&contents) {
            Ok(settings) => Ok(Some(settings)),
            Err(error) => Err(format!("RON parse error: {}", error)),
        },
        Err(error) => Err(format!("Read error: {}", error)),
    }
}

pub fn read_snapshot(path: &Path) -> Result<Option<GalaxySnapshot>, String> {
    if !path.exists() {
        return Ok(None);
    }

    match fs::read_to_string(path) {
        Ok(contents) => GalaxySnapshot::from_ron(&contents).map(Some),
        Err(error) => Err(format!("Read error: {}", error)),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        if let Err(error) = fs::create_dir_all(dir) {
            return Err(format!("Create dir error: {}", error));
        }
    }

    match fs::write(path, contents) {
        Ok(_) => Ok(()),
        Err(error) => Err(format!("Write error: {}", error)),
    }
}
