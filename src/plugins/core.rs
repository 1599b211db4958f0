use bevy::prelude::*;

use crate::scene::GridOptions;

pub struct CorePlugin;

pub const SETTINGS_PATH: &str = "config/grid.ron";
pub const DEFAULT_SCENARIO_PATH: &str = "scenarios/galaxy.ron";

/// Player-facing grid settings, persisted as RON.
#[derive(Resource, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub animate_stars: bool,
    pub show_fleets: bool,
    pub show_star_names: bool,
    pub show_trade_routes: bool,
    /// Skip the confirmation when a new route would cancel a fleet's order.
    pub auto_confirm_route_changes: bool,
    pub scenario_path: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            animate_stars: true,
            show_fleets: true,
            show_star_names: true,
            show_trade_routes: true,
            auto_confirm_route_changes: false,
            scenario_path: DEFAULT_SCENARIO_PATH.to_string(),
        }
    }
}

impl GridSettings {
    pub fn options(&self) -> GridOptions {
        GridOptions {
            show_fleets: self.show_fleets,
            show_star_names: self.show_star_names,
            show_trade_routes: self.show_trade_routes,
            animate: self.animate_stars,
        }
    }
}

/// Recent status lines shown in the log panel, oldest first.
#[derive(Resource, Debug)]
pub struct EventLog {
    entries: Vec<String>,
    capacity: usize,
}

pub const EVENT_LOG_CAPACITY: usize = 8;

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: Vec::with_capacity(EVENT_LOG_CAPACITY),
            capacity: EVENT_LOG_CAPACITY,
        }
    }
}

impl EventLog {
    pub fn push(&mut self, entry: String) {
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputBindings {
    pub zoom_in: KeyCode,
    pub zoom_out: KeyCode,
    pub zoom_close: KeyCode,
    pub zoom_wide: KeyCode,
    pub quadrant_north_west: KeyCode,
    pub quadrant_north_east: KeyCode,
    pub quadrant_south_west: KeyCode,
    pub quadrant_south_east: KeyCode,
    pub center_home: KeyCode,
    pub scroll_left: KeyCode,
    pub scroll_right: KeyCode,
    pub scroll_up: KeyCode,
    pub scroll_down: KeyCode,
    pub page_left: KeyCode,
    pub page_right: KeyCode,
    pub page_up: KeyCode,
    pub page_down: KeyCode,
    pub toggle_animation: KeyCode,
    pub toggle_fleets: KeyCode,
    pub toggle_star_names: KeyCode,
    pub toggle_trade_routes: KeyCode,
    pub toggle_auto_confirm: KeyCode,
    /// Answers to a pending route-change question.
    pub confirm_accept: KeyCode,
    pub confirm_decline: KeyCode,
    pub dump_map: KeyCode,
    pub scrap_ship: KeyCode,
    pub redeploy_ship: KeyCode,
    pub save: KeyCode,
    pub load: KeyCode,
    /// Held while clicking to add waypoints, or to drag the map.
    pub multi_waypoint: KeyCode,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            zoom_in: KeyCode::Equal,
            zoom_out: KeyCode::Minus,
            zoom_close: KeyCode::KeyC,
            zoom_wide: KeyCode::KeyV,
            quadrant_north_west: KeyCode::Digit1,
            quadrant_north_east: KeyCode::Digit2,
            quadrant_south_west: KeyCode::Digit3,
            quadrant_south_east: KeyCode::Digit4,
            center_home: KeyCode::KeyH,
            scroll_left: KeyCode::ArrowLeft,
            scroll_right: KeyCode::ArrowRight,
            scroll_up: KeyCode::ArrowUp,
            scroll_down: KeyCode::ArrowDown,
            page_left: KeyCode::Home,
            page_right: KeyCode::End,
            page_up: KeyCode::PageUp,
            page_down: KeyCode::PageDown,
            toggle_animation: KeyCode::KeyN,
            toggle_fleets: KeyCode::KeyF,
            toggle_star_names: KeyCode::KeyL,
            toggle_trade_routes: KeyCode::KeyT,
            toggle_auto_confirm: KeyCode::KeyY,
            confirm_accept: KeyCode::Enter,
            confirm_decline: KeyCode::Escape,
            dump_map: KeyCode::F2,
            scrap_ship: KeyCode::Delete,
            redeploy_ship: KeyCode::KeyR,
            save: KeyCode::F5,
            load: KeyCode::F9,
            multi_waypoint: KeyCode::ControlLeft,
        }
    }
}

#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Boot,
    Loading,
    InGame,
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<GridSettings>()
            .init_resource::<InputBindings>()
            .init_resource::<EventLog>()
            .add_systems(
                OnEnter(GameState::Boot),
                (announce("State: Boot"), begin_loading).chain(),
            )
            .add_systems(OnEnter(GameState::InGame), announce("State: InGame"))
            .add_systems(OnExit(GameState::InGame), announce("State: grid closed"))
            .add_systems(
                Update,
                handle_option_toggles.run_if(in_state(GameState::InGame)),
            );
    }
}

/// System that writes a fixed line to the log and the event log.
fn announce(line: &'static str) -> impl FnMut(ResMut<EventLog>) {
    move |mut log: ResMut<EventLog>| {
        info!("{}", line);
        log.push(line.to_string());
    }
}

fn begin_loading(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::Loading);
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn handle_option_toggles(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut settings: ResMut<GridSettings>,
    mut log: ResMut<EventLog>,
) {
    let toggles: [(KeyCode, &str); 5] = [
        (bindings.toggle_animation, "Star animation"),
        (bindings.toggle_fleets, "Fleets"),
        (bindings.toggle_star_names, "Star names"),
        (bindings.toggle_trade_routes, "Trade routes"),
        (bindings.toggle_auto_confirm, "Auto-confirm route changes"),
    ];

    for (index, (key, label)) in toggles.iter().enumerate() {
        if !input.just_pressed(*key) {
            continue;
        }
        let value = match index {
            0 => &mut settings.animate_stars,
            1 => &mut settings.show_fleets,
            2 => &mut settings.show_star_names,
            3 => &mut settings.show_trade_routes,
            _ => &mut settings.auto_confirm_route_changes,
        };
        *value = !*value;
        let line = format!("{}: {}", label, on_off(*value));
        info!("{}", line);
        log.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::{RunSystemOnce, SystemState};

    #[test]
    fn event_log_keeps_the_newest_lines() {
        let mut log = EventLog::default();
        for turn in 1..=EVENT_LOG_CAPACITY + 3 {
            log.push(format!("turn {}", turn));
        }

        assert_eq!(log.entries().len(), EVENT_LOG_CAPACITY);
        assert_eq!(log.entries()[0], "turn 4");
        assert_eq!(log.entries()[EVENT_LOG_CAPACITY - 1], "turn 11");
    }

    #[test]
    fn announce_writes_its_line() {
        let mut world = World::default();
        world.insert_resource(EventLog::default());
        let ran = world.run_system_once(announce("State: InGame"));
        assert!(ran.is_ok());
        assert_eq!(world.resource::<EventLog>().entries(), ["State: InGame".to_string()]);
    }

    #[test]
    fn settings_map_onto_grid_options() {
        let settings = GridSettings {
            animate_stars: false,
            show_star_names: false,
            ..Default::default()
        };
        let options = settings.options();
        assert!(!options.animate);
        assert!(!options.show_star_names);
        assert!(options.show_fleets);
        assert!(options.show_trade_routes);
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let parsed = ron::de::from_str::<GridSettings>("(show_fleets: false)");
        let settings = match parsed {
            Ok(settings) => settings,
            Err(error) => panic!("{}", error),
        };
        assert!(!settings.show_fleets);
        assert!(settings.animate_stars);
        assert_eq!(settings.scenario_path, DEFAULT_SCENARIO_PATH);
    }

    #[test]
    fn multi_waypoint_binding_is_left_control() {
        let bindings = InputBindings::default();
        assert_eq!(bindings.multi_waypoint, KeyCode::ControlLeft);
    }

    #[test]
    fn handle_option_toggles_flips_only_pressed_options() {
        let mut world = World::default();
        world.insert_resource(ButtonInput::<KeyCode>::default());
        world.insert_resource(InputBindings::default());
        world.insert_resource(GridSettings::default());
        world.insert_resource(EventLog::default());

        {
            let mut input = world.resource_mut::<ButtonInput<KeyCode>>();
            input.press(KeyCode::KeyL);
            input.press(KeyCode::KeyY);
        }

        let mut system_state: SystemState<(
            Res<ButtonInput<KeyCode>>,
            Res<InputBindings>,
            ResMut<GridSettings>,
            ResMut<EventLog>,
        )> = SystemState::new(&mut world);
        let (input, bindings, settings, log) = system_state.get_mut(&mut world);
        handle_option_toggles(input, bindings, settings, log);
        system_state.apply(&mut world);

        let settings = world.resource::<GridSettings>();
        assert!(!settings.show_star_names);
        assert!(settings.auto_confirm_route_changes);
        assert!(settings.show_fleets);
        let log = world.resource::<EventLog>();
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0], "Star names: off");
    }
}
