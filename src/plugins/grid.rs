//! Hosts the galaxy grid panel: builds it from the loaded galaxy, feeds it
//! window input and frame time, and reacts to its events.

use bevy::ecs::message::MessageReader;
use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bus::NotificationBus;
use crate::dump::render_map;
use crate::interaction::Services;
use crate::grid::MapLocation;
use crate::model::{ConfirmPrompt, Fleet, FleetId, GalaxyView, Order, OrderSink};
use crate::panel::{GalaxyGridPanel, Modifiers, PanelEvent, PointerButton};
use crate::plugins::core::{EventLog, GameState, GridSettings, InputBindings};
use crate::plugins::orders::OrderQueue;
use crate::plugins::saveload::ScenarioLoaded;
use crate::snapshot::GalaxySnapshot;
use crate::theme::Theme;
use crate::viewport::Quadrant;

pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NotificationBus>()
            .init_resource::<RouteChangePrompt>()
            .init_resource::<ClickTracker>()
            .add_systems(OnEnter(GameState::InGame), setup_panel)
            .add_systems(OnExit(GameState::InGame), teardown_panel)
            .add_systems(
                Update,
                (
                    rebuild_on_scenario_loaded,
                    apply_settings,
                    sync_layout,
                    handle_focus,
                    handle_pointer,
                    handle_route_prompt_keys,
                    handle_navigation_keys,
                    tick_panel,
                    drain_panel_events,
                    handle_dump_request,
                )
                    .chain()
                    .in_set(GridSystems)
                    .run_if(in_state(GameState::InGame))
                    .run_if(resource_exists::<GalaxyGridPanel>),
            );
    }
}

/// Input and ticking for the panel; painting runs after this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSystems;

pub const DOUBLE_CLICK_SECS: f32 = 0.4;
const DOUBLE_CLICK_SLOP: f32 = 4.0;

// =============================================================================
// Resources
// =============================================================================

/// A route change waiting for the player's yes or no.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRouteChange {
    pub fleet: FleetId,
    pub fleet_name: String,
    pub route: Vec<MapLocation>,
}

/// Route-change confirmation. With auto-confirm on, every change goes through.
/// Otherwise the click is held back as a pending question that the accept or
/// decline key answers.
#[derive(Resource, Debug, Default)]
pub struct RouteChangePrompt {
    pub auto_confirm: bool,
    pending: Option<PendingRouteChange>,
    pub notices: Vec<String>,
}

impl RouteChangePrompt {
    pub fn pending(&self) -> Option<&PendingRouteChange> {
        self.pending.as_ref()
    }

    pub fn question(&self, bindings: &InputBindings) -> Option<String> {
        self.pending.as_ref().map(|pending| {
            format!(
                "Replace the current order of {}? [{:?}] yes / [{:?}] no",
                pending.fleet_name, bindings.confirm_accept, bindings.confirm_decline
            )
        })
    }

    /// Resolves the pending question; a yes yields the held-back order.
    pub fn answer(&mut self, accept: bool) -> Option<Order> {
        let pending = self.pending.take()?;
        if accept {
            self.notices.push(format!("{} takes the new route", pending.fleet_name));
            Some(Order::SetFleetRoute {
                fleet: pending.fleet,
                route: pending.route,
            })
        } else {
            self.notices.push(format!("{} keeps its current order", pending.fleet_name));
            None
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

impl ConfirmPrompt for RouteChangePrompt {
    fn confirm_route_change(&mut self, fleet: &Fleet, route: &[MapLocation]) -> bool {
        if self.auto_confirm {
            return true;
        }
        self.notices.push(format!("Route change for {} needs confirmation", fleet.name));
        self.pending = Some(PendingRouteChange {
            fleet: fleet.id,
            fleet_name: fleet.name.clone(),
            route: route.to_vec(),
        });
        false
    }
}

/// Counts consecutive clicks that land close together in time and space.
#[derive(Resource, Debug, Default)]
pub struct ClickTracker {
    last_time: Option<f32>,
    last_point: Vec2,
    count: u32,
}

impl ClickTracker {
    pub fn register(&mut self, now: f32, point: Vec2) -> u32 {
        let repeated = self.last_time.is_some_and(|last| {
            now - last <= DOUBLE_CLICK_SECS && point.distance(self.last_point) <= DOUBLE_CLICK_SLOP
        });
        self.count = if repeated { self.count + 1 } else { 1 };
        self.last_time = Some(now);
        self.last_point = point;
        self.count
    }
}

#[derive(Debug, Default)]
struct PointerMemory {
    last_position: Option<Vec2>,
}

// =============================================================================
// Lifecycle
// =============================================================================

pub(crate) fn window_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    windows
        .single()
        .map(|window| Vec2::new(window.width(), window.height()))
        .unwrap_or(Vec2::new(1280.0, 720.0))
}

pub(crate) fn build_panel(
    galaxy: &GalaxySnapshot,
    settings: &GridSettings,
    size: Vec2,
    bus: &mut NotificationBus,
) -> GalaxyGridPanel {
    let theme = Theme::from_catalog(galaxy.civilizations());
    let mut panel = GalaxyGridPanel::new(
        theme,
        galaxy.viewer,
        galaxy.dimensions(),
        settings.options(),
    );
    panel.layout(size);
    panel.load(bus, galaxy);
    panel.center_on_home(galaxy);
    panel
}

fn setup_panel(
    mut commands: Commands,
    galaxy: Option<Res<GalaxySnapshot>>,
    settings: Res<GridSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut bus: ResMut<NotificationBus>,
    mut prompt: ResMut<RouteChangePrompt>,
    mut log: ResMut<EventLog>,
) {
    let Some(galaxy) = galaxy else {
        error!("No galaxy loaded, grid not created");
        log.push("No galaxy loaded".to_string());
        return;
    };

    prompt.auto_confirm = settings.auto_confirm_route_changes;
    let panel = build_panel(&galaxy, &settings, window_size(&windows), &mut bus);
    commands.insert_resource(panel);
}

fn teardown_panel(
    mut commands: Commands,
    panel: Option<ResMut<GalaxyGridPanel>>,
    mut bus: ResMut<NotificationBus>,
    mut prompt: ResMut<RouteChangePrompt>,
) {
    if let Some(mut panel) = panel {
        panel.unload(&mut bus);
    }
    prompt.clear();
    commands.remove_resource::<GalaxyGridPanel>();
}

fn rebuild_on_scenario_loaded(
    mut loaded: MessageReader<ScenarioLoaded>,
    mut panel: ResMut<GalaxyGridPanel>,
    galaxy: Res<GalaxySnapshot>,
    settings: Res<GridSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut bus: ResMut<NotificationBus>,
    mut prompt: ResMut<RouteChangePrompt>,
) {
    if loaded.read().count() == 0 {
        return;
    }
    prompt.clear();
    panel.unload(&mut bus);
    *panel = build_panel(&galaxy, &settings, window_size(&windows), &mut bus);
}

fn apply_settings(
    settings: Res<GridSettings>,
    galaxy: Res<GalaxySnapshot>,
    mut panel: ResMut<GalaxyGridPanel>,
    mut prompt: ResMut<RouteChangePrompt>,
) {
    if !settings.is_changed() {
        return;
    }
    prompt.auto_confirm = settings.auto_confirm_route_changes;
    panel.set_options(settings.options(), &*galaxy);
}

fn sync_layout(windows: Query<&Window, With<PrimaryWindow>>, mut panel: ResMut<GalaxyGridPanel>) {
    let size = window_size(&windows);
    if size != panel.viewport().viewport() {
        panel.layout(size);
    }
}

/// Losing window focus ends any modal route or trade editing.
fn handle_focus(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut was_focused: Local<bool>,
    mut panel: ResMut<GalaxyGridPanel>,
    galaxy: Res<GalaxySnapshot>,
    mut bus: ResMut<NotificationBus>,
) {
    let focused = windows.single().map(|window| window.focused).unwrap_or(true);
    if *was_focused && !focused {
        panel.capture_lost(&*galaxy, &mut bus);
    }
    *was_focused = focused;
}

// =============================================================================
// Input
// =============================================================================

#[allow(deprecated, clippy::too_many_arguments)]
fn handle_pointer(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    time: Res<Time>,
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut memory: Local<PointerMemory>,
    mut clicks: ResMut<ClickTracker>,
    mut panel: ResMut<GalaxyGridPanel>,
    galaxy: Res<GalaxySnapshot>,
    mut queue: ResMut<OrderQueue>,
    mut prompt: ResMut<RouteChangePrompt>,
    mut bus: ResMut<NotificationBus>,
    mut log: ResMut<EventLog>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(position) = window.cursor_position() else {
        if memory.last_position.take().is_some() {
            panel.pointer_left();
        }
        return;
    };

    if memory.last_position != Some(position) {
        memory.last_position = Some(position);
        panel.pointer_moved(position, &*galaxy, &*galaxy);
    }

    for event in wheel.read() {
        panel.wheel(event.y, position);
    }

    let modifiers = Modifiers {
        ctrl: keys.pressed(bindings.multi_waypoint),
    };
    for (button, pointer) in [
        (MouseButton::Left, PointerButton::Left),
        (MouseButton::Right, PointerButton::Right),
        (MouseButton::Middle, PointerButton::Middle),
    ] {
        if mouse_button.just_pressed(button) {
            let count = if pointer == PointerButton::Left {
                clicks.register(time.elapsed_secs(), position)
            } else {
                1
            };
            let mut services = Services {
                galaxy: &*galaxy,
                pathfinder: &*galaxy,
                orders: &mut *queue,
                prompt: &mut *prompt,
                bus: &mut *bus,
            };
            panel.pointer_pressed(position, pointer, modifiers, count, &mut services);
        }
        if mouse_button.just_released(button) {
            panel.pointer_released(position, pointer);
        }
    }

    for line in prompt.notices.drain(..) {
        info!("{}", line);
        log.push(line);
    }
}

/// Answers a pending route-change question from the keyboard.
fn handle_route_prompt_keys(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut prompt: ResMut<RouteChangePrompt>,
    mut queue: ResMut<OrderQueue>,
    mut log: ResMut<EventLog>,
) {
    if prompt.pending().is_none() {
        return;
    }
    let accept = input.just_pressed(bindings.confirm_accept);
    if !accept && !input.just_pressed(bindings.confirm_decline) {
        return;
    }
    if let Some(order) = prompt.answer(accept) {
        queue.submit(order);
    }
    for line in prompt.notices.drain(..) {
        info!("{}", line);
        log.push(line);
    }
}

fn handle_navigation_keys(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    galaxy: Res<GalaxySnapshot>,
    mut panel: ResMut<GalaxyGridPanel>,
) {
    if input.just_pressed(bindings.zoom_in) {
        panel.zoom_in();
    }
    if input.just_pressed(bindings.zoom_out) {
        panel.zoom_out();
    }
    if input.just_pressed(bindings.zoom_close) {
        panel.zoom_close();
    }
    if input.just_pressed(bindings.zoom_wide) {
        panel.zoom_wide();
    }

    for (key, quadrant) in [
        (bindings.quadrant_north_west, Quadrant::NorthWest),
        (bindings.quadrant_north_east, Quadrant::NorthEast),
        (bindings.quadrant_south_west, Quadrant::SouthWest),
        (bindings.quadrant_south_east, Quadrant::SouthEast),
    ] {
        if input.just_pressed(key) {
            panel.center_on_quadrant(quadrant);
        }
    }
    if input.just_pressed(bindings.center_home) {
        panel.center_on_home(&*galaxy);
    }

    let viewport = panel.viewport_mut();
    if input.just_pressed(bindings.scroll_left) {
        viewport.line_left();
    }
    if input.just_pressed(bindings.scroll_right) {
        viewport.line_right();
    }
    if input.just_pressed(bindings.scroll_up) {
        viewport.line_up();
    }
    if input.just_pressed(bindings.scroll_down) {
        viewport.line_down();
    }
    if input.just_pressed(bindings.page_left) {
        viewport.page_left();
    }
    if input.just_pressed(bindings.page_right) {
        viewport.page_right();
    }
    if input.just_pressed(bindings.page_up) {
        viewport.page_up();
    }
    if input.just_pressed(bindings.page_down) {
        viewport.page_down();
    }
}

// =============================================================================
// Frame work
// =============================================================================

fn tick_panel(
    time: Res<Time>,
    galaxy: Res<GalaxySnapshot>,
    mut panel: ResMut<GalaxyGridPanel>,
    mut bus: ResMut<NotificationBus>,
) {
    panel.tick(time.delta_secs(), &*galaxy, &mut bus);
}

fn drain_panel_events(
    mut panel: ResMut<GalaxyGridPanel>,
    galaxy: Res<GalaxySnapshot>,
    mut log: ResMut<EventLog>,
) {
    for event in panel.take_events() {
        match event {
            PanelEvent::SectorDoubleClicked(sector) => {
                let name = galaxy
                    .colony_at(sector)
                    .map_or_else(|| sector.to_string(), |colony| colony.name.clone());
                info!("Colony opened: {}", name);
                log.push(format!("Colony: {}", name));
            }
        }
    }
}

fn handle_dump_request(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    galaxy: Res<GalaxySnapshot>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.dump_map) {
        return;
    }
    let map = render_map(&*galaxy);
    for line in map.lines() {
        info!("{}", line);
    }
    log.push(format!("Map dumped ({} lines)", map.lines().count()));
}
