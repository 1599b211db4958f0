//! HUD setup and update systems.

use bevy::prelude::*;
use bevy::ui::Node as UiNode;
use bevy::window::PrimaryWindow;

use crate::interaction::InputMode;
use crate::model::GalaxyView;
use crate::panel::GalaxyGridPanel;
use crate::plugins::core::InputBindings;
use crate::plugins::grid::RouteChangePrompt;
use crate::snapshot::GalaxySnapshot;

use super::{HudText, LogContentText, TooltipText};

const HUD_COLOR: Color = Color::srgb(0.9, 0.9, 0.95);
const HINT_COLOR: Color = Color::srgb(0.6, 0.65, 0.72);

// =============================================================================
// Setup Systems
// =============================================================================

fn hud_node(top: Option<f32>, bottom: Option<f32>) -> UiNode {
    UiNode {
        position_type: PositionType::Absolute,
        left: Val::Px(14.0),
        top: top.map_or(Val::Auto, Val::Px),
        bottom: bottom.map_or(Val::Auto, Val::Px),
        ..default()
    }
}

pub fn setup_hud(mut commands: Commands) {
    commands.spawn((
        HudText,
        Text::new("Zoom --"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(HUD_COLOR),
        hud_node(Some(10.0), None),
    ));

    commands.spawn((
        TooltipText,
        Text::new(""),
        TextFont {
            font_size: 13.0,
            ..default()
        },
        TextColor(HUD_COLOR),
        hud_node(Some(32.0), None),
    ));

    commands.spawn((
        LogContentText,
        Text::new(""),
        TextFont {
            font_size: 12.0,
            ..default()
        },
        TextColor(HINT_COLOR),
        hud_node(None, Some(10.0)),
    ));
}

// =============================================================================
// Update Systems
// =============================================================================

fn mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Default => "Select",
        InputMode::FleetMovement => "Plot route",
        InputMode::TradeRoute => "Assign trade route",
    }
}

pub fn status_line(panel: &GalaxyGridPanel, galaxy: &dyn GalaxyView) -> String {
    let zoom = (panel.viewport().scale() * 100.0).round() as i32;
    let mut line = format!("Zoom {}% | {}", zoom, mode_label(panel.input_mode()));

    if let Some(sector) = panel.selected_sector() {
        line.push_str(&format!(" | Sector {}", sector));
        if let Some(allegiance) = panel.selected_sector_allegiance(galaxy) {
            line.push_str(&format!(" ({})", allegiance));
        }
    }
    if let Some(fleet) = panel.selected_fleet().and_then(|id| galaxy.fleet(id)) {
        line.push_str(&format!(" | {}", fleet.name));
    }
    line
}

pub fn update_hud(
    panel: Res<GalaxyGridPanel>,
    galaxy: Res<GalaxySnapshot>,
    prompt: Res<RouteChangePrompt>,
    bindings: Res<InputBindings>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };
    let mut line = status_line(&panel, &*galaxy);
    if let Some(question) = prompt.question(&bindings) {
        line.push('\n');
        line.push_str(&question);
    }
    if text.0 != line {
        text.0 = line;
    }
}

pub fn update_tooltip(
    panel: Res<GalaxyGridPanel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut tooltip: Query<&mut Text, With<TooltipText>>,
) {
    let Ok(mut text) = tooltip.single_mut() else {
        return;
    };
    let cursor = windows.single().ok().and_then(Window::cursor_position);
    let line = match cursor.and_then(|point| panel.tooltip_at(point)) {
        Some(tooltip) => tooltip.to_string(),
        None => panel
            .hovered_sector()
            .map(|sector| sector.to_string())
            .unwrap_or_default(),
    };
    if text.0 != line {
        text.0 = line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::NotificationBus;
    use crate::civs::CivId;
    use crate::grid::MapLocation;
    use crate::plugins::core::GridSettings;
    use crate::plugins::grid::build_panel;
    use crate::snapshot::{test_civs, test_fleet};

    #[test]
    fn status_line_reports_selection_and_allegiance() {
        let mut galaxy = GalaxySnapshot::new(8, 8, test_civs());
        galaxy.add_sensor(CivId(1), MapLocation::new(4, 4), 3, 1);
        galaxy.add_fleet(test_fleet(1, CivId(1), MapLocation::new(4, 4)));
        let mut bus = NotificationBus::default();
        let mut panel = build_panel(
            &galaxy,
            &GridSettings::default(),
            Vec2::new(400.0, 400.0),
            &mut bus,
        );

        let idle = status_line(&panel, &galaxy);
        assert!(idle.starts_with("Zoom "));
        assert!(idle.ends_with("| Select"));

        panel.set_selected_sector(Some(MapLocation::new(5, 5)), &galaxy);
        let selected = status_line(&panel, &galaxy);
        assert!(selected.ends_with("| Sector (5, 5) (no owner)"));
    }

    #[test]
    fn mode_labels_are_distinct() {
        assert_ne!(
            mode_label(InputMode::FleetMovement),
            mode_label(InputMode::TradeRoute)
        );
        assert_eq!(mode_label(InputMode::Default), "Select");
    }
}
