//! UI plugin for the grid screen.
//!
//! - HUD (zoom, input mode, selection and hover read-outs)
//! - Log panel (recent event log entries)

mod hud;
mod log;

use bevy::prelude::*;

use crate::panel::GalaxyGridPanel;
use crate::plugins::core::GameState;

// =============================================================================
// Plugin
// =============================================================================

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, hud::setup_hud)
            .add_systems(Update, log::update_log_panel)
            .add_systems(
                Update,
                (hud::update_hud, hud::update_tooltip)
                    .run_if(in_state(GameState::InGame))
                    .run_if(resource_exists::<GalaxyGridPanel>),
            );
    }
}

// =============================================================================
// Components
// =============================================================================

#[derive(Component)]
pub struct HudText;

#[derive(Component)]
pub struct TooltipText;

#[derive(Component)]
pub struct LogContentText;
