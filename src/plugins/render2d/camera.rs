//! Camera for the grid view.

use bevy::prelude::*;

// =============================================================================
// Constants
// =============================================================================

/// Window clear color behind the sectors.
pub const BACKGROUND: Color = Color::srgb(0.02, 0.02, 0.05);

#[derive(Component)]
pub struct GridCamera;

// =============================================================================
// Systems
// =============================================================================

/// The grid paints in window pixels, so the camera sits at the origin with a
/// unit orthographic scale and never moves. Scrolling lives in the viewport.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Camera {
            order: 0,
            ..default()
        },
        Transform::default(),
        GridCamera,
        Name::new("GridCamera"),
    ));
    info!("Grid camera spawned");
}
