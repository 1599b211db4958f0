//! 2D rendering plugin: paints the grid panel each frame through gizmos and a
//! pool of sprite and text entities.

mod camera;
mod canvas;

use bevy::ecs::schedule::IntoScheduleConfigs;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::panel::GalaxyGridPanel;
use crate::plugins::core::GameState;
use crate::plugins::grid::{window_size, GridSystems};
use crate::theme::{IconId, Theme};

pub use camera::BACKGROUND;
use canvas::{FrameCanvas, IconAtlas, SpriteDraw, TextDraw};

const SPRITE_Z: f32 = 0.0;
const TEXT_Z: f32 = 500.0;
const Z_STEP: f32 = 0.001;

// =============================================================================
// Plugin
// =============================================================================

pub struct Render2DPlugin;

impl Plugin for Render2DPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<IconAtlas>()
            .init_resource::<FrameDraws>()
            .init_resource::<DrawPool>()
            .add_systems(Startup, camera::setup_camera)
            .add_systems(
                Update,
                (load_icons, paint_grid, sync_draw_pool)
                    .chain()
                    .after(GridSystems)
                    .run_if(in_state(GameState::InGame))
                    .run_if(resource_exists::<GalaxyGridPanel>),
            )
            .add_systems(OnExit(GameState::InGame), hide_draw_pool);
    }
}

// =============================================================================
// Resources & Components
// =============================================================================

/// Sprites and labels collected while painting the current frame.
#[derive(Resource, Debug, Default)]
pub struct FrameDraws {
    pub sprites: Vec<SpriteDraw>,
    pub texts: Vec<TextDraw>,
}

/// Entities reused across frames, in draw order.
#[derive(Resource, Debug, Default)]
pub struct DrawPool {
    sprites: Vec<Entity>,
    texts: Vec<Entity>,
}

#[derive(Component)]
pub struct GridSprite;

#[derive(Component)]
pub struct GridText;

// =============================================================================
// Systems
// =============================================================================

/// Icons the atlas has not looked up yet.
fn missing_icons(theme: &Theme, atlas: &IconAtlas) -> Vec<IconId> {
    theme
        .icon_ids()
        .into_iter()
        .filter(|icon| !atlas.contains(icon))
        .collect()
}

fn load_icons(
    panel: Res<GalaxyGridPanel>,
    asset_server: Res<AssetServer>,
    mut atlas: ResMut<IconAtlas>,
) {
    for icon in missing_icons(panel.theme(), &atlas) {
        let handle = canvas::load_icon(&asset_server, &icon.0);
        atlas.insert(&icon.0, handle);
    }
}

fn paint_grid(
    panel: Res<GalaxyGridPanel>,
    atlas: Res<IconAtlas>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut gizmos: Gizmos,
    mut draws: ResMut<FrameDraws>,
) {
    let size = window_size(&windows);
    let mut canvas = FrameCanvas::new(&mut gizmos, &atlas, size);
    panel.paint(&mut canvas);
    draws.sprites = std::mem::take(&mut canvas.sprites);
    draws.texts = std::mem::take(&mut canvas.texts);
}

fn z_for(base: f32, index: usize) -> f32 {
    base + index as f32 * Z_STEP
}

/// Reuses pooled entities in order, spawns what is missing and hides the rest.
fn sync_draw_pool(
    mut commands: Commands,
    draws: Res<FrameDraws>,
    mut pool: ResMut<DrawPool>,
    mut sprites: Query<
        (&mut Sprite, &mut Transform, &mut Visibility),
        (With<GridSprite>, Without<GridText>),
    >,
    mut texts: Query<
        (
            &mut Text2d,
            &mut TextFont,
            &mut TextColor,
            &mut Transform,
            &mut Visibility,
        ),
        (With<GridText>, Without<GridSprite>),
    >,
) {
    let pool = &mut *pool;

    for (index, draw) in draws.sprites.iter().enumerate() {
        let translation = draw.center.extend(z_for(SPRITE_Z, index));
        let image = draw.image.clone().unwrap_or_default();
        match pool.sprites.get(index) {
            Some(entity) => {
                if let Ok((mut sprite, mut transform, mut visibility)) = sprites.get_mut(*entity) {
                    sprite.color = draw.color;
                    sprite.custom_size = Some(draw.size);
                    sprite.image = image;
                    transform.translation = translation;
                    *visibility = Visibility::Inherited;
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        Sprite {
                            color: draw.color,
                            custom_size: Some(draw.size),
                            image,
                            ..default()
                        },
                        Transform::from_translation(translation),
                        Visibility::Inherited,
                        GridSprite,
                    ))
                    .id();
                pool.sprites.push(entity);
            }
        }
    }
    for entity in pool.sprites.iter().skip(draws.sprites.len()) {
        if let Ok((_, _, mut visibility)) = sprites.get_mut(*entity) {
            *visibility = Visibility::Hidden;
        }
    }

    for (index, draw) in draws.texts.iter().enumerate() {
        let translation = draw.center.extend(z_for(TEXT_Z, index));
        match pool.texts.get(index) {
            Some(entity) => {
                if let Ok((mut text, mut font, mut color, mut transform, mut visibility)) =
                    texts.get_mut(*entity)
                {
                    if text.0 != draw.text {
                        text.0 = draw.text.clone();
                    }
                    font.font_size = draw.font_size;
                    color.0 = draw.color;
                    transform.translation = translation;
                    *visibility = Visibility::Inherited;
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        Text2d::new(draw.text.clone()),
                        TextFont {
                            font_size: draw.font_size,
                            ..default()
                        },
                        TextColor(draw.color),
                        Transform::from_translation(translation),
                        Visibility::Inherited,
                        GridText,
                    ))
                    .id();
                pool.texts.push(entity);
            }
        }
    }
    for entity in pool.texts.iter().skip(draws.texts.len()) {
        if let Ok((_, _, _, _, mut visibility)) = texts.get_mut(*entity) {
            *visibility = Visibility::Hidden;
        }
    }
}

fn hide_draw_pool(
    mut draws: ResMut<FrameDraws>,
    mut visibilities: Query<&mut Visibility, Or<(With<GridSprite>, With<GridText>)>>,
) {
    draws.sprites.clear();
    draws.texts.clear();
    for mut visibility in visibilities.iter_mut() {
        *visibility = Visibility::Hidden;
    }
}
