use bevy::prelude::*;

mod bus;
mod civs;
mod dump;
mod fleets;
mod grid;
mod interaction;
mod model;
mod panel;
mod perception;
mod plugins;
mod scene;
mod snapshot;
mod theme;
mod viewport;

fn main() {
    App::new()
        .insert_resource(ClearColor(plugins::render2d::BACKGROUND))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Galaxy Grid".to_string(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            plugins::core::CorePlugin,
            plugins::saveload::SaveLoadPlugin,
            plugins::orders::OrdersPlugin,
            plugins::grid::GridPlugin,
            plugins::render2d::Render2DPlugin,
            plugins::ui::UIPlugin,
        ))
        .run();
}
