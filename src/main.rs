use bevy::prelude::*;

mod camera;
mod config;
mod game;
mod input;
mod stage;

use bevy::window::WindowResolution;
use camera::CameraPlugin;
use config::GameConfig;
use input::InputPlugin;
use stage::StagePlugin;

fn main() {
    let config = GameConfig::from_env();
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Egg Party".into(),
            resolution: WindowResolution::new(
                config.stage_size.x as u32,
                config.stage_size.y as u32,
            ),
            resizable: true,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
    .insert_resource(config)
    .add_plugins(CameraPlugin)
    .add_plugins(InputPlugin)
    .add_plugins(StagePlugin);

    app.run();
}
