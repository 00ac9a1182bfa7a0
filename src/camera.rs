use bevy::camera::ScalingMode;
use bevy::prelude::*;

use crate::config::GameConfig;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera);
    }
}

#[derive(Component)]
pub struct MainCamera;

/// Depth layers along +Z (towards the camera)
pub mod layers {
    pub const PLATFORM: f32 = 0.0;
    pub const PICKUP: f32 = 1.0;
    pub const PLAYER: f32 = 2.0;
}

/// Map stage pixels (origin top-left, y down) to world space (origin at the
/// stage centre, y up)
pub fn stage_to_world(stage_size: Vec2, position: Vec2, depth: f32) -> Vec3 {
    Vec3::new(
        position.x - stage_size.x * 0.5,
        stage_size.y * 0.5 - position.y,
        depth,
    )
}

/// Orthographic camera looking down -Z at the whole stage
///
/// ```text
///        Y (up on screen)
///        ↑
///        |
///   -----+---→ X (right on screen)
///       /
///      ↙ Z (towards the viewer)
/// ```
fn setup_camera(mut commands: Commands, config: Res<GameConfig>) {
    let projection = Projection::Orthographic(OrthographicProjection {
        scaling_mode: ScalingMode::AutoMin {
            min_width: config.stage_size.x,
            min_height: config.stage_size.y,
        },
        near: 0.0,
        far: 1000.0,
        ..OrthographicProjection::default_3d()
    });
    commands.spawn((
        Camera3d::default(),
        projection,
        Transform::from_xyz(0.0, 0.0, 100.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));
}
