use bevy::prelude::*;

use crate::camera::{layers, stage_to_world};
use crate::config::GameConfig;
use crate::game::level::{
    BOUNCE_PAD_SIZE, CollectibleId, LevelDefinition, ObstacleKind, PlatformKind,
};
use crate::game::session::GameSession;

use super::body::{ArcadeBody, Obstacle, Player, Surface};

/// Depth of platform boxes, only visible through shading
const BOX_DEPTH: f32 = 16.0;

/// Marks everything that belongs to the loaded level
#[derive(Component)]
pub struct LevelEntity;

#[derive(Component, Debug, Clone, Copy)]
pub struct Collectible {
    pub id: CollectibleId,
    pub rect: Rect,
}

/// Colour palette of the coloured platforms
const PLATFORM_COLORS: [u32; 6] = [0xFF6B9D, 0x6BCEFF, 0xFFD166, 0x7AE582, 0x9B5DE5, 0x00BBF9];

const GROUND_COLOR: u32 = 0xA8E6CF;
const EGG_COLOR: u32 = 0xFFB3C6;
const APPLE_COLOR: u32 = 0xFF0000;
const PAD_COLOR: u32 = 0xFFA8A8;
const OBSTACLE_COLOR: u32 = 0x444444;
const GOAL_COLOR: u32 = 0xFFD700;

fn hex(rgb: u32) -> Color {
    Color::srgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

pub fn platform_color(kind: PlatformKind) -> Color {
    let index = match kind {
        PlatformKind::Ground | PlatformKind::Normal => return hex(GROUND_COLOR),
        PlatformKind::Color1 => 0,
        PlatformKind::Color2 => 1,
        PlatformKind::Color3 => 2,
        PlatformKind::Color4 => 3,
        PlatformKind::Color5 => 4,
        PlatformKind::Color6 => 5,
    };
    hex(PLATFORM_COLORS[index])
}

/// Sky colour behind a level's background key
pub fn background_color(key: &str) -> Color {
    match key {
        "sky_colorful" => hex(0xB5E8FF),
        "sky_mountain" => hex(0x9EC9E2),
        _ => hex(0x87CEEB),
    }
}

fn unlit(materials: &mut Assets<StandardMaterial>, rgb: u32) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: hex(rgb),
        unlit: true,
        ..default()
    })
}

fn vec(point: [f32; 2]) -> Vec2 {
    Vec2::new(point[0], point[1])
}

/// Spawn every entity of `level`. Collectibles already taken this run are skipped.
pub fn spawn_level(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    config: &GameConfig,
    level: &LevelDefinition,
    is_collected: impl Fn(CollectibleId) -> bool,
) {
    let size = config.stage_size;

    for platform in &level.platforms {
        let center = Vec2::new(platform.x, platform.y);
        let extent = Vec2::new(platform.width, platform.height);
        commands.spawn((
            LevelEntity,
            Surface {
                rect: Rect::from_center_size(center, extent),
                bounce: None,
            },
            Mesh3d(meshes.add(Cuboid::new(extent.x, extent.y, BOX_DEPTH))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: platform_color(platform.kind),
                unlit: true,
                ..default()
            })),
            Transform::from_translation(stage_to_world(size, center, layers::PLATFORM)),
        ));
    }

    let pad_size = vec(BOUNCE_PAD_SIZE);
    let pad_mesh = meshes.add(Cuboid::new(pad_size.x, pad_size.y, BOX_DEPTH));
    let pad_material = unlit(materials, PAD_COLOR);
    for pad in &level.bounce_pads {
        let center = Vec2::new(pad.x, pad.y);
        commands.spawn((
            LevelEntity,
            Surface {
                rect: Rect::from_center_size(center, pad_size),
                bounce: Some(pad.power),
            },
            Mesh3d(pad_mesh.clone()),
            MeshMaterial3d(pad_material.clone()),
            Transform::from_translation(stage_to_world(size, center, layers::PICKUP)),
        ));
    }

    let obstacle_material = unlit(materials, OBSTACLE_COLOR);
    for obstacle in &level.obstacles {
        let anchor = Vec2::new(obstacle.x, obstacle.y);
        let extent = Vec2::new(obstacle.width, obstacle.height);
        commands.spawn((
            LevelEntity,
            Obstacle {
                anchor,
                position: anchor,
                half_size: extent * 0.5,
                kind: obstacle.kind,
            },
            Mesh3d(meshes.add(Cuboid::new(extent.x, extent.y, BOX_DEPTH))),
            MeshMaterial3d(obstacle_material.clone()),
            Transform::from_translation(stage_to_world(size, anchor, layers::PICKUP)),
        ));
        if obstacle.kind != ObstacleKind::Static {
            debug!("Moving obstacle {:?} at {:?}", obstacle.kind, anchor);
        }
    }

    let apple_mesh = meshes.add(Sphere::new(config.collectible_half_size.x));
    let apple_material = unlit(materials, APPLE_COLOR);
    for (index, position) in level.collectibles.iter().enumerate() {
        let id = CollectibleId(index);
        if is_collected(id) {
            continue;
        }
        let center = vec(*position);
        commands.spawn((
            LevelEntity,
            Collectible {
                id,
                rect: Rect::from_center_half_size(center, config.collectible_half_size),
            },
            Mesh3d(apple_mesh.clone()),
            MeshMaterial3d(apple_material.clone()),
            Transform::from_translation(stage_to_world(size, center, layers::PICKUP)),
        ));
    }

    // The goal marker is decoration; completion is driven by the collectibles
    let goal = vec(level.end);
    commands.spawn((
        LevelEntity,
        Mesh3d(meshes.add(Cuboid::new(8.0, 40.0, BOX_DEPTH))),
        MeshMaterial3d(unlit(materials, GOAL_COLOR)),
        Transform::from_translation(stage_to_world(size, goal, layers::PLATFORM)),
    ));

    let start = vec(level.start);
    commands.spawn((
        LevelEntity,
        Player,
        ArcadeBody::new(start, config.player_half_size),
        Mesh3d(meshes.add(Sphere::new(config.player_half_size.x))),
        MeshMaterial3d(unlit(materials, EGG_COLOR)),
        Transform::from_translation(stage_to_world(size, start, layers::PLAYER)),
    ));

    commands.insert_resource(ClearColor(background_color(&level.background)));
    info!(
        "Stage built for {}: {} platforms, {} apples, background '{}', music '{}'",
        level.id,
        level.platforms.len(),
        level.collectibles.len(),
        level.background,
        level.music
    );
}

pub fn despawn_level(commands: &mut Commands, entities: &Query<Entity, With<LevelEntity>>) {
    for entity in entities {
        commands.entity(entity).despawn();
    }
}

/// Fired whenever the set of level entities must be rebuilt
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct StageChanged;

/// System: tear down the old level and build the session's current one
pub fn rebuild_stage(
    mut changes: MessageReader<StageChanged>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GameConfig>,
    session: Res<GameSession>,
    existing: Query<Entity, With<LevelEntity>>,
) {
    if changes.read().count() == 0 {
        return;
    }

    despawn_level(&mut commands, &existing);

    match session.current_level() {
        Some(level) => spawn_level(
            &mut commands,
            &mut meshes,
            &mut materials,
            &config,
            level,
            |id| session.is_collected(id),
        ),
        None => {
            let unlocked = session.unlocked_levels();
            info!("=== Level select ===");
            for (index, id) in session.catalog().ids().enumerate() {
                let name = session.catalog().get(id).map_or("", |level| level.name.as_str());
                let best = session.progress_book().load_progress(id);
                let status = if unlocked.contains(id) { "open" } else { "locked" };
                info!(
                    "  [{}] {} {} - {} (best {}, {} star(s))",
                    index + 1,
                    id,
                    name,
                    status,
                    best.map_or(0, |record| record.score),
                    best.map_or(0, |record| record.stars)
                );
            }
        }
    }
}

/// Mirror stage-space physics positions into world transforms
pub fn sync_transforms(
    config: Res<GameConfig>,
    mut bodies: Query<(&ArcadeBody, &mut Transform), Without<Obstacle>>,
    mut obstacles: Query<(&Obstacle, &mut Transform), Without<ArcadeBody>>,
) {
    let size = config.stage_size;
    for (body, mut transform) in &mut bodies {
        transform.translation = stage_to_world(size, body.position, layers::PLAYER);
    }
    for (obstacle, mut transform) in &mut obstacles {
        transform.translation = stage_to_world(size, obstacle.position, layers::PICKUP);
    }
}
