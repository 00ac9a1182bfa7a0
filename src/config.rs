use bevy::prelude::*;
use std::path::PathBuf;

use crate::game::jump::JumpProfile;
use crate::game::level::LevelId;

pub const SAVE_DIR_ENV: &str = "EGG_PARTY_SAVE_DIR";
pub const START_LEVEL_ENV: &str = "EGG_PARTY_START_LEVEL";

/// Tunables for the arcade physics and the session
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Stage size in pixels (y grows downwards)
    pub stage_size: Vec2,
    /// Downward acceleration, px/s²
    pub gravity: f32,
    /// Horizontal walking speed, px/s
    pub move_speed: f32,
    /// Falling below this y costs a life
    pub fall_limit: f32,
    /// Vertical impulse of a bounce pad before its power factor
    pub bounce_impulse: f32,
    /// Half size of the egg's collision box
    pub player_half_size: Vec2,
    /// Half size of a collectible's pickup box
    pub collectible_half_size: Vec2,
    /// Simulation rate of the FixedUpdate schedule
    pub fixed_hz: f64,
    pub jump: JumpProfile,
    pub save_dir: PathBuf,
    /// Level to open on launch (first level when None)
    pub start_level: Option<LevelId>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stage_size: Vec2::new(800.0, 600.0),
            gravity: 800.0,
            move_speed: 160.0,
            fall_limit: 650.0,
            bounce_impulse: -300.0,
            player_half_size: Vec2::splat(16.0),
            collectible_half_size: Vec2::splat(12.0),
            fixed_hz: 60.0,
            jump: JumpProfile::default(),
            save_dir: PathBuf::from("saves"),
            start_level: None,
        }
    }
}

impl GameConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(SAVE_DIR_ENV).ok(),
            std::env::var(START_LEVEL_ENV).ok(),
        )
    }

    fn with_overrides(mut self, save_dir: Option<String>, start_level: Option<String>) -> Self {
        if let Some(dir) = save_dir.filter(|d| !d.trim().is_empty()) {
            self.save_dir = PathBuf::from(dir);
        }
        if let Some(id) = start_level.filter(|id| !id.trim().is_empty()) {
            self.start_level = Some(LevelId::new(id.trim()));
        }
        self
    }
}
