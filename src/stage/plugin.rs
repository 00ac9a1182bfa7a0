use bevy::prelude::*;

use crate::game::audio::AudioPreferences;
use crate::game::session::GameSession;

use super::body::{move_obstacles, simulate_player};
use super::rules::{
    LevelCompleted, announce_completion, check_hazards, collect_pickups, count_down,
    drive_progression, handle_audio_commands, handle_commands, setup_session,
};
use super::spawn::{StageChanged, rebuild_stage, sync_transforms};

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<StageChanged>()
            .add_message::<LevelCompleted>()
            .add_systems(Startup, setup_session)
            // One simulation tick: physics first, then the controller reads
            // the grounded state it produced
            .add_systems(
                FixedUpdate,
                (
                    move_obstacles,
                    simulate_player,
                    drive_progression,
                    collect_pickups,
                    check_hazards,
                    count_down,
                )
                    .chain()
                    .run_if(resource_exists::<GameSession>),
            )
            .add_systems(
                Update,
                (handle_commands, rebuild_stage, announce_completion, sync_transforms)
                    .chain()
                    .run_if(resource_exists::<GameSession>),
            )
            .add_systems(
                Update,
                handle_audio_commands.run_if(resource_exists::<AudioPreferences>),
            );
    }
}
