use bevy::prelude::*;

use crate::config::GameConfig;
use crate::game::audio::{AudioPreferences, Channel, VOLUME_STEP};
use crate::game::level::LevelCatalog;
use crate::game::progress::ProgressBook;
use crate::game::progression::{
    CollectOutcome, CompletionSummary, ControllerState, HazardOutcome, NextLevel, TickInput,
    TimeOutcome,
};
use crate::game::session::GameSession;
use crate::game::store::platform_store;
use crate::input::{ControlState, GameCommand};

use super::body::{ArcadeBody, Obstacle, Player, overlaps};
use super::spawn::{Collectible, StageChanged};

/// Fired once when the last collectible of a level is taken
#[derive(Message, Debug, Clone)]
pub struct LevelCompleted(pub CompletionSummary);

/// System: load the catalog and saved progress, then open the first level
pub fn setup_session(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut exit: MessageWriter<AppExit>,
    mut changed: MessageWriter<StageChanged>,
) {
    let catalog = match LevelCatalog::load() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to load levels: {}", e);
            exit.write(AppExit::error());
            return;
        }
    };

    let book = ProgressBook::new(platform_store(&config.save_dir));
    let mut session = GameSession::new(catalog, book, config.jump.clone());

    let first = session.catalog().first().id.clone();
    let wanted = config.start_level.clone().unwrap_or_else(|| first.clone());
    if let Err(e) = session.start_level(&wanted) {
        warn!("{}; starting {} instead", e, first);
        if let Err(e) = session.start_level(&first) {
            error!("{}", e);
        }
    }

    info!(
        "Session ready: {} levels, saves in {}",
        session.catalog().len(),
        config.save_dir.display()
    );
    commands.insert_resource(session);
    commands.insert_resource(AudioPreferences::load(platform_store(&config.save_dir)));
    changed.write(StageChanged);
}

/// Feed grounded state and the jump key to the controller; apply its impulse
pub fn drive_progression(
    controls: Res<ControlState>,
    mut session: ResMut<GameSession>,
    mut players: Query<&mut ArcadeBody, With<Player>>,
) {
    let Ok(mut body) = players.single_mut() else {
        return;
    };

    let decision = session.tick(TickInput {
        grounded: body.grounded,
        jump_held: controls.jump_held,
    });
    if let Some(impulse) = decision.impulse() {
        body.velocity.y = impulse;
        body.grounded = false;
    }
}

pub fn collect_pickups(
    mut commands: Commands,
    mut session: ResMut<GameSession>,
    players: Query<&ArcadeBody, With<Player>>,
    pickups: Query<(Entity, &Collectible)>,
    mut completed: MessageWriter<LevelCompleted>,
) {
    let Ok(body) = players.single() else {
        return;
    };
    let egg = body.rect();

    for (entity, pickup) in &pickups {
        if !overlaps(egg, pickup.rect) {
            continue;
        }

        match session.collect(pickup.id) {
            Ok(CollectOutcome::Collected { .. }) | Ok(CollectOutcome::AlreadyCollected) => {
                commands.entity(entity).despawn();
            }
            Ok(CollectOutcome::LevelComplete(summary)) => {
                commands.entity(entity).despawn();
                completed.write(LevelCompleted(summary));
            }
            Ok(CollectOutcome::Ignored) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        }

        if let Some(info) = session.progress() {
            info!("{}", info.display_string());
        }
    }
}

/// Falling out of the stage or touching an obstacle costs a life
pub fn check_hazards(
    config: Res<GameConfig>,
    mut session: ResMut<GameSession>,
    mut players: Query<&mut ArcadeBody, With<Player>>,
    obstacles: Query<&Obstacle>,
) {
    let Ok(mut body) = players.single_mut() else {
        return;
    };

    let fell = body.position.y - body.half_size.y > config.fall_limit;
    let hit = obstacles.iter().any(|o| overlaps(body.rect(), o.rect()));
    if !fell && !hit {
        return;
    }

    let start = session
        .current_level()
        .map(|level| Vec2::from(level.start));

    match session.hazard() {
        HazardOutcome::Respawn { .. } => {
            if let Some(start) = start {
                body.respawn(start);
            }
        }
        HazardOutcome::GameOver(reason) => {
            info!("Game over ({:?}). R to retry, Esc for the menu", reason);
        }
        // Nothing to lose outside of play, but never let the egg fall forever
        HazardOutcome::Ignored => {
            if let (true, Some(start)) = (fell, start) {
                body.respawn(start);
            }
        }
    }
}

pub fn count_down(time: Res<Time>, mut session: ResMut<GameSession>) {
    if let TimeOutcome::Expired(reason) = session.advance_time(time.delta_secs()) {
        info!("Game over ({:?}). R to retry, Esc for the menu", reason);
    }
}

pub fn announce_completion(mut completed: MessageReader<LevelCompleted>) {
    for LevelCompleted(summary) in completed.read() {
        info!(
            "Level {} complete! {} + {} time bonus = {} ({} star(s)), run score {}",
            summary.level_id,
            summary.level_points,
            summary.time_bonus,
            summary.level_score,
            summary.stars,
            summary.run_score
        );
        match &summary.next {
            NextLevel::Level(next) => info!("Enter to continue to {}", next),
            NextLevel::NoNextLevel => info!("That was the last level. Esc for the menu"),
        }
    }
}

/// Pausing stops virtual time, which also halts the fixed tick and the level clock
fn toggle_pause(session: &GameSession, time: &mut Time<Virtual>) {
    if time.is_paused() {
        time.unpause();
        info!("Resumed");
    } else if session.state() == ControllerState::Playing {
        time.pause();
        info!("Paused. P to resume");
    }
}

/// System: apply keyboard commands to the session
pub fn handle_commands(
    mut requests: MessageReader<GameCommand>,
    mut session: ResMut<GameSession>,
    mut time: ResMut<Time<Virtual>>,
    mut changed: MessageWriter<StageChanged>,
) {
    for command in requests.read() {
        let rebuild = match *command {
            GameCommand::Pause => {
                toggle_pause(&session, &mut time);
                continue;
            }
            GameCommand::ToggleMute | GameCommand::VolumeUp | GameCommand::VolumeDown => {
                continue;
            }
            GameCommand::Restart => session.restart().map(|()| true),
            GameCommand::Advance => session.advance().map(|next| match next {
                NextLevel::Level(_) => true,
                NextLevel::NoNextLevel => {
                    info!("All levels cleared!");
                    false
                }
            }),
            GameCommand::ReturnToMenu => {
                session.return_to_menu();
                Ok(true)
            }
            GameCommand::SelectLevel(index) => {
                // Level keys only act on the menu
                if session.state() != ControllerState::Loading {
                    continue;
                }
                let Some(id) = session.catalog().by_index(index).map(|l| l.id.clone()) else {
                    continue;
                };
                session.start_level(&id).map(|()| true)
            }
        };

        match rebuild {
            Ok(true) => {
                // Leaving the paused level also leaves the pause
                time.unpause();
                changed.write(StageChanged);
            }
            Ok(false) => {}
            Err(e) => warn!("{}", e),
        }
    }
}

/// System: apply mute and volume keys
pub fn handle_audio_commands(
    mut requests: MessageReader<GameCommand>,
    mut audio: ResMut<AudioPreferences>,
) {
    for command in requests.read() {
        let saved = match command {
            GameCommand::ToggleMute => audio.toggle_mute().map(|_| ()),
            GameCommand::VolumeUp => audio.nudge_volume(VOLUME_STEP).map(|_| ()),
            GameCommand::VolumeDown => audio.nudge_volume(-VOLUME_STEP).map(|_| ()),
            _ => continue,
        };
        if let Err(e) = saved {
            warn!("{}", e);
        }
        let settings = audio.settings();
        debug!(
            "Mixer gain: music {:.1}, effects {:.1}",
            settings.gain(Channel::Music),
            settings.gain(Channel::Effects)
        );
    }
}
