// game/progression.rs

use super::jump::{JumpDecision, JumpProfile};
use super::level::{CollectibleId, LevelCatalog, LevelId};
use super::run::{MAX_LIVES, RunState};
use log::{debug, info, warn};
use std::fmt;

/// Lifecycle of the active run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No level is running (startup, menu, or a failed load)
    Loading,
    Playing,
    LevelComplete,
    /// Time ran out or all lives were lost
    GameOver,
}

impl ControllerState {
    fn accepts_jumps(self) -> bool {
        matches!(self, ControllerState::Playing | ControllerState::LevelComplete)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Loading => "loading",
            ControllerState::Playing => "playing",
            ControllerState::LevelComplete => "level complete",
            ControllerState::GameOver => "game over",
        };
        write!(f, "{}", name)
    }
}

/// Error types for progression requests
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionError {
    LevelNotFound(LevelId),
    LevelLocked(LevelId),
    InvalidCollectible(CollectibleId),
    InvalidTransition {
        from: ControllerState,
        action: &'static str,
    },
    PersistenceWriteFailure(String),
    PersistenceReadFailure(String),
}

impl fmt::Display for ProgressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionError::LevelNotFound(id) => write!(f, "Level {} does not exist", id),
            ProgressionError::LevelLocked(id) => write!(f, "Level {} is still locked", id),
            ProgressionError::InvalidCollectible(id) => {
                write!(f, "Collectible {} is not part of this level", id)
            }
            ProgressionError::InvalidTransition { from, action } => {
                write!(f, "Cannot {} while {}", action, from)
            }
            ProgressionError::PersistenceWriteFailure(msg) => {
                write!(f, "Progress could not be saved: {}", msg)
            }
            ProgressionError::PersistenceReadFailure(msg) => {
                write!(f, "Progress could not be read: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProgressionError {}

/// Where `request_advance` leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLevel {
    Level(LevelId),
    NoNextLevel,
}

/// Final numbers of a finished level
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    pub level_id: LevelId,
    /// Collectible points earned in this level
    pub level_points: u32,
    /// Whole seconds left on the clock
    pub time_bonus: u32,
    /// `level_points + time_bonus`, the value stars and records use
    pub level_score: u32,
    /// Score of the whole run including earlier levels
    pub run_score: u32,
    pub stars: u8,
    pub next: NextLevel,
}

/// Result of a collectible overlap
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    Collected { collected: usize, total: usize },
    /// The last collectible; reported exactly once per run
    LevelComplete(CompletionSummary),
    AlreadyCollected,
    /// Not playing, or the level is already complete
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    TimeUp,
    OutOfLives,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardOutcome {
    Respawn { lives_left: u8 },
    GameOver(GameOverReason),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeOutcome {
    Running { remaining: f32 },
    Expired(GameOverReason),
    /// The clock only runs while playing
    Stopped,
}

/// Physics readings for one simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub grounded: bool,
    pub jump_held: bool,
}

/// Owns the active run: jump chain, collection progress and level transitions
#[derive(Debug, Clone)]
pub struct GameProgressionController {
    state: ControllerState,
    run: Option<RunState>,
    /// Global jump tuning
    profile: JumpProfile,
    /// Jump tuning of the current level (global unless overridden)
    active_profile: JumpProfile,
}

impl Default for GameProgressionController {
    fn default() -> Self {
        Self::new(JumpProfile::default())
    }
}

impl GameProgressionController {
    pub fn new(profile: JumpProfile) -> Self {
        Self {
            state: ControllerState::Loading,
            run: None,
            active_profile: profile.clone(),
            profile,
        }
    }

    // === Query Methods ===

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn level_id(&self) -> Option<&LevelId> {
        self.run.as_ref().map(RunState::level_id)
    }

    pub fn is_level_complete(&self) -> bool {
        self.run.as_ref().is_some_and(RunState::is_complete)
    }

    pub fn jump_stage(&self) -> usize {
        self.run.as_ref().map_or(0, RunState::jump_stage)
    }

    pub fn active_profile(&self) -> &JumpProfile {
        &self.active_profile
    }

    // === Level Transitions ===

    /// Start a level from scratch: score 0, full lives. Only valid while no
    /// run is active; a running level is left through advance or the menu.
    pub fn load_level(
        &mut self,
        catalog: &LevelCatalog,
        id: &LevelId,
    ) -> Result<(), ProgressionError> {
        if self.state != ControllerState::Loading {
            return Err(ProgressionError::InvalidTransition {
                from: self.state,
                action: "load",
            });
        }
        self.enter_level(catalog, id, 0, MAX_LIVES)
    }

    fn enter_level(
        &mut self,
        catalog: &LevelCatalog,
        id: &LevelId,
        entry_score: u32,
        entry_lives: u8,
    ) -> Result<(), ProgressionError> {
        self.state = ControllerState::Loading;
        self.run = None;

        let Some(level) = catalog.get(id) else {
            warn!("Level {} not found", id);
            return Err(ProgressionError::LevelNotFound(id.clone()));
        };

        self.active_profile = match &level.jump_forces {
            Some(forces) => self
                .profile
                .with_impulses(forces.clone())
                .unwrap_or_else(|e| {
                    warn!("Ignoring jump override of level {}: {}", id, e);
                    self.profile.clone()
                }),
            None => self.profile.clone(),
        };

        let next = catalog.next_after(id).cloned();
        self.run = Some(RunState::new(level, next, entry_score, entry_lives));
        self.state = ControllerState::Playing;

        info!(
            "Level {} ({}) loaded: {} collectibles, {}s",
            level.id,
            level.name,
            level.total_collectibles(),
            level.time_limit
        );
        Ok(())
    }

    /// Reset the current level to how it was entered. Stored progress is untouched.
    pub fn request_restart(&mut self) -> Result<(), ProgressionError> {
        match self.state {
            ControllerState::Playing | ControllerState::GameOver => {}
            from => {
                return Err(ProgressionError::InvalidTransition {
                    from,
                    action: "restart",
                });
            }
        }

        if let Some(run) = self.run.as_mut() {
            run.reset();
            info!("Level {} restarted", run.level_id());
        }
        self.state = ControllerState::Playing;
        Ok(())
    }

    /// Move on from a completed level. Score and lives carry over.
    pub fn request_advance(
        &mut self,
        catalog: &LevelCatalog,
    ) -> Result<NextLevel, ProgressionError> {
        let run = match (self.state, self.run.as_ref()) {
            (ControllerState::LevelComplete, Some(run)) => run,
            (from, _) => {
                return Err(ProgressionError::InvalidTransition {
                    from,
                    action: "advance",
                });
            }
        };

        let Some(next) = run.next_level().cloned() else {
            info!("Level {} was the last level", run.level_id());
            return Ok(NextLevel::NoNextLevel);
        };

        let (score, lives) = (run.score(), run.lives());
        self.enter_level(catalog, &next, score, lives)?;
        Ok(NextLevel::Level(next))
    }

    /// Drop the run entirely
    pub fn return_to_menu(&mut self) {
        if let Some(run) = self.run.take() {
            debug!("Leaving level {} for the menu", run.level_id());
        }
        self.state = ControllerState::Loading;
    }

    // === Per-Tick Entry Points ===

    /// Grounded check followed by the jump check, in that order
    pub fn tick(&mut self, input: TickInput) -> JumpDecision {
        self.on_grounded(input.grounded);
        self.on_jump_input(input.jump_held)
    }

    pub fn on_grounded(&mut self, grounded: bool) {
        if let Some(run) = self.run.as_mut() {
            run.jump.on_grounded(grounded);
        }
    }

    /// Feed the held state of the jump control. Only a rising edge can jump.
    pub fn on_jump_input(&mut self, pressed: bool) -> JumpDecision {
        let Some(run) = self.run.as_mut() else {
            return JumpDecision::NoAction;
        };

        if !self.state.accepts_jumps() {
            run.jump.observe(pressed);
            return JumpDecision::NoAction;
        }

        let decision = run.jump.on_jump_input(pressed, &self.active_profile);
        if let JumpDecision::ApplyImpulse { stage, impulse } = decision {
            debug!("Jump stage {} impulse {}", stage + 1, impulse);
        }
        decision
    }

    pub fn on_collectible_reached(
        &mut self,
        id: CollectibleId,
    ) -> Result<CollectOutcome, ProgressionError> {
        let Some(run) = self.run.as_mut() else {
            return Ok(CollectOutcome::Ignored);
        };
        if self.state != ControllerState::Playing || run.is_complete() {
            return Ok(CollectOutcome::Ignored);
        }

        if id.0 >= run.total() {
            warn!("Ignoring unknown collectible {} in level {}", id, run.level_id());
            return Err(ProgressionError::InvalidCollectible(id));
        }

        if !run.collect(id) {
            debug!("Collectible {} already collected", id);
            return Ok(CollectOutcome::AlreadyCollected);
        }

        info!("Collected {} ({}/{})", id, run.collected(), run.total());

        if !run.all_collected() {
            return Ok(CollectOutcome::Collected {
                collected: run.collected(),
                total: run.total(),
            });
        }

        let level_points = run.level_points();
        let time_bonus = run.time_remaining().floor() as u32;
        run.mark_complete(time_bonus);
        self.state = ControllerState::LevelComplete;

        let level_score = level_points + time_bonus;
        let summary = CompletionSummary {
            level_id: run.level_id().clone(),
            level_points,
            time_bonus,
            level_score,
            run_score: run.score(),
            stars: run.stars_for(level_score),
            next: match run.next_level() {
                Some(next) => NextLevel::Level(next.clone()),
                None => NextLevel::NoNextLevel,
            },
        };

        info!(
            "Level {} complete! score {} ({} + {} time bonus), {} star(s)",
            summary.level_id, level_score, level_points, time_bonus, summary.stars
        );
        Ok(CollectOutcome::LevelComplete(summary))
    }

    /// Count the level clock down by `dt` seconds
    pub fn advance_time(&mut self, dt: f32) -> TimeOutcome {
        let Some(run) = self.run.as_mut() else {
            return TimeOutcome::Stopped;
        };
        if self.state != ControllerState::Playing {
            return TimeOutcome::Stopped;
        }

        if run.tick_clock(dt) {
            info!("Time is up in level {}", run.level_id());
            self.state = ControllerState::GameOver;
            return TimeOutcome::Expired(GameOverReason::TimeUp);
        }
        TimeOutcome::Running {
            remaining: run.time_remaining(),
        }
    }

    /// The controlled entity fell off the stage or touched an obstacle
    pub fn on_hazard(&mut self) -> HazardOutcome {
        let Some(run) = self.run.as_mut() else {
            return HazardOutcome::Ignored;
        };
        if self.state != ControllerState::Playing {
            return HazardOutcome::Ignored;
        }

        let lives_left = run.lose_life();
        if lives_left == 0 {
            info!("Out of lives in level {}", run.level_id());
            self.state = ControllerState::GameOver;
            return HazardOutcome::GameOver(GameOverReason::OutOfLives);
        }

        info!("Ouch! {} live(s) left", lives_left);
        HazardOutcome::Respawn { lives_left }
    }
}
