// game/session.rs

use super::jump::{JumpDecision, JumpProfile};
use super::level::{CollectibleId, LevelCatalog, LevelDefinition, LevelId};
use super::progress::ProgressBook;
use super::progression::{
    CollectOutcome, CompletionSummary, ControllerState, GameProgressionController, HazardOutcome,
    NextLevel, ProgressionError, TickInput, TimeOutcome,
};
use bevy::prelude::Resource;
use log::warn;

/// A game session - one player working through the level catalog
#[derive(Resource)]
pub struct GameSession {
    /// The core progression state machine
    controller: GameProgressionController,
    /// Static level data
    catalog: LevelCatalog,
    /// Best scores and unlocks
    progress: ProgressBook,
}

impl GameSession {
    pub fn new(catalog: LevelCatalog, progress: ProgressBook, profile: JumpProfile) -> Self {
        GameSession {
            controller: GameProgressionController::new(profile),
            catalog,
            progress,
        }
    }

    // === Query Methods (for Bevy systems to read state) ===

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn controller(&self) -> &GameProgressionController {
        &self.controller
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn progress_book(&self) -> &ProgressBook {
        &self.progress
    }

    /// Definition of the level being played, if any
    pub fn current_level(&self) -> Option<&LevelDefinition> {
        self.controller
            .level_id()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn is_collected(&self, id: CollectibleId) -> bool {
        self.controller
            .run()
            .is_some_and(|run| run.is_collected(id))
    }

    /// Level time played so far; zero outside a run
    pub fn level_elapsed(&self) -> f32 {
        self.controller.run().map_or(0.0, |run| run.elapsed())
    }

    pub fn unlocked_levels(&self) -> Vec<LevelId> {
        self.progress.unlocked_levels(&self.catalog)
    }

    /// HUD numbers for the current run
    pub fn progress(&self) -> Option<ProgressInfo> {
        let run = self.controller.run()?;
        Some(ProgressInfo {
            collected: run.collected(),
            total: run.total(),
            score: run.score(),
            lives: run.lives(),
            time_remaining: run.time_remaining(),
        })
    }

    // === Mutation Methods (for handling game events) ===

    /// Start an unlocked level with a fresh score
    pub fn start_level(&mut self, id: &LevelId) -> Result<(), ProgressionError> {
        if self.catalog.get(id).is_none() {
            return Err(ProgressionError::LevelNotFound(id.clone()));
        }
        if !self.progress.is_unlocked(&self.catalog, id) {
            return Err(ProgressionError::LevelLocked(id.clone()));
        }
        self.controller.load_level(&self.catalog, id)
    }

    pub fn tick(&mut self, input: TickInput) -> JumpDecision {
        self.controller.tick(input)
    }

    pub fn advance_time(&mut self, dt: f32) -> TimeOutcome {
        self.controller.advance_time(dt)
    }

    pub fn hazard(&mut self) -> HazardOutcome {
        self.controller.on_hazard()
    }

    /// Register a collectible overlap; a completed level is persisted here
    pub fn collect(&mut self, id: CollectibleId) -> Result<CollectOutcome, ProgressionError> {
        let outcome = self.controller.on_collectible_reached(id)?;
        if let CollectOutcome::LevelComplete(summary) = &outcome {
            self.persist_completion(summary);
        }
        Ok(outcome)
    }

    /// Saving is best effort; a failed write never interrupts play
    fn persist_completion(&mut self, summary: &CompletionSummary) {
        if let Err(e) =
            self.progress
                .record_result(&summary.level_id, summary.level_score, summary.stars)
        {
            warn!("{}", e);
        }

        if let NextLevel::Level(next) = &summary.next {
            if let Err(e) = self.progress.unlock(next) {
                warn!("{}", e);
            }
        }
    }

    pub fn restart(&mut self) -> Result<(), ProgressionError> {
        self.controller.request_restart()
    }

    pub fn advance(&mut self) -> Result<NextLevel, ProgressionError> {
        self.controller.request_advance(&self.catalog)
    }

    pub fn return_to_menu(&mut self) {
        self.controller.return_to_menu();
    }
}

/// Progress information for HUD display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInfo {
    pub collected: usize,
    pub total: usize,
    pub score: u32,
    pub lives: u8,
    pub time_remaining: f32,
}

impl ProgressInfo {
    /// Format as a string like "Apples 2/3 | Score 20 | Lives 3 | Time 1:58"
    pub fn display_string(&self) -> String {
        let seconds = self.time_remaining.ceil() as u32;
        format!(
            "Apples {}/{} | Score {} | Lives {} | Time {}:{:02}",
            self.collected,
            self.total,
            self.score,
            self.lives,
            seconds / 60,
            seconds % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::tests::test_catalog;
    use crate::game::progress::ProgressRecord;
    use crate::game::store::{KeyValueStore, MemoryStore};

    fn session() -> GameSession {
        GameSession::new(
            test_catalog(),
            ProgressBook::new(Box::new(MemoryStore::new())),
            JumpProfile::default(),
        )
    }

    fn finish_level(session: &mut GameSession) -> CompletionSummary {
        let total = session.progress().unwrap().total;
        let mut summary = None;
        for i in 0..total {
            if let Ok(CollectOutcome::LevelComplete(s)) = session.collect(CollectibleId(i)) {
                summary = Some(s);
            }
        }
        summary.unwrap()
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, ProgressionError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), ProgressionError> {
            Err(ProgressionError::PersistenceWriteFailure(key.to_string()))
        }
    }

    #[test]
    fn test_locked_levels_cannot_start() {
        let mut session = session();

        assert_eq!(
            session.start_level(&LevelId::new("1-2")),
            Err(ProgressionError::LevelLocked(LevelId::new("1-2")))
        );
        assert_eq!(
            session.start_level(&LevelId::new("5-5")),
            Err(ProgressionError::LevelNotFound(LevelId::new("5-5")))
        );
        assert!(session.start_level(&LevelId::new("1-1")).is_ok());
        assert_eq!(session.state(), ControllerState::Playing);
    }

    #[test]
    fn test_completion_saves_and_unlocks() {
        let mut session = session();
        session.start_level(&LevelId::new("1-1")).unwrap();

        let summary = finish_level(&mut session);

        let record = session
            .progress_book()
            .load_progress(&LevelId::new("1-1"))
            .unwrap();
        assert_eq!(record.score, summary.level_score);
        assert_eq!(record.stars, summary.stars);
        assert_eq!(
            session.unlocked_levels(),
            vec![LevelId::new("1-1"), LevelId::new("1-2")]
        );
    }

    #[test]
    fn test_worse_replay_keeps_best() {
        let mut session = session();
        session.start_level(&LevelId::new("1-1")).unwrap();
        let best = finish_level(&mut session);

        session.return_to_menu();
        session.start_level(&LevelId::new("1-1")).unwrap();
        session.advance_time(50.0);
        finish_level(&mut session);

        let record: ProgressRecord = session
            .progress_book()
            .load_progress(&LevelId::new("1-1"))
            .unwrap();
        assert_eq!(record.score, best.level_score);
    }

    #[test]
    fn test_write_failure_does_not_stop_play() {
        let mut session = GameSession::new(
            test_catalog(),
            ProgressBook::new(Box::new(ReadOnlyStore)),
            JumpProfile::default(),
        );
        session.start_level(&LevelId::new("1-1")).unwrap();

        finish_level(&mut session);

        assert_eq!(session.state(), ControllerState::LevelComplete);
        assert_eq!(
            session.advance(),
            Ok(NextLevel::Level(LevelId::new("1-2")))
        );
        assert_eq!(session.state(), ControllerState::Playing);
    }

    #[test]
    fn test_current_level_and_progress() {
        let mut session = session();
        assert!(session.current_level().is_none());
        assert!(session.progress().is_none());

        session.start_level(&LevelId::new("1-1")).unwrap();
        session.collect(CollectibleId(1)).unwrap();

        assert_eq!(session.current_level().unwrap().id, LevelId::new("1-1"));
        assert!(session.is_collected(CollectibleId(1)));
        assert!(!session.is_collected(CollectibleId(0)));

        let info = session.progress().unwrap();
        assert_eq!(info.collected, 1);
        assert_eq!(info.total, 3);
        assert_eq!(
            info.display_string(),
            "Apples 1/3 | Score 10 | Lives 3 | Time 1:00"
        );

        session.return_to_menu();
        assert!(session.current_level().is_none());
    }
}
