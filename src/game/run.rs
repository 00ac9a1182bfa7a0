// game/run.rs

use super::jump::JumpChain;
use super::level::{CollectibleId, LevelDefinition, LevelId};
use std::collections::HashSet;

pub const MAX_LIVES: u8 = 3;

/// Points awarded per collectible
pub const COLLECTIBLE_POINTS: u32 = 10;

/// Mutable state of one playthrough of one level
#[derive(Debug, Clone)]
pub struct RunState {
    level_id: LevelId,
    next_level: Option<LevelId>,
    total: usize,
    collected: HashSet<CollectibleId>,
    /// Score carried into this level (restart returns here)
    entry_score: u32,
    score: u32,
    entry_lives: u8,
    lives: u8,
    time_limit: f32,
    time_remaining: f32,
    star_thresholds: [u32; 3],
    pub(crate) jump: JumpChain,
    complete: bool,
}

impl RunState {
    pub fn new(
        level: &LevelDefinition,
        next_level: Option<LevelId>,
        entry_score: u32,
        entry_lives: u8,
    ) -> Self {
        let entry_lives = entry_lives.clamp(1, MAX_LIVES);
        RunState {
            level_id: level.id.clone(),
            next_level,
            total: level.total_collectibles(),
            collected: HashSet::new(),
            entry_score,
            score: entry_score,
            entry_lives,
            lives: entry_lives,
            time_limit: level.time_limit,
            time_remaining: level.time_limit,
            star_thresholds: level.star_thresholds,
            jump: JumpChain::new(),
            complete: false,
        }
    }

    // === Queries ===

    pub fn level_id(&self) -> &LevelId {
        &self.level_id
    }

    pub fn next_level(&self) -> Option<&LevelId> {
        self.next_level.as_ref()
    }

    pub fn collected(&self) -> usize {
        self.collected.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_collected(&self, id: CollectibleId) -> bool {
        self.collected.contains(&id)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    /// Seconds played since the level was entered or restarted
    pub fn elapsed(&self) -> f32 {
        self.time_limit - self.time_remaining
    }

    pub fn jump_stage(&self) -> usize {
        self.jump.stage()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn all_collected(&self) -> bool {
        self.collected.len() >= self.total
    }

    /// Points earned inside this level, before any time bonus
    pub fn level_points(&self) -> u32 {
        self.score - self.entry_score
    }

    /// Number of star thresholds reached by `level_score` (0..=3)
    pub fn stars_for(&self, level_score: u32) -> u8 {
        self.star_thresholds
            .iter()
            .filter(|&&threshold| level_score >= threshold)
            .count() as u8
    }

    // === Mutation ===

    /// Returns false when the id was already collected
    pub(crate) fn collect(&mut self, id: CollectibleId) -> bool {
        if !self.collected.insert(id) {
            return false;
        }
        self.score += COLLECTIBLE_POINTS;
        true
    }

    pub(crate) fn mark_complete(&mut self, time_bonus: u32) {
        self.score += time_bonus;
        self.complete = true;
    }

    /// Count the clock down, returning true when it hits zero
    pub(crate) fn tick_clock(&mut self, dt: f32) -> bool {
        self.time_remaining = (self.time_remaining - dt).max(0.0);
        self.time_remaining <= 0.0
    }

    /// Take a life, returning how many remain
    pub(crate) fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.jump.reset();
        self.lives
    }

    /// Back to the state the level was entered with
    pub(crate) fn reset(&mut self) {
        self.collected.clear();
        self.score = self.entry_score;
        self.lives = self.entry_lives;
        self.time_remaining = self.time_limit;
        self.jump.reset();
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::tests::test_level;

    #[test]
    fn test_collect_is_idempotent() {
        let level = test_level("1-1", 3);
        let mut run = RunState::new(&level, None, 0, MAX_LIVES);

        assert!(run.collect(CollectibleId(0)));
        assert!(!run.collect(CollectibleId(0)));
        assert_eq!(run.collected(), 1);
        assert_eq!(run.score(), COLLECTIBLE_POINTS);
    }

    #[test]
    fn test_reset_restores_entry_values() {
        let level = test_level("1-2", 5);
        let mut run = RunState::new(&level, None, 40, 2);

        run.collect(CollectibleId(1));
        run.collect(CollectibleId(2));
        run.lose_life();
        run.tick_clock(12.5);
        run.reset();

        assert_eq!(run.collected(), 0);
        assert_eq!(run.score(), 40);
        assert_eq!(run.lives(), 2);
        assert_eq!(run.time_remaining(), level.time_limit);
        assert_eq!(run.elapsed(), 0.0);
        assert!(!run.is_complete());
    }

    #[test]
    fn test_stars_for_score() {
        let level = test_level("1-1", 3);
        let run = RunState::new(&level, None, 0, MAX_LIVES);

        assert_eq!(run.stars_for(0), 0);
        assert_eq!(run.stars_for(10), 1);
        assert_eq!(run.stars_for(29), 2);
        assert_eq!(run.stars_for(500), 3);
    }

    #[test]
    fn test_clock_clamps_at_zero() {
        let level = test_level("1-1", 1);
        let mut run = RunState::new(&level, None, 0, MAX_LIVES);

        assert!(!run.tick_clock(30.0));
        assert!(run.tick_clock(45.0));
        assert_eq!(run.time_remaining(), 0.0);
    }

    #[test]
    fn test_entry_lives_are_clamped() {
        let level = test_level("1-1", 1);

        assert_eq!(RunState::new(&level, None, 0, 9).lives(), MAX_LIVES);
        assert_eq!(RunState::new(&level, None, 0, 0).lives(), 1);
    }
}
