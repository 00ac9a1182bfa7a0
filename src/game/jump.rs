// game/jump.rs

/// Per-stage vertical impulses for the multi-jump chain.
///
/// Stage 0 is the ground jump; later stages are air jumps. When fewer
/// impulses than `max_jumps` are given, the last one repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpProfile {
    max_jumps: usize,
    impulses: Vec<f32>,
}

impl Default for JumpProfile {
    fn default() -> Self {
        Self {
            max_jumps: 3,
            impulses: vec![-400.0, -350.0, -350.0],
        }
    }
}

impl JumpProfile {
    pub fn new(max_jumps: usize, impulses: Vec<f32>) -> Result<Self, String> {
        if max_jumps > 0 && impulses.is_empty() {
            return Err(format!(
                "Jump profile allows {} jumps but defines no impulses",
                max_jumps
            ));
        }
        Ok(Self {
            max_jumps,
            impulses,
        })
    }

    /// Same jump count, different impulses (used for per-level overrides)
    pub fn with_impulses(&self, impulses: Vec<f32>) -> Result<Self, String> {
        Self::new(self.max_jumps, impulses)
    }

    pub fn max_jumps(&self) -> usize {
        self.max_jumps
    }

    /// Impulse for a stage, or None once the chain is exhausted
    pub fn impulse_for(&self, stage: usize) -> Option<f32> {
        if stage >= self.max_jumps {
            return None;
        }
        self.impulses
            .get(stage)
            .or_else(|| self.impulses.last())
            .copied()
    }
}

/// What the physics side should do with this tick's jump input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpDecision {
    NoAction,
    ApplyImpulse { stage: usize, impulse: f32 },
}

impl JumpDecision {
    pub fn impulse(&self) -> Option<f32> {
        match self {
            JumpDecision::ApplyImpulse { impulse, .. } => Some(*impulse),
            JumpDecision::NoAction => None,
        }
    }
}

/// Jump-stage counter plus the previous tick's key state
#[derive(Debug, Clone, Default)]
pub struct JumpChain {
    stage: usize,
    was_pressed: bool,
}

impl JumpChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Reset the chain while the body rests on a surface
    pub fn on_grounded(&mut self, grounded: bool) {
        if grounded {
            self.stage = 0;
        }
    }

    /// Record whether the jump key is held this tick, returning true on a
    /// rising edge. Must be called exactly once per tick.
    pub fn observe(&mut self, pressed: bool) -> bool {
        let rising = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        rising
    }

    pub fn on_jump_input(&mut self, pressed: bool, profile: &JumpProfile) -> JumpDecision {
        if !self.observe(pressed) {
            return JumpDecision::NoAction;
        }

        match profile.impulse_for(self.stage) {
            Some(impulse) => {
                let stage = self.stage;
                self.stage += 1;
                JumpDecision::ApplyImpulse { stage, impulse }
            }
            None => JumpDecision::NoAction,
        }
    }

    /// Back to stage 0. The key history survives so a key held across a
    /// restart or respawn does not fire a fresh jump.
    pub fn reset(&mut self) {
        self.stage = 0;
    }
}
