// Score, combo and health for one session. Mutated only by the scoring system.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameStats {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Always within 0..=max health.
    pub health: f32,
}

impl GameStats {
    pub fn new(max_health: f32) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            health: max_health,
        }
    }
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new(100.0)
    }
}
