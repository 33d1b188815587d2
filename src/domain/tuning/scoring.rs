/// Score, combo and health rules.

#[derive(Debug, Clone, Copy)]
pub struct ScoringTuning {
    /// Points for a correct-color cut before the combo bonus.
    pub base_points: u64,

    /// Extra points per combo step already built.
    pub combo_bonus: u64,

    /// Health restored by a correct-color cut.
    pub heal_per_hit: f32,

    /// Health lost per missed block.
    pub damage_per_miss: f32,

    /// Health ceiling (and starting health).
    pub max_health: f32,

    /// Audio pitch multiplier for cues triggered by the left saber.
    pub left_pitch: f32,

    /// Audio pitch multiplier for cues triggered by the right saber.
    pub right_pitch: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            base_points: 100,
            combo_bonus: 10,
            heal_per_hit: 2.0,
            damage_per_miss: 10.0,
            max_health: 100.0,
            left_pitch: 0.9,
            right_pitch: 1.1,
        }
    }
}
