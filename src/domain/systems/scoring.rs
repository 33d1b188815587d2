use crate::domain::beatmap::NoteColor;
use crate::domain::state::Hand;
use crate::domain::stats::GameStats;
use crate::domain::tuning::ScoringTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitVerdict {
    /// The saber's hand matches the block color.
    Good,
    /// Wrong saber: combo resets, nothing else changes.
    Bad,
}

pub fn apply_hit(
    stats: &mut GameStats,
    hand: Hand,
    color: NoteColor,
    tuning: &ScoringTuning,
) -> HitVerdict {
    if !hand.matches(color) {
        stats.combo = 0;
        return HitVerdict::Bad;
    }

    stats.score = stats
        .score
        .saturating_add(tuning.base_points)
        .saturating_add(u64::from(stats.combo) * tuning.combo_bonus);
    stats.combo = stats.combo.saturating_add(1);
    stats.max_combo = stats.max_combo.max(stats.combo);
    stats.health = (stats.health + tuning.heal_per_hit).min(tuning.max_health);
    HitVerdict::Good
}

/// Resets the combo and, unless god mode is on, drains health (never below zero).
pub fn apply_miss(stats: &mut GameStats, god_mode: bool, tuning: &ScoringTuning) {
    stats.combo = 0;
    if !god_mode {
        stats.health = (stats.health - tuning.damage_per_miss).max(0.0);
    }
}

/// Pitch multiplier for a hit sound.
pub fn hit_pitch(hand: Hand, tuning: &ScoringTuning) -> f32 {
    match hand {
        Hand::Left => tuning.left_pitch,
        Hand::Right => tuning.right_pitch,
    }
}
