// Gameplay tuning, kept apart from runtime/server configuration.

pub mod calibration;
pub mod effects;
pub mod play_field;
pub mod saber;
pub mod scoring;

pub use calibration::CalibrationTuning;
pub use effects::EffectsTuning;
pub use play_field::PlayFieldTuning;
pub use saber::SaberTuning;
pub use scoring::ScoringTuning;

/// Every tuning table a game session reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTuning {
    pub play_field: PlayFieldTuning,
    pub saber: SaberTuning,
    pub scoring: ScoringTuning,
    pub calibration: CalibrationTuning,
    pub effects: EffectsTuning,
}
