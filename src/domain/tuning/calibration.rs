/// Calibration gate tuning (normalized screen space).

#[derive(Debug, Clone, Copy)]
pub struct CalibrationTuning {
    /// Progress gained per second while a wrist is inside its zone.
    pub fill_rate: f32,

    /// Progress lost per second while a wrist is outside its zone.
    pub decay_rate: f32,

    /// Max distance per axis between a wrist and its zone center.
    pub tolerance: f32,

    /// Zone for the player's left wrist (screen-right in the mirrored view).
    pub left_target: (f32, f32),

    /// Zone for the player's right wrist (screen-left in the mirrored view).
    pub right_target: (f32, f32),

    /// Seconds the "complete" latch is shown before completion is signaled.
    pub completion_hold: f32,
}

impl Default for CalibrationTuning {
    fn default() -> Self {
        Self {
            fill_rate: 50.0,
            decay_rate: 100.0,
            tolerance: 0.1,
            left_target: (0.75, 0.5),
            right_target: (0.25, 0.5),
            completion_hold: 1.0,
        }
    }
}
