// Debug toggles owned by the external UI; read as a snapshot every tick.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugConfig {
    /// Misses cost no health.
    pub god_mode: bool,
    pub saber_scale: f32,
    pub block_scale: f32,
    pub show_hitboxes: bool,
    pub show_avatar: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            god_mode: false,
            saber_scale: 1.0,
            block_scale: 1.0,
            show_hitboxes: false,
            show_avatar: true,
        }
    }
}

impl DebugConfig {
    /// Replaces unusable scales with 1.0 so collision sizes stay finite and positive.
    pub fn sanitized(mut self) -> Self {
        if !self.saber_scale.is_finite() || self.saber_scale <= 0.0 {
            self.saber_scale = 1.0;
        }
        if !self.block_scale.is_finite() || self.block_scale <= 0.0 {
            self.block_scale = 1.0;
        }
        self
    }
}
