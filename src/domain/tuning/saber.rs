/// Blade shape and swing sampling for the energy sabers.

#[derive(Debug, Clone, Copy)]
pub struct SaberTuning {
    /// Blade width across local X, in world units.
    pub blade_width: f32,

    /// Blade height across local Y, in world units.
    pub blade_height: f32,

    /// Blade length along local +Z (the pointing direction).
    pub blade_length: f32,

    /// Gap between the wrist and the start of the blade.
    pub forward_offset: f32,

    /// Wrist speed (world units per second) below which a saber cannot cut.
    pub min_swing_speed: f32,

    /// Sample rows along the blade length.
    pub length_steps: usize,

    /// Sample columns across each of the two blade planes.
    pub width_steps: usize,

    /// Intermediate points tested between previous and current samples.
    pub sweep_steps: usize,
}

impl Default for SaberTuning {
    fn default() -> Self {
        Self {
            blade_width: 0.08,
            blade_height: 0.08,
            blade_length: 1.1,
            forward_offset: 0.1,
            min_swing_speed: 1.5,
            length_steps: 8,
            width_steps: 3,
            sweep_steps: 6,
        }
    }
}
