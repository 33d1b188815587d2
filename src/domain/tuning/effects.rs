/// Cosmetic hit feedback tuning.

#[derive(Debug, Clone, Copy)]
pub struct EffectsTuning {
    /// Downward acceleration applied to debris, in world units per second squared.
    pub gravity: f32,

    /// Fraction of spark velocity lost per second.
    pub spark_drag: f32,

    pub spark_count: usize,
    pub spark_speed: f32,
    pub spark_life: f32,

    pub debris_speed: f32,
    pub debris_life: f32,
    /// Max absolute angular velocity per axis, radians per second.
    pub debris_spin: f32,

    pub shockwave_life: f32,
    /// Scale units gained per second.
    pub shockwave_growth: f32,

    /// Hard cap on live effect entities; new effects are dropped past it.
    pub max_entities: usize,
}

impl Default for EffectsTuning {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            spark_drag: 2.0,
            spark_count: 8,
            spark_speed: 3.0,
            spark_life: 0.4,
            debris_speed: 1.5,
            debris_life: 1.2,
            debris_spin: 8.0,
            shockwave_life: 0.35,
            shockwave_growth: 6.0,
            max_entities: 256,
        }
    }
}
