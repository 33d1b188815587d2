/// Play-field geometry and beat scheduling tuning.
///
/// Z runs toward the camera: blocks spawn far away (negative z) and travel to the hit plane.

#[derive(Debug, Clone, Copy)]
pub struct PlayFieldTuning {
    /// Z coordinate where a block with zero beats of lead appears.
    pub spawn_z: f32,

    /// Z coordinate of the hit plane; blocks reach it exactly on their beat.
    pub hit_z: f32,

    /// Half-depth of the band around `hit_z` where blocks may be cut.
    pub hit_band: f32,

    /// Blocks crossing this z unhit are missed.
    pub despawn_z: f32,

    /// Edge length of a block's cube before debug scaling.
    pub block_size: f32,

    /// Extra padding around a block's box to tolerate fast swings.
    pub hit_margin: f32,

    /// Fraction of the lane's x offset a block starts with; it fans out to 1.0 at the hit plane.
    pub start_spread: f32,

    /// How many beats beyond the current one are dispatched early.
    pub lookahead_beats: u32,

    /// Seconds to wait after the last block resolves before the song completes.
    pub completion_grace: f32,
}

impl PlayFieldTuning {
    /// Distance a block covers in one beat.
    pub fn travel_distance(&self) -> f32 {
        self.hit_z - self.spawn_z
    }
}

impl Default for PlayFieldTuning {
    fn default() -> Self {
        Self {
            spawn_z: -30.0,
            hit_z: 0.0,
            hit_band: 0.75,
            despawn_z: 2.0,
            block_size: 0.5,
            hit_margin: 0.15,
            start_spread: 0.5,
            lookahead_beats: 2,
            completion_grace: 1.5,
        }
    }
}
