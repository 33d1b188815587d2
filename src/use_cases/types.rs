// Use-case level inputs/outputs for a play session.

use crate::domain::systems::EffectKind;
use crate::domain::{Beatmap, BlockId, BlockSnapshot, Camera, DebugConfig, GameStats, SaberSnapshot};
use glam::{Quat, Vec3};

/// Commands a connection sends to its session controller.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Start { beatmap: Beatmap, debug: DebugConfig },
    Pause,
    Resume,
    Debug(DebugConfig),
    Stop,
}

/// Events delivered to a running session task.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Pause,
    Resume,
    Debug(DebugConfig),
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    /// Sensor started, no pose result yet.
    Initializing,
    Calibrating,
    Playing,
    Paused,
    GameOver { score: u64 },
    SongComplete { score: u64, max_combo: u32 },
    PermissionDenied { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    GoodHit,
    BadHit,
    Miss,
}

/// Discrete sound trigger for the audio sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioCue {
    pub kind: CueKind,
    /// Pitch multiplier; depends on which saber scored.
    pub pitch: f32,
    pub block_id: BlockId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSnapshot {
    pub left: f32,
    pub right: f32,
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSnapshot {
    pub id: u64,
    pub kind: EffectKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub opacity: f32,
}

/// Everything the render sink needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub tick: u64,
    pub camera: Camera,
    pub sabers: Vec<SaberSnapshot>,
    pub blocks: Vec<BlockSnapshot>,
    pub effects: Vec<EffectSnapshot>,
    pub stats: GameStats,
    /// Present while the calibration gate is active.
    pub calibration: Option<CalibrationSnapshot>,
    pub show_avatar: bool,
}
