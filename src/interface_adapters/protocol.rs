// Wire protocol DTOs and conversions for the player WebSocket and HTTP routes.

use crate::domain::beatmap::{BeatItem, LaneLayout, Note, SubBeat};
use crate::domain::systems::EffectKind;
use crate::domain::{
    Beatmap, BeatmapError, BlockSnapshot, DebugConfig, Hand, Landmark, NoteColor, PoseFrame,
    SaberSnapshot, SlashDirection,
};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::sensors::{CaptureCommand, SensorStatus};
use crate::use_cases::types::{CalibrationSnapshot, EffectSnapshot, FrameUpdate};
use crate::use_cases::{AudioCue, CueKind, SessionState};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Camera control for the browser-side pose sensor.
    Capture(CaptureDto),
    // Session lifecycle transitions.
    State(SessionStateDto),
    // Render-sink snapshot for one tick.
    Frame(FrameUpdateDto),
    // Discrete audio trigger.
    Cue(AudioCueDto),
    // A client message was understood but could not be acted on.
    Error(ErrorResponse),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Start(StartPayload),
    // Reply to a `Capture::Start` command.
    SensorStatus(SensorStatusDto),
    Pose(PoseDto),
    Pause,
    Resume,
    Debug(DebugConfigDto),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaptureDto {
    Start,
    Stop,
}

impl From<CaptureCommand> for CaptureDto {
    fn from(command: CaptureCommand) -> Self {
        match command {
            CaptureCommand::Start => CaptureDto::Start,
            CaptureCommand::Stop => CaptureDto::Stop,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartPayload {
    pub beatmap: BeatmapDto,
    #[serde(default)]
    pub debug: Option<DebugConfigDto>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum SensorStatusDto {
    Started,
    Denied { reason: String },
}

impl From<SensorStatusDto> for SensorStatus {
    fn from(status: SensorStatusDto) -> Self {
        match status {
            SensorStatusDto::Started => SensorStatus::Started,
            SensorStatusDto::Denied { reason } => SensorStatus::Denied { reason },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoseDto {
    pub landmarks: Vec<LandmarkDto>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LandmarkDto {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl From<PoseDto> for PoseFrame {
    fn from(pose: PoseDto) -> Self {
        PoseFrame::new(
            pose.landmarks
                .into_iter()
                .map(|l| Landmark {
                    x: l.x,
                    y: l.y,
                    z: l.z,
                    visibility: l.visibility,
                })
                .collect(),
        )
    }
}

/// Debug toggles; omitted fields keep their defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DebugConfigDto {
    pub god_mode: bool,
    pub saber_scale: f32,
    pub block_scale: f32,
    pub show_hitboxes: bool,
    pub show_avatar: bool,
}

impl Default for DebugConfigDto {
    fn default() -> Self {
        let config = DebugConfig::default();
        Self {
            god_mode: config.god_mode,
            saber_scale: config.saber_scale,
            block_scale: config.block_scale,
            show_hitboxes: config.show_hitboxes,
            show_avatar: config.show_avatar,
        }
    }
}

impl From<DebugConfigDto> for DebugConfig {
    fn from(dto: DebugConfigDto) -> Self {
        DebugConfig {
            god_mode: dto.god_mode,
            saber_scale: dto.saber_scale,
            block_scale: dto.block_scale,
            show_hitboxes: dto.show_hitboxes,
            show_avatar: dto.show_avatar,
        }
        .sanitized()
    }
}

/// Beatmap file format.
#[derive(Debug, Clone, Deserialize)]
pub struct BeatmapDto {
    pub bpm: f32,
    #[serde(default)]
    pub start_delay_ms: u64,
    /// Custom lane targets; the default 4x3 grid is used when absent. Lane indices follow
    /// label order.
    #[serde(default)]
    pub lanes: Option<BTreeMap<String, [f32; 2]>>,
    pub measures: Vec<Vec<Option<BeatItemDto>>>,
}

/// `"M2"`, `{lane, ...}`, `{"group": [...]}`, or an array of those (a subdivided beat).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BeatItemDto {
    Lane(String),
    Group { group: Vec<NoteRefDto> },
    Note(NoteDto),
    Subdivided(Vec<Option<SubBeatDto>>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubBeatDto {
    Lane(String),
    Group { group: Vec<NoteRefDto> },
    Note(NoteDto),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NoteRefDto {
    Lane(String),
    Note(NoteDto),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteDto {
    pub lane: String,
    #[serde(default)]
    pub direction: SlashDirectionDto,
    #[serde(default)]
    pub color: Option<NoteColorDto>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlashDirectionDto {
    #[default]
    Any,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColorDto {
    Left,
    Right,
    Both,
}

impl From<SlashDirectionDto> for SlashDirection {
    fn from(dto: SlashDirectionDto) -> Self {
        match dto {
            SlashDirectionDto::Any => SlashDirection::Any,
            SlashDirectionDto::Up => SlashDirection::Up,
            SlashDirectionDto::Down => SlashDirection::Down,
            SlashDirectionDto::Left => SlashDirection::Left,
            SlashDirectionDto::Right => SlashDirection::Right,
            SlashDirectionDto::UpLeft => SlashDirection::UpLeft,
            SlashDirectionDto::UpRight => SlashDirection::UpRight,
            SlashDirectionDto::DownLeft => SlashDirection::DownLeft,
            SlashDirectionDto::DownRight => SlashDirection::DownRight,
        }
    }
}

impl From<NoteColorDto> for NoteColor {
    fn from(dto: NoteColorDto) -> Self {
        match dto {
            NoteColorDto::Left => NoteColor::Left,
            NoteColorDto::Right => NoteColor::Right,
            NoteColorDto::Both => NoteColor::Both,
        }
    }
}

impl From<NoteColor> for NoteColorDto {
    fn from(color: NoteColor) -> Self {
        match color {
            NoteColor::Left => NoteColorDto::Left,
            NoteColor::Right => NoteColorDto::Right,
            NoteColor::Both => NoteColorDto::Both,
        }
    }
}

impl TryFrom<BeatmapDto> for Beatmap {
    type Error = BeatmapError;

    fn try_from(dto: BeatmapDto) -> Result<Self, Self::Error> {
        let lanes = match dto.lanes {
            Some(lanes) => LaneLayout::new(
                lanes
                    .into_iter()
                    .map(|(label, [x, y])| (label, Vec2::new(x, y)))
                    .collect(),
            ),
            None => LaneLayout::default(),
        };

        let measures = dto
            .measures
            .into_iter()
            .map(|measure| {
                measure
                    .into_iter()
                    .map(|item| beat_item(item, &lanes))
                    .collect()
            })
            .collect();

        Beatmap::new(
            dto.bpm,
            dto.start_delay_ms as f32 / 1000.0,
            measures,
            lanes,
        )
    }
}

fn beat_item(item: Option<BeatItemDto>, lanes: &LaneLayout) -> BeatItem {
    match item {
        None => BeatItem::Rest,
        Some(BeatItemDto::Lane(lane)) => BeatItem::Single(lane_note(lane, lanes)),
        Some(BeatItemDto::Note(note)) => BeatItem::Single(object_note(note, lanes)),
        Some(BeatItemDto::Group { group }) => BeatItem::Group(group_notes(group, lanes)),
        Some(BeatItemDto::Subdivided(slots)) => BeatItem::Subdivided(
            slots
                .into_iter()
                .map(|slot| match slot {
                    None => SubBeat::Rest,
                    Some(SubBeatDto::Lane(lane)) => SubBeat::Single(lane_note(lane, lanes)),
                    Some(SubBeatDto::Note(note)) => SubBeat::Single(object_note(note, lanes)),
                    Some(SubBeatDto::Group { group }) => SubBeat::Group(group_notes(group, lanes)),
                })
                .collect(),
        ),
    }
}

fn group_notes(group: Vec<NoteRefDto>, lanes: &LaneLayout) -> Vec<Note> {
    group
        .into_iter()
        .map(|note| match note {
            NoteRefDto::Lane(lane) => lane_note(lane, lanes),
            NoteRefDto::Note(note) => object_note(note, lanes),
        })
        .collect()
}

fn lane_note(lane: String, lanes: &LaneLayout) -> Note {
    Note {
        color: lanes.side_of(&lane),
        direction: SlashDirection::Any,
        lane,
    }
}

fn object_note(note: NoteDto, lanes: &LaneLayout) -> Note {
    Note {
        color: note
            .color
            .map(NoteColor::from)
            .unwrap_or_else(|| lanes.side_of(&note.lane)),
        direction: note.direction.into(),
        lane: note.lane,
    }
}

/// Session lifecycle state sent to clients for UI flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionStateDto {
    Idle,
    Initializing,
    Calibrating,
    Playing,
    Paused,
    GameOver { score: u64 },
    SongComplete { score: u64, max_combo: u32 },
    PermissionDenied { reason: String },
}

impl From<SessionState> for SessionStateDto {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => SessionStateDto::Idle,
            SessionState::Initializing => SessionStateDto::Initializing,
            SessionState::Calibrating => SessionStateDto::Calibrating,
            SessionState::Playing => SessionStateDto::Playing,
            SessionState::Paused => SessionStateDto::Paused,
            SessionState::GameOver { score } => SessionStateDto::GameOver { score },
            SessionState::SongComplete { score, max_combo } => {
                SessionStateDto::SongComplete { score, max_combo }
            }
            SessionState::PermissionDenied { reason } => {
                SessionStateDto::PermissionDenied { reason }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CueKindDto {
    GoodHit,
    BadHit,
    Miss,
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioCueDto {
    pub kind: CueKindDto,
    pub pitch: f32,
    pub block_id: u64,
}

impl From<AudioCue> for AudioCueDto {
    fn from(cue: AudioCue) -> Self {
        Self {
            kind: match cue.kind {
                CueKind::GoodHit => CueKindDto::GoodHit,
                CueKind::BadHit => CueKindDto::BadHit,
                CueKind::Miss => CueKindDto::Miss,
            },
            pitch: cue.pitch,
            block_id: cue.block_id,
        }
    }
}

/// Per-tick render payload. Vectors are `[x, y, z]`, rotations `[x, y, z, w]`.
#[derive(Debug, Clone, Serialize)]
pub struct FrameUpdateDto {
    pub tick: u64,
    pub camera: CameraDto,
    pub sabers: Vec<SaberDto>,
    pub blocks: Vec<BlockDto>,
    pub effects: Vec<EffectDto>,
    pub stats: StatsDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationDto>,
    pub show_avatar: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraDto {
    pub position: [f32; 3],
    pub fov_degrees: f32,
    pub aspect: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaberDto {
    pub hand: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: f32,
    pub tracked: bool,
}

impl From<&SaberSnapshot> for SaberDto {
    fn from(saber: &SaberSnapshot) -> Self {
        Self {
            hand: match saber.hand {
                Hand::Left => "left",
                Hand::Right => "right",
            },
            position: saber.position.to_array(),
            rotation: saber.rotation.to_array(),
            scale: saber.scale,
            tracked: saber.tracked,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockDto {
    pub id: u64,
    pub color: NoteColorDto,
    pub direction: &'static str,
    pub lane: usize,
    pub position: [f32; 3],
    pub progress: f32,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hitbox: Option<[f32; 3]>,
}

fn direction_label(direction: SlashDirection) -> &'static str {
    match direction {
        SlashDirection::Any => "any",
        SlashDirection::Up => "up",
        SlashDirection::Down => "down",
        SlashDirection::Left => "left",
        SlashDirection::Right => "right",
        SlashDirection::UpLeft => "up-left",
        SlashDirection::UpRight => "up-right",
        SlashDirection::DownLeft => "down-left",
        SlashDirection::DownRight => "down-right",
    }
}

impl From<&BlockSnapshot> for BlockDto {
    fn from(block: &BlockSnapshot) -> Self {
        Self {
            id: block.id,
            color: block.color.into(),
            direction: direction_label(block.direction),
            lane: block.lane_index,
            position: block.position.to_array(),
            progress: block.progress,
            opacity: block.opacity,
            hitbox: block.hitbox.map(|extents| extents.to_array()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectDto {
    pub id: u64,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: f32,
    pub opacity: f32,
}

impl From<&EffectSnapshot> for EffectDto {
    fn from(effect: &EffectSnapshot) -> Self {
        Self {
            id: effect.id,
            kind: match effect.kind {
                EffectKind::Spark => "spark",
                EffectKind::Debris { .. } => "debris",
                EffectKind::Shockwave => "shockwave",
            },
            position: effect.position.to_array(),
            rotation: effect.rotation.to_array(),
            scale: effect.scale,
            opacity: effect.opacity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsDto {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub health: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationDto {
    pub left: f32,
    pub right: f32,
    pub complete: bool,
}

impl From<CalibrationSnapshot> for CalibrationDto {
    fn from(calibration: CalibrationSnapshot) -> Self {
        Self {
            left: calibration.left,
            right: calibration.right,
            complete: calibration.complete,
        }
    }
}

impl From<FrameUpdate> for FrameUpdateDto {
    fn from(update: FrameUpdate) -> Self {
        Self {
            tick: update.tick,
            camera: CameraDto {
                position: update.camera.position.to_array(),
                fov_degrees: update.camera.fov_degrees,
                aspect: update.camera.aspect,
            },
            sabers: update.sabers.iter().map(SaberDto::from).collect(),
            blocks: update.blocks.iter().map(BlockDto::from).collect(),
            effects: update.effects.iter().map(EffectDto::from).collect(),
            stats: StatsDto {
                score: update.stats.score,
                combo: update.stats.combo,
                max_combo: update.stats.max_combo,
                health: update.stats.health,
            },
            calibration: update.calibration.map(CalibrationDto::from),
            show_avatar: update.show_avatar,
        }
    }
}
