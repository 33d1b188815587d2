// Domain layer: core simulation types and rules.

pub mod beatmap;
pub mod debug;
pub mod landmarks;
pub mod ports;
pub mod projection;
pub mod state;
pub mod stats;
pub mod systems;
pub mod tuning;

pub use beatmap::{Beatmap, BeatmapError, NoteColor, SlashDirection, SpawnSchedule};
pub use debug::DebugConfig;
pub use landmarks::{Landmark, PoseFrame};
pub use ports::{PoseSensor, PoseSlot, SensorError};
pub use projection::Camera;
pub use state::{BlockId, BlockSnapshot, Hand, SaberSnapshot};
pub use stats::GameStats;
