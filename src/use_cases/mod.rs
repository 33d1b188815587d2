// Use cases layer: session workflows driving the gameplay core.

pub mod controller;
pub mod game;
pub mod sensor;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{ControllerHandle, spawn_controller};
pub use game::{GameSession, SessionSettings};
pub use sensor::{ActiveSensor, IdleSensor};
pub use types::{AudioCue, CueKind, FrameUpdate, SessionCommand, SessionEvent, SessionState};
