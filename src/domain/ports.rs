use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::landmarks::PoseFrame;

/// Single-slot buffer the sensor overwrites with its latest result.
pub type PoseSlot = watch::Sender<Option<PoseFrame>>;

#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The player refused camera access (or the browser blocked it).
    PermissionDenied(String),
    /// No camera, or the sensor's transport went away.
    Unavailable(String),
    /// The sensor did not confirm capture in time.
    Timeout,
}

impl SensorError {
    /// Short reason surfaced to the player.
    pub fn reason(&self) -> String {
        match self {
            SensorError::PermissionDenied(reason) => reason.clone(),
            SensorError::Unavailable(reason) => reason.clone(),
            SensorError::Timeout => "timeout".to_string(),
        }
    }
}

// Port for the external pose-estimation subsystem.
#[async_trait]
pub trait PoseSensor: Send {
    async fn initialize(&mut self) -> Result<(), SensorError>;
    /// Begins capture; results are written into `slot` at the sensor's own cadence.
    async fn start(&mut self, slot: PoseSlot) -> Result<(), SensorError>;
    /// Halts capture and releases the camera; returns only once fully released.
    async fn stop(&mut self);
}
