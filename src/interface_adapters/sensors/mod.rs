// Pose sensor adapters implementing the domain sensor port.

pub mod remote;

pub use remote::{CaptureCommand, RemotePoseSensor, SensorLink, SensorStatus};
