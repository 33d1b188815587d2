// Per-tick gameplay systems, run by the session in a fixed order.

pub mod calibration;
pub mod collision;
pub mod effects;
pub mod motion;
pub mod sabers;
pub mod scheduler;
pub mod scoring;

pub use calibration::Calibration;
pub use effects::{Effect, EffectKind, EffectsWorld};
pub use scheduler::BeatScheduler;
pub use scoring::HitVerdict;
