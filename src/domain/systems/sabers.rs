use crate::domain::landmarks::{ArmLandmarks, Landmark};
use crate::domain::projection::{Camera, project, sanitize};
use crate::domain::state::Saber;
use crate::domain::tuning::SaberTuning;
use glam::{Quat, Vec3};

/// Without a fresh frame for this long, a saber counts as stationary.
pub const STALE_POSE_SECONDS: f32 = 0.25;

/// Moves a saber from its arm landmarks, or holds its last transform when `arm` is `None`.
///
/// Previous-frame blade samples are kept only across fresh frames so the collision sweep
/// always spans the motion between two real sensor results.
pub fn update_saber(
    saber: &mut Saber,
    arm: Option<&ArmLandmarks>,
    camera: &Camera,
    dt: f32,
    scale: f32,
    tuning: &SaberTuning,
) {
    saber.pose_age += dt.max(0.0);

    let Some(arm) = arm else {
        saber.previous_samples = None;
        saber.scale = scale;
        if saber.pose_age > STALE_POSE_SECONDS {
            saber.velocity = Vec3::ZERO;
        }
        return;
    };

    let previous = saber.tracked.then(|| saber.world_samples(tuning));
    let wrist = to_world(&arm.wrist, camera);
    let palm = to_world(&arm.palm, camera);
    let elbow = to_world(&arm.elbow, camera);

    saber.velocity = if saber.tracked && saber.pose_age > 0.0 {
        sanitize((wrist - saber.position) / saber.pose_age)
    } else {
        Vec3::ZERO
    };
    saber.position = wrist;
    if let Some(rotation) = aim(wrist, palm, elbow) {
        saber.rotation = rotation;
    }
    saber.scale = scale;
    saber.previous_samples = previous;
    saber.tracked = true;
    saber.pose_age = 0.0;
}

fn to_world(landmark: &Landmark, camera: &Camera) -> Vec3 {
    project(landmark.x, landmark.y, landmark.z, Some(camera), false).unwrap_or(Vec3::ZERO)
}

/// Orientation pointing the blade from the wrist toward the palm, falling back to the
/// forearm direction when the palm sits on the wrist.
fn aim(wrist: Vec3, palm: Vec3, elbow: Vec3) -> Option<Quat> {
    let direction = [palm - wrist, wrist - elbow]
        .into_iter()
        .find(|d| d.is_finite() && d.length_squared() > 1e-8)?;
    Some(Quat::from_rotation_arc(Vec3::Z, direction.normalize()))
}
