use crate::domain::state::{Block, Saber};
use crate::domain::tuning::{PlayFieldTuning, SaberTuning};
use glam::{Mat4, Vec3};

/// World-space axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Block box stretched over the depth it swept through the hit band on its last step.
pub fn block_bounds(block: &Block, field: &PlayFieldTuning, block_scale: f32) -> Aabb {
    let half = block.half_extents(field, block_scale);
    let mut bounds = Aabb::from_center(block.position, half);
    if let Some((near, far)) = block.band_span(field) {
        bounds.min.z = near - half.z;
        bounds.max.z = far + half.z;
    }
    bounds
}

/// Blade samples in world space using an explicit saber scale.
pub fn blade_samples(saber: &Saber, saber_scale: f32, tuning: &SaberTuning) -> Vec<Vec3> {
    let matrix = Mat4::from_scale_rotation_translation(
        Vec3::splat(saber_scale),
        saber.rotation,
        saber.position,
    );
    saber
        .blade
        .local_samples(tuning.length_steps, tuning.width_steps)
        .into_iter()
        .map(|point| matrix.transform_point3(point))
        .collect()
}

/// Swept-volume hit test between a saber blade and a block.
///
/// Pure: the verdict depends only on its inputs. Swing-speed gating is the caller's job.
/// Checks, in order, stopping at the first success:
/// 1. current blade samples inside the block box;
/// 2. points interpolated between previous and current samples;
/// 3. centroids of the quads (and their two triangles) swept by adjacent samples.
pub fn test_hit(
    saber: &Saber,
    block: &Block,
    previous: Option<&[Vec3]>,
    block_scale: f32,
    saber_scale: f32,
    field: &PlayFieldTuning,
    tuning: &SaberTuning,
) -> bool {
    let bounds = block_bounds(block, field, block_scale);
    let current = blade_samples(saber, saber_scale, tuning);

    if current.iter().any(|p| bounds.contains(*p)) {
        return true;
    }

    let Some(previous) = previous.filter(|prev| prev.len() == current.len()) else {
        return false;
    };

    if sweep_hits(&bounds, previous, &current, tuning.sweep_steps) {
        return true;
    }

    let row_stride = tuning.width_steps.max(2) * 2;
    swept_quads_hit(&bounds, previous, &current, row_stride)
}

fn sweep_hits(bounds: &Aabb, previous: &[Vec3], current: &[Vec3], steps: usize) -> bool {
    let divisions = (steps + 1) as f32;
    previous.iter().zip(current).any(|(from, to)| {
        (1..=steps).any(|step| bounds.contains(from.lerp(*to, step as f32 / divisions)))
    })
}

fn swept_quads_hit(bounds: &Aabb, previous: &[Vec3], current: &[Vec3], row_stride: usize) -> bool {
    if current.len() <= row_stride {
        return false;
    }

    (0..current.len() - row_stride).any(|i| {
        let j = i + row_stride;
        let (c0, c1, p0, p1) = (current[i], current[j], previous[i], previous[j]);
        let quad = (c0 + c1 + p0 + p1) * 0.25;
        let upper = (c0 + c1 + p0) / 3.0;
        let lower = (c1 + p1 + p0) / 3.0;
        bounds.contains(quad) || bounds.contains(upper) || bounds.contains(lower)
    })
}
