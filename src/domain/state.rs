// Simulation records for blocks and sabers, plus the snapshots published to renderers.

use crate::domain::beatmap::{NoteColor, SlashDirection};
use crate::domain::tuning::{PlayFieldTuning, SaberTuning};
use glam::{Mat4, Quat, Vec2, Vec3};

pub type BlockId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    /// Blocks this hand cuts for points.
    pub fn matches(self, color: NoteColor) -> bool {
        matches!(
            (self, color),
            (_, NoteColor::Both) | (Hand::Left, NoteColor::Left) | (Hand::Right, NoteColor::Right)
        )
    }
}

/// Local blade volume, +Z being the pointing direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BladeShape {
    pub width: f32,
    pub height: f32,
    pub length: f32,
    pub forward_offset: f32,
}

impl From<&SaberTuning> for BladeShape {
    fn from(tuning: &SaberTuning) -> Self {
        Self {
            width: tuning.blade_width,
            height: tuning.blade_height,
            length: tuning.blade_length,
            forward_offset: tuning.forward_offset,
        }
    }
}

impl BladeShape {
    /// Fixed grid of local sample points: `length_steps` rows, each holding `width_steps`
    /// points across local X followed by `width_steps` points across local Y (a cross).
    pub fn local_samples(&self, length_steps: usize, width_steps: usize) -> Vec<Vec3> {
        let length_steps = length_steps.max(2);
        let width_steps = width_steps.max(2);
        let mut points = Vec::with_capacity(length_steps * width_steps * 2);

        for row in 0..length_steps {
            let along = row as f32 / (length_steps - 1) as f32;
            let z = self.forward_offset + self.length * along;
            for column in 0..width_steps {
                let across = column as f32 / (width_steps - 1) as f32 - 0.5;
                points.push(Vec3::new(across * self.width, 0.0, z));
            }
            for column in 0..width_steps {
                let across = column as f32 / (width_steps - 1) as f32 - 0.5;
                points.push(Vec3::new(0.0, across * self.height, z));
            }
        }
        points
    }
}

/// One saber per hand; holds its last known transform when no pose is available.
#[derive(Debug, Clone)]
pub struct Saber {
    pub hand: Hand,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub blade: BladeShape,
    /// Wrist velocity in world units per second.
    pub velocity: Vec3,
    /// True once a pose frame has driven this saber.
    pub tracked: bool,
    /// Seconds since a fresh pose frame last moved this saber.
    pub pose_age: f32,
    /// World-space blade samples from the previous tick, for sweep tests.
    pub previous_samples: Option<Vec<Vec3>>,
}

impl Saber {
    pub fn new(hand: Hand, tuning: &SaberTuning) -> Self {
        Self {
            hand,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            blade: BladeShape::from(tuning),
            velocity: Vec3::ZERO,
            tracked: false,
            pose_age: 0.0,
            previous_samples: None,
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Blade sample points transformed into world space.
    pub fn world_samples(&self, tuning: &SaberTuning) -> Vec<Vec3> {
        let matrix = self.world_matrix();
        self.blade
            .local_samples(tuning.length_steps, tuning.width_steps)
            .into_iter()
            .map(|point| matrix.transform_point3(point))
            .collect()
    }
}

/// A scheduled note travelling toward the hit plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub color: NoteColor,
    pub direction: SlashDirection,
    pub lane_index: usize,
    /// Accumulated game time at spawn, in seconds.
    pub spawn_time: f32,
    /// x/y at (and before) the spawn plane.
    pub start: Vec2,
    /// x/y of the lane target on the hit plane.
    pub end: Vec2,
    /// Z this block was spawned at (further back the more beats ahead it was dispatched).
    pub spawn_z: f32,
    pub position: Vec3,
    /// Z before the most recent advance.
    pub prev_z: f32,
    pub hit: bool,
    pub missed: bool,
}

impl Block {
    /// Travel progress from the spawn plane (0) to the hit plane (1); not clamped above.
    pub fn travel(&self, field: &PlayFieldTuning) -> f32 {
        let span = field.hit_z - field.spawn_z;
        if span.abs() <= f32::EPSILON {
            return 0.0;
        }
        let t = (self.position.z - field.spawn_z) / span;
        if t.is_finite() { t.max(0.0) } else { 0.0 }
    }

    pub fn is_resolved(&self) -> bool {
        self.hit || self.missed
    }

    /// Part of the z range swept during the last advance that lies inside the hit band.
    pub fn band_span(&self, field: &PlayFieldTuning) -> Option<(f32, f32)> {
        let near = self.prev_z.min(self.position.z).max(field.hit_z - field.hit_band);
        let far = self.prev_z.max(self.position.z).min(field.hit_z + field.hit_band);
        (near <= far).then_some((near, far))
    }

    /// Half extents of the hit box: scaled cube plus the swing margin.
    pub fn half_extents(&self, field: &PlayFieldTuning, block_scale: f32) -> Vec3 {
        Vec3::splat(field.block_size * block_scale * 0.5 + field.hit_margin)
    }
}

/// Arena of live blocks keyed by stable ids.
#[derive(Debug)]
pub struct BlockArena {
    blocks: Vec<Block>,
    next_id: BlockId,
}

/// Spawn parameters for a new block.
#[derive(Debug, Clone)]
pub struct BlockSpawn {
    pub color: NoteColor,
    pub direction: SlashDirection,
    pub lane_index: usize,
    pub spawn_time: f32,
    pub start: Vec2,
    pub end: Vec2,
    pub spawn_z: f32,
}

impl BlockArena {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, spawn: BlockSpawn) -> BlockId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.blocks.push(Block {
            id,
            color: spawn.color,
            direction: spawn.direction,
            lane_index: spawn.lane_index,
            spawn_time: spawn.spawn_time,
            start: spawn.start,
            end: spawn.end,
            spawn_z: spawn.spawn_z,
            position: Vec3::new(spawn.start.x, spawn.start.y, spawn.spawn_z),
            prev_z: spawn.spawn_z,
            hit: false,
            missed: false,
        });
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drops every hit or missed block, returning how many were removed.
    pub fn remove_resolved(&mut self) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| !b.is_resolved());
        before - self.blocks.len()
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaberSnapshot {
    pub hand: Hand,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub tracked: bool,
}

impl From<&Saber> for SaberSnapshot {
    fn from(s: &Saber) -> Self {
        Self {
            hand: s.hand,
            position: s.position,
            rotation: s.rotation,
            scale: s.scale,
            tracked: s.tracked,
        }
    }
}

/// Block as the renderer sees it; presentation values are derived here, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub color: NoteColor,
    pub direction: SlashDirection,
    pub lane_index: usize,
    pub position: Vec3,
    /// 0 at the spawn plane, 1 at the hit plane.
    pub progress: f32,
    pub opacity: f32,
    /// Hit box half extents when hitbox display is enabled.
    pub hitbox: Option<Vec3>,
}

impl BlockSnapshot {
    pub fn project(
        block: &Block,
        field: &PlayFieldTuning,
        block_scale: f32,
        show_hitbox: bool,
    ) -> Self {
        let progress = block.travel(field).min(1.0);
        Self {
            id: block.id,
            color: block.color,
            direction: block.direction,
            lane_index: block.lane_index,
            position: block.position,
            progress,
            opacity: 0.3 + 0.7 * progress,
            hitbox: show_hitbox.then(|| block.half_extents(field, block_scale)),
        }
    }
}
