use crate::domain::projection::sanitize;
use crate::domain::tuning::EffectsTuning;
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type EffectId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    Spark,
    /// Half of a cut block.
    Debris { angular_velocity: Vec3 },
    Shockwave,
}

/// Cosmetic entity. Nothing in the gameplay core reads these back.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub life: f32,
    pub max_life: f32,
}

impl Effect {
    /// Fades linearly with remaining life.
    pub fn opacity(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct EffectsWorld {
    effects: Vec<Effect>,
    next_id: EffectId,
    rng: StdRng,
}

impl EffectsWorld {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            effects: Vec::new(),
            next_id: 1,
            rng,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Debris halves, a spark burst and a shockwave ring.
    pub fn emit_good_hit(&mut self, at: Vec3, tuning: &EffectsTuning) {
        for side in [-1.0_f32, 1.0] {
            let spin = tuning.debris_spin;
            let angular_velocity = Vec3::new(
                self.rng.gen_range(-spin..=spin),
                self.rng.gen_range(-spin..=spin),
                self.rng.gen_range(-spin..=spin),
            );
            let velocity = Vec3::new(
                side * tuning.debris_speed,
                self.rng.gen_range(0.0..=tuning.debris_speed),
                self.rng.gen_range(-0.5..=0.5),
            );
            self.push(
                EffectKind::Debris { angular_velocity },
                at,
                velocity,
                tuning.debris_life,
                tuning,
            );
        }
        self.emit_sparks(at, tuning);
        self.push(EffectKind::Shockwave, at, Vec3::ZERO, tuning.shockwave_life, tuning);
    }

    pub fn emit_bad_hit(&mut self, at: Vec3, tuning: &EffectsTuning) {
        self.emit_sparks(at, tuning);
    }

    fn emit_sparks(&mut self, at: Vec3, tuning: &EffectsTuning) {
        for _ in 0..tuning.spark_count {
            let direction = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            )
            .normalize_or_zero();
            let speed = tuning.spark_speed * self.rng.gen_range(0.5..=1.0);
            self.push(EffectKind::Spark, at, direction * speed, tuning.spark_life, tuning);
        }
    }

    fn push(
        &mut self,
        kind: EffectKind,
        position: Vec3,
        velocity: Vec3,
        life: f32,
        tuning: &EffectsTuning,
    ) {
        if self.effects.len() >= tuning.max_entities {
            return;
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.effects.push(Effect {
            id,
            kind,
            position: sanitize(position),
            velocity: sanitize(velocity),
            rotation: Quat::IDENTITY,
            scale: 1.0,
            life,
            max_life: life,
        });
    }

    /// Explicit Euler step for every entity, then drops the expired ones.
    pub fn integrate(&mut self, dt: f32, tuning: &EffectsTuning) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        for effect in &mut self.effects {
            match effect.kind {
                EffectKind::Spark => {
                    effect.velocity *= (1.0 - tuning.spark_drag * dt).max(0.0);
                }
                EffectKind::Debris { angular_velocity } => {
                    effect.velocity.y -= tuning.gravity * dt;
                    let step = Quat::from_scaled_axis(angular_velocity * dt);
                    effect.rotation = (step * effect.rotation).normalize();
                }
                EffectKind::Shockwave => {
                    effect.scale += tuning.shockwave_growth * dt;
                }
            }
            effect.position = sanitize(effect.position + effect.velocity * dt);
            effect.life -= dt;
        }

        self.effects.retain(|effect| effect.life > 0.0);
    }
}

impl Default for EffectsWorld {
    fn default() -> Self {
        Self::new()
    }
}
