use super::sensor::IdleSensor;
use super::types::{
    AudioCue, CalibrationSnapshot, CueKind, EffectSnapshot, FrameUpdate, SessionEvent,
    SessionState,
};
use crate::domain::state::{Block, BlockArena, Saber};
use crate::domain::systems::scoring::{self, HitVerdict};
use crate::domain::systems::{BeatScheduler, Calibration, EffectsWorld, collision, motion, sabers};
use crate::domain::tuning::GameTuning;
use crate::domain::{
    Beatmap, BlockId, BlockSnapshot, Camera, DebugConfig, GameStats, Hand, NoteColor, PoseFrame,
    SaberSnapshot,
};
use glam::Vec3;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Shared configuration for spawning play sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Interval between simulation ticks.
    pub tick_interval: Duration,
    /// Longest simulated step a single tick may take.
    pub max_frame_dt: Duration,
    /// How long the sensor has to confirm capture.
    pub sensor_start_timeout: Duration,
    /// Capacity for connection commands into the controller.
    pub command_channel_capacity: usize,
    /// Capacity for controller events into a running session.
    pub event_channel_capacity: usize,
    /// Capacity for broadcast frame updates.
    pub frame_broadcast_capacity: usize,
    /// Capacity for broadcast audio cues.
    pub cue_broadcast_capacity: usize,
}

/// Side effects of one tick besides the frame snapshot.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickOutput {
    pub cues: Vec<AudioCue>,
    pub transition: Option<SessionState>,
}

struct Hit {
    hand: Hand,
    block_id: BlockId,
    color: NoteColor,
    position: Vec3,
    spawn_time: f32,
}

/// One player's game: owns every simulation record and runs the fixed-order tick.
pub struct GameSession {
    tuning: GameTuning,
    camera: Camera,
    max_frame_dt: f32,
    scheduler: BeatScheduler,
    block_speed: f32,
    arena: BlockArena,
    sabers: [Saber; 2],
    stats: GameStats,
    calibration: Calibration,
    effects: EffectsWorld,
    state: SessionState,
    latest_pose: Option<PoseFrame>,
    /// Unpaused play time, seconds.
    elapsed: f32,
    completion_timer: Option<f32>,
    tick: u64,
}

impl GameSession {
    pub fn new(beatmap: &Beatmap, tuning: GameTuning, max_frame_dt: Duration) -> Self {
        Self::with_effects(beatmap, tuning, max_frame_dt, EffectsWorld::new())
    }

    pub fn with_effects(
        beatmap: &Beatmap,
        tuning: GameTuning,
        max_frame_dt: Duration,
        effects: EffectsWorld,
    ) -> Self {
        let scheduler = BeatScheduler::new(beatmap);
        let block_speed = scheduler.block_speed(&tuning.play_field);
        Self {
            camera: Camera::default(),
            max_frame_dt: max_frame_dt.as_secs_f32(),
            scheduler,
            block_speed,
            arena: BlockArena::new(),
            sabers: Hand::BOTH.map(|hand| Saber::new(hand, &tuning.saber)),
            stats: GameStats::new(tuning.scoring.max_health),
            calibration: Calibration::new(),
            effects,
            state: SessionState::Initializing,
            latest_pose: None,
            elapsed: 0.0,
            completion_timer: None,
            tick: 0,
            tuning,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accepted only while playing.
    pub fn pause(&mut self) -> Option<SessionState> {
        (self.state == SessionState::Playing).then(|| self.transition(SessionState::Paused))
    }

    pub fn resume(&mut self) -> Option<SessionState> {
        (self.state == SessionState::Paused).then(|| self.transition(SessionState::Playing))
    }

    /// Runs pose ingestion, calibration or play (scheduling, motion, collision, scoring),
    /// then effects. `fresh_pose` is the sensor result that arrived since the last tick.
    pub fn tick(
        &mut self,
        dt: f32,
        fresh_pose: Option<PoseFrame>,
        debug: &DebugConfig,
    ) -> TickOutput {
        let dt = clamp_dt(dt, self.max_frame_dt);
        let debug = debug.sanitized();
        let mut output = TickOutput::default();
        self.tick += 1;

        let fresh = fresh_pose.is_some();
        if let Some(frame) = fresh_pose {
            self.latest_pose = Some(frame);
        }
        self.ingest_pose(fresh, dt, &debug);

        if fresh && self.state == SessionState::Initializing {
            output.transition = Some(self.transition(SessionState::Calibrating));
        }

        match self.state {
            SessionState::Calibrating => {
                let done = self.calibration.tick(
                    self.latest_pose.as_ref(),
                    dt,
                    &self.tuning.calibration,
                );
                if done {
                    output.transition = Some(self.transition(SessionState::Playing));
                }
            }
            SessionState::Playing => {
                if let Some(state) = self.play(dt, &debug, &mut output.cues) {
                    output.transition = Some(state);
                }
            }
            _ => {}
        }

        self.effects.integrate(dt, &self.tuning.effects);
        output
    }

    /// Render-sink view of the current state; presentation values are derived here.
    pub fn snapshot(&self, debug: &DebugConfig) -> FrameUpdate {
        let debug = debug.sanitized();
        let field = &self.tuning.play_field;
        FrameUpdate {
            tick: self.tick,
            camera: self.camera,
            sabers: self.sabers.iter().map(SaberSnapshot::from).collect(),
            blocks: self
                .arena
                .iter()
                .map(|block| {
                    BlockSnapshot::project(block, field, debug.block_scale, debug.show_hitboxes)
                })
                .collect(),
            effects: self
                .effects
                .iter()
                .map(|effect| EffectSnapshot {
                    id: effect.id,
                    kind: effect.kind,
                    position: effect.position,
                    rotation: effect.rotation,
                    scale: effect.scale,
                    opacity: effect.opacity(),
                })
                .collect(),
            stats: self.stats,
            calibration: (self.state == SessionState::Calibrating).then(|| CalibrationSnapshot {
                left: self.calibration.left,
                right: self.calibration.right,
                complete: self.calibration.latched,
            }),
            show_avatar: debug.show_avatar,
        }
    }

    fn transition(&mut self, next: SessionState) -> SessionState {
        debug!(from = ?self.state, to = ?next, "session state transition");
        self.state = next.clone();
        next
    }

    fn ingest_pose(&mut self, fresh: bool, dt: f32, debug: &DebugConfig) {
        let frame = if fresh { self.latest_pose.as_ref() } else { None };
        for saber in &mut self.sabers {
            let arm = frame.and_then(|frame| match saber.hand {
                Hand::Left => frame.left_arm(),
                Hand::Right => frame.right_arm(),
            });
            sabers::update_saber(
                saber,
                arm.as_ref(),
                &self.camera,
                dt,
                debug.saber_scale,
                &self.tuning.saber,
            );
        }
    }

    fn play(
        &mut self,
        dt: f32,
        debug: &DebugConfig,
        cues: &mut Vec<AudioCue>,
    ) -> Option<SessionState> {
        let field = self.tuning.play_field;

        self.scheduler.tick(self.elapsed, &field, &mut self.arena);
        self.elapsed += dt;
        motion::advance_blocks(&mut self.arena, dt, self.block_speed, &field);

        for hit in self.detect_hits(debug) {
            let verdict =
                scoring::apply_hit(&mut self.stats, hit.hand, hit.color, &self.tuning.scoring);
            let pitch = scoring::hit_pitch(hit.hand, &self.tuning.scoring);
            let kind = match verdict {
                HitVerdict::Good => {
                    self.effects.emit_good_hit(hit.position, &self.tuning.effects);
                    CueKind::GoodHit
                }
                HitVerdict::Bad => {
                    self.effects.emit_bad_hit(hit.position, &self.tuning.effects);
                    CueKind::BadHit
                }
            };
            debug!(
                block_id = hit.block_id,
                hand = ?hit.hand,
                age = self.elapsed - hit.spawn_time,
                ?verdict,
                score = self.stats.score,
                "block hit"
            );
            cues.push(AudioCue {
                kind,
                pitch,
                block_id: hit.block_id,
            });
        }

        for block_id in motion::collect_misses(&mut self.arena, &field) {
            scoring::apply_miss(&mut self.stats, debug.god_mode, &self.tuning.scoring);
            let age = self.arena.get(block_id).map(|b| self.elapsed - b.spawn_time);
            debug!(block_id, ?age, health = self.stats.health, "block missed");
            cues.push(AudioCue {
                kind: CueKind::Miss,
                pitch: 1.0,
                block_id,
            });
        }

        self.arena.remove_resolved();

        if self.stats.health <= 0.0 {
            info!(score = self.stats.score, "game over");
            return Some(self.transition(SessionState::GameOver {
                score: self.stats.score,
            }));
        }

        if self.scheduler.is_completed() && self.arena.is_empty() {
            let remaining = self.completion_timer.unwrap_or(field.completion_grace) - dt;
            self.completion_timer = Some(remaining);
            if remaining <= 0.0 {
                info!(
                    score = self.stats.score,
                    max_combo = self.stats.max_combo,
                    "song complete"
                );
                return Some(self.transition(SessionState::SongComplete {
                    score: self.stats.score,
                    max_combo: self.stats.max_combo,
                }));
            }
        }

        None
    }

    /// Each eligible block is claimed by the first swinging saber that touches it.
    fn detect_hits(&mut self, debug: &DebugConfig) -> Vec<Hit> {
        let field = &self.tuning.play_field;
        let tuning = &self.tuning.saber;
        let mut hits = Vec::new();

        for saber in &self.sabers {
            if !saber.tracked || saber.speed() < tuning.min_swing_speed {
                continue;
            }
            for block in self.arena.iter_mut() {
                if !motion::in_hit_band(block, field) {
                    continue;
                }
                if collides(saber, block, debug, &self.tuning) {
                    block.hit = true;
                    hits.push(Hit {
                        hand: saber.hand,
                        block_id: block.id,
                        color: block.color,
                        position: block.position,
                        spawn_time: block.spawn_time,
                    });
                }
            }
        }
        hits
    }
}

fn collides(saber: &Saber, block: &Block, debug: &DebugConfig, tuning: &GameTuning) -> bool {
    collision::test_hit(
        saber,
        block,
        saber.previous_samples.as_deref(),
        debug.block_scale,
        debug.saber_scale,
        &tuning.play_field,
        &tuning.saber,
    )
}

fn clamp_dt(dt: f32, max: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max) } else { 0.0 }
}

/// Channels a session task publishes on. Owned by the controller so they outlive sessions.
#[derive(Clone)]
pub struct SessionOutputs {
    pub frame_tx: broadcast::Sender<FrameUpdate>,
    pub cue_tx: broadcast::Sender<AudioCue>,
    pub state_tx: watch::Sender<SessionState>,
}

/// Drives one session: starts the sensor, ticks the game until `Stop`, then releases the
/// sensor and hands it back idle.
pub async fn session_task(
    sensor: IdleSensor,
    beatmap: Beatmap,
    mut debug: DebugConfig,
    settings: SessionSettings,
    mut events_rx: mpsc::Receiver<SessionEvent>,
    outputs: SessionOutputs,
) -> IdleSensor {
    outputs.state_tx.send_replace(SessionState::Initializing);

    let active = match sensor.start(settings.sensor_start_timeout).await {
        Ok(active) => active,
        Err((idle, error)) => {
            warn!(reason = %error.reason(), "sensor unavailable; session not started");
            outputs.state_tx.send_replace(SessionState::PermissionDenied {
                reason: error.reason(),
            });
            return idle;
        }
    };

    let mut game = GameSession::new(&beatmap, GameTuning::default(), settings.max_frame_dt);
    let mut frames = active.frames();
    let mut interval = tokio::time::interval(settings.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    info!(
        bpm = beatmap.bpm(),
        total_beats = beatmap.total_beats(),
        total_notes = beatmap.total_notes(),
        "session started"
    );

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                let transition = match event {
                    Some(SessionEvent::Pause) => game.pause(),
                    Some(SessionEvent::Resume) => game.resume(),
                    Some(SessionEvent::Debug(config)) => {
                        debug = config.sanitized();
                        None
                    }
                    Some(SessionEvent::Stop) | None => break,
                };
                if let Some(state) = transition {
                    outputs.state_tx.send_replace(state);
                }
            }
            _ = interval.tick() => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32();
                last_tick = now;

                // Only a frame the tick has not seen yet moves the sabers.
                let fresh = match frames.has_changed() {
                    Ok(true) => frames.borrow_and_update().clone(),
                    _ => None,
                };

                let output = game.tick(dt, fresh, &debug);
                for cue in output.cues {
                    let _ = outputs.cue_tx.send(cue);
                }
                if let Some(state) = output.transition {
                    info!(state = ?state, "session state changed");
                    outputs.state_tx.send_replace(state);
                }
                let _ = outputs.frame_tx.send(game.snapshot(&debug));
            }
        }
    }

    let stats = game.stats();
    info!(score = stats.score, max_combo = stats.max_combo, "session stopped");
    let idle = active.stop().await;
    outputs.state_tx.send_replace(SessionState::Idle);
    idle
}
