use crate::domain::beatmap::{Beatmap, SpawnSchedule};
use crate::domain::state::{BlockArena, BlockId, BlockSpawn};
use crate::domain::tuning::PlayFieldTuning;
use glam::Vec2;
use tracing::debug;

/// Dispatches beatmap notes early enough that each block reaches the hit plane on its beat.
#[derive(Debug, Clone)]
pub struct BeatScheduler {
    schedule: SpawnSchedule,
    beat_interval: f32,
    start_delay: f32,
    next_beat: usize,
    total_beats: usize,
    completed: bool,
}

impl BeatScheduler {
    pub fn new(beatmap: &Beatmap) -> Self {
        let schedule = SpawnSchedule::from_beatmap(beatmap);
        let total_beats = schedule.total_beats();
        Self {
            schedule,
            beat_interval: beatmap.beat_interval(),
            start_delay: beatmap.start_delay(),
            next_beat: 0,
            total_beats,
            completed: total_beats == 0,
        }
    }

    /// Block speed that covers the spawn-to-hit distance in exactly one beat.
    pub fn block_speed(&self, field: &PlayFieldTuning) -> f32 {
        field.travel_distance() / self.beat_interval
    }

    /// Every beat has been dispatched.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Spawns every beat that has come within the lookahead window at `accumulated` seconds
    /// of (unpaused) game time.
    pub fn tick(
        &mut self,
        accumulated: f32,
        field: &PlayFieldTuning,
        arena: &mut BlockArena,
    ) -> Vec<BlockId> {
        let mut spawned = Vec::new();
        if self.completed {
            return spawned;
        }

        // Travel time equals one beat because of how block speed is derived.
        let travel_time = self.beat_interval;
        let effective_time = accumulated - self.start_delay + travel_time;
        let effective_beats = effective_time / self.beat_interval;
        let current_beat = effective_beats.floor().max(0.0) as usize;
        let target_beat =
            (current_beat + field.lookahead_beats as usize).min(self.total_beats - 1);

        while self.next_beat <= target_beat {
            let beat = self.next_beat;
            for note in self.schedule.beat(beat) {
                // Notes dispatched ahead of their beat start further back so they still
                // arrive on time at constant speed.
                let beats_ahead = (beat as f32 + note.sub_offset - effective_beats).max(0.0);
                let spawn_z = field.spawn_z - beats_ahead * field.travel_distance();
                let id = arena.spawn(BlockSpawn {
                    color: note.color,
                    direction: note.direction,
                    lane_index: note.lane_index,
                    spawn_time: accumulated,
                    start: Vec2::new(note.target.x * field.start_spread, note.target.y),
                    end: note.target,
                    spawn_z,
                });
                debug!(block_id = id, beat, lane = %note.lane, beats_ahead, "block spawned");
                spawned.push(id);
            }
            self.next_beat += 1;
        }

        if self.next_beat >= self.total_beats {
            self.completed = true;
            debug!(total_beats = self.total_beats, "beatmap fully dispatched");
        }

        spawned
    }
}
