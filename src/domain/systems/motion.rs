use crate::domain::projection::sanitize;
use crate::domain::state::{Block, BlockArena, BlockId};
use crate::domain::tuning::PlayFieldTuning;
use glam::Vec3;

/// Advances every unresolved block toward the camera, remembering where it started the step.
pub fn advance_blocks(arena: &mut BlockArena, dt: f32, speed: f32, field: &PlayFieldTuning) {
    for block in arena.iter_mut() {
        if block.is_resolved() {
            continue;
        }

        block.prev_z = block.position.z;
        let z = block.position.z + speed * dt;
        block.position.z = z;
        let t = block.travel(field);
        let xy = block.start.lerp(block.end, t);
        block.position = sanitize(Vec3::new(xy.x, xy.y, z));
    }
}

/// Flags unhit blocks past the despawn plane as missed. Returns the ids missed this tick.
///
/// Runs after hit detection so a block that crosses both the band and the despawn
/// plane in one long step still gets its chance to be cut.
pub fn collect_misses(arena: &mut BlockArena, field: &PlayFieldTuning) -> Vec<BlockId> {
    let mut missed = Vec::new();
    for block in arena.iter_mut() {
        if !block.is_resolved() && block.position.z > field.despawn_z {
            block.missed = true;
            missed.push(block.id);
        }
    }
    missed
}

/// The block's last step touched the band around the hit plane.
pub fn in_hit_band(block: &Block, field: &PlayFieldTuning) -> bool {
    !block.is_resolved() && block.band_span(field).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::beatmap::{BeatItem, Beatmap, LaneLayout, NoteColor, SlashDirection, note};
    use crate::domain::state::BlockSpawn;
    use crate::domain::systems::scheduler::BeatScheduler;
    use glam::Vec2;
    use std::collections::HashSet;

    fn spawn(arena: &mut BlockArena, field: &PlayFieldTuning) -> BlockId {
        arena.spawn(BlockSpawn {
            color: NoteColor::Right,
            direction: SlashDirection::Up,
            lane_index: 3,
            spawn_time: 0.0,
            start: Vec2::new(0.45, 1.5),
            end: Vec2::new(0.9, 1.5),
            spawn_z: field.spawn_z,
        })
    }

    #[test]
    fn when_block_spawns_on_the_plane_at_120_bpm_then_it_crosses_hit_plane_after_500ms() {
        let field = PlayFieldTuning::default();
        let beat_interval = 0.5;
        let speed = field.travel_distance() / beat_interval;
        let mut arena = BlockArena::new();
        let id = spawn(&mut arena, &field);
        let dt = 1.0 / 60.0;

        let mut elapsed = 0.0_f32;
        while arena.get(id).map(|b| b.position.z < field.hit_z).unwrap_or(false) {
            advance_blocks(&mut arena, dt, speed, &field);
            elapsed += dt;
        }

        assert!((elapsed - 0.5).abs() <= dt + 1e-4, "crossed after {elapsed}s");
    }

    #[test]
    fn when_block_reaches_hit_plane_then_it_sits_on_its_lane_target() {
        let field = PlayFieldTuning::default();
        let mut arena = BlockArena::new();
        let id = spawn(&mut arena, &field);

        advance_blocks(&mut arena, 1.0, field.travel_distance(), &field);

        let block = arena.get(id).expect("expected block");
        assert!((block.position.x - 0.9).abs() < 1e-4);
        assert!((block.position.z - field.hit_z).abs() < 1e-4);
        assert!(in_hit_band(block, &field));
    }

    #[test]
    fn when_block_passes_despawn_plane_then_it_is_missed_once() {
        let field = PlayFieldTuning::default();
        let mut arena = BlockArena::new();
        let id = spawn(&mut arena, &field);
        let distance = field.despawn_z - field.spawn_z + 0.1;

        advance_blocks(&mut arena, 1.0, distance, &field);
        let first = collect_misses(&mut arena, &field);
        advance_blocks(&mut arena, 1.0, distance, &field);
        let second = collect_misses(&mut arena, &field);

        assert_eq!(first, vec![id]);
        assert!(second.is_empty());
        assert!(!in_hit_band(arena.get(id).expect("expected block"), &field));
    }

    #[test]
    fn when_speed_is_not_finite_then_block_collapses_to_origin() {
        let field = PlayFieldTuning::default();
        let mut arena = BlockArena::new();
        let id = spawn(&mut arena, &field);

        advance_blocks(&mut arena, 0.016, f32::NAN, &field);

        let block = arena.get(id).expect("expected block");
        assert!(block.position.is_finite());
    }

    #[test]
    fn when_ticking_at_30hz_with_stalls_then_every_block_enters_the_hit_band() {
        let field = PlayFieldTuning::default();
        let dt = 1.0 / 30.0;
        let stall = 0.1;

        for bpm in [120.0, 180.0, 240.0] {
            let items = (0..32)
                .map(|_| BeatItem::Single(note("M2", NoteColor::Left)))
                .collect();
            let map = Beatmap::new(bpm, 0.5, vec![items], LaneLayout::default())
                .expect("expected valid beatmap");
            let mut scheduler = BeatScheduler::new(&map);
            let speed = scheduler.block_speed(&field);
            let mut arena = BlockArena::new();
            let mut spawned = HashSet::new();
            let mut eligible = HashSet::new();
            let mut time = 0.0_f32;

            for tick in 0..2000 {
                spawned.extend(scheduler.tick(time, &field, &mut arena));
                let step = if tick % 7 == 6 { stall } else { dt };
                advance_blocks(&mut arena, step, speed, &field);
                time += step;
                let in_band = arena.iter().filter(|b| in_hit_band(b, &field));
                eligible.extend(in_band.map(|b| b.id));
                collect_misses(&mut arena, &field);
                arena.remove_resolved();
                if scheduler.is_completed() && arena.is_empty() {
                    break;
                }
            }

            assert_eq!(spawned.len(), 32, "bpm {bpm}");
            assert_eq!(eligible, spawned, "bpm {bpm}");
        }
    }

    #[test]
    fn when_block_lingers_short_of_the_band_then_it_is_not_eligible() {
        let field = PlayFieldTuning::default();
        let mut arena = BlockArena::new();
        let id = spawn(&mut arena, &field);

        advance_blocks(&mut arena, 1.0, field.travel_distance() - 1.0, &field);

        assert!(!in_hit_band(arena.get(id).expect("expected block"), &field));
    }
}
