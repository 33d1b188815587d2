// Immutable beatmap input and its flat, pre-timed spawn schedule.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteColor {
    Left,
    Right,
    /// Neutral blocks any saber may cut for points.
    Both,
}

/// Required cut direction. Carried to the render sink only; collisions ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlashDirection {
    #[default]
    Any,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub lane: String,
    pub direction: SlashDirection,
    pub color: NoteColor,
}

/// One slot of a subdivided beat.
#[derive(Debug, Clone, PartialEq)]
pub enum SubBeat {
    Rest,
    Single(Note),
    Group(Vec<Note>),
}

/// Content of one beat.
#[derive(Debug, Clone, PartialEq)]
pub enum BeatItem {
    Rest,
    Single(Note),
    /// Notes that arrive together.
    Group(Vec<Note>),
    /// Slots splitting the beat interval evenly.
    Subdivided(Vec<SubBeat>),
}

impl BeatItem {
    pub fn note_count(&self) -> usize {
        match self {
            BeatItem::Rest => 0,
            BeatItem::Single(_) => 1,
            BeatItem::Group(notes) => notes.len(),
            BeatItem::Subdivided(slots) => slots
                .iter()
                .map(|slot| match slot {
                    SubBeat::Rest => 0,
                    SubBeat::Single(_) => 1,
                    SubBeat::Group(notes) => notes.len(),
                })
                .sum(),
        }
    }
}

/// Named lane targets on the hit plane (x, y in world units), in lane-index order.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    lanes: Vec<(String, Vec2)>,
}

impl LaneLayout {
    pub fn new(lanes: Vec<(String, Vec2)>) -> Self {
        Self { lanes }
    }

    /// Lane index and target for a label.
    pub fn resolve(&self, label: &str) -> Option<(usize, Vec2)> {
        self.lanes
            .iter()
            .position(|(name, _)| name == label)
            .map(|index| (index, self.lanes[index].1))
    }

    pub fn target(&self, label: &str) -> Option<Vec2> {
        self.resolve(label).map(|(_, target)| target)
    }

    /// Default color for a lane: left half is the left saber's, right half the right's.
    pub fn side_of(&self, label: &str) -> NoteColor {
        match self.target(label) {
            Some(target) if target.x < 0.0 => NoteColor::Left,
            Some(target) if target.x > 0.0 => NoteColor::Right,
            _ => NoteColor::Both,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl Default for LaneLayout {
    /// 4x3 grid labelled `T1..T4`, `M1..M4`, `B1..B4` (row letter, column number).
    fn default() -> Self {
        const COLUMNS: [f32; 4] = [-0.9, -0.3, 0.3, 0.9];
        const ROWS: [(char, f32); 3] = [('T', 2.1), ('M', 1.5), ('B', 0.9)];

        let lanes = ROWS
            .iter()
            .flat_map(|(row, y)| {
                COLUMNS
                    .iter()
                    .enumerate()
                    .map(move |(column, x)| (format!("{row}{}", column + 1), Vec2::new(*x, *y)))
            })
            .collect();
        Self { lanes }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BeatmapError {
    /// BPM must be finite and positive.
    InvalidBpm,
    /// Start delay must be finite and non-negative.
    InvalidStartDelay,
}

impl std::fmt::Display for BeatmapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeatmapError::InvalidBpm => write!(f, "bpm must be a positive number"),
            BeatmapError::InvalidStartDelay => write!(f, "start delay must be non-negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Beatmap {
    bpm: f32,
    /// Seconds of silence before beat zero reaches the hit plane.
    start_delay: f32,
    measures: Vec<Vec<BeatItem>>,
    lanes: LaneLayout,
}

impl Beatmap {
    pub fn new(
        bpm: f32,
        start_delay: f32,
        measures: Vec<Vec<BeatItem>>,
        lanes: LaneLayout,
    ) -> Result<Self, BeatmapError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(BeatmapError::InvalidBpm);
        }
        if !start_delay.is_finite() || start_delay < 0.0 {
            return Err(BeatmapError::InvalidStartDelay);
        }
        Ok(Self {
            bpm,
            start_delay,
            measures,
            lanes,
        })
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn start_delay(&self) -> f32 {
        self.start_delay
    }

    pub fn lanes(&self) -> &LaneLayout {
        &self.lanes
    }

    /// Seconds per beat.
    pub fn beat_interval(&self) -> f32 {
        60.0 / self.bpm
    }

    pub fn total_beats(&self) -> usize {
        self.measures.iter().map(Vec::len).sum()
    }

    pub fn total_notes(&self) -> usize {
        self.beats().map(BeatItem::note_count).sum()
    }

    /// Song length from the first beat slot to the end of the last one.
    pub fn duration(&self) -> f32 {
        self.start_delay + self.total_beats() as f32 * self.beat_interval()
    }

    pub fn beats(&self) -> impl Iterator<Item = &BeatItem> {
        self.measures.iter().flatten()
    }
}

/// A note with its resolved lane target and fractional offset inside its beat.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledNote {
    pub lane: String,
    pub lane_index: usize,
    pub target: Vec2,
    pub direction: SlashDirection,
    pub color: NoteColor,
    /// Position inside the beat, in beats (0 for on-beat notes).
    pub sub_offset: f32,
}

/// Beatmap resolved once at load time: one entry per beat, each holding its notes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSchedule {
    beats: Vec<Vec<ScheduledNote>>,
    unresolved_lanes: usize,
}

impl SpawnSchedule {
    pub fn from_beatmap(beatmap: &Beatmap) -> Self {
        let mut unresolved_lanes = 0;
        let mut beats = Vec::with_capacity(beatmap.total_beats());

        for item in beatmap.beats() {
            let mut notes = Vec::new();
            let mut push = |note: &Note, sub_offset: f32| {
                let Some((lane_index, target)) = beatmap.lanes.resolve(&note.lane) else {
                    unresolved_lanes += 1;
                    return;
                };
                notes.push(ScheduledNote {
                    lane: note.lane.clone(),
                    lane_index,
                    target,
                    direction: note.direction,
                    color: note.color,
                    sub_offset,
                });
            };

            match item {
                BeatItem::Rest => {}
                BeatItem::Single(note) => push(note, 0.0),
                BeatItem::Group(group) => group.iter().for_each(|note| push(note, 0.0)),
                BeatItem::Subdivided(slots) => {
                    let slot_len = 1.0 / slots.len().max(1) as f32;
                    for (slot_index, slot) in slots.iter().enumerate() {
                        let sub_offset = slot_index as f32 * slot_len;
                        match slot {
                            SubBeat::Rest => {}
                            SubBeat::Single(note) => push(note, sub_offset),
                            SubBeat::Group(group) => {
                                group.iter().for_each(|note| push(note, sub_offset))
                            }
                        }
                    }
                }
            }
            beats.push(notes);
        }

        Self {
            beats,
            unresolved_lanes,
        }
    }

    pub fn total_beats(&self) -> usize {
        self.beats.len()
    }

    pub fn beat(&self, index: usize) -> &[ScheduledNote] {
        self.beats.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Notes that will actually spawn.
    pub fn spawnable_notes(&self) -> usize {
        self.beats.iter().map(Vec::len).sum()
    }

    /// Notes dropped because their lane label has no definition.
    pub fn unresolved_lanes(&self) -> usize {
        self.unresolved_lanes
    }
}

#[cfg(test)]
pub(crate) fn note(lane: &str, color: NoteColor) -> Note {
    Note {
        lane: lane.to_string(),
        direction: SlashDirection::Down,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_bpm_is_zero_then_beatmap_is_rejected() {
        let result = Beatmap::new(0.0, 0.0, Vec::new(), LaneLayout::default());

        assert_eq!(result, Err(BeatmapError::InvalidBpm));
    }

    #[test]
    fn when_bpm_is_nan_then_beatmap_is_rejected() {
        let result = Beatmap::new(f32::NAN, 0.0, Vec::new(), LaneLayout::default());

        assert_eq!(result, Err(BeatmapError::InvalidBpm));
    }

    #[test]
    fn when_counting_notes_then_rests_are_ignored_and_groups_are_summed() {
        let beatmap = Beatmap::new(
            120.0,
            0.0,
            vec![vec![
                BeatItem::Rest,
                BeatItem::Single(note("M1", NoteColor::Left)),
                BeatItem::Group(vec![
                    note("T1", NoteColor::Left),
                    note("T4", NoteColor::Right),
                ]),
                BeatItem::Subdivided(vec![
                    SubBeat::Single(note("B2", NoteColor::Left)),
                    SubBeat::Rest,
                    SubBeat::Group(vec![
                        note("B3", NoteColor::Right),
                        note("B4", NoteColor::Right),
                    ]),
                ]),
            ]],
            LaneLayout::default(),
        )
        .expect("expected valid beatmap");

        assert_eq!(beatmap.total_beats(), 4);
        assert_eq!(beatmap.total_notes(), 6);
        assert!((beatmap.beat_interval() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn when_beat_is_subdivided_then_slots_get_even_fractional_offsets() {
        let beatmap = Beatmap::new(
            120.0,
            0.0,
            vec![vec![BeatItem::Subdivided(vec![
                SubBeat::Single(note("M1", NoteColor::Left)),
                SubBeat::Rest,
                SubBeat::Single(note("M2", NoteColor::Left)),
                SubBeat::Single(note("M3", NoteColor::Right)),
            ])]],
            LaneLayout::default(),
        )
        .expect("expected valid beatmap");

        let schedule = SpawnSchedule::from_beatmap(&beatmap);
        let offsets: Vec<f32> = schedule.beat(0).iter().map(|n| n.sub_offset).collect();

        assert_eq!(offsets, vec![0.0, 0.5, 0.75]);
    }

    #[test]
    fn when_lane_is_unknown_then_note_is_dropped_and_counted() {
        let beatmap = Beatmap::new(
            120.0,
            0.0,
            vec![vec![
                BeatItem::Single(note("Z9", NoteColor::Left)),
                BeatItem::Single(note("M1", NoteColor::Left)),
            ]],
            LaneLayout::default(),
        )
        .expect("expected valid beatmap");

        let schedule = SpawnSchedule::from_beatmap(&beatmap);

        assert_eq!(schedule.total_beats(), 2);
        assert!(schedule.beat(0).is_empty());
        assert_eq!(schedule.spawnable_notes(), 1);
        assert_eq!(schedule.unresolved_lanes(), 1);
    }

    #[test]
    fn when_lane_is_on_the_left_half_then_default_color_is_left() {
        let lanes = LaneLayout::default();

        assert_eq!(lanes.side_of("M1"), NoteColor::Left);
        assert_eq!(lanes.side_of("M4"), NoteColor::Right);
        assert_eq!(lanes.side_of("nope"), NoteColor::Both);
        assert_eq!(lanes.len(), 12);
    }
}
