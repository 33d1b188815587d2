use crate::domain::landmarks::{LEFT_WRIST, Landmark, PoseFrame, RIGHT_WRIST};
use crate::domain::tuning::CalibrationTuning;

pub const FULL: f32 = 100.0;

/// Gate before play: both wrists must rest in their zones until both counters fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    pub left: f32,
    pub right: f32,
    /// Both counters reached full; waiting out the hold before signaling.
    pub latched: bool,
    hold_remaining: f32,
    signaled: bool,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the counters. Returns `true` exactly once per calibration session,
    /// after the completion hold has elapsed.
    pub fn tick(&mut self, pose: Option<&PoseFrame>, dt: f32, tuning: &CalibrationTuning) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if self.signaled {
            return false;
        }

        if self.latched {
            self.hold_remaining -= dt;
            if self.hold_remaining > 0.0 {
                return false;
            }
            self.left = 0.0;
            self.right = 0.0;
            self.latched = false;
            self.signaled = true;
            return true;
        }

        let wrist = |index: usize| pose.filter(|p| p.is_complete()).and_then(|p| p.get(index));
        let left_in = in_zone(wrist(LEFT_WRIST), tuning.left_target, tuning.tolerance);
        let right_in = in_zone(wrist(RIGHT_WRIST), tuning.right_target, tuning.tolerance);

        self.left = step(self.left, left_in, dt, tuning);
        self.right = step(self.right, right_in, dt, tuning);

        if self.left >= FULL && self.right >= FULL {
            self.latched = true;
            self.hold_remaining = tuning.completion_hold;
        }
        false
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled
    }
}

fn in_zone(wrist: Option<Landmark>, target: (f32, f32), tolerance: f32) -> bool {
    wrist.is_some_and(|w| {
        (w.x - target.0).abs() <= tolerance && (w.y - target.1).abs() <= tolerance
    })
}

fn step(progress: f32, inside: bool, dt: f32, tuning: &CalibrationTuning) -> f32 {
    let delta = if inside {
        tuning.fill_rate * dt
    } else {
        -tuning.decay_rate * dt
    };
    (progress + delta).clamp(0.0, FULL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::landmarks::frame_with;

    fn wrist(x: f32, y: f32) -> Landmark {
        Landmark {
            x,
            y,
            z: 0.0,
            visibility: Some(1.0),
        }
    }

    fn in_zone_frame(tuning: &CalibrationTuning) -> PoseFrame {
        frame_with(&[
            (LEFT_WRIST, wrist(tuning.left_target.0, tuning.left_target.1)),
            (RIGHT_WRIST, wrist(tuning.right_target.0, tuning.right_target.1)),
        ])
    }

    #[test]
    fn when_both_wrists_hold_in_zone_then_completion_fires_exactly_once() {
        let tuning = CalibrationTuning::default();
        let frame = in_zone_frame(&tuning);
        let mut calibration = Calibration::new();
        let dt = 1.0 / 60.0;

        let mut fired = 0;
        for _ in 0..(60 * 6) {
            if calibration.tick(Some(&frame), dt, &tuning) {
                fired += 1;
            }
        }

        assert_eq!(fired, 1);
        assert!(calibration.is_signaled());
        assert_eq!(calibration.left, 0.0);
        assert_eq!(calibration.right, 0.0);
    }

    #[test]
    fn when_counters_fill_then_completion_waits_for_the_hold() {
        let tuning = CalibrationTuning::default();
        let frame = in_zone_frame(&tuning);
        let mut calibration = Calibration::new();

        // 100 / 50 per second = 2 seconds to fill.
        assert!(!calibration.tick(Some(&frame), 2.0, &tuning));
        assert!(calibration.latched);
        assert!(!calibration.tick(Some(&frame), tuning.completion_hold * 0.5, &tuning));
        assert!(calibration.tick(Some(&frame), tuning.completion_hold * 0.5, &tuning));
    }

    #[test]
    fn when_wrist_leaves_zone_before_completion_then_progress_decays() {
        let tuning = CalibrationTuning::default();
        let mut calibration = Calibration::new();
        calibration.tick(Some(&in_zone_frame(&tuning)), 1.0, &tuning);
        let filled = calibration.left;

        let away = frame_with(&[
            (LEFT_WRIST, wrist(0.1, 0.9)),
            (RIGHT_WRIST, wrist(tuning.right_target.0, tuning.right_target.1)),
        ]);
        calibration.tick(Some(&away), 0.2, &tuning);

        assert!(calibration.left < filled);
        assert!(calibration.right > filled);
    }

    #[test]
    fn when_pose_is_missing_then_both_counters_decay_to_zero() {
        let tuning = CalibrationTuning::default();
        let mut calibration = Calibration::new();
        calibration.tick(Some(&in_zone_frame(&tuning)), 1.0, &tuning);

        calibration.tick(None, 1.0, &tuning);

        assert_eq!(calibration.left, 0.0);
        assert_eq!(calibration.right, 0.0);
    }

    #[test]
    fn when_wrists_are_swapped_then_mirrored_zones_do_not_fill() {
        let tuning = CalibrationTuning::default();
        let swapped = frame_with(&[
            (LEFT_WRIST, wrist(tuning.right_target.0, tuning.right_target.1)),
            (RIGHT_WRIST, wrist(tuning.left_target.0, tuning.left_target.1)),
        ]);
        let mut calibration = Calibration::new();

        calibration.tick(Some(&swapped), 1.0, &tuning);

        assert_eq!(calibration.left, 0.0);
        assert_eq!(calibration.right, 0.0);
    }
}
