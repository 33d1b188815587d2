// Pose sensor data: normalized landmarks and the body topology the core reads.

/// Body-topology indices used by the gameplay core.
pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_PALM: usize = 19;
pub const RIGHT_PALM: usize = 20;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// Smallest skeleton that resolves every index above.
pub const MIN_LANDMARKS: usize = RIGHT_HIP + 1;

/// A single normalized landmark (x/y in 0..1 screen space, z relative depth).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: Option<f32>,
}

/// One pose-estimation result, replaced wholesale on every sensor callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseFrame {
    pub landmarks: Vec<Landmark>,
}

/// Landmarks needed to drive one saber.
#[derive(Debug, Clone, Copy)]
pub struct ArmLandmarks {
    pub elbow: Landmark,
    pub wrist: Landmark,
    pub palm: Landmark,
}

impl PoseFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Frames too short for the topology are skipped by every pose-dependent system.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= MIN_LANDMARKS
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    pub fn left_arm(&self) -> Option<ArmLandmarks> {
        self.arm(LEFT_ELBOW, LEFT_WRIST, LEFT_PALM)
    }

    pub fn right_arm(&self) -> Option<ArmLandmarks> {
        self.arm(RIGHT_ELBOW, RIGHT_WRIST, RIGHT_PALM)
    }

    fn arm(&self, elbow: usize, wrist: usize, palm: usize) -> Option<ArmLandmarks> {
        if !self.is_complete() {
            return None;
        }
        Some(ArmLandmarks {
            elbow: self.get(elbow)?,
            wrist: self.get(wrist)?,
            palm: self.get(palm)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn frame_with(overrides: &[(usize, Landmark)]) -> PoseFrame {
    let mut landmarks = vec![
        Landmark {
            x: 0.5,
            y: 0.5,
            z: 0.0,
            visibility: Some(1.0),
        };
        33
    ];
    for (index, landmark) in overrides {
        landmarks[*index] = *landmark;
    }
    PoseFrame::new(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_frame_is_shorter_than_topology_then_arms_are_unavailable() {
        let frame = PoseFrame::new(vec![Landmark::default(); MIN_LANDMARKS - 1]);

        assert!(!frame.is_complete());
        assert!(frame.left_arm().is_none());
        assert!(frame.right_arm().is_none());
    }

    #[test]
    fn when_frame_is_complete_then_right_arm_reads_right_indices() {
        let wrist = Landmark {
            x: 0.2,
            y: 0.3,
            z: -0.1,
            visibility: None,
        };
        let frame = frame_with(&[(RIGHT_WRIST, wrist)]);

        let arm = frame.right_arm().expect("expected right arm");
        assert_eq!(arm.wrist, wrist);
    }
}
