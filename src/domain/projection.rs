// Maps normalized 2D landmarks into world space through the virtual camera.

use glam::Vec3;

/// Exaggerates the sensor's shallow relative depth into a usable play-field range.
pub const Z_SCALE: f32 = 6.0;

/// Virtual perspective camera looking down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width / height of the viewport.
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 4.0),
            fov_degrees: 60.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    /// World-space (width, height) of the view frustum slice at `distance` from the camera.
    pub fn plane_size_at(&self, distance: f32) -> (f32, f32) {
        let half_fov = self.fov_degrees.to_radians() * 0.5;
        let height = 2.0 * half_fov.tan() * distance.abs();
        (height * self.aspect, height)
    }
}

/// Projects a normalized landmark into world space.
///
/// Returns `None` only when no camera is supplied and `use_fallback` is false.
/// Non-finite inputs are replaced with safe defaults (0.5 for x/y, 0 for depth) and a
/// non-finite result collapses to the origin.
pub fn project(
    norm_x: f32,
    norm_y: f32,
    raw_z: f32,
    camera: Option<&Camera>,
    use_fallback: bool,
) -> Option<Vec3> {
    let fallback;
    let camera = match camera {
        Some(camera) => camera,
        None if use_fallback => {
            fallback = Camera::default();
            &fallback
        }
        None => return None,
    };

    let norm_x = finite_or(norm_x, 0.5);
    let norm_y = finite_or(norm_y, 0.5);
    let raw_z = finite_or(raw_z, 0.0);

    let world_z = raw_z * Z_SCALE;
    let distance = camera.position.z - world_z;
    let (width, height) = camera.plane_size_at(distance);

    let point = Vec3::new(
        // The sensor image is a selfie view: screen-right is the player's left.
        camera.position.x + (0.5 - norm_x) * width,
        // Screen Y grows downward; world Y grows upward.
        camera.position.y + (0.5 - norm_y) * height,
        world_z,
    );

    Some(sanitize(point))
}

/// Collapses any non-finite point to the origin.
pub fn sanitize(point: Vec3) -> Vec3 {
    if point.is_finite() { point } else { Vec3::ZERO }
}

fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() { value } else { default }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn when_point_is_screen_center_then_it_lands_on_camera_axis() {
        let camera = Camera::default();
        let point = project(0.5, 0.5, 0.0, Some(&camera), false).expect("expected point");

        assert!(approx(point.x, camera.position.x));
        assert!(approx(point.y, camera.position.y));
        assert!(approx(point.z, 0.0));
    }

    #[test]
    fn when_point_is_top_of_screen_then_world_y_is_above_camera() {
        let camera = Camera::default();
        let point = project(0.5, 0.0, 0.0, Some(&camera), false).expect("expected point");
        let (_, height) = camera.plane_size_at(camera.position.z);

        assert!(approx(point.y, camera.position.y + height * 0.5));
    }

    #[test]
    fn when_wrists_rest_in_their_calibration_zones_then_each_lands_over_its_own_lanes() {
        use crate::domain::beatmap::{LaneLayout, NoteColor};
        use crate::domain::tuning::CalibrationTuning;

        let camera = Camera::default();
        let zones = CalibrationTuning::default();
        let lanes = LaneLayout::default();
        let nearest_lane = |x: f32| {
            ["M1", "M2", "M3", "M4"]
                .into_iter()
                .min_by(|a, b| {
                    let da = (lanes.target(a).map_or(f32::MAX, |t| t.x) - x).abs();
                    let db = (lanes.target(b).map_or(f32::MAX, |t| t.x) - x).abs();
                    da.total_cmp(&db)
                })
                .unwrap_or("M1")
        };

        let (lx, ly) = zones.left_target;
        let (rx, ry) = zones.right_target;
        let left = project(lx, ly, 0.0, Some(&camera), false).expect("expected point");
        let right = project(rx, ry, 0.0, Some(&camera), false).expect("expected point");

        assert!(left.x < 0.0 && right.x > 0.0, "left {left:?}, right {right:?}");
        assert_eq!(lanes.side_of(nearest_lane(left.x)), NoteColor::Left);
        assert_eq!(lanes.side_of(nearest_lane(right.x)), NoteColor::Right);
    }

    #[test]
    fn when_depth_is_scaled_then_world_z_is_raw_times_scale() {
        let point = project(0.5, 0.5, -0.25, None, true).expect("expected point");

        assert!(approx(point.z, -0.25 * Z_SCALE));
    }

    #[test]
    fn when_inputs_are_not_finite_then_safe_defaults_are_used() {
        let camera = Camera::default();
        let point = project(f32::NAN, f32::INFINITY, f32::NAN, Some(&camera), false)
            .expect("expected point");

        assert!(point.is_finite());
        assert!(approx(point.x, camera.position.x));
        assert!(approx(point.z, 0.0));
    }

    #[test]
    fn when_camera_is_degenerate_then_result_collapses_to_origin() {
        let camera = Camera {
            position: Vec3::new(f32::MAX, 0.0, 4.0),
            fov_degrees: 179.999,
            aspect: f32::MAX,
        };
        let point = project(1.0, 0.5, 0.0, Some(&camera), false).expect("expected point");

        assert_eq!(point, Vec3::ZERO);
    }

    #[test]
    fn when_no_camera_and_no_fallback_then_nothing_is_projected() {
        assert!(project(0.5, 0.5, 0.0, None, false).is_none());
    }
}
