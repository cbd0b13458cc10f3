//! Orientation calibration.
//!
//! The calibrator stores the inverse of the orientation the head had when the
//! user pressed calibrate. Multiplying that reference onto every later sample
//! re-expresses the sample relative to the zeroed pose.

use glam::{EulerRot, Quat};

/// Frame correction premultiplied onto every raw game-rotation sample.
/// The wearable reports rotations in a frame flipped 180 degrees about the
/// device's x axis relative to the head frame used here.
pub const SENSOR_FRAME_FIX: Quat = Quat::from_xyzw(1.0, 0.0, 0.0, 0.0);

/// Re-express a raw sensor quaternion in the head frame.
pub fn remap_sensor_frame(raw: Quat) -> Quat {
    SENSOR_FRAME_FIX * raw
}

/// Yaw about the vertical axis (+Z in the head frame), in radians.
pub fn yaw_of(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::ZYX).0
}

/// Holds the user-set zero-orientation reference.
///
/// Owned by the app state and passed to the event dispatcher explicitly;
/// there is no process-wide calibration singleton. Written only by the
/// calibrate action and read by every orientation event, all on the same
/// dispatch loop.
#[derive(Debug, Clone, Copy)]
pub struct OrientationCalibrator {
    reference: Quat,
}

impl OrientationCalibrator {
    pub fn new() -> Self {
        Self {
            reference: Quat::IDENTITY,
        }
    }

    /// Replace the reference with the inverse of the current orientation.
    /// For unit quaternions the inverse is always defined, so this cannot
    /// fail. Returns the new reference.
    pub fn calibrate(&mut self, current: Quat) -> Quat {
        self.reference = current.inverse();
        self.reference
    }

    /// Apply the stored reference to a sample: `reference * sample`.
    pub fn apply(&self, sample: Quat) -> Quat {
        self.reference * sample
    }

    pub fn reference(&self) -> Quat {
        self.reference
    }
}

impl Default for OrientationCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Format radians as degrees with two decimal places and a degree symbol.
pub fn format_degrees(radians: f32) -> String {
    format!("{:.2}°", radians.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPSILON: f32 = 1e-5;

    fn assert_identity_rotation(q: Quat) {
        // A quaternion represents the identity rotation when its angle with
        // identity is zero; -identity counts too.
        assert!(
            q.angle_between(Quat::IDENTITY) < EPSILON,
            "expected identity rotation, got {:?}",
            q
        );
    }

    #[test]
    fn calibrate_cancels_current_orientation() {
        let samples = [
            Quat::from_rotation_z(0.7),
            Quat::from_rotation_y(-1.2),
            Quat::from_euler(EulerRot::ZYX, 1.0, -0.3, 2.1),
            Quat::from_axis_angle(glam::Vec3::new(1.0, 2.0, -0.5).normalize(), 2.8),
        ];

        for q in samples {
            let mut calibrator = OrientationCalibrator::new();
            calibrator.calibrate(q);
            assert_identity_rotation(calibrator.apply(q));
        }
    }

    #[test]
    fn calibrate_overwrites_previous_reference() {
        let mut calibrator = OrientationCalibrator::new();
        let first = Quat::from_rotation_z(FRAC_PI_4);
        let second = Quat::from_rotation_z(-FRAC_PI_2);

        calibrator.calibrate(first);
        calibrator.calibrate(second);

        assert_identity_rotation(calibrator.apply(second));
        // The first orientation must no longer map to identity.
        assert!(calibrator.apply(first).angle_between(Quat::IDENTITY) > 0.1);
    }

    #[test]
    fn apply_is_reference_times_sample() {
        let mut calibrator = OrientationCalibrator::new();
        let reference_source = Quat::from_rotation_y(0.4);
        let reference = calibrator.calibrate(reference_source);
        let sample = Quat::from_rotation_z(1.1);

        let applied = calibrator.apply(sample);
        let expected = reference * sample;
        assert!((applied.dot(expected).abs() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn uncalibrated_reference_is_identity() {
        let calibrator = OrientationCalibrator::new();
        let sample = Quat::from_rotation_z(0.3);
        assert!((calibrator.apply(sample).dot(sample).abs() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn yaw_of_pure_z_rotation() {
        assert!((yaw_of(Quat::from_rotation_z(0.5)) - 0.5).abs() < EPSILON);
        assert!((yaw_of(Quat::from_rotation_z(-1.2)) + 1.2).abs() < EPSILON);
        assert!(yaw_of(Quat::IDENTITY).abs() < EPSILON);
    }

    #[test]
    fn sensor_frame_fix_is_involutive() {
        // Applying the frame fix twice lands back on the original rotation.
        let q = Quat::from_euler(EulerRot::ZYX, 0.9, 0.2, -0.4);
        let twice = remap_sensor_frame(remap_sensor_frame(q));
        assert!((twice.dot(q).abs() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn format_degrees_output() {
        assert_eq!(format_degrees(PI), "180.00°");
        assert_eq!(format_degrees(0.0), "0.00°");
    }
}
