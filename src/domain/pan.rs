//! Yaw to stereo-pan mapping.

/// Map calibrated head yaw (radians) to a stereo pan in [-1, 1].
///
/// The mapping is one-sided by design: negative yaw walks the pan from full
/// right back toward the left, non-negative yaw keeps it pinned at full
/// right. The loop is anchored at the listener's right, so the pan only
/// tracks the head on that side.
pub fn compute_pan(yaw: f32) -> f32 {
    if yaw < 0.0 {
        (1.0 + yaw).clamp(-1.0, 1.0)
    } else {
        // TODO: decide whether to attenuate volume as yaw grows while the
        // pan is already pinned at 1.
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_yaw_moves_pan_off_full_right() {
        assert_eq!(compute_pan(-0.5), 0.5);
        assert_eq!(compute_pan(-1.0), 0.0);
    }

    #[test]
    fn large_negative_yaw_clamps_to_full_left() {
        assert_eq!(compute_pan(-1.5), -0.5);
        assert_eq!(compute_pan(-2.0), -1.0);
        assert_eq!(compute_pan(-10.0), -1.0);
    }

    #[test]
    fn non_negative_yaw_pins_pan_right() {
        assert_eq!(compute_pan(0.0), 1.0);
        assert_eq!(compute_pan(0.5), 1.0);
        assert_eq!(compute_pan(3.0), 1.0);
    }

    #[test]
    fn pan_stays_in_domain_for_finite_yaw() {
        let mut yaw = -8.0f32;
        while yaw <= 8.0 {
            let pan = compute_pan(yaw);
            assert!((-1.0..=1.0).contains(&pan), "yaw {} gave pan {}", yaw, pan);
            yaw += 0.01;
        }
        assert_eq!(compute_pan(f32::MAX), 1.0);
        assert_eq!(compute_pan(f32::MIN), -1.0);
    }
}
