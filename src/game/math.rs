use std::f32::consts::{PI, TAU};

use glam::Vec2;

/// Wraps an angle into (-PI, PI]. NaN collapses to 0 so a bad upstream value
/// can never poison position state.
pub fn normalize_angle(mut a: f32) -> f32 {
    if a.is_nan() {
        return 0.0;
    }
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

/// Rotates `angle` toward `target` by at most `max_step` radians.
pub fn rotate_toward(angle: f32, target: f32, max_step: f32) -> f32 {
    let diff = normalize_angle(target - angle);
    if diff.abs() > max_step {
        angle + max_step.copysign(diff)
    } else {
        target
    }
}

/// Steps `pos` toward `target`, clamped so it lands exactly on the target
/// instead of overshooting.
pub fn move_toward(pos: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - pos;
    let dist = delta.length();
    if dist <= max_step || dist <= f32::EPSILON {
        target
    } else {
        pos + delta / dist * max_step
    }
}

pub fn circles_overlap(a: Vec2, ar: f32, b: Vec2, br: f32) -> bool {
    let r = ar + br;
    a.distance_squared(b) <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(-3.0 * PI) - PI).abs() < 1e-5);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn rotate_is_capped() {
        let a = rotate_toward(0.0, PI, 0.1);
        assert!((a - 0.1).abs() < 1e-6);
        // Within reach: snaps to the target exactly.
        assert_eq!(rotate_toward(0.0, 0.05, 0.1), 0.05);
    }

    #[test]
    fn rotate_takes_the_short_way_round() {
        // From just below PI toward just above -PI the short arc crosses the
        // seam, so a capped step moves the angle up, not down.
        let a = rotate_toward(3.0, -3.0, 0.1);
        assert!((a - 3.1).abs() < 1e-6);
    }

    #[test]
    fn move_toward_lands_exactly() {
        let p = move_toward(Vec2::ZERO, Vec2::new(3.0, 4.0), 10.0);
        assert_eq!(p, Vec2::new(3.0, 4.0));
        let q = move_toward(Vec2::ZERO, Vec2::new(3.0, 4.0), 2.5);
        assert!((q.length() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn overlap_includes_touching_circles() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.1, 0.0), 1.0));
    }
}
