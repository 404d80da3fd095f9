//! Curl-noise steering with deterministic jolts.

use tunnelcave_shared::{rotate_towards, Vector3};

use super::{DirectionField, FieldParams};
use crate::noise::{curl_noise, hash64, pseudo_random_unit, unit_interval};

/// Salt mixed into the jolt hash before deriving the jolt vector.
const JOLT_VECTOR_SALT: u64 = 0x00AB_CDEF;

/// Smooth, divergence-free steering.
///
/// The only mutable state is a persistent target direction that low-passes
/// the curl samples when lookahead averaging is enabled. It advances once
/// per call, so ring `i` depends only on calls `0..i`.
#[derive(Clone, Debug)]
pub struct DivergenceFreeField {
    params: FieldParams,
    persistent_target: Vector3,
}

impl DivergenceFreeField {
    /// Creates a field starting with a +Z target.
    #[must_use]
    pub fn new(params: FieldParams) -> Self {
        Self {
            params,
            persistent_target: Vector3::Z,
        }
    }

    /// Raw normalized curl direction at `position`.
    #[must_use]
    pub fn sample_field(&self, position: Vector3) -> Vector3 {
        let raw = curl_noise(self.params.seed, position, self.params.dir_freq);
        if raw.length() < 1e-6 {
            Vector3::Z
        } else {
            raw.normalize_or(Vector3::Z)
        }
    }

    fn sample_smoothed(&mut self, position: Vector3, previous_direction: Vector3) -> Vector3 {
        let steps = self.params.curve_smoothing_steps.max(1);
        let span = self.params.curve_smoothing_distance.max(0.0);
        let heading = if previous_direction.length() < 1e-5 {
            Vector3::Z
        } else {
            previous_direction.normalize_or(Vector3::Z)
        };

        let averaged = if steps <= 1 || span <= 1e-6 {
            self.sample_field(position)
        } else {
            let step_size = span / (steps - 1) as f64;
            let start = -0.5 * span;
            let sum = (0..steps).fold(Vector3::ZERO, |acc, i| {
                let offset = start + step_size * i as f64;
                acc + self.sample_field(position + heading * offset)
            });
            sum / steps as f64
        };
        let averaged = if averaged.length() < 1e-6 {
            Vector3::Z
        } else {
            averaged.normalize_or(Vector3::Z)
        };

        let history_blend = 1.0 / steps as f64;
        self.persistent_target = self
            .persistent_target
            .lerp(averaged, history_blend)
            .normalize_or(averaged);
        self.persistent_target
    }

    fn apply_jolt(&self, direction: Vector3, step_index: u64, arc_length: f64) -> Vector3 {
        let params = &self.params;
        if params.jolt_every_meters <= 0.0 || params.jolt_strength <= 0.0 {
            return direction;
        }
        let hashed = hash64(params.seed, step_index);
        let threshold = 1.0 - (-arc_length / params.jolt_every_meters.max(1e-5)).exp();
        if unit_interval(hashed) > threshold {
            return direction;
        }
        let kick = pseudo_random_unit(hashed ^ JOLT_VECTOR_SALT);
        (direction + kick * params.jolt_strength).normalize_or(direction)
    }
}

impl DirectionField for DivergenceFreeField {
    fn next_direction(
        &mut self,
        position: Vector3,
        previous_direction: Vector3,
        step_index: u64,
        arc_length: f64,
    ) -> Vector3 {
        let sampled = self.sample_smoothed(position, previous_direction);
        let blended = previous_direction
            .lerp(sampled, self.params.dir_blend)
            .normalize_or(sampled);
        let jolted = self.apply_jolt(blended, step_index, arc_length);
        rotate_towards(previous_direction, jolted, self.params.max_turn_per_step_rad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelParams;
    use crate::noise::WorldSeed;

    fn params() -> FieldParams {
        FieldParams {
            jolt_every_meters: 40.0,
            jolt_strength: 0.6,
            ..FieldParams::from_tunnel(&TunnelParams::test())
        }
    }

    fn walk(field: &mut DivergenceFreeField, steps: u64) -> Vec<Vector3> {
        let mut position = Vector3::ZERO;
        let mut dir = Vector3::Z;
        let mut out = Vec::new();
        for step in 1..=steps {
            dir = field.next_direction(position, dir, step, step as f64 * 3.0);
            position = position + dir * 3.0;
            out.push(dir);
        }
        out
    }

    #[test]
    fn test_turn_rate_is_bounded() {
        let p = params();
        let mut field = DivergenceFreeField::new(p.clone());
        let dirs = walk(&mut field, 400);
        let mut prev = Vector3::Z;
        for dir in dirs {
            assert!(prev.angle_between(dir) <= p.max_turn_per_step_rad + 1e-6);
            assert!((dir.length() - 1.0).abs() < 1e-9);
            prev = dir;
        }
    }

    #[test]
    fn test_same_seed_same_walk() {
        let a = walk(&mut DivergenceFreeField::new(params()), 200);
        let b = walk(&mut DivergenceFreeField::new(params()), 200);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_walk() {
        let other = FieldParams { seed: WorldSeed::new(99), ..params() };
        let a = walk(&mut DivergenceFreeField::new(params()), 100);
        let b = walk(&mut DivergenceFreeField::new(other), 100);
        assert_ne!(a, b);
    }

    #[test]
    fn test_lookahead_smoothing_is_bounded_too() {
        let p = FieldParams {
            curve_smoothing_distance: 12.0,
            curve_smoothing_steps: 5,
            ..params()
        };
        let mut field = DivergenceFreeField::new(p.clone());
        let mut prev = Vector3::Z;
        for dir in walk(&mut field, 200) {
            assert!(prev.angle_between(dir) <= p.max_turn_per_step_rad + 1e-6);
            prev = dir;
        }
    }

    #[test]
    fn test_jolt_disabled_without_strength() {
        let p = FieldParams { jolt_strength: 0.0, ..params() };
        let field = DivergenceFreeField::new(p);
        assert_eq!(field.apply_jolt(Vector3::Z, 7, 1.0e6), Vector3::Z);
    }

    #[test]
    fn test_jolt_fires_far_along_path() {
        let p = FieldParams { jolt_every_meters: 1.0, jolt_strength: 2.0, ..params() };
        let field = DivergenceFreeField::new(p);
        let jolted: Vec<Vector3> = (0..48).map(|step| field.apply_jolt(Vector3::Z, step, 1.0e4)).collect();

        for (step, dir) in (0..).zip(&jolted) {
            assert!(dir.angle_between(Vector3::Z) > 1e-3, "step {step} was not kicked");
            assert!((dir.length() - 1.0).abs() < 1e-9);
            assert_eq!(field.apply_jolt(Vector3::Z, step, 1.0e4), *dir);
        }
        assert!(jolted.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_jolt_never_fires_at_path_start() {
        let field = DivergenceFreeField::new(params());
        for step in 0..64 {
            assert_eq!(field.apply_jolt(Vector3::Z, step, 0.0), Vector3::Z);
        }
    }
}
