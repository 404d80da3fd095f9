//! Coarse signed distance to the tunnel wall.
//!
//! The wall is approximated as a chain of cones: each pair of consecutive
//! rings contributes its centre-line segment, with the radius interpolated
//! between the two rings' largest radii. Negative values are inside.

use tunnelcave_shared::Vector3;

use crate::noise::{noise3, WorldSeed};
use crate::terrain::RingSample;

/// Distance from `point` to segment `a..b` and the clamped segment
/// parameter of the closest point.
#[must_use]
pub fn distance_to_segment(point: Vector3, a: Vector3, b: Vector3) -> (f64, f64) {
    let ab = b - a;
    let ap = point - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return (ap.length(), 0.0);
    }
    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    ((point - (a + ab * t)).length(), t)
}

/// Signed distance field over a ring slice.
#[derive(Clone, Copy, Debug)]
pub struct SignedDistanceField<'a> {
    rings: &'a [RingSample],
    detail_seed: WorldSeed,
    detail_amplitude: f64,
}

impl<'a> SignedDistanceField<'a> {
    /// Field without surface detail.
    #[must_use]
    pub fn new(rings: &'a [RingSample]) -> Self {
        Self {
            rings,
            detail_seed: WorldSeed::default(),
            detail_amplitude: 0.0,
        }
    }

    /// Field with seeded noise of `amplitude` added to the distance.
    #[must_use]
    pub fn with_detail(rings: &'a [RingSample], seed: WorldSeed, amplitude: f64) -> Self {
        Self {
            rings,
            detail_seed: seed,
            detail_amplitude: amplitude,
        }
    }

    /// Signed distance at `point`; infinite for an empty slice.
    #[must_use]
    pub fn evaluate(&self, point: Vector3) -> f64 {
        let base = match self.rings {
            [] => return f64::INFINITY,
            [single] => point.distance(single.center()) - single.max_radius(),
            rings => rings
                .windows(2)
                .map(|pair| {
                    let (distance, t) = distance_to_segment(point, pair[0].center(), pair[1].center());
                    let radius = pair[0].max_radius() * (1.0 - t) + pair[1].max_radius() * t;
                    distance - radius
                })
                .fold(f64::INFINITY, f64::min),
        };
        if self.detail_amplitude == 0.0 {
            return base;
        }
        base + self.detail_amplitude * noise3(self.detail_seed, point.x, point.y, point.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnelcave_shared::OrthonormalFrame;

    fn rings() -> Vec<RingSample> {
        (0..3)
            .map(|i| {
                let frame = OrthonormalFrame::initial(Vector3::new(0.0, 0.0, f64::from(i) * 4.0), Vector3::Z);
                RingSample::uniform(frame, 2.0, 8).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_segment_distance() {
        let (d, t) = distance_to_segment(Vector3::new(1.0, 0.0, 5.0), Vector3::ZERO, Vector3::new(0.0, 0.0, 10.0));
        assert!((d - 1.0).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_segment() {
        let (d, t) = distance_to_segment(Vector3::new(3.0, 4.0, 0.0), Vector3::ZERO, Vector3::ZERO);
        assert_eq!((d, t), (5.0, 0.0));
    }

    #[test]
    fn test_sign_inside_and_outside() {
        let rings = rings();
        let field = SignedDistanceField::new(&rings);
        assert!((field.evaluate(Vector3::new(0.0, 0.0, 4.0)) + 2.0).abs() < 1e-12);
        assert!((field.evaluate(Vector3::new(5.0, 0.0, 4.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_field_is_far() {
        assert_eq!(SignedDistanceField::new(&[]).evaluate(Vector3::ZERO), f64::INFINITY);
    }

    #[test]
    fn test_detail_is_bounded() {
        let rings = rings();
        let plain = SignedDistanceField::new(&rings);
        let detailed = SignedDistanceField::with_detail(&rings, WorldSeed::new(4), 0.25);
        for i in 0..50 {
            let p = Vector3::new(f64::from(i) * 0.37, 0.5, f64::from(i) * 0.11);
            assert!((plain.evaluate(p) - detailed.evaluate(p)).abs() <= 0.25 * 1.5);
        }
    }
}
