//! Wall clearance measured across a single ring.

use std::f64::consts::TAU;

use tunnelcave_shared::Vector3;

use crate::error::{TunnelError, TunnelResult};
use crate::terrain::RingSample;

/// Radii on both sides of the ring centre along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clearance {
    /// Distance to the wall along `+axis`.
    pub positive: f64,
    /// Distance to the wall along `-axis`.
    pub negative: f64,
    /// Sum of both sides.
    pub diameter: f64,
}

/// Distribution of diameters across evenly spaced axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearanceStats {
    /// Smallest diameter.
    pub min: f64,
    /// Mean diameter.
    pub mean: f64,
    /// Population variance of the diameters.
    pub variance: f64,
}

/// Clearance queries against one ring.
#[derive(Clone, Copy, Debug)]
pub struct RingProbe<'a> {
    ring: &'a RingSample,
}

impl<'a> RingProbe<'a> {
    /// Probes `ring`.
    #[must_use]
    pub const fn new(ring: &'a RingSample) -> Self {
        Self { ring }
    }

    /// Clearance along `axis`, projected into the ring plane.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::AxisParallelToForward`] when the axis has no
    /// in-plane component.
    pub fn clearance_along(&self, axis: Vector3) -> TunnelResult<Clearance> {
        let frame = self.ring.frame();
        let forward = frame.forward();
        let in_plane = axis - forward * axis.dot(forward);
        if in_plane.length() < 1e-6 {
            return Err(TunnelError::AxisParallelToForward);
        }
        let in_plane = in_plane.normalize_or(frame.right());
        let angle = in_plane.dot(frame.up()).atan2(in_plane.dot(frame.right()));

        let sides = self.ring.sides() as f64;
        let index = angle / TAU * sides;
        let positive = self.ring.radius_at_angle(index.rem_euclid(sides));
        let negative = self.ring.radius_at_angle((index + sides / 2.0).rem_euclid(sides));
        Ok(Clearance {
            positive,
            negative,
            diameter: positive + negative,
        })
    }

    /// Diameter statistics over `sample_count` evenly spaced axes.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::InvalidSampleCount`] for zero samples.
    pub fn min_mean_variance(&self, sample_count: usize) -> TunnelResult<ClearanceStats> {
        if sample_count == 0 {
            return Err(TunnelError::InvalidSampleCount);
        }
        let frame = self.ring.frame();
        let diameters = (0..sample_count)
            .map(|i| {
                let angle = i as f64 / sample_count as f64 * TAU;
                self.clearance_along(frame.radial(angle)).map(|c| c.diameter)
            })
            .collect::<TunnelResult<Vec<f64>>>()?;

        let n = diameters.len() as f64;
        let mean = diameters.iter().sum::<f64>() / n;
        let variance = diameters.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        Ok(ClearanceStats {
            min: diameters.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            variance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnelcave_shared::OrthonormalFrame;

    fn ring(profile: Vec<f64>) -> RingSample {
        let frame = OrthonormalFrame::initial(Vector3::ZERO, Vector3::Z);
        RingSample::new(frame, 1.0, profile, 0.0).unwrap()
    }

    #[test]
    fn test_uniform_ring_clearance() {
        let r = ring(vec![3.0; 12]);
        let probe = RingProbe::new(&r);
        let c = probe.clearance_along(Vector3::new(0.3, 0.8, 0.0)).unwrap();
        assert!((c.positive - 3.0).abs() < 1e-12);
        assert!((c.negative - 3.0).abs() < 1e-12);
        assert!((c.diameter - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_asymmetric_ring_clearance() {
        // Side 0 (right) is wide, side 2 (left) is narrow.
        let r = ring(vec![5.0, 2.0, 1.0, 2.0]);
        let probe = RingProbe::new(&r);
        let c = probe.clearance_along(r.frame().right()).unwrap();
        assert!((c.positive - 5.0).abs() < 1e-12);
        assert!((c.negative - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_forward_component_is_ignored() {
        let r = ring(vec![5.0, 2.0, 1.0, 2.0]);
        let probe = RingProbe::new(&r);
        let tilted = r.frame().right() + Vector3::Z * 4.0;
        assert_eq!(
            probe.clearance_along(tilted).unwrap(),
            probe.clearance_along(r.frame().right()).unwrap()
        );
    }

    #[test]
    fn test_rejects_axis_along_forward() {
        let r = ring(vec![3.0; 8]);
        assert_eq!(
            RingProbe::new(&r).clearance_along(Vector3::Z * 2.0),
            Err(TunnelError::AxisParallelToForward)
        );
    }

    #[test]
    fn test_min_mean_variance() {
        let r = ring(vec![3.0; 8]);
        let stats = RingProbe::new(&r).min_mean_variance(12).unwrap();
        assert!((stats.mean - 6.0).abs() < 1e-12);
        assert!((stats.min - 6.0).abs() < 1e-12);
        assert!(stats.variance < 1e-20);
        assert_eq!(
            RingProbe::new(&r).min_mean_variance(0),
            Err(TunnelError::InvalidSampleCount)
        );
    }
}
