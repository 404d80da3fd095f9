//! # Cave Path
//!
//! The ring cache seen as a continuous curve `C(t)` with wall surface
//! `P(theta, r, t)`, parametrized by arc length.

use std::f64::consts::TAU;

use tunnelcave_shared::{OrthonormalFrame, Vector3};

use crate::error::{TunnelError, TunnelResult};
use crate::terrain::{RingSample, TunnelTerrainGenerator};

/// Interpolated frame and radii at one arc length.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveSample {
    /// Arc length the sample was taken at.
    pub parameter: f64,
    /// Interpolated frame.
    pub frame: OrthonormalFrame,
    /// Interpolated per-side radii.
    pub radii: Vec<f64>,
}

impl CurveSample {
    fn from_ring(parameter: f64, ring: &RingSample) -> Self {
        Self {
            parameter,
            frame: *ring.frame(),
            radii: ring.roughness_profile().to_vec(),
        }
    }

    /// Smallest radius.
    #[must_use]
    pub fn min_radius(&self) -> f64 {
        self.radii.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest radius.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.radii.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Radius along `theta` radians from `right`, interpolated between sides.
    #[must_use]
    pub fn radius_at(&self, theta: f64) -> f64 {
        let sides = self.radii.len();
        if sides == 0 {
            return 0.0;
        }
        let index = theta.rem_euclid(TAU) / TAU * sides as f64;
        let floor = index.floor();
        let base = (floor as usize) % sides;
        let next = (base + 1) % sides;
        let t = index - floor;
        self.radii[base] * (1.0 - t) + self.radii[next] * t
    }

    /// Wall point along `theta`; `radius` overrides the sampled radius and
    /// is clamped at zero.
    #[must_use]
    pub fn point_on_wall(&self, theta: f64, radius: Option<f64>) -> Vector3 {
        let r = radius.map_or_else(|| self.radius_at(theta), |r| r.max(0.0));
        self.frame.origin() + self.frame.radial(theta) * r
    }
}

/// Continuous view over a generator's rings.
///
/// Sampling past the generated prefix grows the generator, so the path
/// borrows it mutably.
#[derive(Debug)]
pub struct CavePath<'g> {
    generator: &'g mut TunnelTerrainGenerator,
}

impl<'g> CavePath<'g> {
    /// Wraps a generator.
    #[must_use]
    pub fn new(generator: &'g mut TunnelTerrainGenerator) -> Self {
        Self { generator }
    }

    /// Frame and radii at arc length `t`.
    ///
    /// At a ring's exact arc length the ring itself is returned. At or past
    /// the last ring (after growing to `t`) the last ring is returned.
    ///
    /// Growth is proportional to `t`: a far target allocates every ring up
    /// to it.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::NegativeParameter`] for negative or NaN `t`
    /// and [`TunnelError::InvalidParameter`] for infinite `t`.
    pub fn sample(&mut self, t: f64) -> TunnelResult<CurveSample> {
        if t.is_nan() || t < 0.0 {
            return Err(TunnelError::NegativeParameter(t));
        }
        self.generator.ensure_arc_length(t)?;
        let rings = self.generator.rings();
        let arcs = self.generator.arc_lengths();
        if rings.len() != arcs.len() {
            return Err(TunnelError::RingCountMismatch {
                rings: rings.len(),
                arc_lengths: arcs.len(),
            });
        }
        let (Some(last_ring), Some(&last_s)) = (rings.last(), arcs.last()) else {
            return Err(TunnelError::RingCountMismatch { rings: 0, arc_lengths: 0 });
        };
        if t >= last_s {
            return Ok(CurveSample::from_ring(t, last_ring));
        }

        let upper = arcs.partition_point(|&s| s <= t).max(1);
        let lower = upper - 1;
        let (s0, s1) = (arcs[lower], arcs[upper]);
        let blend = (t - s0) / (s1 - s0).max(1e-6);
        let (a, b) = (&rings[lower], &rings[upper]);
        if blend == 0.0 {
            return Ok(CurveSample::from_ring(t, a));
        }

        let origin = a.center().lerp(b.center(), blend);
        let forward = a.forward().lerp(b.forward(), blend).normalize_or(b.forward());
        let up_hint = a.frame().up().lerp(b.frame().up(), blend);
        let radii = a
            .roughness_profile()
            .iter()
            .zip(b.roughness_profile())
            .map(|(ra, rb)| ra * (1.0 - blend) + rb * blend)
            .collect();

        Ok(CurveSample {
            parameter: t,
            frame: OrthonormalFrame::from_forward_up(origin, forward, up_hint),
            radii,
        })
    }

    /// Centre-line point `C(t)`.
    ///
    /// # Errors
    ///
    /// Same as [`CavePath::sample`].
    pub fn centerline(&mut self, t: f64) -> TunnelResult<Vector3> {
        Ok(self.sample(t)?.frame.origin())
    }

    /// Wall point `P(theta, r, t)`.
    ///
    /// # Errors
    ///
    /// Same as [`CavePath::sample`].
    pub fn wall_point(&mut self, t: f64, theta: f64, radius: Option<f64>) -> TunnelResult<Vector3> {
        Ok(self.sample(t)?.point_on_wall(theta, radius))
    }
}
