//! # Spawn Planner
//!
//! Picks a deterministic, collision-free pose for a craft of a given radius.
//!
//! ## Strategy
//!
//! 1. Score every ring in the arc-length window by
//!    `mean - variance - |mean - min|` over 12 probe diameters.
//! 2. Walk rings from best to worst score. On each, scan 16 lateral axes and
//!    keep the one with the largest `min(positive, negative) - craft_radius`.
//! 3. Accept the first ring whose best margin is positive, shifting the
//!    position along the axis to centre the craft between opposing walls.
//! 4. Otherwise try the globally widest ring, then give up.

use std::f64::consts::TAU;

use tracing::{debug, warn};
use tunnelcave_shared::Vector3;

use crate::error::{TunnelError, TunnelResult};
use crate::probe::RingProbe;
use crate::terrain::{RingSample, TunnelTerrainGenerator};

/// Probe diameters sampled per ring while scoring.
const SCORE_SAMPLES: usize = 12;

/// Lateral axes scanned per candidate ring.
const AXIS_CANDIDATES: usize = 16;

/// What to spawn and where to look.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Arc-length window `[start, end)` of candidate rings.
    pub arc_window: (f64, f64),
    /// Radius of the craft's bounding sphere.
    pub craft_radius: f64,
}

/// Chosen spawn pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnResult {
    /// Craft centre.
    pub position: Vector3,
    /// Travel direction of the chosen ring.
    pub forward: Vector3,
    /// Lateral axis with the most clearance.
    pub right: Vector3,
    /// `forward x right`.
    pub up: Vector3,
    /// Index of the chosen ring.
    pub ring_index: usize,
    /// Clearance left on the tighter side.
    pub margin: f64,
}

/// Searches a ring sequence for safe spawn poses.
#[derive(Clone, Copy, Debug)]
pub struct SpawnPlanner<'a> {
    rings: &'a [RingSample],
    arc_lengths: &'a [f64],
}

impl<'a> SpawnPlanner<'a> {
    /// Planner over rings paired with their arc lengths.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::RingCountMismatch`] when the slices differ in
    /// length.
    pub fn new(rings: &'a [RingSample], arc_lengths: &'a [f64]) -> TunnelResult<Self> {
        if rings.len() != arc_lengths.len() {
            return Err(TunnelError::RingCountMismatch {
                rings: rings.len(),
                arc_lengths: arc_lengths.len(),
            });
        }
        Ok(Self { rings, arc_lengths })
    }

    /// Planner over everything a generator has produced so far.
    #[must_use]
    pub fn from_generator(generator: &'a TunnelTerrainGenerator) -> Self {
        Self {
            rings: generator.rings(),
            arc_lengths: generator.arc_lengths(),
        }
    }

    /// Finds a pose for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::NoSafeSpawn`] when no ring, including the
    /// widest fallback, leaves a positive margin, and
    /// [`TunnelError::InvalidParameter`] for a negative or non-finite craft
    /// radius.
    pub fn plan(&self, request: &SpawnRequest) -> TunnelResult<SpawnResult> {
        let craft_radius = request.craft_radius;
        if !craft_radius.is_finite() || craft_radius < 0.0 {
            return Err(TunnelError::invalid(
                "craft_radius",
                format!("must be finite and non-negative, got {craft_radius}"),
            ));
        }

        let (start, end) = request.arc_window;
        let mut scored = Vec::new();
        for (index, (ring, &s)) in self.rings.iter().zip(self.arc_lengths).enumerate() {
            if s >= start && s < end {
                let stats = RingProbe::new(ring).min_mean_variance(SCORE_SAMPLES)?;
                let score = stats.mean - stats.variance - (stats.mean - stats.min).abs();
                scored.push((score, index));
            }
        }
        // Stable: equal scores keep ascending ring order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        for &(_, index) in &scored {
            if let Some(result) = self.try_ring(index, craft_radius)? {
                return Ok(result);
            }
        }

        if let Some(widest) = self.widest_ring() {
            debug!(widest, candidates = scored.len(), craft_radius, "spawn window exhausted, trying widest ring");
            if let Some(result) = self.try_ring(widest, craft_radius)? {
                return Ok(result);
            }
        }

        warn!(craft_radius, window = ?request.arc_window, "no safe spawn pose");
        Err(TunnelError::NoSafeSpawn { craft_radius })
    }

    fn widest_ring(&self) -> Option<usize> {
        self.rings
            .iter()
            .map(RingSample::max_radius)
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
                Some((_, best_r)) if best_r >= r => best,
                _ => Some((i, r)),
            })
            .map(|(i, _)| i)
    }

    fn try_ring(&self, index: usize, craft_radius: f64) -> TunnelResult<Option<SpawnResult>> {
        let ring = &self.rings[index];
        let probe = RingProbe::new(ring);
        let frame = ring.frame();

        let mut best: Option<(f64, Vector3, f64, f64)> = None;
        for i in 0..AXIS_CANDIDATES {
            let axis = frame.radial(i as f64 / AXIS_CANDIDATES as f64 * TAU);
            let clearance = probe.clearance_along(axis)?;
            let margin = clearance.positive.min(clearance.negative) - craft_radius;
            if best.map_or(true, |(m, ..)| margin > m) {
                best = Some((margin, axis.normalize_or(frame.right()), clearance.positive, clearance.negative));
            }
        }

        let Some((margin, axis, positive, negative)) = best.filter(|b| b.0 > 0.0) else {
            return Ok(None);
        };
        let forward = ring.forward();
        Ok(Some(SpawnResult {
            position: ring.center() + axis * ((positive - negative) * 0.5),
            forward,
            right: axis,
            up: forward.cross(axis).normalize_or(frame.up()),
            ring_index: index,
            margin,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnelcave_shared::OrthonormalFrame;

    fn ring_at(z: f64, profile: Vec<f64>) -> RingSample {
        let frame = OrthonormalFrame::initial(Vector3::new(0.0, 0.0, z), Vector3::Z);
        RingSample::new(frame, 1.0, profile, 0.0).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_slices() {
        let rings = vec![ring_at(0.0, vec![3.0; 8])];
        assert!(matches!(
            SpawnPlanner::new(&rings, &[0.0, 1.0]),
            Err(TunnelError::RingCountMismatch { rings: 1, arc_lengths: 2 })
        ));
    }

    #[test]
    fn test_offset_centres_between_walls() {
        // One wall much farther away than the others.
        let rings = vec![ring_at(0.0, vec![6.0, 2.0, 2.0, 2.0])];
        let planner = SpawnPlanner::new(&rings, &[0.0]).unwrap();
        let result = planner
            .plan(&SpawnRequest { arc_window: (0.0, 1.0), craft_radius: 1.0 })
            .unwrap();
        assert!(result.margin > 0.0);
        let frame = rings[0].frame();
        let shift = result.position - rings[0].center();
        assert!(shift.dot(frame.forward()).abs() < 1e-12);
        // Remaining clearance is equal on both sides of the chosen axis.
        let clearance = RingProbe::new(&rings[0]).clearance_along(result.right).unwrap();
        let offset = shift.dot(result.right);
        assert!(((clearance.positive - offset) - (clearance.negative + offset)).abs() < 1e-9);
    }

    #[test]
    fn test_pose_is_orthonormal() {
        let rings = vec![ring_at(0.0, vec![4.0; 10])];
        let planner = SpawnPlanner::new(&rings, &[0.0]).unwrap();
        let r = planner
            .plan(&SpawnRequest { arc_window: (0.0, 1.0), craft_radius: 0.5 })
            .unwrap();
        assert!(r.forward.dot(r.right).abs() < 1e-12);
        assert!(r.forward.dot(r.up).abs() < 1e-12);
        assert!(r.right.dot(r.up).abs() < 1e-12);
        assert!((r.up.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_falls_back_to_widest() {
        let rings = vec![ring_at(0.0, vec![2.0; 8]), ring_at(3.0, vec![5.0; 8])];
        let planner = SpawnPlanner::new(&rings, &[0.0, 3.0]).unwrap();
        let r = planner
            .plan(&SpawnRequest { arc_window: (100.0, 200.0), craft_radius: 1.0 })
            .unwrap();
        assert_eq!(r.ring_index, 1);
    }

    #[test]
    fn test_rejects_bad_craft_radius() {
        let rings = vec![ring_at(0.0, vec![2.0; 8])];
        let planner = SpawnPlanner::new(&rings, &[0.0]).unwrap();
        let request = SpawnRequest { arc_window: (0.0, 1.0), craft_radius: f64::NAN };
        assert!(matches!(planner.plan(&request), Err(TunnelError::InvalidParameter { .. })));
    }

    #[test]
    fn test_oversized_craft_is_rejected() {
        let rings = vec![ring_at(0.0, vec![2.0; 8])];
        let planner = SpawnPlanner::new(&rings, &[0.0]).unwrap();
        let request = SpawnRequest { arc_window: (0.0, 1.0), craft_radius: 2.5 };
        assert_eq!(planner.plan(&request), Err(TunnelError::NoSafeSpawn { craft_radius: 2.5 }));
    }
}
