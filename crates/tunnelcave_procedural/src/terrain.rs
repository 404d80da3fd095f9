//! # Tunnel Terrain Generator
//!
//! The central engine: an append-only cache of rings grown one at a time
//! along the direction field, sliced into overlapping chunks on request.
//!
//! ## Determinism Guarantee
//!
//! Ring `i` depends only on the configuration and rings `0..i`. Rings are
//! never regenerated or mutated once appended, so any call order or chunk
//! slicing observes the same sequence.
//!
//! ## Profile Pipeline
//!
//! For every side of ring `i > 0`:
//!
//! 1. cavern radius from lobe shaping around the twisted lobe pattern
//! 2. fractal rock detail scaled by `rough_amp / radius_base`
//! 3. clamp to the adaptive floor
//! 4. optional blend with ring `i - 1` (`rough_smoothness`)
//! 5. optional circular convolution (`rough_filter_kernel`)
//! 6. final clamp to the same floor

use std::f64::consts::TAU;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use tunnelcave_shared::{OrthonormalFrame, Vector3};

use crate::chunk::ChunkGeometry;
use crate::config::{FieldType, TunnelParams};
use crate::error::{TunnelError, TunnelResult};
use crate::field::{DirectionField, PathField};
use crate::noise::{channel, noise3};
use crate::profile::CavernProfile;

/// Fraction of the scaled radius no wall may cut below.
const STRUCTURAL_FLOOR_FRACTION: f64 = 0.5;

/// Weight of the previous ring's statistics in the continuity floor.
const CONTINUITY_FLOOR_FRACTION: f64 = 0.9;

/// Lower bound of the modulated base radius, relative to `radius_base`.
const MIN_BASE_RADIUS_FRACTION: f64 = 0.2;

/// One cross-section of the tunnel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingSample {
    frame: OrthonormalFrame,
    base_radius: f64,
    roughness_profile: Vec<f64>,
    floor_radius: f64,
}

impl RingSample {
    /// Builds a ring from explicit data.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::TooFewSides`] for fewer than three radii and
    /// [`TunnelError::InvalidParameter`] for non-positive radii.
    pub fn new(
        frame: OrthonormalFrame,
        base_radius: f64,
        roughness_profile: Vec<f64>,
        floor_radius: f64,
    ) -> TunnelResult<Self> {
        if roughness_profile.len() < 3 {
            return Err(TunnelError::TooFewSides(roughness_profile.len()));
        }
        if roughness_profile.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(TunnelError::invalid("roughness_profile", "radii must be positive"));
        }
        Ok(Self {
            frame,
            base_radius,
            roughness_profile,
            floor_radius,
        })
    }

    /// Round ring of `radius` with `sides` samples.
    ///
    /// # Errors
    ///
    /// Same as [`RingSample::new`].
    pub fn uniform(frame: OrthonormalFrame, radius: f64, sides: usize) -> TunnelResult<Self> {
        Self::new(frame, radius, vec![radius; sides], 0.0)
    }

    /// Frame of the cross-section.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> &OrthonormalFrame {
        &self.frame
    }

    /// Centre-line point.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Vector3 {
        self.frame.origin()
    }

    /// Travel direction.
    #[inline]
    #[must_use]
    pub const fn forward(&self) -> Vector3 {
        self.frame.forward()
    }

    /// Noise-modulated scalar radius before cavern shaping.
    #[inline]
    #[must_use]
    pub const fn base_radius(&self) -> f64 {
        self.base_radius
    }

    /// Floor every profile value was clamped to.
    #[inline]
    #[must_use]
    pub const fn floor_radius(&self) -> f64 {
        self.floor_radius
    }

    /// Per-side wall radii, side `k` at angle `k / sides * TAU` from `right`.
    #[inline]
    #[must_use]
    pub fn roughness_profile(&self) -> &[f64] {
        &self.roughness_profile
    }

    /// Number of angular samples.
    #[inline]
    #[must_use]
    pub fn sides(&self) -> usize {
        self.roughness_profile.len()
    }

    /// Largest wall radius.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.roughness_profile.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest wall radius.
    #[must_use]
    pub fn min_radius(&self) -> f64 {
        self.roughness_profile.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Radius at a fractional side index, interpolated with wraparound.
    #[must_use]
    pub fn radius_at_angle(&self, angle_index: f64) -> f64 {
        let sides = self.sides();
        let wrapped = angle_index.rem_euclid(sides as f64);
        let floor = wrapped.floor();
        let base = (floor as usize) % sides;
        let next = (base + 1) % sides;
        let t = wrapped - floor;
        self.roughness_profile[base] * (1.0 - t) + self.roughness_profile[next] * t
    }

    /// Radius in the direction `theta` radians from `right`.
    #[must_use]
    pub fn radius_at_theta(&self, theta: f64) -> f64 {
        self.radius_at_angle(theta.rem_euclid(TAU) / TAU * self.sides() as f64)
    }

    /// Minimum, mean and variance of the diameters implied by the profile.
    #[must_use]
    pub fn diameter_stats(&self) -> DiameterStats {
        let n = self.sides() as f64;
        let mean_radius = self.roughness_profile.iter().sum::<f64>() / n;
        let variance = self
            .roughness_profile
            .iter()
            .map(|r| (r - mean_radius).powi(2))
            .sum::<f64>()
            / n;
        DiameterStats {
            min: self.min_radius() * 2.0,
            mean: mean_radius * 2.0,
            variance,
        }
    }
}

/// Summary returned by [`RingSample::diameter_stats`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiameterStats {
    /// Twice the smallest radius.
    pub min: f64,
    /// Twice the mean radius.
    pub mean: f64,
    /// Variance of the radii.
    pub variance: f64,
}

/// Statistics of the most recent ring, feeding the next ring's floor and
/// smoothing.
#[derive(Clone, Debug)]
struct RollingStats {
    profile: Vec<f64>,
    mean: f64,
    std_dev: f64,
    min: f64,
}

impl RollingStats {
    fn from_profile(profile: &[f64]) -> Self {
        let n = profile.len() as f64;
        let mean = profile.iter().sum::<f64>() / n;
        let variance = profile.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        Self {
            profile: profile.to_vec(),
            mean,
            std_dev: variance.sqrt(),
            min: profile.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Incremental, deterministic tunnel generator.
///
/// # Example
///
/// ```rust,ignore
/// let mut generator = TunnelTerrainGenerator::new(TunnelParams::default())?;
/// let chunk = generator.generate_chunk(0);
/// assert!(chunk.mesh().is_some());
/// ```
#[derive(Debug)]
pub struct TunnelTerrainGenerator {
    params: TunnelParams,
    profile: CavernProfile,
    field: PathField,
    kernel: Option<Vec<f64>>,
    rings: Vec<RingSample>,
    arc_lengths: Vec<f64>,
    rolling: Option<RollingStats>,
    rings_per_chunk: usize,
}

impl TunnelTerrainGenerator {
    /// Validates `params` and seeds ring 0.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found by
    /// [`TunnelParams::validate`].
    pub fn new(params: TunnelParams) -> TunnelResult<Self> {
        params.validate()?;

        let kernel = params.rough_filter_kernel.as_ref().map(|weights| {
            let sum: f64 = weights.iter().sum();
            weights.iter().map(|w| w / sum).collect()
        });
        let rings_per_chunk = params.rings_per_chunk();

        debug!(
            seed = params.world_seed.value(),
            field = %params.field_type,
            sides = params.tube_sides,
            mode = %params.mode,
            rings_per_chunk,
            "tunnel generator created"
        );

        let mut generator = Self {
            profile: CavernProfile::new(params.profile.clone()),
            field: PathField::from_params(&params),
            kernel,
            rings: Vec::new(),
            arc_lengths: Vec::new(),
            rolling: None,
            rings_per_chunk,
            params,
        };
        generator.ensure_ring(0);
        Ok(generator)
    }

    /// Configuration in use.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &TunnelParams {
        &self.params
    }

    /// Steering variant in use.
    #[inline]
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field.field_type()
    }

    /// All rings generated so far.
    #[inline]
    #[must_use]
    pub fn rings(&self) -> &[RingSample] {
        &self.rings
    }

    /// Ring `index`, if already generated.
    #[inline]
    #[must_use]
    pub fn ring(&self, index: usize) -> Option<&RingSample> {
        self.rings.get(index)
    }

    /// Arc length of every generated ring, strictly increasing.
    #[inline]
    #[must_use]
    pub fn arc_lengths(&self) -> &[f64] {
        &self.arc_lengths
    }

    /// Number of generated rings.
    #[inline]
    #[must_use]
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    /// Rings per chunk, including the ring shared with the next chunk.
    #[inline]
    #[must_use]
    pub const fn rings_per_chunk(&self) -> usize {
        self.rings_per_chunk
    }

    /// Half-open ring range covered by chunk `index`.
    ///
    /// Consecutive ranges share one ring.
    #[must_use]
    pub fn chunk_ring_range(&self, index: usize) -> Range<usize> {
        let start = index * (self.rings_per_chunk - 1);
        start..start + self.rings_per_chunk
    }

    /// Generates rings until ring `index` exists.
    pub fn ensure_ring(&mut self, index: usize) {
        while self.rings.len() <= index {
            self.append_ring();
        }
    }

    /// Generates rings until the last one reaches `arc_length`.
    ///
    /// The cache is never truncated, so a finite but huge target (say
    /// `1e15`) allocates `arc_length / ring_step` rings and can exhaust
    /// memory. Callers bound their own lookahead.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::InvalidParameter`] for a non-finite target.
    pub fn ensure_arc_length(&mut self, arc_length: f64) -> TunnelResult<()> {
        if !arc_length.is_finite() {
            return Err(TunnelError::invalid("arc_length", format!("must be finite, got {arc_length}")));
        }
        while self.arc_lengths.last().map_or(true, |&last| last < arc_length) {
            self.append_ring();
        }
        Ok(())
    }

    /// Builds chunk `index` from its ring window.
    ///
    /// Chunks are not cached here; [`crate::ChunkStreamer`] keeps the
    /// loaded band.
    pub fn generate_chunk(&mut self, index: usize) -> ChunkGeometry {
        let range = self.chunk_ring_range(index);
        self.ensure_ring(range.end - 1);
        let chunk = ChunkGeometry::build(
            index,
            range.start,
            &self.rings[range.clone()],
            &self.params,
        );
        debug!(
            chunk = index,
            rings = ?range,
            vertices = chunk.mesh().map_or(0, |m| m.vertex_count()),
            indices = chunk.mesh().map_or(0, |m| m.index_count()),
            "chunk built"
        );
        chunk
    }

    fn append_ring(&mut self) {
        let index = self.rings.len();
        let previous = self.rings.last().cloned().zip(self.arc_lengths.last().copied());
        let ring = match previous {
            Some((prev, prev_s)) => {
                let arc_length = prev_s + self.params.ring_step;
                let ring = self.next_ring(&prev, index, arc_length);
                self.arc_lengths.push(arc_length);
                ring
            }
            None => {
                self.arc_lengths.push(0.0);
                self.seed_ring()
            }
        };
        trace!(
            index,
            arc_length = self.arc_lengths[index],
            floor = ring.floor_radius,
            max_radius = ring.max_radius(),
            "ring appended"
        );
        self.rolling = Some(RollingStats::from_profile(&ring.roughness_profile));
        self.rings.push(ring);
    }

    fn seed_ring(&self) -> RingSample {
        let params = &self.params;
        let frame = OrthonormalFrame::initial(Vector3::ZERO, Vector3::Z);
        let structural = self.structural_floor(params.radius_base * self.profile.base_scale());
        RingSample {
            frame,
            base_radius: params.radius_base,
            roughness_profile: vec![params.radius_base; params.tube_sides],
            floor_radius: structural.min(params.radius_base),
        }
    }

    fn next_ring(&mut self, prev: &RingSample, index: usize, arc_length: f64) -> RingSample {
        let params = &self.params;
        let direction = self
            .field
            .next_direction(prev.center(), prev.forward(), index as u64, arc_length);
        let origin = self
            .field
            .position_at(arc_length)
            .unwrap_or_else(|| prev.center() + direction * params.ring_step);
        let frame = prev.frame.transport(origin, direction);

        let modulation = noise3(
            params.world_seed.offset(channel::RADIUS),
            arc_length * params.radius_freq,
            0.0,
            0.0,
        );
        let base_radius = (params.radius_base + params.radius_var * modulation)
            .max(params.radius_base * MIN_BASE_RADIUS_FRACTION);

        let (roughness_profile, floor_radius) = self.build_profile(&frame, base_radius, arc_length);
        RingSample {
            frame,
            base_radius,
            roughness_profile,
            floor_radius,
        }
    }

    fn structural_floor(&self, scaled_radius: f64) -> f64 {
        (STRUCTURAL_FLOOR_FRACTION * scaled_radius).max(self.params.min_clearance_radius)
    }

    /// Adaptive floor: the structural floor or, when higher, a fraction of
    /// the previous ring's low end, capped below the scaled radius.
    fn floor_for(&self, scaled_radius: f64) -> f64 {
        let structural = self.structural_floor(scaled_radius);
        let continuity = self.rolling.as_ref().map_or(0.0, |prev| {
            let low_end = prev.min.min(prev.mean - prev.std_dev);
            (CONTINUITY_FLOOR_FRACTION * low_end).min(CONTINUITY_FLOOR_FRACTION * scaled_radius)
        });
        structural.max(continuity)
    }

    fn build_profile(
        &self,
        frame: &OrthonormalFrame,
        base_radius: f64,
        arc_length: f64,
    ) -> (Vec<f64>, f64) {
        let params = &self.params;
        let sides = params.tube_sides;
        let scaled = base_radius * self.profile.base_scale();
        let twist = self
            .profile
            .twist_angle(params.world_seed.offset(channel::TWIST), arc_length);
        let rock_seed = params.world_seed.offset(channel::ROCK);
        let detail_gain = params.rough_amp / params.radius_base;
        let floor = self.floor_for(scaled);
        let origin = frame.origin();

        let mut values: Vec<f64> = (0..sides)
            .map(|side| {
                let angle = side as f64 / sides as f64 * TAU;
                let cavern = scaled * (1.0 + self.profile.lobe_scale(angle - twist));
                let detail = self.profile.fractal_roughness(
                    rock_seed,
                    (origin.x, origin.y),
                    arc_length,
                    angle,
                    params.rough_freq,
                );
                (cavern * (1.0 + detail_gain * detail)).max(floor)
            })
            .collect();

        let smoothness = params.rough_smoothness;
        if smoothness > 0.0 {
            if let Some(prev) = &self.rolling {
                for (value, &previous) in values.iter_mut().zip(&prev.profile) {
                    *value = previous * smoothness + *value * (1.0 - smoothness);
                }
            }
        }

        if let Some(kernel) = &self.kernel {
            values = circular_convolve(&values, kernel);
        }

        for value in &mut values {
            *value = value.max(floor);
        }
        (values, floor)
    }
}

/// Circular convolution with a normalized kernel centred at `len / 2`.
fn circular_convolve(values: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = values.len() as isize;
    let center = (kernel.len() / 2) as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let j = (i + k as isize - center).rem_euclid(n);
                    w * values[j as usize]
                })
                .sum()
        })
        .collect()
}
