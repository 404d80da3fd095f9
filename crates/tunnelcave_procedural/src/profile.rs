//! # Cavern Profile
//!
//! Cross-section shaping: Gaussian lobes that turn a round tube into
//! interlinked caverns, a slow twist of those lobes along the path, and
//! seam-free fractal rock detail around each ring.

use std::f64::consts::{PI, TAU};

use crate::config::CavernProfileParams;
use crate::noise::{noise3, noise3_periodic, WorldSeed};

/// Seed spacing between fractal octaves.
const OCTAVE_SEED_STRIDE: i64 = 97;

/// Evaluates the cavern shaping functions for one parameter set.
#[derive(Clone, Debug)]
pub struct CavernProfile {
    params: CavernProfileParams,
}

impl CavernProfile {
    /// Wraps validated profile parameters.
    #[must_use]
    pub fn new(params: CavernProfileParams) -> Self {
        Self { params }
    }

    /// Underlying parameters.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &CavernProfileParams {
        &self.params
    }

    /// Multiplier applied to the modulated base radius.
    #[inline]
    #[must_use]
    pub fn base_scale(&self) -> f64 {
        self.params.base_scale
    }

    /// Sum of Gaussian lobes evaluated at `angle`.
    ///
    /// Angular distance to each centre is taken along the shorter way round.
    /// Returns 0 when the lobe width is not positive.
    #[must_use]
    pub fn lobe_scale(&self, angle: f64) -> f64 {
        let width = self.params.lobe_width;
        if width <= 0.0 {
            return 0.0;
        }
        self.params
            .lobe_centers
            .iter()
            .zip(&self.params.lobe_strengths)
            .map(|(&center, &strength)| {
                let d = wrap_signed(angle - center) / width;
                strength * (-0.5 * d * d).exp()
            })
            .sum()
    }

    /// Rotation of the lobe pattern at arc length `arc`.
    #[must_use]
    pub fn twist_angle(&self, seed: WorldSeed, arc: f64) -> f64 {
        let freq = self.params.twist_frequency;
        let strength = self.params.twist_strength;
        if freq <= 0.0 || strength <= 0.0 {
            return 0.0;
        }
        noise3(seed, arc * freq, 0.0, 0.0) * strength
    }

    /// Weighted octave sum of periodic noise, normalized by total weight.
    ///
    /// The angle enters only through its sine and cosine, so the value at
    /// `angle` and `angle + TAU` is identical.
    #[must_use]
    pub fn fractal_roughness(
        &self,
        seed: WorldSeed,
        position: (f64, f64),
        arc: f64,
        angle: f64,
        base_freq: f64,
    ) -> f64 {
        let octaves = self.params.fractal_octaves;
        if octaves == 0 {
            return 0.0;
        }
        let (px, py) = position;
        let base_scale = self.params.base_scale;
        let (sin_a, cos_a) = angle.sin_cos();
        let sin_double = sin_a * cos_a;

        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        let mut weight = 0.0;
        for octave in 0..octaves {
            let f = frequency * base_freq;
            let sample = noise3_periodic(
                seed.offset(i64::from(octave) * OCTAVE_SEED_STRIDE),
                px * f + cos_a * base_scale,
                py * f + sin_a * base_scale,
                arc * f + sin_double * base_scale,
                TAU,
            );
            total += sample * amplitude;
            weight += amplitude;
            amplitude *= self.params.fractal_gain;
            frequency *= self.params.fractal_lacunarity;
        }
        if weight <= 0.0 {
            0.0
        } else {
            total / weight
        }
    }
}

/// Wraps an angle into `(-PI, PI]`.
fn wrap_signed(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
