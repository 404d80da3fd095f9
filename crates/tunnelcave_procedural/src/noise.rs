//! # Gradient Noise Implementation
//!
//! Hash-based gradient noise, an angularly periodic variant and a curl
//! field, all pure functions of `(seed, coordinates)`.
//!
//! ## Determinism Guarantee
//!
//! Every hash is integer bit mixing with wrapping arithmetic. There is no
//! permutation table, no platform RNG and no floating-point state, so the
//! same `WorldSeed` produces **exactly** the same values on any platform.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tunnelcave_shared::Vector3;

/// World seed for deterministic generation.
///
/// All noise channels derive from this seed through fixed offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(i64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: i64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Derives the seed of an independent noise channel.
    #[inline]
    #[must_use]
    pub const fn offset(self, channel: i64) -> Self {
        Self(self.0.wrapping_add(channel))
    }

    /// Seed reinterpreted as unsigned bits for the 64-bit mixer.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0 as u64
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(1337)
    }
}

/// Channel offsets added to the world seed for each noise consumer.
pub mod channel {
    /// Curl potential X.
    pub const CURL_X: i64 = 101;
    /// Curl potential Y.
    pub const CURL_Y: i64 = 257;
    /// Curl potential Z.
    pub const CURL_Z: i64 = 409;
    /// Low-frequency base radius modulation.
    pub const RADIUS: i64 = 2000;
    /// Rock detail on the walls.
    pub const ROCK: i64 = 4000;
    /// Lobe twist along the path.
    pub const TWIST: i64 = 5000;
    /// Pipe-network module plan.
    pub const PIPE_PLAN: i64 = 30000;
    /// Pipe-network selector when no plan exists.
    pub const PIPE_SELECTOR: i64 = 31000;
    /// Sign of yaw arcs.
    pub const PIPE_YAW_SIGN: i64 = 32000;
    /// Helix pitch variation.
    pub const PIPE_HELIX_PITCH: i64 = 33000;
    /// Helix turn variation.
    pub const PIPE_HELIX_TURNS: i64 = 34000;
    /// Sign of pitch arcs.
    pub const PIPE_PITCH_SIGN: i64 = 35000;
}

/// Hashes an integer lattice point to 32 bits.
#[inline]
#[must_use]
pub fn hash3(seed: WorldSeed, x: i64, y: i64, z: i64) -> u32 {
    let mut value = seed.value()
        ^ x.wrapping_mul(374_761_393)
        ^ y.wrapping_mul(668_265_263)
        ^ z.wrapping_mul(2_147_483_647);
    value = (value ^ (value >> 13)).wrapping_mul(1_274_126_177);
    value ^= value >> 16;
    (value & 0xFFFF_FFFF) as u32
}

/// SplitMix-style 64-bit mixer used for per-step and per-module decisions.
#[inline]
#[must_use]
pub fn hash64(seed: WorldSeed, value: u64) -> u64 {
    let mut v = seed.bits() ^ value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    v = (v ^ (v >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    v = (v ^ (v >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    v ^ (v >> 31)
}

/// Maps the low 32 bits of a hash to `[0, 1]`.
#[inline]
#[must_use]
pub fn unit_interval(hash: u64) -> f64 {
    (hash & 0xFFFF_FFFF) as f64 / f64::from(u32::MAX)
}

/// Maps a 16-bit field of a hash (starting at `shift`) to `[0, 1]`.
#[inline]
#[must_use]
pub fn unit_field16(hash: u64, shift: u32) -> f64 {
    ((hash >> shift) & 0xFFFF) as f64 / f64::from(u16::MAX)
}

/// Deterministic unit vector from three 16-bit fields of a hash.
#[must_use]
pub fn pseudo_random_unit(hash: u64) -> Vector3 {
    let v = Vector3::new(
        unit_field16(hash, 0) * 2.0 - 1.0,
        unit_field16(hash, 16) * 2.0 - 1.0,
        unit_field16(hash, 32) * 2.0 - 1.0,
    );
    if v.length() < 1e-5 {
        Vector3::Z
    } else {
        v.normalize_or(Vector3::Z)
    }
}

/// Lattice gradient, normalized from three bytes of the point hash.
fn gradient(seed: WorldSeed, x: i64, y: i64, z: i64) -> Vector3 {
    let h = hash3(seed, x, y, z);
    let component = |shift: u32| f64::from((h >> shift) & 0xFF) / 255.0 * 2.0 - 1.0;
    let g = Vector3::new(component(0), component(8), component(16));
    let length = g.length();
    if length == 0.0 {
        g
    } else {
        g / length
    }
}

/// Quintic fade curve.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Perlin-style gradient noise in 3D, roughly in `[-1, 1]`.
#[must_use]
pub fn noise3(seed: WorldSeed, x: f64, y: f64, z: f64) -> f64 {
    let (xf0, yf0, zf0) = (x.floor(), y.floor(), z.floor());
    let (xi, yi, zi) = (xf0 as i64, yf0 as i64, zf0 as i64);
    let (xf, yf, zf) = (x - xf0, y - yf0, z - zf0);

    let corner = |dx: i64, dy: i64, dz: i64| {
        let g = gradient(seed, xi + dx, yi + dy, zi + dz);
        let offset = Vector3::new(xf - dx as f64, yf - dy as f64, zf - dz as f64);
        offset.dot(g)
    };

    let u = fade(xf);
    let v = fade(yf);
    let w = fade(zf);

    let x1 = lerp(corner(0, 0, 0), corner(1, 0, 0), u);
    let x2 = lerp(corner(0, 1, 0), corner(1, 1, 0), u);
    let x3 = lerp(corner(0, 0, 1), corner(1, 0, 1), u);
    let x4 = lerp(corner(0, 1, 1), corner(1, 1, 1), u);

    let y1 = lerp(x1, x2, v);
    let y2 = lerp(x3, x4, v);

    lerp(y1, y2, w)
}

/// 3D noise whose `z` argument is an angle.
///
/// The angle is folded through its sine and cosine, so samples at `z` and
/// `z + TAU` agree up to the `z / period` drift term. With `period = TAU`
/// this is the seam-free variant used around each cross-section.
#[must_use]
pub fn noise3_periodic(seed: WorldSeed, x: f64, y: f64, z: f64, period: f64) -> f64 {
    let (sin_a, cos_a) = z.sin_cos();
    let scale = 1.0 / period.max(1e-5);
    noise3(seed, x * scale + sin_a, y * scale + cos_a, z * scale)
}

/// Curl of a vector potential built from three independent noise fields.
///
/// Partial derivatives use central differences with a fixed step.
#[must_use]
pub fn curl_noise(seed: WorldSeed, position: Vector3, frequency: f64) -> Vector3 {
    const EPS: f64 = 0.01;

    let p = position * frequency;
    let sx = seed.offset(channel::CURL_X);
    let sy = seed.offset(channel::CURL_Y);
    let sz = seed.offset(channel::CURL_Z);

    let partial = |s: WorldSeed, axis: Vector3| {
        let a = p + axis * EPS;
        let b = p - axis * EPS;
        (noise3(s, a.x, a.y, a.z) - noise3(s, b.x, b.y, b.z)) / (2.0 * EPS)
    };

    let d_az_dy = partial(sz, Vector3::Y);
    let d_ay_dz = partial(sy, Vector3::Z);
    let d_ax_dz = partial(sx, Vector3::Z);
    let d_az_dx = partial(sz, Vector3::X);
    let d_ay_dx = partial(sy, Vector3::X);
    let d_ax_dy = partial(sx, Vector3::Y);

    Vector3::new(d_az_dy - d_ay_dz, d_ax_dz - d_az_dx, d_ay_dx - d_ax_dy)
}

/// Wraps an angle into `[0, TAU)`.
#[inline]
#[must_use]
pub fn wrap_tau(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}
