//! Vector math shared by every stage of tunnel generation.
//!
//! All arithmetic is `f64` and free of platform intrinsics so the same seed
//! reproduces the same tunnel bit for bit.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Immutable 3D vector - positions, directions, frame axes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Creates a new vector
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Returns the unit vector, or `None` for a zero-length vector.
    #[must_use]
    pub fn try_normalized(self) -> Option<Self> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            None
        } else {
            Some(self / length)
        }
    }

    /// Returns the unit vector, or `fallback` for a zero-length vector.
    #[must_use]
    pub fn normalize_or(self, fallback: Self) -> Self {
        self.try_normalized().unwrap_or(fallback)
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self * (1.0 - t) + other * t
    }

    /// Scales the vector down so its length does not exceed `max_length`.
    #[must_use]
    pub fn clamp_length(self, max_length: f64) -> Self {
        let length = self.length();
        if length <= max_length || length == 0.0 {
            self
        } else {
            self * (max_length / length)
        }
    }

    /// Angle in radians between two non-zero vectors.
    #[must_use]
    pub fn angle_between(self, other: Self) -> f64 {
        let a = self.normalize_or(Self::Z);
        let b = other.normalize_or(Self::Z);
        a.dot(b).clamp(-1.0, 1.0).acos()
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for Vector3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Mul<Vector3> for f64 {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        rhs * self
    }
}

impl std::ops::Div<f64> for Vector3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Builds a right-handed basis `(forward, up, right)` from a forward vector.
///
/// The hint is projected out of the forward component (Gram-Schmidt). When
/// the hint is parallel to forward a fallback axis chosen from the forward
/// components alone is used instead.
#[must_use]
pub fn orthonormalize(forward: Vector3, up_hint: Vector3) -> (Vector3, Vector3, Vector3) {
    let fwd = forward.normalize_or(Vector3::Z);
    let mut up_projected = up_hint - fwd * fwd.dot(up_hint);
    if up_projected.length() < 1e-6 {
        let fallback = if fwd.z.abs() > 0.707 { Vector3::X } else { Vector3::Z };
        up_projected = fallback - fwd * fwd.dot(fallback);
    }
    let up = up_projected.normalize_or(Vector3::Y);
    let right = fwd.cross(up);
    (fwd, up, right)
}

/// Rotates `vector` about `axis` by `angle` radians (Rodrigues' formula).
#[must_use]
pub fn rotate_vector(vector: Vector3, axis: Vector3, angle: f64) -> Vector3 {
    let axis = axis.normalize_or(Vector3::Z);
    let (sin_theta, cos_theta) = angle.sin_cos();
    vector * cos_theta
        + axis.cross(vector) * sin_theta
        + axis * axis.dot(vector) * (1.0 - cos_theta)
}

/// Rotates `vector` toward `target` by at most `max_angle` radians.
///
/// The rotation happens in the plane spanned by both vectors. Targets
/// already within the limit are returned normalized. Antiparallel inputs
/// rotate about a deterministic perpendicular axis.
#[must_use]
pub fn rotate_towards(vector: Vector3, target: Vector3, max_angle: f64) -> Vector3 {
    let v_norm = vector.normalize_or(Vector3::Z);
    if max_angle <= 0.0 {
        return v_norm;
    }
    let t_norm = target.normalize_or(v_norm);
    let dot = v_norm.dot(t_norm).clamp(-1.0, 1.0);
    if dot.acos() <= max_angle {
        return t_norm;
    }

    let mut axis = v_norm.cross(t_norm);
    if axis.length() < 1e-8 {
        if dot >= 0.0 {
            return v_norm;
        }
        axis = if v_norm.z.abs() < 0.9 {
            v_norm.cross(Vector3::Z)
        } else {
            v_norm.cross(Vector3::Y)
        };
        if axis.length() < 1e-8 {
            return v_norm;
        }
    }
    rotate_vector(v_norm, axis, max_angle).normalize_or(v_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vector3, b: Vector3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vector3_operations() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vector3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vector3::X.cross(Vector3::Y), Vector3::Z);
        assert_eq!(a.lerp(b, 0.0), a);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert!(Vector3::ZERO.try_normalized().is_none());
        assert_eq!(Vector3::ZERO.normalize_or(Vector3::Y), Vector3::Y);
        assert!((Vector3::new(3.0, 4.0, 0.0).normalize_or(Vector3::Z).length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthonormalize_basis() {
        let (fwd, up, right) = orthonormalize(Vector3::new(0.3, 0.2, 1.0), Vector3::Y);
        assert!(fwd.dot(up).abs() < 1e-12);
        assert!(fwd.dot(right).abs() < 1e-12);
        assert!(up.dot(right).abs() < 1e-12);
        assert!((right.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthonormalize_parallel_hint_falls_back() {
        let (fwd, up, _) = orthonormalize(Vector3::Y, Vector3::Y);
        assert_eq!(fwd, Vector3::Y);
        assert!(fwd.dot(up).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_towards_clamps_angle() {
        let limit = 0.1;
        let rotated = rotate_towards(Vector3::Z, Vector3::X, limit);
        assert!((Vector3::Z.angle_between(rotated) - limit).abs() < 1e-9);

        let within = rotate_towards(Vector3::Z, Vector3::new(0.01, 0.0, 1.0), limit);
        assert_close(within, Vector3::new(0.01, 0.0, 1.0).normalize_or(Vector3::Z));
    }

    #[test]
    fn test_rotate_towards_antiparallel() {
        let rotated = rotate_towards(Vector3::Z, -Vector3::Z, 0.25);
        assert!((Vector3::Z.angle_between(rotated) - 0.25).abs() < 1e-9);
    }
}
