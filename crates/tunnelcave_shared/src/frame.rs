//! Orthonormal frames carried along the tunnel centre line.

use serde::{Deserialize, Serialize};

use crate::math::{orthonormalize, rotate_vector, Vector3};

/// Coordinate frame travelling along the tunnel path.
///
/// `forward`, `right` and `up` are mutually orthogonal unit vectors. Frames
/// are never mutated: [`OrthonormalFrame::transport`] returns a new frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrthonormalFrame {
    origin: Vector3,
    forward: Vector3,
    right: Vector3,
    up: Vector3,
}

impl OrthonormalFrame {
    /// Seed frame at `origin` facing `forward`, with up derived from +Y.
    #[must_use]
    pub fn initial(origin: Vector3, forward: Vector3) -> Self {
        let (forward, up, right) = orthonormalize(forward, Vector3::Y);
        Self { origin, forward, right, up }
    }

    /// Frame at `origin` built from `forward` and an up hint.
    #[must_use]
    pub fn from_forward_up(origin: Vector3, forward: Vector3, up_hint: Vector3) -> Self {
        let (forward, up, right) = orthonormalize(forward, up_hint);
        Self { origin, forward, right, up }
    }

    /// Frame origin.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Vector3 {
        self.origin
    }

    /// Unit travel direction.
    #[inline]
    #[must_use]
    pub const fn forward(&self) -> Vector3 {
        self.forward
    }

    /// Unit right axis of the cross-section plane.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> Vector3 {
        self.right
    }

    /// Unit up axis of the cross-section plane.
    #[inline]
    #[must_use]
    pub const fn up(&self) -> Vector3 {
        self.up
    }

    /// Direction in the cross-section plane at angle `theta` from `right`.
    #[inline]
    #[must_use]
    pub fn radial(&self, theta: f64) -> Vector3 {
        let (sin_theta, cos_theta) = theta.sin_cos();
        self.right * cos_theta + self.up * sin_theta
    }

    /// Moves the frame with parallel transport.
    ///
    /// `right` and `up` rotate only by the minimal rotation mapping the old
    /// forward onto the new one, so no roll accumulates along the path.
    #[must_use]
    pub fn transport(&self, new_origin: Vector3, new_forward: Vector3) -> Self {
        let new_forward = new_forward.normalize_or(self.forward);
        let angle = self.forward.dot(new_forward).clamp(-1.0, 1.0).acos();
        if angle < 1e-6 {
            return Self {
                origin: new_origin,
                forward: new_forward,
                right: self.right,
                up: self.up,
            };
        }

        let mut axis = self.forward.cross(new_forward);
        if axis.length() < 1e-8 {
            // Reversal: `right` is perpendicular to forward by construction.
            axis = self.right;
        }
        let axis = axis.normalize_or(self.right);

        Self {
            origin: new_origin,
            forward: new_forward,
            right: rotate_vector(self.right, axis, angle),
            up: rotate_vector(self.up, axis, angle),
        }
    }

    /// Largest deviation from orthonormality across the three axes.
    #[must_use]
    pub fn orthonormality_error(&self) -> f64 {
        let lengths = [self.forward, self.right, self.up]
            .iter()
            .map(|axis| (axis.length() - 1.0).abs())
            .fold(0.0_f64, f64::max);
        let dots = [
            self.forward.dot(self.right),
            self.forward.dot(self.up),
            self.right.dot(self.up),
        ]
        .iter()
        .map(|d| d.abs())
        .fold(0.0_f64, f64::max);
        lengths.max(dots)
    }
}
