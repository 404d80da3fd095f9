//! Closed-form path primitives for the pipe network.

use std::f64::consts::TAU;

use tunnelcave_shared::{rotate_vector, OrthonormalFrame, Vector3};

/// Circular arc about a fixed axis through a centre point.
#[derive(Clone, Debug)]
pub struct ArcSegment {
    start: OrthonormalFrame,
    axis: Vector3,
    angle: f64,
    center: Vector3,
    length: f64,
}

/// Helix wound around an axis tilted so the path leaves tangent to the
/// incoming direction.
#[derive(Clone, Debug)]
pub struct HelixSegment {
    axis: Vector3,
    u: Vector3,
    v: Vector3,
    base: Vector3,
    radius: f64,
    pitch_per_turn: f64,
    rise_per_radian: f64,
    length_scale: f64,
    total_theta: f64,
    length: f64,
}

/// One module of the pipe network, positioned in world space.
#[derive(Clone, Debug)]
pub enum Segment {
    /// Straight run along the start frame's forward.
    Straight {
        /// Frame at the segment start.
        start: OrthonormalFrame,
        /// Run length.
        length: f64,
    },
    /// Banked circular arc.
    Arc(ArcSegment),
    /// Helical coil.
    Helix(HelixSegment),
}

impl Segment {
    /// Straight run of `length`.
    #[must_use]
    pub fn straight(start: OrthonormalFrame, length: f64) -> Self {
        Self::Straight { start, length }
    }

    /// Arc of `radius` sweeping `angle` radians about `axis`.
    ///
    /// `axis` must be perpendicular to the start forward; the frame's up and
    /// right axes always are.
    #[must_use]
    pub fn arc(start: OrthonormalFrame, radius: f64, angle: f64, axis: Vector3) -> Self {
        let axis = axis.normalize_or(start.up());
        let toward_center = axis.cross(start.forward()).normalize_or(start.right());
        // The centre sits on the side the arc turns toward.
        let side = if angle < 0.0 { -1.0 } else { 1.0 };
        Self::Arc(ArcSegment {
            start,
            axis,
            angle,
            center: start.origin() + toward_center * (radius * side),
            length: (radius * angle).abs(),
        })
    }

    /// Helix of `turns` turns, rising `pitch_per_turn` per turn.
    #[must_use]
    pub fn helix(start: OrthonormalFrame, turns: f64, pitch_per_turn: f64, radius: f64) -> Self {
        let forward = start.forward();
        let hint = if start.up().dot(forward).abs() > 0.95 {
            start.right()
        } else {
            start.up()
        };
        let perp = (hint - forward * forward.dot(hint)).normalize_or(start.right());

        let rise_per_radian = pitch_per_turn / TAU;
        let (sin_phi, cos_phi) = (-radius).atan2(rise_per_radian).sin_cos();
        let axis = (forward * cos_phi + perp * sin_phi).normalize_or(forward);
        let v = (forward * -sin_phi + perp * cos_phi).normalize_or(perp);
        let u = axis.cross(v).normalize_or(start.right());

        let length_scale = (rise_per_radian * rise_per_radian + radius * radius).sqrt();
        let total_theta = turns * TAU;
        Self::Helix(HelixSegment {
            axis,
            u,
            v,
            base: start.origin() - u * radius,
            radius,
            pitch_per_turn,
            rise_per_radian,
            length_scale,
            total_theta,
            length: length_scale * total_theta,
        })
    }

    /// Arc length covered by the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Straight { length, .. } => *length,
            Self::Arc(arc) => arc.length,
            Self::Helix(helix) => helix.length,
        }
    }

    /// Frame at local arc length `local_s`, clamped to the segment.
    #[must_use]
    pub fn sample(&self, local_s: f64) -> OrthonormalFrame {
        let length = self.length();
        let s = local_s.clamp(0.0, length.max(0.0));
        let fraction = if length <= 0.0 { 0.0 } else { s / length };
        match self {
            Self::Straight { start, .. } => OrthonormalFrame::from_forward_up(
                start.origin() + start.forward() * s,
                start.forward(),
                start.up(),
            ),
            Self::Arc(arc) => {
                let theta = arc.angle * fraction;
                let offset = arc.start.origin() - arc.center;
                OrthonormalFrame::from_forward_up(
                    arc.center + rotate_vector(offset, arc.axis, theta),
                    rotate_vector(arc.start.forward(), arc.axis, theta),
                    rotate_vector(arc.start.up(), arc.axis, theta),
                )
            }
            Self::Helix(h) => {
                let theta = h.total_theta * fraction;
                let (sin_t, cos_t) = theta.sin_cos();
                let origin = h.base
                    + h.axis * (h.pitch_per_turn * theta / TAU)
                    + h.u * (h.radius * cos_t)
                    + h.v * (h.radius * sin_t);
                let tangent = (h.axis * h.rise_per_radian
                    + h.u * (-h.radius * sin_t)
                    + h.v * (h.radius * cos_t))
                    / h.length_scale;
                OrthonormalFrame::from_forward_up(origin, tangent, h.u * cos_t + h.v * sin_t)
            }
        }
    }

    /// Frame at the far end, where the next segment starts.
    #[must_use]
    pub fn end_frame(&self) -> OrthonormalFrame {
        self.sample(self.length())
    }
}
