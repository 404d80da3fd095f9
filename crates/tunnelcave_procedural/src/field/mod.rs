//! # Direction Fields
//!
//! Steering for the tunnel centre line. Each field answers one question per
//! ring: given where the path is and where it was heading, which way does it
//! go next? The pipe network also knows where the path *is* in closed form.
//!
//! The variant is selected once from [`FieldType`] when the generator is
//! built and never changes afterwards.

mod curl;
mod pipe;
mod segment;

pub use curl::DivergenceFreeField;
pub use pipe::{ModuleKind, PipeNetworkField};
pub use segment::{ArcSegment, HelixSegment, Segment};

use tunnelcave_shared::{rotate_towards, Vector3};

use crate::config::{FieldType, TunnelParams};
use crate::noise::WorldSeed;

/// Steering parameters shared by every field variant.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldParams {
    /// Seed for the curl potentials and jolt hashing.
    pub seed: WorldSeed,
    /// Curl field frequency.
    pub dir_freq: f64,
    /// Weight of the field sample against the previous direction.
    pub dir_blend: f64,
    /// Maximum rotation between consecutive directions.
    pub max_turn_per_step_rad: f64,
    /// Mean distance between jolts.
    pub jolt_every_meters: f64,
    /// Jolt magnitude.
    pub jolt_strength: f64,
    /// Span of the lookahead averaging window.
    pub curve_smoothing_distance: f64,
    /// Samples in the lookahead averaging window.
    pub curve_smoothing_steps: usize,
}

impl FieldParams {
    /// Extracts the steering subset of a tunnel configuration.
    #[must_use]
    pub fn from_tunnel(params: &TunnelParams) -> Self {
        Self {
            seed: params.world_seed,
            dir_freq: params.dir_freq,
            dir_blend: params.dir_blend,
            max_turn_per_step_rad: params.max_turn_per_step_rad,
            jolt_every_meters: params.jolt_every_meters,
            jolt_strength: params.jolt_strength,
            curve_smoothing_distance: params.curve_smoothing_distance,
            curve_smoothing_steps: params.curve_smoothing_steps,
        }
    }
}

/// Contract every steering field fulfils.
pub trait DirectionField {
    /// Next unit travel direction.
    ///
    /// The result never deviates from `previous_direction` by more than the
    /// configured turn limit.
    fn next_direction(
        &mut self,
        position: Vector3,
        previous_direction: Vector3,
        step_index: u64,
        arc_length: f64,
    ) -> Vector3;

    /// Closed-form centre-line position, for fields that have one.
    fn position_at(&mut self, _arc_length: f64) -> Option<Vector3> {
        None
    }
}

/// Field that keeps the tunnel heading along +Z.
#[derive(Clone, Debug)]
pub struct StraightField {
    max_turn_per_step_rad: f64,
}

impl StraightField {
    /// Creates a straight field with the given turn limit.
    #[must_use]
    pub fn new(params: &FieldParams) -> Self {
        Self {
            max_turn_per_step_rad: params.max_turn_per_step_rad,
        }
    }
}

impl DirectionField for StraightField {
    fn next_direction(
        &mut self,
        _position: Vector3,
        previous_direction: Vector3,
        _step_index: u64,
        _arc_length: f64,
    ) -> Vector3 {
        let previous = if previous_direction.length() < 1e-6 {
            Vector3::Z
        } else {
            previous_direction
        };
        rotate_towards(previous, Vector3::Z, self.max_turn_per_step_rad)
    }
}

/// The field variant a generator steers with.
#[derive(Clone, Debug)]
pub enum PathField {
    /// Constant heading.
    Straight(StraightField),
    /// Curl noise with jolts.
    DivergenceFree(DivergenceFreeField),
    /// Segment queue.
    PipeNetwork(PipeNetworkField),
}

impl PathField {
    /// Builds the variant named by `params.field_type`.
    #[must_use]
    pub fn from_params(params: &TunnelParams) -> Self {
        let field_params = FieldParams::from_tunnel(params);
        match params.field_type {
            FieldType::Straight => Self::Straight(StraightField::new(&field_params)),
            FieldType::DivergenceFree => {
                Self::DivergenceFree(DivergenceFreeField::new(field_params))
            }
            FieldType::PipeNetwork => Self::PipeNetwork(PipeNetworkField::new(
                &field_params,
                params.pipe_network.clone(),
            )),
        }
    }

    /// Which variant this is.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Straight(_) => FieldType::Straight,
            Self::DivergenceFree(_) => FieldType::DivergenceFree,
            Self::PipeNetwork(_) => FieldType::PipeNetwork,
        }
    }
}

impl DirectionField for PathField {
    fn next_direction(
        &mut self,
        position: Vector3,
        previous_direction: Vector3,
        step_index: u64,
        arc_length: f64,
    ) -> Vector3 {
        match self {
            Self::Straight(f) => f.next_direction(position, previous_direction, step_index, arc_length),
            Self::DivergenceFree(f) => {
                f.next_direction(position, previous_direction, step_index, arc_length)
            }
            Self::PipeNetwork(f) => f.next_direction(position, previous_direction, step_index, arc_length),
        }
    }

    fn position_at(&mut self, arc_length: f64) -> Option<Vector3> {
        match self {
            Self::Straight(f) => f.position_at(arc_length),
            Self::DivergenceFree(f) => f.position_at(arc_length),
            Self::PipeNetwork(f) => f.position_at(arc_length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_field_recovers_heading() {
        let params = FieldParams::from_tunnel(&TunnelParams::test());
        let mut field = StraightField::new(&params);
        let mut dir = Vector3::X;
        for step in 0..100 {
            let next = field.next_direction(Vector3::ZERO, dir, step, 0.0);
            assert!(dir.angle_between(next) <= params.max_turn_per_step_rad + 1e-9);
            dir = next;
        }
        assert!((dir - Vector3::Z).length() < 1e-9);
    }

    #[test]
    fn test_straight_field_has_no_closed_form() {
        let params = FieldParams::from_tunnel(&TunnelParams::test());
        assert_eq!(StraightField::new(&params).position_at(10.0), None);
    }

    #[test]
    fn test_path_field_matches_selector() {
        for field_type in [FieldType::Straight, FieldType::DivergenceFree, FieldType::PipeNetwork] {
            let params = TunnelParams { field_type, ..TunnelParams::test() };
            assert_eq!(PathField::from_params(&params).field_type(), field_type);
        }
    }

    #[test]
    fn test_only_pipe_network_has_positions() {
        let curl = TunnelParams::test();
        assert!(PathField::from_params(&curl).position_at(5.0).is_none());

        let pipe = TunnelParams { field_type: FieldType::PipeNetwork, ..TunnelParams::test() };
        assert!(PathField::from_params(&pipe).position_at(5.0).is_some());
    }
}
