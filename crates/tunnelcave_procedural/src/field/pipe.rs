//! Pipe-network steering: a lazily extended queue of straight, arc and
//! helix modules laid end to end.

use tracing::trace;
use tunnelcave_shared::{rotate_towards, OrthonormalFrame, Vector3};

use super::segment::Segment;
use super::{DirectionField, FieldParams};
use crate::config::PipeNetworkParams;
use crate::noise::{channel, hash64, unit_field16, WorldSeed};

/// Path primitive selected for one module slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Straight run.
    Straight,
    /// Arc about the frame's up axis.
    YawArc,
    /// Helical coil.
    Helix,
    /// Arc about the frame's right axis.
    PitchArc,
}

impl ModuleKind {
    const fn from_hash(hash: u64) -> Self {
        match hash % 4 {
            0 => Self::Straight,
            1 => Self::YawArc,
            2 => Self::Helix,
            _ => Self::PitchArc,
        }
    }

    /// Straight, arc or helix, with both arc orientations grouped.
    #[must_use]
    pub const fn family(self) -> usize {
        match self {
            Self::Straight => 0,
            Self::YawArc | Self::PitchArc => 1,
            Self::Helix => 2,
        }
    }
}

/// Representative kind inserted when a family is missing from the plan.
const FAMILY_REPRESENTATIVE: [ModuleKind; 3] =
    [ModuleKind::Straight, ModuleKind::YawArc, ModuleKind::Helix];

#[derive(Clone, Debug)]
struct PlacedSegment {
    segment: Segment,
    start_s: f64,
}

/// Deterministic network of pipe modules.
///
/// Two fields built from the same parameters lay out identical segments,
/// whatever order they are queried in.
#[derive(Clone, Debug)]
pub struct PipeNetworkField {
    seed: WorldSeed,
    max_turn_per_step_rad: f64,
    pipe: PipeNetworkParams,
    initial_frame: OrthonormalFrame,
    segments: Vec<PlacedSegment>,
    segment_end_s: Vec<f64>,
    total_length: f64,
    plan: Vec<ModuleKind>,
}

impl PipeNetworkField {
    /// Creates an empty network starting at the origin facing +Z.
    #[must_use]
    pub fn new(params: &FieldParams, pipe: PipeNetworkParams) -> Self {
        let plan = build_plan(params.seed, pipe.module_count_hint);
        Self {
            seed: params.seed,
            max_turn_per_step_rad: params.max_turn_per_step_rad,
            pipe,
            initial_frame: OrthonormalFrame::initial(Vector3::ZERO, Vector3::Z),
            segments: Vec::new(),
            segment_end_s: Vec::new(),
            total_length: 0.0,
            plan,
        }
    }

    /// The cyclic module plan (empty when per-module hashing is used).
    #[must_use]
    pub fn module_plan(&self) -> &[ModuleKind] {
        &self.plan
    }

    /// Kind of the module at `index` in the queue.
    #[must_use]
    pub fn module_kind(&self, index: u64) -> ModuleKind {
        if self.plan.is_empty() {
            ModuleKind::from_hash(hash64(self.seed.offset(channel::PIPE_SELECTOR), index))
        } else {
            self.plan[(index % self.plan.len() as u64) as usize]
        }
    }

    /// Number of segments laid so far.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total length of the laid segments.
    #[must_use]
    pub fn generated_length(&self) -> f64 {
        self.total_length
    }

    /// Frame of the network at arc length `arc_length`.
    pub fn sample(&mut self, arc_length: f64) -> OrthonormalFrame {
        if arc_length <= 0.0 {
            if let Some(first) = self.segments.first() {
                return first.segment.sample(0.0);
            }
        }
        let target = arc_length.max(0.0);
        self.ensure_length(target + self.pipe.straight_length);

        let Some(last) = self.segments.len().checked_sub(1) else {
            return self.initial_frame;
        };
        let idx = self.segment_end_s.partition_point(|&end| end < target).min(last);
        let placed = &self.segments[idx];
        placed.segment.sample(target - placed.start_s)
    }

    fn ensure_length(&mut self, length: f64) {
        while self.total_length < length {
            self.append_segment();
        }
    }

    fn append_segment(&mut self) {
        let index = self.segments.len() as u64;
        let start = self
            .segments
            .last()
            .map_or(self.initial_frame, |placed| placed.segment.end_frame());
        let kind = self.module_kind(index);
        let pipe = &self.pipe;

        let segment = match kind {
            ModuleKind::Straight => Segment::straight(start, pipe.straight_length),
            ModuleKind::YawArc => Segment::arc(
                start,
                pipe.junction_radius,
                self.junction_angle(channel::PIPE_YAW_SIGN, index),
                start.up(),
            ),
            ModuleKind::PitchArc => Segment::arc(
                start,
                pipe.junction_radius,
                self.junction_angle(channel::PIPE_PITCH_SIGN, index),
                start.right(),
            ),
            ModuleKind::Helix => {
                let pitch_hash = hash64(self.seed.offset(channel::PIPE_HELIX_PITCH), index);
                let pitch = (pipe.helix_pitch + unit_field16(pitch_hash, 16) * 0.5 - 0.25).max(0.5);
                let turns_hash = hash64(self.seed.offset(channel::PIPE_HELIX_TURNS), index);
                let turns = (pipe.helix_turns + unit_field16(turns_hash, 32) * 0.5 - 0.25).max(0.75);
                Segment::helix(start, turns, pitch, pipe.helix_radius.max(1.0))
            }
        };

        let start_s = self.total_length;
        self.total_length += segment.length();
        trace!(index, ?kind, start_s, length = segment.length(), "pipe module laid");
        self.segments.push(PlacedSegment { segment, start_s });
        self.segment_end_s.push(self.total_length);
    }

    fn junction_angle(&self, sign_channel: i64, index: u64) -> f64 {
        let sign = if hash64(self.seed.offset(sign_channel), index) & 1 == 1 {
            -1.0
        } else {
            1.0
        };
        self.pipe.junction_angle_deg.to_radians() * sign
    }
}

impl DirectionField for PipeNetworkField {
    fn next_direction(
        &mut self,
        _position: Vector3,
        previous_direction: Vector3,
        _step_index: u64,
        arc_length: f64,
    ) -> Vector3 {
        let target = self.sample(arc_length).forward();
        rotate_towards(previous_direction, target, self.max_turn_per_step_rad)
    }

    fn position_at(&mut self, arc_length: f64) -> Option<Vector3> {
        Some(self.sample(arc_length).origin())
    }
}

/// Hashes the cyclic plan and repairs it so every family appears.
///
/// A missing family takes over the first slot of the most represented
/// family, which always holds at least two slots when `count >= 3`.
fn build_plan(seed: WorldSeed, count: usize) -> Vec<ModuleKind> {
    let plan_seed = seed.offset(channel::PIPE_PLAN);
    let mut plan: Vec<ModuleKind> = (0..count as u64)
        .map(|i| ModuleKind::from_hash(hash64(plan_seed, i)))
        .collect();
    if count < 3 {
        return plan;
    }

    for missing in 0..FAMILY_REPRESENTATIVE.len() {
        let mut counts = [0_usize; 3];
        for kind in &plan {
            counts[kind.family()] += 1;
        }
        if counts[missing] > 0 {
            continue;
        }
        let donor = (0..counts.len())
            .filter(|&family| counts[family] > 1)
            .max_by_key(|&family| (counts[family], std::cmp::Reverse(family)));
        let slot = donor.and_then(|family| plan.iter().position(|k| k.family() == family));
        if let Some(slot) = slot {
            plan[slot] = FAMILY_REPRESENTATIVE[missing];
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelParams;

    fn field(seed: i64, hint: usize) -> PipeNetworkField {
        let params = FieldParams {
            seed: WorldSeed::new(seed),
            ..FieldParams::from_tunnel(&TunnelParams::test())
        };
        let pipe = PipeNetworkParams { module_count_hint: hint, ..PipeNetworkParams::default() };
        PipeNetworkField::new(&params, pipe)
    }

    fn has_every_family(kinds: impl IntoIterator<Item = ModuleKind>) -> bool {
        let mut seen = [false; 3];
        for kind in kinds {
            seen[kind.family()] = true;
        }
        seen.iter().all(|&s| s)
    }

    #[test]
    fn test_independent_fields_agree() {
        let mut a = field(7, 24);
        let mut b = field(7, 24);
        // Query b out of order first.
        let _ = b.position_at(400.0);
        for i in 0..300 {
            let s = f64::from(i) * 1.7;
            assert_eq!(a.position_at(s), b.position_at(s));
        }
    }

    #[test]
    fn test_plan_contains_every_family() {
        for seed in 0..200 {
            for hint in [3, 4, 5, 8, 24] {
                let f = field(seed, hint);
                assert_eq!(f.module_plan().len(), hint);
                assert!(has_every_family(f.module_plan().iter().copied()), "seed {seed} hint {hint}");
            }
        }
    }

    #[test]
    fn test_any_window_contains_every_family() {
        let f = field(11, 6);
        for start in 0..40_u64 {
            let window = (start..start + 6).map(|i| f.module_kind(i));
            assert!(has_every_family(window));
        }
    }

    #[test]
    fn test_without_plan_modules_are_hashed() {
        let mut f = field(3, 0);
        assert!(f.module_plan().is_empty());
        let _ = f.position_at(500.0);
        assert!(f.segment_count() > 5);
    }

    #[test]
    fn test_queue_covers_lookahead() {
        let mut f = field(5, 24);
        let _ = f.position_at(100.0);
        assert!(f.generated_length() >= 100.0 + PipeNetworkParams::default().straight_length);
    }

    #[test]
    fn test_path_is_continuous() {
        let mut f = field(21, 24);
        let mut prev = f.position_at(0.0).unwrap_or_default();
        for i in 1..2000 {
            let s = f64::from(i) * 0.25;
            let p = f.position_at(s).unwrap_or_default();
            // Chord never exceeds the arc between samples.
            assert!(prev.distance(p) <= 0.25 + 1e-6, "jump at s={s}");
            prev = p;
        }
    }

    #[test]
    fn test_next_direction_respects_turn_limit() {
        let mut f = field(2, 24);
        let limit = TunnelParams::test().max_turn_per_step_rad;
        let mut dir = Vector3::Z;
        for i in 1..300 {
            let next = f.next_direction(Vector3::ZERO, dir, i, f64::from(i as u32) * 3.0);
            assert!(dir.angle_between(next) <= limit + 1e-9);
            dir = next;
        }
    }
}
