//! # Tunnel Configuration
//!
//! Immutable parameter sets for the generator, loadable from TOML.
//!
//! ## Validation
//!
//! [`TunnelParams::validate`] is the single eager check. It runs when a
//! config is parsed and again when a generator is built, so a bad value is
//! reported before the first ring exists and never clamped silently.

use std::f64::consts::{PI, TAU};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TunnelError, TunnelResult};
use crate::noise::WorldSeed;

/// Which direction field steers the tunnel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// Constant +Z target, turn-rate clamped.
    Straight,
    /// Curl-noise field with jolts.
    #[default]
    DivergenceFree,
    /// Queue of straight, arc and helix modules.
    PipeNetwork,
}

impl FieldType {
    /// Config name of this field type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::DivergenceFree => "divergence_free",
            Self::PipeNetwork => "pipe_network",
        }
    }
}

impl FromStr for FieldType {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "straight" => Ok(Self::Straight),
            "divergence_free" => Ok(Self::DivergenceFree),
            "pipe_network" => Ok(Self::PipeNetwork),
            other => Err(TunnelError::UnknownFieldType(other.to_owned())),
        }
    }
}

/// Topology added at both ends of a chunk mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EndCapStyle {
    /// Open tube.
    #[default]
    None,
    /// One centre vertex per boundary ring, fanned to the ring.
    Fan,
    /// One extra ring extruded past each boundary along the path.
    Sleeve,
}

impl EndCapStyle {
    /// Config name of this cap style.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fan => "fan",
            Self::Sleeve => "sleeve",
        }
    }
}

impl FromStr for EndCapStyle {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "fan" => Ok(Self::Fan),
            "sleeve" => Ok(Self::Sleeve),
            other => Err(TunnelError::UnknownEndCapStyle(other.to_owned())),
        }
    }
}

/// Which representations a chunk carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputMode {
    /// Triangle mesh only.
    Mesh,
    /// SDF descriptor only.
    Sdf,
    /// Both mesh and SDF descriptor.
    #[default]
    MeshAndSdf,
}

impl OutputMode {
    /// Config name of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Sdf => "sdf",
            Self::MeshAndSdf => "mesh+sdf",
        }
    }

    /// Whether chunks carry a triangle mesh.
    #[must_use]
    pub const fn wants_mesh(self) -> bool {
        matches!(self, Self::Mesh | Self::MeshAndSdf)
    }

    /// Whether chunks carry an SDF descriptor.
    #[must_use]
    pub const fn wants_sdf(self) -> bool {
        matches!(self, Self::Sdf | Self::MeshAndSdf)
    }
}

impl FromStr for OutputMode {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mesh" => Ok(Self::Mesh),
            "sdf" => Ok(Self::Sdf),
            "mesh+sdf" => Ok(Self::MeshAndSdf),
            other => Err(TunnelError::UnknownOutputMode(other.to_owned())),
        }
    }
}

macro_rules! string_selector {
    ($($ty:ty),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = TunnelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_owned()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

string_selector!(FieldType, EndCapStyle, OutputMode);

/// How the tunnel cross-section is sculpted into caverns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavernProfileParams {
    /// Multiplier applied to the modulated base radius.
    pub base_scale: f64,
    /// Angles (radians, from the frame's right axis) of the lobe centres.
    pub lobe_centers: Vec<f64>,
    /// Relative bulge of each lobe.
    pub lobe_strengths: Vec<f64>,
    /// Angular standard deviation of each lobe falloff.
    pub lobe_width: f64,
    /// Octaves of rock detail.
    pub fractal_octaves: u32,
    /// Amplitude decay per octave.
    pub fractal_gain: f64,
    /// Frequency growth per octave.
    pub fractal_lacunarity: f64,
    /// Frequency of the lobe twist along arc length.
    pub twist_frequency: f64,
    /// Maximum lobe twist in radians.
    pub twist_strength: f64,
}

impl CavernProfileParams {
    /// Round tube: no lobes, no twist, no fractal detail.
    #[must_use]
    pub fn cylinder() -> Self {
        Self {
            base_scale: 1.0,
            lobe_centers: Vec::new(),
            lobe_strengths: Vec::new(),
            lobe_width: 0.0,
            fractal_octaves: 0,
            fractal_gain: 0.5,
            fractal_lacunarity: 2.0,
            twist_frequency: 0.0,
            twist_strength: 0.0,
        }
    }

    fn validate(&self) -> TunnelResult<()> {
        if self.lobe_centers.len() != self.lobe_strengths.len() {
            return Err(TunnelError::LobeArrayMismatch {
                centers: self.lobe_centers.len(),
                strengths: self.lobe_strengths.len(),
            });
        }
        require_positive("profile.base_scale", self.base_scale)?;
        require_non_negative("profile.lobe_width", self.lobe_width)?;
        require_non_negative("profile.fractal_gain", self.fractal_gain)?;
        require_positive("profile.fractal_lacunarity", self.fractal_lacunarity)?;
        require_non_negative("profile.twist_frequency", self.twist_frequency)?;
        require_non_negative("profile.twist_strength", self.twist_strength)?;
        for (&center, &strength) in self.lobe_centers.iter().zip(&self.lobe_strengths) {
            require_finite("profile.lobe_centers", center)?;
            require_non_negative("profile.lobe_strengths", strength)?;
        }
        Ok(())
    }
}

impl Default for CavernProfileParams {
    /// Three interlinked caverns: two strong side lobes and a weaker roof.
    fn default() -> Self {
        Self {
            base_scale: 1.35,
            lobe_centers: vec![PI / 2.0, 3.0 * PI / 2.0, 0.0],
            lobe_strengths: vec![0.85, 0.85, 0.55],
            lobe_width: 0.9,
            fractal_octaves: 4,
            fractal_gain: 0.55,
            fractal_lacunarity: 2.1,
            twist_frequency: 0.018,
            twist_strength: 0.65,
        }
    }
}

/// Shape of the deterministic pipe-network path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeNetworkParams {
    /// Length of the cyclic module plan (0 disables the plan).
    pub module_count_hint: usize,
    /// Length of straight modules.
    pub straight_length: f64,
    /// Nominal helix turns.
    pub helix_turns: f64,
    /// Nominal rise per helix turn.
    pub helix_pitch: f64,
    /// Helix radius.
    pub helix_radius: f64,
    /// Arc sweep in degrees.
    pub junction_angle_deg: f64,
    /// Arc radius.
    pub junction_radius: f64,
}

impl PipeNetworkParams {
    /// Tightest curvature any laid module can have.
    ///
    /// Helix pitch is jittered by up to a quarter metre per module, so the
    /// lowest pitch bounds the helix curvature.
    #[must_use]
    pub fn max_curvature(&self) -> f64 {
        let radius = self.helix_radius.max(1.0);
        let rise = (self.helix_pitch - 0.25).max(0.5) / TAU;
        let helix = radius / (radius * radius + rise * rise);
        helix.max(1.0 / self.junction_radius)
    }

    fn validate(&self) -> TunnelResult<()> {
        if matches!(self.module_count_hint, 1 | 2) {
            return Err(TunnelError::invalid(
                "pipe_network.module_count_hint",
                "must be 0 or at least 3 so every primitive fits in one cycle",
            ));
        }
        require_positive("pipe_network.straight_length", self.straight_length)?;
        require_positive("pipe_network.helix_turns", self.helix_turns)?;
        require_positive("pipe_network.helix_pitch", self.helix_pitch)?;
        require_positive("pipe_network.helix_radius", self.helix_radius)?;
        require_positive("pipe_network.junction_radius", self.junction_radius)?;
        require_positive("pipe_network.junction_angle_deg", self.junction_angle_deg)?;
        if self.junction_angle_deg >= 360.0 {
            return Err(TunnelError::invalid(
                "pipe_network.junction_angle_deg",
                "must be below a full turn",
            ));
        }
        Ok(())
    }
}

impl Default for PipeNetworkParams {
    fn default() -> Self {
        Self {
            module_count_hint: 24,
            straight_length: 12.0,
            helix_turns: 1.5,
            helix_pitch: 3.0,
            helix_radius: 6.0,
            junction_angle_deg: 45.0,
            junction_radius: 10.0,
        }
    }
}

/// Complete generator configuration.
///
/// # Example
///
/// ```rust,ignore
/// let params = TunnelParams::from_toml_str(r#"
///     world_seed = 42
///     tube_sides = 12
///     field_type = "pipe_network"
///     end_caps = "sleeve"
/// "#)?;
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelParams {
    /// Seed driving every noise channel.
    pub world_seed: WorldSeed,
    /// Nominal chunk length along the path.
    pub chunk_length: f64,
    /// Arc-length distance between consecutive rings.
    pub ring_step: f64,
    /// Angular samples per ring.
    pub tube_sides: usize,
    /// Curl field frequency.
    pub dir_freq: f64,
    /// Weight of the field sample against the previous direction.
    pub dir_blend: f64,
    /// Maximum forward rotation between consecutive rings (radians).
    pub max_turn_per_step_rad: f64,
    /// Mean distance between jolts.
    pub jolt_every_meters: f64,
    /// Magnitude of a jolt perturbation.
    pub jolt_strength: f64,
    /// Span of the lookahead window averaged by the curl field.
    pub curve_smoothing_distance: f64,
    /// Samples in the lookahead window.
    pub curve_smoothing_steps: usize,
    /// Unmodulated tunnel radius.
    pub radius_base: f64,
    /// Amplitude of the low-frequency radius modulation.
    pub radius_var: f64,
    /// Frequency of the radius modulation along arc length.
    pub radius_freq: f64,
    /// Rock detail amplitude.
    pub rough_amp: f64,
    /// Rock detail frequency.
    pub rough_freq: f64,
    /// Blend weight of the previous ring's profile (0 disables).
    pub rough_smoothness: f64,
    /// Optional circular convolution kernel across angular samples.
    pub rough_filter_kernel: Option<Vec<f64>>,
    /// Hard lower bound on every wall radius after ring 0.
    pub min_clearance_radius: f64,
    /// Which chunk representations to build.
    pub mode: OutputMode,
    /// Mesh end-cap topology.
    pub end_caps: EndCapStyle,
    /// Direction field selector.
    pub field_type: FieldType,
    /// Cavern cross-section shaping.
    pub profile: CavernProfileParams,
    /// Pipe-network shaping (used by [`FieldType::PipeNetwork`]).
    pub pipe_network: PipeNetworkParams,
}

impl TunnelParams {
    /// Small, fast configuration: smoothing off, jolts effectively off.
    #[must_use]
    pub fn test() -> Self {
        Self {
            world_seed: WorldSeed::new(1234),
            chunk_length: 30.0,
            ring_step: 3.0,
            tube_sides: 16,
            dir_freq: 0.05,
            dir_blend: 0.65,
            max_turn_per_step_rad: 5.0_f64.to_radians(),
            jolt_every_meters: 10_000.0,
            jolt_strength: 0.0,
            curve_smoothing_distance: 0.0,
            curve_smoothing_steps: 1,
            radius_base: 8.0,
            radius_var: 0.0,
            radius_freq: 0.0,
            rough_amp: 0.9,
            rough_freq: 0.1,
            rough_smoothness: 0.0,
            rough_filter_kernel: None,
            min_clearance_radius: 0.0,
            mode: OutputMode::Mesh,
            end_caps: EndCapStyle::None,
            field_type: FieldType::DivergenceFree,
            profile: CavernProfileParams::default(),
            pipe_network: PipeNetworkParams {
                helix_radius: 40.0,
                junction_radius: 40.0,
                ..PipeNetworkParams::default()
            },
        }
    }

    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Config`] for malformed TOML or unknown
    /// selector names, or the specific validation error.
    pub fn from_toml_str(source: &str) -> TunnelResult<Self> {
        let params: Self = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Config`] if the file cannot be read, plus
    /// everything [`TunnelParams::from_toml_str`] can return.
    pub fn from_toml_file(path: &Path) -> TunnelResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| TunnelError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> TunnelResult<String> {
        toml::to_string(self).map_err(|e| TunnelError::Config(e.to_string()))
    }

    /// Rings per chunk, including the ring shared with the next chunk.
    #[must_use]
    pub fn rings_per_chunk(&self) -> usize {
        (self.chunk_length / self.ring_step).round() as usize + 1
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> TunnelResult<()> {
        if self.tube_sides < 3 {
            return Err(TunnelError::TooFewSides(self.tube_sides));
        }
        require_positive("radius_base", self.radius_base)?;
        require_non_negative("rough_amp", self.rough_amp)?;
        if self.rough_amp >= self.radius_base {
            return Err(TunnelError::RoughnessTooLarge {
                amplitude: self.rough_amp,
                base_radius: self.radius_base,
            });
        }
        self.profile.validate()?;
        if !(0.0..=1.0).contains(&self.rough_smoothness) {
            return Err(TunnelError::SmoothnessOutOfRange(self.rough_smoothness));
        }
        if let Some(kernel) = &self.rough_filter_kernel {
            validate_kernel(kernel)?;
        }

        require_positive("ring_step", self.ring_step)?;
        require_positive("chunk_length", self.chunk_length)?;
        if self.rings_per_chunk() < 2 {
            return Err(TunnelError::invalid(
                "chunk_length",
                format!("must span at least one ring step ({})", self.ring_step),
            ));
        }
        require_non_negative("dir_freq", self.dir_freq)?;
        if !(0.0..=1.0).contains(&self.dir_blend) {
            return Err(TunnelError::invalid("dir_blend", "must be within [0, 1]"));
        }
        require_positive("max_turn_per_step_rad", self.max_turn_per_step_rad)?;
        require_non_negative("jolt_every_meters", self.jolt_every_meters)?;
        require_non_negative("jolt_strength", self.jolt_strength)?;
        require_non_negative("curve_smoothing_distance", self.curve_smoothing_distance)?;
        require_non_negative("radius_var", self.radius_var)?;
        require_non_negative("radius_freq", self.radius_freq)?;
        require_non_negative("rough_freq", self.rough_freq)?;
        require_non_negative("min_clearance_radius", self.min_clearance_radius)?;

        if self.field_type == FieldType::PipeNetwork {
            self.pipe_network.validate()?;
            // Ring frames follow the closed-form path only while the turn
            // clamp never binds.
            let turn = self.ring_step * self.pipe_network.max_curvature();
            if turn > self.max_turn_per_step_rad {
                return Err(TunnelError::invalid(
                    "ring_step",
                    format!(
                        "pipe network turns {turn:.3} rad per step, above max_turn_per_step_rad {}",
                        self.max_turn_per_step_rad
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Default for TunnelParams {
    /// The sandbox demo configuration.
    fn default() -> Self {
        Self {
            world_seed: WorldSeed::new(1337),
            chunk_length: 80.0,
            ring_step: 3.0,
            tube_sides: 18,
            dir_freq: 0.05,
            dir_blend: 0.65,
            max_turn_per_step_rad: 0.7,
            jolt_every_meters: 140.0,
            jolt_strength: 0.3,
            curve_smoothing_distance: 0.0,
            curve_smoothing_steps: 1,
            radius_base: 11.0,
            radius_var: 1.2,
            radius_freq: 0.008,
            rough_amp: 1.1,
            rough_freq: 0.1,
            rough_smoothness: 0.45,
            rough_filter_kernel: Some(vec![0.2, 0.6, 0.2]),
            min_clearance_radius: 0.0,
            mode: OutputMode::MeshAndSdf,
            end_caps: EndCapStyle::None,
            field_type: FieldType::DivergenceFree,
            profile: CavernProfileParams::default(),
            pipe_network: PipeNetworkParams::default(),
        }
    }
}

fn validate_kernel(kernel: &[f64]) -> TunnelResult<()> {
    if kernel.is_empty() {
        return Err(TunnelError::EmptyFilterKernel);
    }
    let sum: f64 = kernel.iter().sum();
    if !sum.is_finite() || sum <= 1e-12 {
        return Err(TunnelError::DegenerateFilterKernel(sum));
    }
    Ok(())
}

fn require_finite(name: &'static str, value: f64) -> TunnelResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TunnelError::invalid(name, format!("must be finite, got {value}")))
    }
}

fn require_positive(name: &'static str, value: f64) -> TunnelResult<()> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TunnelError::invalid(name, format!("must be positive, got {value}")))
    }
}

fn require_non_negative(name: &'static str, value: f64) -> TunnelResult<()> {
    require_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(TunnelError::invalid(name, format!("must be non-negative, got {value}")))
    }
}
