//! # Tunnel Error Types
//!
//! All errors that can occur while configuring or querying the tunnel.
//! Configuration errors surface at construction, never mid-generation.

use thiserror::Error;

/// Errors that can occur in tunnel generation and its derived queries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TunnelError {
    /// Cross-sections need at least a triangle.
    #[error("tube_sides must be >= 3, got {0}")]
    TooFewSides(usize),

    /// Rock detail would be able to push walls through the centre line.
    #[error("roughness amplitude {amplitude} must be smaller than base radius {base_radius}")]
    RoughnessTooLarge {
        /// Configured roughness amplitude.
        amplitude: f64,
        /// Configured base radius.
        base_radius: f64,
    },

    /// Every lobe needs exactly one strength.
    #[error("lobe arrays differ in length: {centers} centers, {strengths} strengths")]
    LobeArrayMismatch {
        /// Number of lobe centers.
        centers: usize,
        /// Number of lobe strengths.
        strengths: usize,
    },

    /// Ring-to-ring smoothing is a blend weight.
    #[error("rough_smoothness must be within [0, 1], got {0}")]
    SmoothnessOutOfRange(f64),

    /// An angular filter kernel was supplied with no weights.
    #[error("angular filter kernel must not be empty")]
    EmptyFilterKernel,

    /// The angular filter kernel cannot be normalized.
    #[error("angular filter kernel weights must sum to a positive value, got {0}")]
    DegenerateFilterKernel(f64),

    /// Unrecognized direction field selector.
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    /// Unrecognized end-cap selector.
    #[error("unknown end cap style: {0}")]
    UnknownEndCapStyle(String),

    /// Unrecognized output mode selector.
    #[error("unknown output mode: {0}")]
    UnknownOutputMode(String),

    /// A scalar parameter is outside its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the config.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Streamer band with `low > high`.
    #[error("invalid streaming band: low {low} > high {high}")]
    InvalidBand {
        /// Lower band offset.
        low: i64,
        /// Upper band offset.
        high: i64,
    },

    /// Curve parameters start at zero.
    #[error("path parameter must be non-negative, got {0}")]
    NegativeParameter(f64),

    /// The probe axis has no component in the cross-section plane.
    #[error("probe axis is parallel to the ring's forward direction")]
    AxisParallelToForward,

    /// Clearance statistics need at least one sample.
    #[error("sample count must be positive")]
    InvalidSampleCount,

    /// Rings and arc lengths must pair up one to one.
    #[error("ring count {rings} does not match arc length count {arc_lengths}")]
    RingCountMismatch {
        /// Number of rings.
        rings: usize,
        /// Number of arc lengths.
        arc_lengths: usize,
    },

    /// No ring/axis combination leaves room for the craft.
    #[error("no safe spawn pose for craft radius {craft_radius}")]
    NoSafeSpawn {
        /// Requested craft radius.
        craft_radius: f64,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TunnelError {
    /// Shorthand for [`TunnelError::InvalidParameter`].
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for TunnelError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for tunnel operations.
pub type TunnelResult<T> = Result<T, TunnelError>;
