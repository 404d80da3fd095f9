//! # Tunnelcave Shared
//!
//! Math types used by the tunnel generator and by anything consuming its
//! output (renderers, collision, gameplay).
//!
//! ## CRITICAL RULE
//!
//! This crate holds plain geometry only. No noise, no generation state,
//! no platform RNG.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod frame;
pub mod math;

pub use frame::OrthonormalFrame;
pub use math::{orthonormalize, rotate_towards, rotate_vector, Vector3};
