//! # Tunnelcave Procedural Generation
//!
//! Deterministic, endless tunnel and cavern generation.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and config always produce the same rings
//! 2. **Append-only**: Rings are grown once and cached, never regenerated
//! 3. **Chunked**: Overlapping ring windows become meshes and SDF descriptors
//! 4. **Fail fast**: Bad configuration is rejected before the first ring
//!
//! ## Core Components
//!
//! - `TunnelTerrainGenerator`: Grows the ring cache and builds chunks
//! - `PathField`: Curl-noise or pipe-network steering
//! - `CavernProfile`: Lobes, twist and rock detail of each cross-section
//! - `ChunkStreamer`: Sliding load/unload band over chunk indices
//! - `CavePath`: Continuous arc-length sampling of the ring cache
//! - `RingProbe` / `SpawnPlanner`: Wall clearance and safe spawn poses
//!
//! ## Example
//!
//! ```rust,ignore
//! use tunnelcave_procedural::{
//!     CavePath, ChunkStreamer, SpawnPlanner, SpawnRequest, StreamerConfig, TunnelParams,
//!     TunnelTerrainGenerator,
//! };
//!
//! let generator = TunnelTerrainGenerator::new(TunnelParams::default())?;
//! let mut streamer = ChunkStreamer::new(generator, StreamerConfig::default())?;
//! streamer.update(0);
//!
//! let spawn = SpawnPlanner::from_generator(streamer.generator())
//!     .plan(&SpawnRequest { arc_window: (0.0, 60.0), craft_radius: 2.0 })?;
//!
//! let mut path = CavePath::new(streamer.generator_mut());
//! let ahead = path.centerline(120.0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod field;
pub mod noise;
pub mod path;
pub mod probe;
pub mod profile;
pub mod sdf;
pub mod spawn;
pub mod streamer;
pub mod terrain;

pub use chunk::{Aabb, ChunkGeometry, MeshChunk, SdfChunk};
pub use config::{CavernProfileParams, EndCapStyle, FieldType, OutputMode, PipeNetworkParams, TunnelParams};
pub use error::{TunnelError, TunnelResult};
pub use field::{DirectionField, DivergenceFreeField, FieldParams, PathField, PipeNetworkField, StraightField};
pub use noise::WorldSeed;
pub use path::{CavePath, CurveSample};
pub use probe::{Clearance, ClearanceStats, RingProbe};
pub use profile::CavernProfile;
pub use sdf::SignedDistanceField;
pub use spawn::{SpawnPlanner, SpawnRequest, SpawnResult};
pub use streamer::{BandChange, ChunkStreamer, StreamerConfig, StreamerStats};
pub use terrain::{DiameterStats, RingSample, TunnelTerrainGenerator};
