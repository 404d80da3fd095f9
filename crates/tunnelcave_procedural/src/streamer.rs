//! # Chunk Streamer
//!
//! Sliding load/unload window over chunk indices.
//!
//! ## Lifecycle
//!
//! ```text
//! [Outside band] -> update() -> [Loaded] -> update() -> [Unloaded]
//!                                  ^                        |
//!                                  +---- back in band ------+
//! ```
//!
//! A chunk that stays inside the band is never rebuilt. The map is not
//! internally synchronized: callers serialize `update()` per streamer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::ChunkGeometry;
use crate::error::{TunnelError, TunnelResult};
use crate::terrain::TunnelTerrainGenerator;

/// Band of chunk offsets kept loaded around the current chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Lowest offset kept (inclusive, usually negative).
    pub band_low: i64,
    /// Highest offset kept (inclusive).
    pub band_high: i64,
}

impl StreamerConfig {
    /// Checks `band_low <= band_high`.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::InvalidBand`] otherwise.
    pub fn validate(&self) -> TunnelResult<()> {
        if self.band_low > self.band_high {
            return Err(TunnelError::InvalidBand {
                low: self.band_low,
                high: self.band_high,
            });
        }
        Ok(())
    }
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            band_low: -2,
            band_high: 3,
        }
    }
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Chunks built since the streamer was created.
    pub generated_this_session: u64,
    /// Chunks dropped since the streamer was created.
    pub unloaded_this_session: u64,
}

/// Chunks loaded and unloaded by one [`ChunkStreamer::update`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BandChange {
    /// Newly built chunk indices, ascending.
    pub loaded: Vec<usize>,
    /// Dropped chunk indices, ascending.
    pub unloaded: Vec<usize>,
}

/// Keeps the chunks around a moving index loaded.
#[derive(Debug)]
pub struct ChunkStreamer {
    generator: TunnelTerrainGenerator,
    config: StreamerConfig,
    loaded: BTreeMap<usize, ChunkGeometry>,
    stats: StreamerStats,
}

impl ChunkStreamer {
    /// Wraps a generator.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::InvalidBand`] for an inverted band.
    pub fn new(generator: TunnelTerrainGenerator, config: StreamerConfig) -> TunnelResult<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            config,
            loaded: BTreeMap::new(),
            stats: StreamerStats::default(),
        })
    }

    /// Loads the band around `current` and unloads everything outside it.
    ///
    /// Negative indices are never requested.
    pub fn update(&mut self, current: i64) -> BandChange {
        let low = current.saturating_add(self.config.band_low).max(0);
        let high = current.saturating_add(self.config.band_high);
        let desired = if high < 0 {
            None
        } else {
            usize::try_from(low).ok().zip(usize::try_from(high).ok())
        };
        let in_band = |index: usize| desired.map_or(false, |(lo, hi)| (lo..=hi).contains(&index));

        let unloaded: Vec<usize> = self.loaded.keys().copied().filter(|&i| !in_band(i)).collect();
        for index in &unloaded {
            self.loaded.remove(index);
        }

        let mut loaded = Vec::new();
        if let Some((lo, hi)) = desired {
            for index in lo..=hi {
                if !self.loaded.contains_key(&index) {
                    let chunk = self.generator.generate_chunk(index);
                    self.loaded.insert(index, chunk);
                    loaded.push(index);
                }
            }
        }

        self.stats.generated_this_session += loaded.len() as u64;
        self.stats.unloaded_this_session += unloaded.len() as u64;
        if !loaded.is_empty() || !unloaded.is_empty() {
            debug!(current, ?loaded, ?unloaded, resident = self.loaded.len(), "streaming band updated");
        }
        BandChange { loaded, unloaded }
    }

    /// Loaded chunk `index`, if resident.
    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<&ChunkGeometry> {
        self.loaded.get(&index)
    }

    /// Resident chunk indices, ascending.
    pub fn loaded_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.loaded.keys().copied()
    }

    /// Number of resident chunks.
    #[inline]
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.loaded.len()
    }

    /// Session counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> StreamerStats {
        self.stats
    }

    /// Band configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> StreamerConfig {
        self.config
    }

    /// Underlying generator.
    #[inline]
    #[must_use]
    pub const fn generator(&self) -> &TunnelTerrainGenerator {
        &self.generator
    }

    /// Underlying generator, for path and spawn queries.
    #[inline]
    pub fn generator_mut(&mut self) -> &mut TunnelTerrainGenerator {
        &mut self.generator
    }

    /// Summaries of the resident chunks in index order.
    #[must_use]
    pub fn band_summary(&self) -> String {
        self.loaded
            .iter()
            .map(|(index, chunk)| format!("{index}:{}", chunk.summary()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
