use crate::{
    id::{Identifier, MAX_BIT_DISTANCE},
    routing::{bucket::DEFAULT_CAPACITY, chain::BucketChain},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings shared by every node of a chain.
///
/// Missing fields fall back to their defaults when deserialized, so a host can load a partial
/// configuration from any serde format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Bit distance of the first node. Defaults to the farthest bucket.
    pub bit_distance: u8,
    /// Peers per bucket before new arrivals are waitlisted.
    pub capacity: usize,
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_distance > MAX_BIT_DISTANCE {
            return Err(ConfigError::BitDistanceOutOfRange(self.bit_distance));
        }

        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            bit_distance: MAX_BIT_DISTANCE,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bit distance {0} is past the last bucket")]
    BitDistanceOutOfRange(u8),
    #[error("bucket capacity must be at least one peer")]
    ZeroCapacity,
}

// ----------------------------------------------------------------------------//

/// Stores information for initializing a BucketChain.
#[derive(Clone, Debug, Default)]
pub struct ChainBuilder {
    config: ChainConfig,
}

impl ChainBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// Set the bit distance of the node the chain starts with. Defaults to 159.
    pub fn set_bit_distance(mut self, bit_distance: u8) -> ChainBuilder {
        self.config.bit_distance = bit_distance;
        self
    }

    /// Set how many peers each bucket holds before waitlisting. Defaults to 20.
    pub fn set_capacity(mut self, capacity: usize) -> ChainBuilder {
        self.config.capacity = capacity;
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Create the chain around `local_id`.
    pub fn build<T>(self, local_id: Identifier) -> Result<BucketChain<T>, ConfigError> {
        BucketChain::from_config(local_id, self.config)
    }
}

impl From<ChainConfig> for ChainBuilder {
    fn from(config: ChainConfig) -> ChainBuilder {
        ChainBuilder { config }
    }
}
