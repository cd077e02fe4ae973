//! Routing-table core of a Kademlia-style distributed hash table.
//!
//! A [`BucketChain`] keeps peers keyed by 160-bit Ethereum-style identifiers in a chain of
//! fixed-capacity buckets, one per bit distance from the local identifier. Buckets are created
//! as peers arrive and the empty low end of the chain is trimmed as they leave. Full buckets
//! overflow into a per-bucket waitlist, and [`BucketChain::nearest`] answers XOR-nearest
//! neighbour queries over every bucket-resident peer.
//!
//! The chain performs no locking. Hosts sharing one across threads serialize access to it.

pub mod diagnostics;

mod builder;
mod id;
mod routing;

pub use crate::builder::{ChainBuilder, ChainConfig, ConfigError};
pub use crate::id::{Distance, Identifier, InvalidIdentifier, ID_BITS, ID_LEN, MAX_BIT_DISTANCE};
pub use crate::routing::bucket::{
    AddOutcome, BucketNode, PeerData, RemoveOutcome, SetOutcome, UpdateOutcome, DEFAULT_CAPACITY,
};
pub use crate::routing::chain::{BucketChain, Buckets, ChainStats, Cursor, LayoutEntry};
pub use crate::routing::peer::Peer;
pub use crate::routing::registry::SharedRegistry;
