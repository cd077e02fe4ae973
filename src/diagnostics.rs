//! Log output describing the shape of a chain.

use crate::routing::chain::{BucketChain, LayoutEntry};
use std::fmt::Write;

/// Log every bit distance from 159 down to 0: linked nodes at info level with their bucket and
/// waitlist sizes, positions without a node at warn level.
pub fn log_layout<T>(chain: &BucketChain<T>) {
    for entry in chain.layout() {
        match entry {
            LayoutEntry::Vacant(bit_distance) => log::warn!("[ Bucket ID {} ]", bit_distance),
            LayoutEntry::Bucket {
                bit_distance,
                size,
                waitlist_size,
            } => log::info!(
                "[ Bucket ID {} ]\t\t[ Bucket {} ]\t[ Waitlist {} ]",
                bit_distance,
                size,
                waitlist_size
            ),
        }
    }
}

/// One line summary of the occupied buckets, e.g. `Bucket 152: 1 | Bucket 8: 2 | Total: 3`.
pub fn summary<T>(chain: &BucketChain<T>) -> String {
    let mut total = 0;
    let mut buffer = String::new();

    for bucket in chain.buckets() {
        let num_peers = bucket.len();
        total += num_peers;

        if num_peers != 0 {
            write!(&mut buffer, "Bucket {}: {} | ", bucket.bit_distance(), num_peers).ok();
        }
    }

    write!(&mut buffer, "Total: {}", total).ok();

    buffer
}

pub fn log_summary<T>(chain: &BucketChain<T>) {
    log::debug!("{}", summary(chain));
}
