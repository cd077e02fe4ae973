use std::fmt::{self, Debug, Formatter};
use std::time::Instant;

use crate::id::{Distance, Identifier};

/// Where a target identifier sits relative to the local identifier of a chain.
///
/// Computed once per operation, before routing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Locator {
    pub id: Identifier,
    pub distance: Distance,
    pub bit_distance: u8,
}

impl Locator {
    pub fn new(local_id: Identifier, id: Identifier) -> Locator {
        let distance = local_id.xor_distance(id);

        Locator {
            id,
            distance,
            bit_distance: distance.bit_distance(),
        }
    }
}

/// Peer stored in a bucket or a waitlist.
///
/// Distances are relative to the local identifier of the owning chain and are fixed at insertion.
#[derive(Clone)]
pub struct Peer<T> {
    id: Identifier,
    distance: Distance,
    bit_distance: u8,
    data: T,
    last_action: Instant,
}

impl<T> Peer<T> {
    pub(crate) fn new(locator: &Locator, data: T) -> Peer<T> {
        Peer {
            id: locator.id,
            distance: locator.distance,
            bit_distance: locator.bit_distance,
            data,
            last_action: Instant::now(),
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn bit_distance(&self) -> u8 {
        self.bit_distance
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    /// Last time the peer was added or touched.
    pub fn last_action(&self) -> Instant {
        self.last_action
    }

    /// Replace the payload, leaving position and timestamp alone.
    pub(crate) fn set_data(&mut self, data: T) {
        self.data = data;
    }

    /// Record activity from the peer.
    pub(crate) fn touch(&mut self) {
        self.last_action = Instant::now();
    }
}

impl<T: Debug> Debug for Peer<T> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("bit_distance", &self.bit_distance)
            .field("data", &self.data)
            .field("last_action", &self.last_action)
            .finish()
    }
}
