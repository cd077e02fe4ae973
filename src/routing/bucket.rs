use std::slice::Iter;

use crate::id::Identifier;
use crate::routing::peer::{Locator, Peer};
use crate::routing::registry::SharedRegistry;

/// Default number of peers a bucket holds before overflowing into its waitlist.
pub const DEFAULT_CAPACITY: usize = 20;

/// Result of adding a peer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AddOutcome {
    /// The peer is already held by the bucket or its waitlist; nothing changed.
    AlreadyExists,
    AddedToBucket,
    /// The bucket is full, the peer was queued at the tail of the waitlist.
    AddedToWaitlist,
}

/// Result of removing a peer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RemoveOutcome {
    NotFound,
    RemovedFromBucket,
    RemovedFromWaitlist,
}

/// Result of replacing the payload of a peer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum SetOutcome {
    NotFound,
    EditedFromBucket,
    EditedFromWaitlist,
}

/// Result of touching a peer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum UpdateOutcome {
    NotFound,
    UpdatedFromBucket,
    UpdatedFromWaitlist,
}

/// Payload lookup result.
#[derive(PartialEq, Eq, Debug)]
pub struct PeerData<'a, T> {
    /// Bit distance of the node holding the peer.
    pub bucket_id: u8,
    /// Whether the peer sits in the waitlist rather than the bucket.
    pub waitlist: bool,
    pub data: &'a T,
}

/// Mutating operations a node executes once routing has reached it.
pub(crate) enum Action<T> {
    Add(T),
    Remove,
    Set(T),
    Update,
}

pub(crate) enum Outcome {
    Add(AddOutcome),
    Remove(RemoveOutcome),
    Set(SetOutcome),
    Update(UpdateOutcome),
}

/// Position of a peer within a node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Slot {
    Bucket(usize),
    Waitlist(usize),
}

/// One link of a chain: the peers at a single bit distance from the local identifier.
///
/// The bucket is ordered most recently active first and never grows past the capacity. The
/// waitlist takes the overflow in arrival order and is unbounded.
pub struct BucketNode<T> {
    bit_distance: u8,
    capacity: usize,
    bucket: Vec<Peer<T>>,
    waitlist: Vec<Peer<T>>,
    left: Option<u8>,
    right: Option<u8>,
}

impl<T> BucketNode<T> {
    pub(crate) fn new(bit_distance: u8, capacity: usize) -> BucketNode<T> {
        BucketNode {
            bit_distance,
            capacity,
            bucket: Vec::with_capacity(capacity),
            waitlist: Vec::new(),
            left: None,
            right: None,
        }
    }

    pub fn bit_distance(&self) -> u8 {
        self.bit_distance
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of peers in the bucket.
    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    pub fn is_full(&self) -> bool {
        self.bucket.len() >= self.capacity
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    /// True if neither the bucket nor the waitlist hold any peer.
    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty() && self.waitlist.is_empty()
    }

    /// Bucket peers, most recently active first.
    pub fn peers(&self) -> Iter<Peer<T>> {
        self.bucket.iter()
    }

    pub fn waitlist(&self) -> Iter<Peer<T>> {
        self.waitlist.iter()
    }

    /// Bit distance of the neighbour one step closer to the local identifier.
    pub fn left(&self) -> Option<u8> {
        self.left
    }

    /// Bit distance of the neighbour one step further from the local identifier.
    pub fn right(&self) -> Option<u8> {
        self.right
    }

    /// Whether the node may be unlinked from its right neighbour.
    pub fn is_removable(&self) -> bool {
        self.is_empty() && self.bit_distance != 0 && self.left.is_none()
    }

    pub(crate) fn set_left(&mut self, left: Option<u8>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<u8>) {
        self.right = right;
    }

    /// Execute `action` for the peer described by `locator`, which must belong to this node.
    pub(crate) fn apply(
        &mut self,
        locator: &Locator,
        action: Action<T>,
        registry: &mut SharedRegistry,
    ) -> Outcome {
        debug_assert_eq!(locator.bit_distance, self.bit_distance);

        match action {
            Action::Add(data) => Outcome::Add(self.add(locator, data, registry)),
            Action::Remove => Outcome::Remove(self.remove(&locator.id, registry)),
            Action::Set(data) => Outcome::Set(self.set(&locator.id, data)),
            Action::Update => Outcome::Update(self.update(&locator.id)),
        }
    }

    pub(crate) fn get(&self, id: &Identifier) -> Option<PeerData<'_, T>> {
        let (peer, waitlist) = match self.find(id)? {
            Slot::Bucket(index) => (&self.bucket[index], false),
            Slot::Waitlist(index) => (&self.waitlist[index], true),
        };

        Some(PeerData {
            bucket_id: self.bit_distance,
            waitlist,
            data: peer.data(),
        })
    }

    fn add(&mut self, locator: &Locator, data: T, registry: &mut SharedRegistry) -> AddOutcome {
        if self.find(&locator.id).is_some() {
            return AddOutcome::AlreadyExists;
        }

        if self.bucket.len() < self.capacity {
            self.bucket.insert(0, Peer::new(locator, data));
            registry.insert(locator.id);

            AddOutcome::AddedToBucket
        } else {
            log::trace!(
                "bucket {} full, waitlisting {}",
                self.bit_distance,
                locator.id
            );
            self.waitlist.push(Peer::new(locator, data));

            AddOutcome::AddedToWaitlist
        }
    }

    fn remove(&mut self, id: &Identifier, registry: &mut SharedRegistry) -> RemoveOutcome {
        match self.find(id) {
            Some(Slot::Bucket(index)) => {
                self.bucket.remove(index);
                registry.remove(id);
                RemoveOutcome::RemovedFromBucket
            }
            Some(Slot::Waitlist(index)) => {
                self.waitlist.remove(index);
                RemoveOutcome::RemovedFromWaitlist
            }
            None => RemoveOutcome::NotFound,
        }
    }

    fn set(&mut self, id: &Identifier, data: T) -> SetOutcome {
        match self.find(id) {
            Some(Slot::Bucket(index)) => {
                self.bucket[index].set_data(data);
                SetOutcome::EditedFromBucket
            }
            Some(Slot::Waitlist(index)) => {
                self.waitlist[index].set_data(data);
                SetOutcome::EditedFromWaitlist
            }
            None => SetOutcome::NotFound,
        }
    }

    fn update(&mut self, id: &Identifier) -> UpdateOutcome {
        match self.find(id) {
            Some(Slot::Bucket(index)) => {
                touch(&mut self.bucket, index);
                UpdateOutcome::UpdatedFromBucket
            }
            Some(Slot::Waitlist(index)) => {
                touch(&mut self.waitlist, index);
                UpdateOutcome::UpdatedFromWaitlist
            }
            None => UpdateOutcome::NotFound,
        }
    }

    /// Bucket takes precedence over the waitlist.
    fn find(&self, id: &Identifier) -> Option<Slot> {
        if self.is_empty() {
            return None;
        }

        if let Some(index) = self.bucket.iter().position(|peer| peer.id() == *id) {
            return Some(Slot::Bucket(index));
        }

        self.waitlist
            .iter()
            .position(|peer| peer.id() == *id)
            .map(Slot::Waitlist)
    }
}

/// Refresh the timestamp of `peers[index]` and move it to the front, the rest ordered by
/// descending last action.
fn touch<T>(peers: &mut Vec<Peer<T>>, index: usize) {
    let mut peer = peers.remove(index);
    peer.touch();

    peers.sort_by(|a, b| b.last_action().cmp(&a.last_action()));
    peers.insert(0, peer);
}

// ----------------------------------------------------------------------------//
