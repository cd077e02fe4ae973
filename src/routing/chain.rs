use crate::builder::{ChainConfig, ConfigError};
use crate::id::{Identifier, ID_BITS};
use crate::routing::bucket::{
    Action, AddOutcome, BucketNode, Outcome, PeerData, RemoveOutcome, SetOutcome, UpdateOutcome,
};
use crate::routing::peer::Locator;
use crate::routing::registry::SharedRegistry;

/// Self-expanding chain of buckets around a local identifier.
///
/// Nodes live in an arena indexed by bit distance and are linked to their direct neighbours. Any
/// operation names a target identifier; the chain walks from the starting node toward the bit
/// distance of the target, creating the missing nodes on the way. On the way back every node
/// that forwarded the operation unlinks its left neighbour if that neighbour became removable
/// (empty, not bucket 0, nothing further left). Right neighbours are never unlinked.
///
/// The anchor, the node the chain was created with, is never unlinked. Neither is the node a
/// [`Cursor`] starts from, for the duration of its operation.
pub struct BucketChain<T> {
    local_id: Identifier,
    capacity: usize,
    anchor: u8,
    nodes: Vec<Option<BucketNode<T>>>,
    registry: SharedRegistry,
}

/// Nodes visited while routing an operation.
struct Route {
    target: u8,
    /// Nodes that forwarded the operation, starting node first.
    path: Vec<u8>,
}

impl<T> BucketChain<T> {
    /// Create a chain with the default anchor bit distance and bucket capacity.
    pub fn new(local_id: Identifier) -> BucketChain<T> {
        let config = ChainConfig::default();

        BucketChain::with_config(local_id, config.bit_distance, config.capacity)
    }

    /// Create a chain from a loaded configuration.
    pub fn from_config(
        local_id: Identifier,
        config: ChainConfig,
    ) -> Result<BucketChain<T>, ConfigError> {
        config.validate()?;

        Ok(BucketChain::with_config(
            local_id,
            config.bit_distance,
            config.capacity,
        ))
    }

    fn with_config(local_id: Identifier, anchor: u8, capacity: usize) -> BucketChain<T> {
        let mut nodes: Vec<_> = (0..ID_BITS).map(|_| None).collect();
        nodes[anchor as usize] = Some(BucketNode::new(anchor, capacity));

        BucketChain {
            local_id,
            capacity,
            anchor,
            nodes,
            registry: SharedRegistry::new(),
        }
    }

    pub fn local_id(&self) -> Identifier {
        self.local_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bit distance of the node the chain was created with.
    pub fn anchor(&self) -> u8 {
        self.anchor
    }

    /// All bucket-resident identifiers.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// The node at `bit_distance`, if it is currently linked into the chain.
    pub fn bucket(&self, bit_distance: u8) -> Option<&BucketNode<T>> {
        self.nodes.get(bit_distance as usize)?.as_ref()
    }

    /// Start operations from the node at `bit_distance` instead of the anchor.
    pub fn at(&mut self, bit_distance: u8) -> Option<Cursor<'_, T>> {
        self.bucket(bit_distance)?;

        Some(Cursor {
            chain: self,
            position: bit_distance,
        })
    }

    /// Add a peer to the bucket matching its bit distance.
    pub fn add(&mut self, id: Identifier, data: T) -> AddOutcome {
        self.add_from(self.anchor, id, data)
    }

    pub fn remove(&mut self, id: Identifier) -> RemoveOutcome {
        self.remove_from(self.anchor, id)
    }

    /// Look up a peer. Routing may still grow and prune the chain.
    pub fn get(&mut self, id: Identifier) -> Option<PeerData<'_, T>> {
        self.get_from(self.anchor, id)
    }

    /// Replace the payload of a peer.
    pub fn set(&mut self, id: Identifier, data: T) -> SetOutcome {
        self.set_from(self.anchor, id, data)
    }

    /// Mark a peer as just active, moving it to the front of its list.
    pub fn update(&mut self, id: Identifier) -> UpdateOutcome {
        self.update_from(self.anchor, id)
    }

    /// Up to `count` bucket-resident identifiers closest to `target` by XOR distance.
    ///
    /// Scans the whole chain; waitlisted peers are not candidates.
    pub fn nearest(&self, target: Identifier, count: usize) -> Vec<Identifier> {
        self.registry.nearest(target, count)
    }

    /// Walk from the node at `from` toward `bit_distance` along existing links and return the
    /// node found there, or the last node reachable in that direction.
    ///
    /// Returns `None` if `from` is not linked into the chain.
    pub fn find_bucket(&self, bit_distance: u8, from: u8) -> Option<&BucketNode<T>> {
        let mut node = self.bucket(from)?;

        while node.bit_distance() != bit_distance {
            let next = if bit_distance < node.bit_distance() {
                node.left()
            } else {
                node.right()
            };

            match next.and_then(|position| self.bucket(position)) {
                Some(next) => node = next,
                None => break,
            }
        }

        Some(node)
    }

    /// The node with the highest bit distance.
    pub fn first(&self) -> &BucketNode<T> {
        let mut node = self.linked(self.anchor);

        while node.bit_distance() != 0 {
            match node.right() {
                Some(right) => node = self.linked(right),
                None => break,
            }
        }

        node
    }

    /// Every linked node, from the highest bit distance down.
    pub fn buckets(&self) -> Buckets<'_, T> {
        Buckets {
            chain: self,
            next: Some(self.first().bit_distance()),
        }
    }

    /// All bit distances from the highest down to 0, marking the ones without a node.
    pub fn layout(&self) -> impl Iterator<Item = LayoutEntry> + '_ {
        (0..ID_BITS)
            .rev()
            .map(move |position| match self.bucket(position as u8) {
                Some(node) => LayoutEntry::Bucket {
                    bit_distance: node.bit_distance(),
                    size: node.len(),
                    waitlist_size: node.waitlist_len(),
                },
                None => LayoutEntry::Vacant(position as u8),
            })
    }

    pub fn stats(&self) -> ChainStats {
        self.buckets().fold(ChainStats::default(), |mut stats, node| {
            stats.bucket_count += 1;
            stats.peer_count += node.len();
            stats.waitlisted_count += node.waitlist_len();
            stats
        })
    }

    fn add_from(&mut self, from: u8, id: Identifier, data: T) -> AddOutcome {
        match self.execute(from, id, Action::Add(data)) {
            Outcome::Add(outcome) => outcome,
            _ => unreachable!("add action answered with another outcome"),
        }
    }

    fn remove_from(&mut self, from: u8, id: Identifier) -> RemoveOutcome {
        match self.execute(from, id, Action::Remove) {
            Outcome::Remove(outcome) => outcome,
            _ => unreachable!("remove action answered with another outcome"),
        }
    }

    fn set_from(&mut self, from: u8, id: Identifier, data: T) -> SetOutcome {
        match self.execute(from, id, Action::Set(data)) {
            Outcome::Set(outcome) => outcome,
            _ => unreachable!("set action answered with another outcome"),
        }
    }

    fn update_from(&mut self, from: u8, id: Identifier) -> UpdateOutcome {
        match self.execute(from, id, Action::Update) {
            Outcome::Update(outcome) => outcome,
            _ => unreachable!("update action answered with another outcome"),
        }
    }

    fn get_from(&mut self, from: u8, id: Identifier) -> Option<PeerData<'_, T>> {
        let locator = Locator::new(self.local_id, id);
        let route = self.route(from, locator.bit_distance);

        // A target pruned here was empty, so reading afterwards gives the same answer.
        self.unwind(from, &route.path);

        self.bucket(route.target)?.get(&id)
    }

    fn execute(&mut self, from: u8, id: Identifier, action: Action<T>) -> Outcome {
        let locator = Locator::new(self.local_id, id);
        let route = self.route(from, locator.bit_distance);

        let node = self.nodes[route.target as usize]
            .as_mut()
            .expect("routed to an unlinked bucket - implementation error");
        let outcome = node.apply(&locator, action, &mut self.registry);

        self.unwind(from, &route.path);

        outcome
    }

    /// Follow links from `from` to the node at `bit_distance`, creating missing neighbours.
    fn route(&mut self, from: u8, bit_distance: u8) -> Route {
        let mut path = Vec::new();
        let mut current = from;

        while current != bit_distance {
            path.push(current);

            current = if bit_distance < current {
                self.left_or_grow(current)
            } else {
                self.right_or_grow(current)
            };
        }

        Route {
            target: current,
            path,
        }
    }

    fn left_or_grow(&mut self, position: u8) -> u8 {
        if let Some(left) = self.linked(position).left() {
            return left;
        }

        let left = position - 1;
        log::trace!("growing chain left to bucket {}", left);

        let mut node = BucketNode::new(left, self.capacity);
        node.set_right(Some(position));
        self.nodes[left as usize] = Some(node);
        self.linked_mut(position).set_left(Some(left));

        left
    }

    fn right_or_grow(&mut self, position: u8) -> u8 {
        if let Some(right) = self.linked(position).right() {
            return right;
        }

        let right = position + 1;
        log::trace!("growing chain right to bucket {}", right);

        let mut node = BucketNode::new(right, self.capacity);
        node.set_left(Some(position));
        self.nodes[right as usize] = Some(node);
        self.linked_mut(position).set_right(Some(right));

        right
    }

    /// Give every forwarding node, deepest first, the chance to unlink its left neighbour.
    fn unwind(&mut self, from: u8, path: &[u8]) {
        for &position in path.iter().rev() {
            self.prune_left_of(position, from);
        }
    }

    fn prune_left_of(&mut self, position: u8, from: u8) {
        let left = match self.bucket(position).and_then(BucketNode::left) {
            Some(left) => left,
            None => return,
        };

        if left == self.anchor || left == from {
            return;
        }

        if self.bucket(left).map_or(false, BucketNode::is_removable) {
            log::debug!("pruning empty bucket {}", left);

            self.nodes[left as usize] = None;
            self.linked_mut(position).set_left(None);
        }
    }

    fn linked(&self, position: u8) -> &BucketNode<T> {
        self.bucket(position)
            .expect("link to a missing bucket - implementation error")
    }

    fn linked_mut(&mut self, position: u8) -> &mut BucketNode<T> {
        self.nodes[position as usize]
            .as_mut()
            .expect("link to a missing bucket - implementation error")
    }
}

// ----------------------------------------------------------------------------//

/// Handle running operations from a node other than the anchor.
///
/// Routing and pruning behave as if the operation had been invoked on that node directly.
pub struct Cursor<'a, T> {
    chain: &'a mut BucketChain<T>,
    position: u8,
}

impl<'a, T> Cursor<'a, T> {
    pub fn bit_distance(&self) -> u8 {
        self.position
    }

    /// The node operations start from.
    pub fn bucket(&self) -> &BucketNode<T> {
        self.chain.linked(self.position)
    }

    pub fn chain(&self) -> &BucketChain<T> {
        &*self.chain
    }

    pub fn add(&mut self, id: Identifier, data: T) -> AddOutcome {
        self.chain.add_from(self.position, id, data)
    }

    pub fn remove(&mut self, id: Identifier) -> RemoveOutcome {
        self.chain.remove_from(self.position, id)
    }

    pub fn get(&mut self, id: Identifier) -> Option<PeerData<'_, T>> {
        self.chain.get_from(self.position, id)
    }

    pub fn set(&mut self, id: Identifier, data: T) -> SetOutcome {
        self.chain.set_from(self.position, id, data)
    }

    pub fn update(&mut self, id: Identifier) -> UpdateOutcome {
        self.chain.update_from(self.position, id)
    }

    pub fn nearest(&self, target: Identifier, count: usize) -> Vec<Identifier> {
        self.chain.nearest(target, count)
    }
}

/// Iterator over linked nodes, highest bit distance first.
pub struct Buckets<'a, T> {
    chain: &'a BucketChain<T>,
    next: Option<u8>,
}

impl<'a, T> Iterator for Buckets<'a, T> {
    type Item = &'a BucketNode<T>;

    fn next(&mut self) -> Option<&'a BucketNode<T>> {
        let node = self.chain.bucket(self.next?)?;
        self.next = node.left();

        Some(node)
    }
}

/// One bit distance position as seen by the diagnostics sink.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LayoutEntry {
    Vacant(u8),
    Bucket {
        bit_distance: u8,
        size: usize,
        waitlist_size: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ChainStats {
    pub bucket_count: usize,
    /// Peers held in buckets.
    pub peer_count: usize,
    pub waitlisted_count: usize,
}

// ----------------------------------------------------------------------------//
