use crate::id::Identifier;

/// Every identifier resident in some bucket of a chain, in insertion order.
///
/// Waitlisted peers are never registered.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    peers: Vec<Identifier>,
}

impl SharedRegistry {
    pub fn new() -> SharedRegistry {
        SharedRegistry { peers: Vec::new() }
    }

    pub(crate) fn insert(&mut self, id: Identifier) {
        self.peers.push(id);
    }

    pub(crate) fn remove(&mut self, id: &Identifier) {
        self.peers.retain(|peer| peer != id);
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.peers.contains(id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> + ExactSizeIterator {
        self.peers.iter()
    }

    /// Up to `count` registered identifiers ordered by XOR distance to `target`.
    ///
    /// Equal distances keep insertion order.
    pub fn nearest(&self, target: Identifier, count: usize) -> Vec<Identifier> {
        let mut scored: Vec<_> = self
            .peers
            .iter()
            .map(|peer| (target.xor_distance(*peer), *peer))
            .collect();

        scored.sort_by_key(|(distance, _)| *distance);
        scored.into_iter().take(count).map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SharedRegistry;
    use crate::test;

    #[test]
    fn positive_initial_empty() {
        let registry = SharedRegistry::new();

        assert!(registry.is_empty());
        assert!(registry.nearest(test::zero_id(), 10).is_empty());
    }

    #[test]
    fn positive_remove_drops_identifier() {
        let mut registry = SharedRegistry::new();
        let first = test::random_id();
        let second = test::random_id();

        registry.insert(first);
        registry.insert(second);
        registry.remove(&first);

        assert!(!registry.contains(&first));
        assert!(registry.contains(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn positive_nearest_sorted_by_distance() {
        let mut registry = SharedRegistry::new();
        let far = test::id("0xff00000000000000000000000000000000000000");
        let near = test::id("0x0000000000000000000000000000000000000003");
        let middle = test::id("0x0000000000000000000000000000000000ff0000");

        for id in [far, near, middle] {
            registry.insert(id);
        }

        assert_eq!(
            registry.nearest(test::zero_id(), 10),
            vec![near, middle, far]
        );
        assert_eq!(registry.nearest(test::zero_id(), 2), vec![near, middle]);
        assert!(registry.nearest(test::zero_id(), 0).is_empty());
    }

    #[test]
    fn positive_nearest_includes_exact_match_first() {
        let mut registry = SharedRegistry::new();
        let target = test::random_id();

        for _ in 0..20 {
            registry.insert(test::random_id());
        }
        registry.insert(target);

        assert_eq!(registry.nearest(target, 1), vec![target]);
    }
}
