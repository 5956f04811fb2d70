use std::{hint, marker::PhantomData};

use smallvec::{SmallVec, smallvec};

use crate::{
    branching::BranchingPolicy, executor::TaskExecutor, rng::SplittableRng, spawner::divide_conquer,
    tree::Node,
};

mod stats;

pub use stats::{SearchSnapshot, SearchStats};

type ChildCounts = SmallVec<[u64; 4]>;

/// Recursive parallel enumeration of a generated tree.
pub struct TreeSearch<'e, R, E> {
    executor: &'e E,
    policy: BranchingPolicy,
    granularity: u32,
    stats: SearchStats,
    _rng: PhantomData<fn() -> R>,
}

impl<'e, R, E> TreeSearch<'e, R, E>
where
    R: SplittableRng,
    E: TaskExecutor,
{
    #[must_use]
    pub fn new(executor: &'e E, policy: BranchingPolicy, granularity: u32) -> Self {
        Self {
            executor,
            policy,
            granularity: granularity.max(1),
            stats: SearchStats::new(),
            _rng: PhantomData,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &BranchingPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub const fn executor(&self) -> &'e E {
        self.executor
    }

    /// Builds the root for `seed`, decides its fan-out and records it.
    pub fn prepare_root(&self, seed: u32) -> (Node<R::State>, u32) {
        let mut root = Node::root::<R>(seed);
        let num_children = self.policy.decide::<R>(&mut root, &self.stats);
        self.stats.record_node(root.height, num_children);
        (root, num_children)
    }

    /// Returns the number of nodes in the subtree of `parent`, itself included.
    pub fn search(&self, depth: u32, parent: &Node<R::State>, num_children: u32) -> u64 {
        debug_assert_eq!(depth, parent.height);
        let mut counts: ChildCounts = smallvec![0; num_children as usize];
        divide_conquer(self.executor, 0, &mut counts, &|index, slot: &mut u64| {
            *slot = self.expand_child(depth, parent, index);
        });
        counts.iter().fold(1u64, |total, &count| total.saturating_add(count))
    }

    fn expand_child(&self, depth: u32, parent: &Node<R::State>, index: usize) -> u64 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        let mut child = Node::new(parent.height + 1, self.derive_state(&parent.state, index));
        let num_children = self.policy.decide::<R>(&mut child, &self.stats);
        self.stats.record_node(child.height, num_children);
        self.search(depth + 1, &child, num_children)
    }

    /// Only the last derivation is kept; the repeats simulate per-node work.
    fn derive_state(&self, parent: &R::State, index: u32) -> R::State {
        let mut state = R::spawn_child(parent, index);
        for _ in 1..self.granularity {
            state = hint::black_box(R::spawn_child(hint::black_box(parent), index));
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        executor::{InlineExecutor, WorkStealingPool},
        rng::ShaRng,
    };

    const STACK: usize = 8 * 1024 * 1024;

    fn count_tree<E: TaskExecutor>(
        executor: &E,
        policy: BranchingPolicy,
        seed: u32,
    ) -> (u64, SearchSnapshot) {
        let search = TreeSearch::<ShaRng, _>::new(executor, policy, 1);
        let total = executor
            .run(|| {
                let (root, n) = search.prepare_root(seed);
                search.search(0, &root, n)
            })
            .unwrap();
        (total, search.stats().snapshot())
    }

    #[test]
    fn star_tree_has_root_plus_children() {
        let executor = InlineExecutor::new(STACK);
        let (total, stats) = count_tree(&executor, BranchingPolicy::new(6.0, 0.0, 4), 0);
        assert_eq!(total, 7);
        assert_eq!(stats.leaves, 6);
        assert_eq!(stats.max_depth, 1);
    }

    #[test]
    fn childless_root_is_a_leaf() {
        let executor = InlineExecutor::new(STACK);
        let (total, stats) = count_tree(&executor, BranchingPolicy::new(0.0, 0.5, 4), 0);
        assert_eq!(total, 1);
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.max_depth, 0);
    }

    #[test]
    fn counters_agree_with_returned_total() {
        let pool = WorkStealingPool::new(4, STACK).unwrap();
        let (total, stats) = count_tree(&pool, BranchingPolicy::new(20.0, 0.2, 4), 17);
        assert_eq!(stats.nodes(), total);
    }

    #[test]
    fn granularity_does_not_change_states() {
        let executor = InlineExecutor::new(STACK);
        let policy = BranchingPolicy::new(4.0, 0.2, 4);
        let coarse = TreeSearch::<ShaRng, _>::new(&executor, policy, 1);
        let fine = TreeSearch::<ShaRng, _>::new(&executor, policy, 5);
        let parent = ShaRng::init(3);
        for index in 0..8 {
            assert_eq!(coarse.derive_state(&parent, index), fine.derive_state(&parent, index));
        }
    }
}
