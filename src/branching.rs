use tracing::{debug, warn};

use crate::{rng::SplittableRng, search::SearchStats, tree::Node};

/// Safety bound on the fan-out of any non-root node.
pub const MAX_NUM_CHILDREN: u32 = 100;

/// Largest accepted root branching factor, `u32::MAX`.
pub const MAX_ROOT_BRANCHING_FACTOR: f64 = 4_294_967_295.0;

const PROB_SCALE: f64 = 2_147_483_648.0;

/// Converts a whole, non-negative child count. `None` when it does not fit.
fn to_count(value: f64) -> Option<u32> {
    if (0.0..=MAX_ROOT_BRANCHING_FACTOR).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}

/// Maps a generator draw onto `[0, 1)`. Negative draws map to `0.0`.
#[must_use]
pub fn to_probability(value: i32) -> (f64, bool) {
    if value < 0 {
        (0.0, true)
    } else {
        (f64::from(value) / PROB_SCALE, false)
    }
}

/// Binomial Galton-Watson branching: the root has `floor(b_0)` children,
/// every other node has `m` children with probability `q` and none otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchingPolicy {
    pub root_branching_factor: f64,
    pub non_leaf_prob: f64,
    pub non_leaf_bf: u32,
}

impl BranchingPolicy {
    #[must_use]
    pub const fn new(root_branching_factor: f64, non_leaf_prob: f64, non_leaf_bf: u32) -> Self {
        Self {
            root_branching_factor,
            non_leaf_prob,
            non_leaf_bf,
        }
    }

    /// Expected number of children of a non-root node, `q * m`.
    #[must_use]
    pub fn expected_branching(&self) -> f64 {
        self.non_leaf_prob * f64::from(self.non_leaf_bf)
    }

    /// Expected size of a non-root subtree, `1 / (1 - q * m)`. Infinite for
    /// critical and supercritical processes.
    #[must_use]
    pub fn expected_subtree_size(&self) -> f64 {
        let branching = self.expected_branching();
        if branching >= 1.0 {
            f64::INFINITY
        } else {
            1.0 / (1.0 - branching)
        }
    }

    fn root_children(&self, stats: &SearchStats) -> u32 {
        let ceil = to_count(self.root_branching_factor.ceil()).unwrap_or(u32::MAX);
        let Some(floor) = to_count(self.root_branching_factor.floor()) else {
            debug!(
                factor = self.root_branching_factor,
                to = ceil,
                "root branching factor does not fit a child count"
            );
            stats.record_truncation();
            return ceil;
        };
        if floor > ceil {
            debug!(from = floor, to = ceil, "number of children of root truncated");
            stats.record_truncation();
            return ceil;
        }
        floor
    }

    fn binomial_children<R: SplittableRng>(
        &self,
        state: &mut R::State,
        stats: &SearchStats,
    ) -> u32 {
        let value = R::next(state);
        let (prob, out_of_range) = to_probability(value);
        if out_of_range {
            warn!(value, "generator value out of range, using probability 0");
            stats.record_range_error();
        }
        if prob < self.non_leaf_prob {
            self.non_leaf_bf
        } else {
            0
        }
    }

    /// Computes the child count of `node` from its height and state.
    ///
    /// Non-root nodes consume one draw from their own state.
    pub fn num_children<R: SplittableRng>(
        &self,
        node: &mut Node<R::State>,
        stats: &SearchStats,
    ) -> u32 {
        if node.is_root() {
            return self.root_children(stats);
        }
        let count = self.binomial_children::<R>(&mut node.state, stats);
        if count > MAX_NUM_CHILDREN {
            debug!(from = count, to = MAX_NUM_CHILDREN, "number of children truncated");
            stats.record_truncation();
            return MAX_NUM_CHILDREN;
        }
        count
    }

    /// Decides the child count once; later calls return the first decision.
    pub fn decide<R: SplittableRng>(
        &self,
        node: &mut Node<R::State>,
        stats: &SearchStats,
    ) -> u32 {
        if let Some(count) = node.num_children() {
            return count;
        }
        let count = self.num_children::<R>(node, stats);
        node.decide_children(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ShaRng;

    fn policy(b0: f64, q: f64, m: u32) -> BranchingPolicy {
        BranchingPolicy::new(b0, q, m)
    }

    #[test]
    fn probability_mapping() {
        assert_eq!(to_probability(0), (0.0, false));
        assert_eq!(to_probability(1 << 30), (0.5, false));
        assert_eq!(to_probability(-5), (0.0, true));
        assert!(to_probability(i32::MAX).0 < 1.0);
    }

    #[test]
    fn root_uses_floor_of_branching_factor() {
        let stats = SearchStats::new();
        let mut root = Node::root::<ShaRng>(0);
        assert_eq!(policy(4.0, 0.5, 4).num_children::<ShaRng>(&mut root, &stats), 4);
        assert_eq!(policy(2.7, 0.5, 4).num_children::<ShaRng>(&mut root, &stats), 2);
        assert_eq!(policy(0.5, 0.5, 4).num_children::<ShaRng>(&mut root, &stats), 0);
        assert_eq!(stats.snapshot().truncated, 0);
    }

    #[test]
    fn root_decision_is_idempotent() {
        let stats = SearchStats::new();
        let policy = policy(3.0, 0.2, 4);
        let mut root = Node::root::<ShaRng>(11);
        let first = policy.num_children::<ShaRng>(&mut root, &stats);
        let second = policy.num_children::<ShaRng>(&mut root, &stats);
        assert_eq!(first, second);
        assert_eq!(root.state, ShaRng::init(11));
    }

    #[test]
    fn zero_probability_never_branches() {
        let stats = SearchStats::new();
        let policy = policy(4.0, 0.0, 4);
        let parent = ShaRng::init(0);
        for index in 0..256 {
            let mut node = Node::new(1, ShaRng::spawn_child(&parent, index));
            assert_eq!(policy.num_children::<ShaRng>(&mut node, &stats), 0);
        }
    }

    #[test]
    fn certain_probability_always_branches() {
        let stats = SearchStats::new();
        let policy = policy(4.0, 1.0, 3);
        let parent = ShaRng::init(9);
        for index in 0..256 {
            let mut node = Node::new(2, ShaRng::spawn_child(&parent, index));
            assert_eq!(policy.num_children::<ShaRng>(&mut node, &stats), 3);
        }
    }

    #[test]
    fn non_root_fan_out_is_capped() {
        let stats = SearchStats::new();
        let policy = policy(1.0, 1.0, 500);
        let mut node = Node::new(1, ShaRng::init(3));
        assert_eq!(policy.num_children::<ShaRng>(&mut node, &stats), MAX_NUM_CHILDREN);
        assert_eq!(stats.snapshot().truncated, 1);
    }

    #[test]
    fn root_may_exceed_cap() {
        let stats = SearchStats::new();
        let policy = policy(250.0, 0.0, 4);
        let mut root = Node::root::<ShaRng>(0);
        assert_eq!(policy.num_children::<ShaRng>(&mut root, &stats), 250);
    }

    #[test]
    fn decide_keeps_first_answer() {
        let stats = SearchStats::new();
        let policy = policy(4.0, 0.5, 4);
        let mut node = Node::new(1, ShaRng::init(5));
        let first = policy.decide::<ShaRng>(&mut node, &stats);
        let state_after = node.state;
        assert_eq!(policy.decide::<ShaRng>(&mut node, &stats), first);
        assert_eq!(node.state, state_after);
    }

    struct NegativeRng;

    impl SplittableRng for NegativeRng {
        type State = u32;

        const NAME: &'static str = "negative";

        fn init(seed: u32) -> u32 {
            seed
        }

        fn next(state: &mut u32) -> i32 {
            *state = state.wrapping_add(1);
            -7
        }

        fn spawn_child(parent: &u32, index: u32) -> u32 {
            parent.wrapping_mul(31).wrapping_add(index)
        }
    }

    #[test]
    fn negative_draw_maps_to_zero_probability_and_continues() {
        let stats = SearchStats::new();
        let mut node = Node::new(1, NegativeRng::init(0));
        let branching = policy(4.0, 0.25, 4).num_children::<NegativeRng>(&mut node, &stats);
        assert_eq!(branching, 4);
        assert_eq!(stats.snapshot().range_errors, 1);

        let mut node = Node::new(2, NegativeRng::init(1));
        let never = policy(4.0, 0.0, 4).num_children::<NegativeRng>(&mut node, &stats);
        assert_eq!(never, 0);
        assert_eq!(stats.snapshot().range_errors, 2);
        assert_eq!(node.state, 2);
    }

    #[test]
    fn oversized_root_factor_saturates_and_is_counted() {
        let stats = SearchStats::new();
        let mut root = Node::root::<ShaRng>(0);
        let count = policy(5e9, 0.0, 4).num_children::<ShaRng>(&mut root, &stats);
        assert_eq!(count, u32::MAX);
        assert_eq!(stats.snapshot().truncated, 1);
        assert_eq!(to_count(MAX_ROOT_BRANCHING_FACTOR), Some(u32::MAX));
        assert_eq!(to_count(-1.0), None);
    }

    #[test]
    fn expected_sizes() {
        let p = policy(4.0, 15.0 / 64.0, 4);
        assert!((p.expected_branching() - 0.9375).abs() < 1e-12);
        assert!((p.expected_subtree_size() - 16.0).abs() < 1e-9);
        assert!(policy(4.0, 0.5, 2).expected_subtree_size().is_infinite());
    }
}
