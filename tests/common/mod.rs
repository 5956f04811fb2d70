#![allow(dead_code)]

use uts::{BranchingPolicy, Node, SearchStats, ShaRng, SplittableRng, TreeParams};

pub const STACK: usize = 16 * 1024 * 1024;

pub fn params(
    root_branching_factor: f64,
    non_leaf_prob: f64,
    non_leaf_bf: u32,
    root_seed: u32,
) -> TreeParams {
    TreeParams {
        root_branching_factor,
        non_leaf_prob,
        non_leaf_bf,
        root_seed,
        compute_granularity: 1,
        expected_size: 0,
        expected_depth: 0,
        expected_leaves: 0,
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Census {
    pub nodes: u64,
    pub leaves: u64,
    pub max_depth: u32,
}

/// Sequential walk with an explicit work list, independent of the spawner.
pub fn census(params: &TreeParams) -> Census {
    let policy: BranchingPolicy = params.policy();
    let stats = SearchStats::new();
    let mut census = Census::default();
    let mut pending = vec![Node::root::<ShaRng>(params.root_seed)];
    while let Some(mut node) = pending.pop() {
        let num_children = policy.decide::<ShaRng>(&mut node, &stats);
        census.nodes += 1;
        if num_children == 0 {
            census.leaves += 1;
        }
        census.max_depth = census.max_depth.max(node.height);
        for index in 0..num_children {
            pending.push(Node::new(node.height + 1, ShaRng::spawn_child(&node.state, index)));
        }
    }
    census
}
