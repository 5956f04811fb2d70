use std::{
    fmt::Display,
    thread,
    time::{Duration, Instant},
};

use serde::Serialize;
use tracing::info;

use crate::{
    alloc_stats::{self, AllocSnapshot},
    config::TreeParams,
    error::ExecutorError,
    executor::TaskExecutor,
    report::progress,
    rng::SplittableRng,
    search::{SearchSnapshot, TreeSearch},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Check<T> {
    pub expected: T,
    pub actual: T,
}

impl<T: PartialEq + Copy> Check<T> {
    #[must_use]
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

impl<T: Display> Check<T> {
    #[must_use]
    pub fn mismatch_message(&self, what: &str) -> String {
        format!("Incorrect {what} result ({} instead of {}).", self.actual, self.expected)
    }
}

/// Computed totals compared against the expected ones from the input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub size: Check<u64>,
    pub depth: Check<u32>,
    pub leaves: Check<u64>,
}

impl Verdict {
    #[must_use]
    pub fn new(params: &TreeParams, tree_size: u64, stats: &SearchSnapshot) -> Self {
        Self {
            size: Check {
                expected: params.expected_size,
                actual: tree_size,
            },
            depth: Check {
                expected: params.expected_depth,
                actual: stats.max_depth,
            },
            leaves: Check {
                expected: params.expected_leaves,
                actual: stats.leaves,
            },
        }
    }

    /// Only the tree size decides success unless `strict` is set.
    #[must_use]
    pub fn is_successful(&self, strict: bool) -> bool {
        self.size.matches() && (!strict || (self.depth.matches() && self.leaves.matches()))
    }

    #[must_use]
    pub fn mismatches(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.size.matches() {
            messages.push(self.size.mismatch_message("tree size"));
        }
        if !self.depth.matches() {
            messages.push(self.depth.mismatch_message("tree depth"));
        }
        if !self.leaves.matches() {
            messages.push(self.leaves.mismatch_message("number of leaves"));
        }
        messages
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SearchOutcome {
    pub tree_size: u64,
    pub stats: SearchSnapshot,
    pub workers: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub verdict: Verdict,
    pub alloc: Option<AllocSnapshot>,
}

fn serialize_secs<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

impl SearchOutcome {
    #[must_use]
    pub fn nodes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.tree_size as f64 / secs
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn nodes_per_sec_per_worker(&self) -> f64 {
        self.nodes_per_sec() / self.workers.max(1) as f64
    }
}

/// Builds the root, runs the search on an executor and validates the totals.
pub struct Driver {
    params: TreeParams,
    progress_interval: Option<Duration>,
    track_alloc: bool,
}

impl Driver {
    #[must_use]
    pub const fn new(params: TreeParams) -> Self {
        Self {
            params,
            progress_interval: None,
            track_alloc: false,
        }
    }

    #[must_use]
    pub const fn with_progress(mut self, interval: Option<Duration>) -> Self {
        self.progress_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_alloc_tracking(mut self, enabled: bool) -> Self {
        self.track_alloc = enabled;
        self
    }

    #[must_use]
    pub const fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn run<R, E>(&self, executor: &E) -> Result<SearchOutcome, ExecutorError>
    where
        R: SplittableRng,
        E: TaskExecutor,
    {
        let search =
            TreeSearch::<R, E>::new(executor, self.params.policy(), self.params.granularity());
        let guard = self.track_alloc.then(alloc_stats::TrackingGuard::start);
        let start = Instant::now();
        let tree_size = thread::scope(|scope| {
            let stop = self
                .progress_interval
                .map(|interval| progress::spawn(scope, search.stats(), interval, start));
            let result = executor.run(|| {
                let (root, num_children) = search.prepare_root(self.params.root_seed);
                search.search(0, &root, num_children)
            });
            drop(stop);
            result
        })?;
        let elapsed = start.elapsed();
        let alloc = guard.map(|guard| guard.finish());
        let stats = search.stats().snapshot();
        info!(
            tree_size,
            leaves = stats.leaves,
            max_depth = stats.max_depth,
            elapsed_ms = elapsed.as_millis(),
            "search completed"
        );
        Ok(SearchOutcome {
            tree_size,
            stats,
            workers: executor.workers(),
            elapsed,
            verdict: Verdict::new(&self.params, tree_size, &stats),
            alloc,
        })
    }

    /// Repeats the run `runs` times on the same executor.
    pub fn benchmark<R, E>(
        &self,
        executor: &E,
        runs: usize,
    ) -> Result<Vec<SearchOutcome>, ExecutorError>
    where
        R: SplittableRng,
        E: TaskExecutor,
    {
        (0..runs.max(1))
            .map(|run| {
                info!(run = run + 1, runs, "starting run");
                self.run::<R, E>(executor)
            })
            .collect()
    }
}

/// The run with the highest throughput.
#[must_use]
pub fn best_run(outcomes: &[SearchOutcome]) -> Option<&SearchOutcome> {
    outcomes
        .iter()
        .max_by(|a, b| a.nodes_per_sec().total_cmp(&b.nodes_per_sec()))
}
