pub mod alloc_stats;
pub mod branching;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod report;
pub mod rng;
pub mod search;
pub mod spawner;
pub mod tree;

pub use branching::{BranchingPolicy, MAX_NUM_CHILDREN};
pub use config::{RunSettings, TreeParams};
pub use driver::{Driver, SearchOutcome, Verdict};
pub use error::{ConfigError, Error, ExecutorError, Result};
pub use executor::{InlineExecutor, TaskExecutor, WorkStealingPool};
pub use rng::{ShaRng, SplittableRng};
pub use search::{SearchSnapshot, SearchStats, TreeSearch};
pub use tree::Node;
