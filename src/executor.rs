use std::{num::NonZeroUsize, thread};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ExecutorError;

/// Fork-join contract the search is written against.
pub trait TaskExecutor: Sync {
    fn workers(&self) -> usize;

    /// Runs `op` inside the executor and blocks until it returns.
    fn run<R, OP>(&self, op: OP) -> Result<R, ExecutorError>
    where
        OP: FnOnce() -> R + Send,
        R: Send;

    /// Submits `spawned` as a stealable task, runs `inline` on the calling
    /// context, then blocks until both have finished. A blocked context keeps
    /// executing pending tasks instead of parking.
    fn fork_join<A, B, RA, RB>(&self, inline: A, spawned: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send;
}

pub struct WorkStealingPool {
    pool: ThreadPool,
}

impl WorkStealingPool {
    pub fn new(workers: usize, stack_size: usize) -> Result<Self, ExecutorError> {
        let workers = NonZeroUsize::new(workers).ok_or(ExecutorError::NoWorkers)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .stack_size(stack_size)
            .thread_name(|index| format!("uts-worker-{index}"))
            .build()?;
        Ok(Self { pool })
    }
}

impl TaskExecutor for WorkStealingPool {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn run<R, OP>(&self, op: OP) -> Result<R, ExecutorError>
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        Ok(self.pool.install(op))
    }

    #[inline]
    fn fork_join<A, B, RA, RB>(&self, inline: A, spawned: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        rayon::join(inline, spawned)
    }
}

/// Single-context executor: runs `op` on a dedicated thread and both halves
/// of every fork one after the other.
pub struct InlineExecutor {
    stack_size: usize,
}

impl InlineExecutor {
    #[must_use]
    pub const fn new(stack_size: usize) -> Self {
        Self { stack_size }
    }
}

impl TaskExecutor for InlineExecutor {
    fn workers(&self) -> usize {
        1
    }

    fn run<R, OP>(&self, op: OP) -> Result<R, ExecutorError>
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        thread::scope(|scope| {
            let handle = thread::Builder::new()
                .name("uts-serial".to_string())
                .stack_size(self.stack_size)
                .spawn_scoped(scope, op)
                .map_err(ExecutorError::Thread)?;
            handle.join().map_err(|_| ExecutorError::Panicked)
        })
    }

    #[inline]
    fn fork_join<A, B, RA, RB>(&self, inline: A, spawned: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        let a = inline();
        let b = spawned();
        (a, b)
    }
}
