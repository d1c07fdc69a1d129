use std::fmt::Debug;
use std::num::NonZero;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    Concurrency, Configuration, ProcessPool, Result, ThreadPool, WorkerCommand, summation,
};

/// A way of executing one batch of the workload over a set of inputs.
///
/// An implementation owns the whole lifecycle of its workers: it creates them, distributes
/// the inputs, waits for every result and tears the workers down again before returning.
/// All of that is part of what a batch measures.
pub trait ExecutionStrategy: Debug {
    /// Applies the workload to every input, returning the results in input order.
    fn execute(&self, inputs: &Arc<[u64]>) -> Result<Box<[u128]>>;
}

/// Executes batches on a freshly created [`ThreadPool`].
#[derive(Clone, Copy, Debug)]
pub struct ThreadStrategy {
    threads: NonZero<usize>,
}

impl ThreadStrategy {
    /// A strategy that uses `threads` worker threads per batch.
    #[must_use]
    pub const fn new(threads: NonZero<usize>) -> Self {
        Self { threads }
    }
}

impl ExecutionStrategy for ThreadStrategy {
    fn execute(&self, inputs: &Arc<[u64]>) -> Result<Box<[u128]>> {
        // The pool joins its threads when dropped, on every exit path.
        let mut pool = ThreadPool::new(self.threads)?;

        Ok(pool.map(inputs, summation))
    }
}

/// Executes batches on a freshly spawned [`ProcessPool`].
#[derive(Clone, Debug)]
pub struct ProcessStrategy {
    processes: NonZero<usize>,
    command: WorkerCommand,
}

impl ProcessStrategy {
    /// A strategy that uses `processes` worker processes per batch, each launched with `command`.
    #[must_use]
    pub const fn new(processes: NonZero<usize>, command: WorkerCommand) -> Self {
        Self { processes, command }
    }
}

impl ExecutionStrategy for ProcessStrategy {
    fn execute(&self, inputs: &Arc<[u64]>) -> Result<Box<[u128]>> {
        let mut pool = ProcessPool::spawn(&self.command, self.processes)?;

        let results = pool.map(inputs)?;
        pool.shutdown()?;

        Ok(results)
    }
}

/// Creates the execution strategy that implements `configuration`.
///
/// A worker count based on the processor count is resolved here, once per strategy.
#[must_use]
pub fn strategy_for(
    configuration: &Configuration,
    command: &WorkerCommand,
) -> Box<dyn ExecutionStrategy> {
    let workers = configuration.workers().resolve();

    match configuration.concurrency() {
        Concurrency::Threads => Box::new(ThreadStrategy::new(workers)),
        Concurrency::Processes => Box::new(ProcessStrategy::new(workers, command.clone())),
    }
}

/// Outcome of one measured batch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchRun {
    elapsed: Duration,
    results: Box<[u128]>,
}

impl BatchRun {
    /// Wall-clock time the whole batch took, including worker startup and teardown.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Workload results, in input order.
    #[must_use]
    pub fn results(&self) -> &[u128] {
        &self.results
    }
}

/// Measures batches, regardless of how they are executed.
#[derive(Clone, Copy, Debug, Default)]
#[expect(clippy::exhaustive_structs, reason = "intentionally an empty struct")]
pub struct BatchExecutor;

impl BatchExecutor {
    /// Executes one batch with `strategy`, measuring its wall-clock duration.
    pub fn run_batch(
        &self,
        strategy: &dyn ExecutionStrategy,
        inputs: &Arc<[u64]>,
    ) -> Result<BatchRun> {
        let start = Instant::now();
        let results = strategy.execute(inputs)?;
        let elapsed = start.elapsed();

        debug!(?strategy, ?elapsed, inputs = inputs.len(), "batch completed");

        Ok(BatchRun { elapsed, results })
    }
}
