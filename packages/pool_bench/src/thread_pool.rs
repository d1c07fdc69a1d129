use std::num::NonZero;
use std::sync::atomic::{self, AtomicUsize};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use crate::{Error, Result};

/// Fixed-size pool of worker threads that applies a function to a shared set of inputs.
///
/// Each worker pulls the next unclaimed input from a shared cursor, so every input is processed
/// exactly once no matter how many threads there are or how unevenly the work is sized.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use new_zealand::nz;
/// use pool_bench::{ThreadPool, summation};
///
/// let inputs: Arc<[u64]> = Arc::from([3, 4]);
/// let mut pool = ThreadPool::new(nz!(2)).unwrap();
///
/// let results = pool.map(&inputs, summation);
/// assert_eq!(&*results, &[4, 10]);
/// ```
///
/// # Lifecycle
///
/// Dropping the pool will wait for all threads to finish executing their tasks.
#[derive(Debug)]
pub struct ThreadPool {
    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,
    thread_count: NonZero<usize>,
}

impl ThreadPool {
    /// Starts a pool with `thread_count` worker threads.
    ///
    /// If any thread fails to start, the threads that did start are shut down before the error
    /// is returned.
    pub fn new(thread_count: NonZero<usize>) -> Result<Self> {
        let mut pool = Self {
            command_txs: Vec::with_capacity(thread_count.get()),
            join_handles: Vec::with_capacity(thread_count.get()),
            thread_count,
        };

        for index in 0..thread_count.get() {
            let (tx, rx) = mpsc::channel();

            let join_handle = thread::Builder::new()
                .name(format!("pool_bench-worker-{index}"))
                .spawn(move || worker_entrypoint(&rx))
                .map_err(|source| Error::SpawnThread { index, source })?;

            pool.command_txs.push(tx);
            pool.join_handles.push(join_handle);
        }

        Ok(pool)
    }

    /// Returns the number of threads in the pool.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Applies `f` to every input across all threads of the pool, waiting for all of them to
    /// complete. Results are returned in input order.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    pub fn map(&mut self, inputs: &Arc<[u64]>, f: fn(u64) -> u128) -> Box<[u128]> {
        // Takes `&mut self` so two concurrent maps cannot interleave their jobs on one pool.

        let cursor = Arc::new(AtomicUsize::new(0));
        let (result_tx, result_rx) = mpsc::channel::<(usize, u128)>();

        for tx in &self.command_txs {
            let inputs = Arc::clone(inputs);
            let cursor = Arc::clone(&cursor);
            let result_tx = result_tx.clone();

            tx.send(Command::Execute(Box::new(move || {
                while let Some(index) = claim_next(&cursor, inputs.len()) {
                    let input = *inputs
                        .get(index)
                        .expect("claim_next only returns indexes within bounds");

                    result_tx
                        .send((index, f(input)))
                        .expect("receiver must still exist - map() waits for all results");
                }
            })))
            .expect("worker thread must still exist - thread pool cannot operate without workers");
        }

        // Only the workers hold senders now, so the receiver drains once every job finished.
        drop(result_tx);

        let mut results = vec![None; inputs.len()];

        for (index, result) in result_rx {
            let slot = results
                .get_mut(index)
                .expect("claim_next only returns indexes within bounds");
            *slot = Some(result);
        }

        results
            .into_iter()
            .map(|result| result.expect("worker thread failed to process an input - did it panic?"))
            .collect()
    }
}

/// Claims the next unprocessed input index, or `None` once all inputs have been claimed.
pub(crate) fn claim_next(cursor: &AtomicUsize, len: usize) -> Option<usize> {
    let index = cursor.fetch_add(1, atomic::Ordering::Relaxed);

    (index < len).then_some(index)
}

impl Drop for ThreadPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // If the thread is panicking, we are probably in a dirty state and shutting down
            // may make the problem worse by hiding the original panic, so just do nothing.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that already exited has nothing to shut down.
            drop(tx.send(Command::Shutdown));
        }

        for handle in self.join_handles.drain(..) {
            handle
                .join()
                .expect("worker thread panicked while executing a job");
        }
    }
}

enum Command {
    Execute(Box<dyn FnOnce() + Send>),
    Shutdown,
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that things do not happen when worker function is missing.
fn worker_entrypoint(rx: &mpsc::Receiver<Command>) {
    while let Ok(Command::Execute(f)) = rx.recv() {
        f();
    }
}
