#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Measures how long a fixed CPU-bound workload takes under different concurrency models and
//! renders the results as a static HTML report.
//!
//! The same [`summation()`] workload is applied to a fixed set of inputs under every
//! [`Configuration`], so differences in timing isolate the overhead of the concurrency model:
//!
//! - [`ThreadPool`] - worker threads inside the benchmark process.
//! - [`ProcessPool`] - worker processes that speak a line-based protocol on their standard
//!   streams (see [`worker`]).
//!
//! Both are driven through the [`ExecutionStrategy`] trait and timed by the single
//! [`BatchExecutor`], which measures the whole create-distribute-wait-teardown cycle of a batch.
//! Each configuration is measured several times; the sorted durations and their median end up
//! in a [`BenchReport`].
//!
//! The binary entry point is in `main.rs`. It runs [`BenchConfig::standard()`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use new_zealand::nz;
//! use pool_bench::{BatchExecutor, ThreadStrategy, repeat};
//!
//! let inputs: Arc<[u64]> = Arc::from([1_000, 2_000, 3_000]);
//!
//! let batch = repeat(&BatchExecutor, &ThreadStrategy::new(nz!(2)), &inputs, nz!(5)).unwrap();
//! let sorted = batch.into_sorted();
//!
//! println!("median: {:?}", sorted.median());
//! ```

mod bench;
mod config;
mod environment;
mod error;
mod executor;
mod process_pool;
mod report;
mod stats;
mod thread_pool;
mod workload;

pub mod worker;

pub use bench::*;
pub use config::*;
pub use environment::*;
pub use error::*;
pub use executor::*;
pub use process_pool::*;
pub use report::*;
pub use stats::*;
pub use thread_pool::*;
pub use workload::*;
