use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur while measuring batches or writing the report.
///
/// None of these are recoverable: a benchmark run either completes in full or is aborted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread {index}: {source}")]
    SpawnThread {
        /// Zero-based index of the thread within its pool.
        index: usize,

        /// The underlying operating system error.
        source: io::Error,
    },

    /// The operating system refused to start a worker process.
    #[error("failed to spawn worker process '{}': {source}", .program.display())]
    SpawnWorker {
        /// The program that was being launched.
        program: PathBuf,

        /// The underlying operating system error.
        source: io::Error,
    },

    /// Communication with a worker process failed mid-batch.
    #[error("I/O error while talking to worker process {pid}: {source}")]
    WorkerIo {
        /// Process ID of the affected worker.
        pid: u32,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A worker process answered with something that is not a workload result.
    #[error("worker process {pid} sent an invalid response: '{response}'")]
    WorkerProtocol {
        /// Process ID of the affected worker.
        pid: u32,

        /// The offending response line, without its line terminator.
        response: String,

        /// Why the response is not a valid result.
        source: ParseIntError,
    },

    /// A worker process terminated unsuccessfully.
    #[error("worker process {pid} exited with {status}")]
    WorkerExited {
        /// Process ID of the affected worker.
        pid: u32,

        /// The exit status reported by the operating system.
        status: ExitStatus,
    },

    /// The report document could not be written.
    #[error("failed to write report to '{}': {source}", .path.display())]
    WriteReport {
        /// The destination that was being written.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
