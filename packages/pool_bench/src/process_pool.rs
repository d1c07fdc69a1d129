use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::AtomicUsize;
use std::{env, mem, thread};

use crate::thread_pool::claim_next;
use crate::{Error, Result};

/// The name of the hidden subcommand that turns the `pool_bench` binary into a worker process.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Describes how to launch one worker process of a [`ProcessPool`].
///
/// The launched program must speak the worker protocol on its standard streams, as implemented
/// by [`crate::worker::serve()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl WorkerCommand {
    /// A command that launches `program` without arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument to the command line of the worker.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// A command that relaunches the currently running binary as a worker.
    ///
    /// This is only meaningful when the current binary is `pool_bench` itself.
    pub fn current_exe() -> io::Result<Self> {
        Ok(Self::new(env::current_exe()?).arg(WORKER_SUBCOMMAND))
    }

    /// The program that will be launched.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);

        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        command
    }
}

/// Fixed-size pool of worker processes that applies the workload to a shared set of inputs.
///
/// Each worker process is fed by a dedicated driver thread that pulls the next unclaimed input
/// from a shared cursor, so every input is processed exactly once no matter how many processes
/// there are.
///
/// # Lifecycle
///
/// Call [`shutdown()`][Self::shutdown] to let the workers exit cleanly and observe their exit
/// status. Dropping the pool without shutting it down kills any remaining workers.
#[derive(Debug)]
pub struct ProcessPool {
    workers: Vec<Worker>,
}

impl ProcessPool {
    /// Starts `count` worker processes using `command`.
    ///
    /// If any process fails to start, the processes that did start are killed before the error
    /// is returned.
    pub fn spawn(command: &WorkerCommand, count: NonZero<usize>) -> Result<Self> {
        let mut pool = Self {
            workers: Vec::with_capacity(count.get()),
        };

        for _ in 0..count.get() {
            pool.workers.push(Worker::spawn(command)?);
        }

        Ok(pool)
    }

    /// Returns the number of worker processes in the pool.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.workers.len()
    }

    /// Applies the workload to every input across all worker processes, waiting for all of them
    /// to complete. Results are returned in input order.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    pub fn map(&mut self, inputs: &[u64]) -> Result<Box<[u128]>> {
        let cursor = &AtomicUsize::new(0);

        let partials = thread::scope(|s| {
            let drivers = self
                .workers
                .iter_mut()
                .map(|worker| s.spawn(move || worker.drive(inputs, cursor)))
                .collect::<Vec<_>>();

            drivers
                .into_iter()
                .map(|driver| driver.join().expect("driver thread panicked"))
                .collect::<Vec<_>>()
        });

        let mut results = vec![None; inputs.len()];

        for partial in partials {
            for (index, result) in partial? {
                let slot = results
                    .get_mut(index)
                    .expect("claim_next only returns indexes within bounds");
                debug_assert!(slot.is_none(), "input {index} was answered more than once");
                *slot = Some(result);
            }
        }

        Ok(results
            .into_iter()
            .map(|result| result.expect("every claimed input was answered or an error returned"))
            .collect())
    }

    /// Closes the input of every worker and waits for all of them to exit.
    ///
    /// All workers are waited for even if some of them fail. The first failure is returned.
    pub fn shutdown(mut self) -> Result<()> {
        let mut outcome = Ok(());

        for worker in mem::take(&mut self.workers) {
            let result = worker.finish();

            if outcome.is_ok() {
                outcome = result;
            }
        }

        outcome
    }
}

impl Drop for ProcessPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.kill();
        }
    }
}

#[derive(Debug)]
struct Worker {
    child: Child,

    // Taken when the worker is asked to exit, which closes the pipe.
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(command: &WorkerCommand) -> Result<Self> {
        let mut child = command
            .to_command()
            .spawn()
            .map_err(|source| Error::SpawnWorker {
                program: command.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().expect("stdin is configured as piped");
        let stdout = child.stdout.take().expect("stdout is configured as piped");

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }

    /// Feeds inputs to the worker one at a time until the shared cursor runs out.
    fn drive(&mut self, inputs: &[u64], cursor: &AtomicUsize) -> Result<Vec<(usize, u128)>> {
        let pid = self.child.id();
        let io_error = |source| Error::WorkerIo { pid, source };

        let stdin = self
            .stdin
            .as_mut()
            .expect("stdin is only taken when the worker is finished");

        let mut answered = Vec::new();
        let mut line = String::new();

        while let Some(index) = claim_next(cursor, inputs.len()) {
            let input = inputs
                .get(index)
                .expect("claim_next only returns indexes within bounds");

            writeln!(stdin, "{input}").map_err(io_error)?;
            stdin.flush().map_err(io_error)?;

            line.clear();

            if self.stdout.read_line(&mut line).map_err(io_error)? == 0 {
                return Err(io_error(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "worker closed its output before answering",
                )));
            }

            let response = line.trim();

            let result = response
                .parse::<u128>()
                .map_err(|source| Error::WorkerProtocol {
                    pid,
                    response: response.to_string(),
                    source,
                })?;

            answered.push((index, result));
        }

        Ok(answered)
    }

    fn finish(mut self) -> Result<()> {
        let pid = self.child.id();

        // Closing stdin is the signal for the worker to exit.
        drop(self.stdin.take());

        let status = self
            .child
            .wait()
            .map_err(|source| Error::WorkerIo { pid, source })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::WorkerExited { pid, status })
        }
    }

    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn kill(&mut self) {
        drop(self.stdin.take());

        // The worker may already have exited, in which case there is nothing to kill.
        drop(self.child.kill());
        drop(self.child.wait());
    }
}
