//! Integration tests that launch real worker processes from the `pool_bench` binary.

#![cfg(not(miri))]

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use new_zealand::nz;
use pool_bench::{
    BatchExecutor, Error, ExecutionStrategy, ProcessPool, ProcessStrategy, ThreadStrategy,
    WORKER_SUBCOMMAND, WorkerCommand, summation,
};

/// A command that launches the benchmark binary as a worker process.
fn worker_command() -> WorkerCommand {
    WorkerCommand::new(env!("CARGO_BIN_EXE_pool_bench")).arg(WORKER_SUBCOMMAND)
}

fn sample_inputs() -> Arc<[u64]> {
    (1..=16_u64).map(|n| n * 997).collect()
}

#[test]
fn worker_binary_speaks_protocol() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pool_bench"))
        .arg(WORKER_SUBCOMMAND)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"4\n3\n100\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "10\n4\n166650\n");
}

#[test]
fn worker_binary_rejects_garbage() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pool_bench"))
        .arg(WORKER_SUBCOMMAND)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"not a number\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
}

#[test]
fn pool_processes_every_input_once_in_order() {
    let inputs = sample_inputs();

    let mut pool = ProcessPool::spawn(&worker_command(), nz!(4)).unwrap();
    assert_eq!(pool.process_count(), 4);

    let results = pool.map(&inputs).unwrap();
    pool.shutdown().unwrap();

    let expected = inputs.iter().map(|&n| summation(n)).collect::<Vec<_>>();
    assert_eq!(&*results, expected.as_slice());
}

/// A command that launches a worker behind `tee`, so every request a worker process receives
/// is also appended to a log file of its own in `log_dir`.
fn logging_worker_command(log_dir: &Path) -> WorkerCommand {
    let script = format!(
        "tee '{}/requests.'$$ | '{}' {WORKER_SUBCOMMAND}",
        log_dir.display(),
        env!("CARGO_BIN_EXE_pool_bench")
    );

    WorkerCommand::new("sh").arg("-c").arg(script)
}

#[test]
fn pool_sends_every_input_exactly_once() {
    if cfg!(windows) {
        return;
    }

    let log_dir = tempfile::tempdir().unwrap();
    let inputs = sample_inputs();

    let mut pool = ProcessPool::spawn(&logging_worker_command(log_dir.path()), nz!(4)).unwrap();
    let results = pool.map(&inputs).unwrap();

    // Every worker has exited after this, so the logs are complete.
    pool.shutdown().unwrap();

    assert_eq!(results.len(), inputs.len());

    let logs = fs::read_dir(log_dir.path())
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect::<Vec<_>>();

    // One log per worker process.
    assert_eq!(logs.len(), 4);

    let mut requests = HashMap::<u64, usize>::new();

    for line in logs.iter().flat_map(|log| log.lines()) {
        *requests.entry(line.trim().parse().unwrap()).or_default() += 1;
    }

    assert_eq!(requests.len(), inputs.len());

    for input in inputs.iter() {
        assert_eq!(
            requests.get(input),
            Some(&1),
            "input {input} was not sent exactly once"
        );
    }
}

#[test]
fn pool_is_reusable_across_maps() {
    let mut pool = ProcessPool::spawn(&worker_command(), nz!(2)).unwrap();

    let first = pool.map(&[4, 3]).unwrap();
    let second = pool.map(&[4, 3]).unwrap();
    pool.shutdown().unwrap();

    assert_eq!(&*first, &[10, 4]);
    assert_eq!(first, second);
}

#[test]
fn more_processes_than_inputs() {
    let mut pool = ProcessPool::spawn(&worker_command(), nz!(6)).unwrap();

    let results = pool.map(&[4]).unwrap();
    pool.shutdown().unwrap();

    assert_eq!(&*results, &[10]);
}

#[test]
fn process_and_thread_strategies_agree() {
    let inputs = sample_inputs();

    let processes = ProcessStrategy::new(nz!(4), worker_command())
        .execute(&inputs)
        .unwrap();
    let threads = ThreadStrategy::new(nz!(4)).execute(&inputs).unwrap();
    let single = ThreadStrategy::new(nz!(1)).execute(&inputs).unwrap();

    assert_eq!(processes, threads);
    assert_eq!(threads, single);
}

#[test]
fn timed_process_batch() {
    let inputs = sample_inputs();
    let strategy = ProcessStrategy::new(nz!(2), worker_command());

    let run = BatchExecutor.run_batch(&strategy, &inputs).unwrap();

    assert_eq!(run.results().len(), inputs.len());
    assert!(!run.elapsed().is_zero());
}

#[test]
fn worker_that_is_not_a_worker_is_a_protocol_error() {
    // `yes` ignores its input and answers with something that is not a number.
    if cfg!(windows) {
        return;
    }

    let mut pool = ProcessPool::spawn(&WorkerCommand::new("yes"), nz!(1)).unwrap();

    let error = pool.map(&[4]).unwrap_err();

    assert!(matches!(error, Error::WorkerProtocol { .. }), "{error}");
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn worker_that_exits_immediately_is_an_io_error() {
    if cfg!(windows) {
        return;
    }

    let mut pool = ProcessPool::spawn(&WorkerCommand::new("true"), nz!(1)).unwrap();

    let error = pool.map(&[4]).unwrap_err();

    assert!(matches!(error, Error::WorkerIo { .. }), "{error}");
}

#[test]
fn failing_worker_exit_is_reported_on_shutdown() {
    if cfg!(windows) {
        return;
    }

    // `false` ignores its input and exits unsuccessfully.
    let pool = ProcessPool::spawn(&WorkerCommand::new("false"), nz!(2)).unwrap();

    let error = pool.shutdown().unwrap_err();

    assert!(matches!(error, Error::WorkerExited { .. }), "{error}");
}
