#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the pool benchmark.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::process::ExitCode;
use std::time::Instant;

use argh::FromArgs;
use pool_bench::{BenchConfig, WorkerCommand, run, worker};
use tracing_subscriber::EnvFilter;

/// Compares the wall-clock time of a CPU-bound workload on thread pools and process pools,
/// writing the results to report.html in the current directory.
#[derive(FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Worker(WorkerArgs),
}

/// internal: serve workload requests on stdin/stdout for the process pool
#[derive(FromArgs)]
#[argh(subcommand, name = "worker")]
struct WorkerArgs {}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_logging();

    match args.command {
        Some(Command::Worker(WorkerArgs {})) => serve_worker(),
        None => run_benchmark(),
    }
}

#[cfg_attr(test, mutants::skip)]
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Diagnostics go to stderr - stdout carries the results, or the worker protocol.
    drop(
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(filter)
            .try_init(),
    );
}

#[cfg_attr(test, mutants::skip)]
fn serve_worker() -> ExitCode {
    match worker::serve_stdio() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg_attr(test, mutants::skip)]
fn run_benchmark() -> ExitCode {
    let program_start = Instant::now();

    let worker_command = match WorkerCommand::current_exe() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: cannot locate own executable to launch workers: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match run(&BenchConfig::standard(), &worker_command) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for configuration in outcome.configurations() {
        println!("{}", configuration.batch());
    }

    println!(
        "Finished in {} seconds.",
        program_start.elapsed().as_secs_f64()
    );

    ExitCode::SUCCESS
}
