//! End-to-end runs of the benchmark over a scaled-down input set, using real worker processes.

#![cfg(not(miri))]

use std::fs;
use std::sync::Arc;

use new_zealand::nz;
use pool_bench::{BenchConfig, Configuration, WORKER_SUBCOMMAND, WorkerCommand, run};

fn worker_command() -> WorkerCommand {
    WorkerCommand::new(env!("CARGO_BIN_EXE_pool_bench")).arg(WORKER_SUBCOMMAND)
}

/// The standard configurations and repetitions, with inputs small enough for a debug build.
fn scaled_down_config(report_path: std::path::PathBuf) -> BenchConfig {
    BenchConfig {
        inputs: (1..=16_u64).map(|n| n * 10_000).collect::<Arc<[u64]>>(),
        report_path,
        ..BenchConfig::standard()
    }
}

#[test]
fn full_run_writes_complete_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = scaled_down_config(dir.path().join("report.html"));

    let outcome = run(&config, &worker_command()).unwrap();

    assert_eq!(outcome.configurations().len(), 4);

    for configuration in outcome.configurations() {
        let batch = configuration.batch();

        assert_eq!(batch.len(), 5);
        assert!(batch.durations().is_sorted());
        assert_eq!(batch.median(), Some(batch.durations()[2]));
    }

    let html = fs::read_to_string(&config.report_path).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert_eq!(html.matches("<table>").count(), 2);
    assert_eq!(html.matches("</table>").count(), 2);

    // Two header rows, five detail rows and one median row.
    assert_eq!(html.matches("<tr>").count(), 8);

    for configuration in &config.configurations {
        assert_eq!(
            html.matches(&format!("<th>{}</th>", configuration.label()))
                .count(),
            2
        );
    }
}

#[test]
fn repeated_run_overwrites_report() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.html");

    fs::write(&report_path, "previous report").unwrap();

    let config = BenchConfig {
        configurations: vec![Configuration::processes(nz!(2))],
        repetitions: nz!(1),
        inputs: Arc::from([100, 200]),
        report_path: report_path.clone(),
    };

    run(&config, &worker_command()).unwrap();

    let html = fs::read_to_string(&report_path).unwrap();
    assert!(!html.contains("previous report"));
    assert!(html.contains("<th>2 Processes (s)</th>"));
}

#[test]
fn console_format_of_sorted_batches() {
    let dir = tempfile::tempdir().unwrap();

    let config = BenchConfig {
        configurations: vec![Configuration::threads(nz!(1))],
        repetitions: nz!(3),
        inputs: Arc::from([100, 200]),
        report_path: dir.path().join("report.html"),
    };

    let outcome = run(&config, &worker_command()).unwrap();
    let printed = outcome.configurations()[0].batch().to_string();

    assert!(printed.starts_with("['"), "{printed}");
    assert!(printed.ends_with("']"), "{printed}");
    assert_eq!(printed.matches(", ").count(), 2, "{printed}");
}
