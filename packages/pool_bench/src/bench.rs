use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    BatchExecutor, BenchConfig, BenchReport, Configuration, Environment, ReportColumn,
    SortedBatch, WorkerCommand, repeat, strategy_for, write_report,
};

/// Sorted measurements of one configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigurationOutcome {
    configuration: Configuration,
    batch: SortedBatch,
}

impl ConfigurationOutcome {
    /// The configuration that was measured.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// The measured batch durations, ascending.
    #[must_use]
    pub fn batch(&self) -> &SortedBatch {
        &self.batch
    }
}

/// Result of a complete benchmark run.
#[derive(Clone, Debug)]
pub struct BenchOutcome {
    configurations: Vec<ConfigurationOutcome>,
    report: BenchReport,
    report_path: PathBuf,
}

impl BenchOutcome {
    /// Measurements of every configuration, in the order they were measured.
    #[must_use]
    pub fn configurations(&self) -> &[ConfigurationOutcome] {
        &self.configurations
    }

    /// The report that was written.
    #[must_use]
    pub fn report(&self) -> &BenchReport {
        &self.report
    }

    /// Where the report was written.
    #[must_use]
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

/// Measures every configuration of `config` and writes the report.
///
/// Configurations and their repetitions run strictly one after another, in the order given by
/// `config`. The report orders its columns by [`Configuration`] instead. Worker processes are
/// launched with `worker_command`.
///
/// Any failure aborts the run. No report is written unless every batch completed.
pub fn run(config: &BenchConfig, worker_command: &WorkerCommand) -> crate::Result<BenchOutcome> {
    let executor = BatchExecutor;

    let mut configurations = Vec::with_capacity(config.configurations.len());

    for configuration in &config.configurations {
        info!(%configuration, repetitions = config.repetitions.get(), "measuring configuration");

        let strategy = strategy_for(configuration, worker_command);
        let batch = repeat(&executor, &*strategy, &config.inputs, config.repetitions)?;

        configurations.push(ConfigurationOutcome {
            configuration: *configuration,
            batch: batch.into_sorted(),
        });
    }

    // The report groups thread-based columns before process-based ones, whatever the run order.
    let mut column_order = configurations.iter().collect::<Vec<_>>();
    column_order.sort_by_key(|outcome| outcome.configuration);

    let columns = column_order
        .into_iter()
        .map(|outcome| ReportColumn::new(outcome.configuration.label(), outcome.batch.clone()))
        .collect();

    let report = BenchReport::new(Environment::capture(), columns);
    write_report(&report, &config.report_path)?;

    Ok(BenchOutcome {
        configurations,
        report,
        report_path: config.report_path.clone(),
    })
}
