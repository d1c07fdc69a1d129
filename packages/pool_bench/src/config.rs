use std::fmt;
use std::num::NonZero;
use std::path::PathBuf;
use std::sync::Arc;

use many_cpus::SystemHardware;
use new_zealand::nz;

/// The inputs every batch of the standard configuration applies the workload to.
pub const STANDARD_INPUTS: [u64; 16] = [
    15_972_490, 80_247_910, 92_031_257, 75_940_266, 97_986_012, 87_599_664, 75_231_321,
    11_138_524, 68_870_499, 11_872_796, 79_132_533, 40_649_382, 63_886_074, 53_146_293,
    36_914_087, 62_770_938,
];

/// How many times each configuration is measured in the standard configuration.
pub const STANDARD_REPETITIONS: NonZero<usize> = nz!(5);

/// Where the standard configuration writes its report, relative to the working directory.
pub const STANDARD_REPORT_FILE_NAME: &str = "report.html";

/// The kind of worker a configuration distributes its inputs to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum Concurrency {
    /// Worker threads inside the benchmark process.
    Threads,

    /// Separate worker processes.
    Processes,
}

/// How many workers a configuration uses.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum WorkerCount {
    /// A fixed number of workers.
    Fixed(NonZero<usize>),

    /// One worker per active processor of the host.
    AllProcessors,
}

impl WorkerCount {
    /// Resolves the worker count to a concrete number.
    ///
    /// For [`WorkerCount::AllProcessors`] this inspects the hardware every time it is called.
    #[must_use]
    pub fn resolve(self) -> NonZero<usize> {
        match self {
            Self::Fixed(count) => count,
            Self::AllProcessors => host_processor_count(),
        }
    }
}

/// Number of active logical processors on the host, never less than one.
///
/// This counts every processor of the machine, including those that affinity or resource
/// quotas keep the current process from using.
#[must_use]
pub fn host_processor_count() -> NonZero<usize> {
    NonZero::new(SystemHardware::current().active_processor_count()).unwrap_or(nz!(1))
}

/// One concurrency setup that is measured and reported as a single column.
///
/// Configurations order threads before processes, then by worker count, with a count based on
/// the processor count last. This is the column order of the report.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Configuration {
    concurrency: Concurrency,
    workers: WorkerCount,
}

impl Configuration {
    /// A configuration that uses `count` worker threads.
    #[must_use]
    pub const fn threads(count: NonZero<usize>) -> Self {
        Self {
            concurrency: Concurrency::Threads,
            workers: WorkerCount::Fixed(count),
        }
    }

    /// A configuration that uses `count` worker processes.
    #[must_use]
    pub const fn processes(count: NonZero<usize>) -> Self {
        Self {
            concurrency: Concurrency::Processes,
            workers: WorkerCount::Fixed(count),
        }
    }

    /// A configuration that uses one worker process per active processor of the host.
    #[must_use]
    pub const fn processes_per_processor() -> Self {
        Self {
            concurrency: Concurrency::Processes,
            workers: WorkerCount::AllProcessors,
        }
    }

    /// The kind of worker this configuration uses.
    #[must_use]
    pub const fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// How many workers this configuration uses.
    #[must_use]
    pub const fn workers(&self) -> WorkerCount {
        self.workers
    }

    /// The column heading used for this configuration in the report.
    #[must_use]
    pub fn label(&self) -> String {
        match (self.concurrency, self.workers) {
            (Concurrency::Threads, WorkerCount::Fixed(count)) if count.get() == 1 => {
                "1 Thread (s)".to_string()
            }
            (Concurrency::Threads, WorkerCount::Fixed(count)) => format!("{count} Threads (s)"),
            (Concurrency::Threads, WorkerCount::AllProcessors) => {
                "Threads Based on Number of CPU(s)".to_string()
            }
            (Concurrency::Processes, WorkerCount::Fixed(count)) if count.get() == 1 => {
                "1 Process (s)".to_string()
            }
            (Concurrency::Processes, WorkerCount::Fixed(count)) => {
                format!("{count} Processes (s)")
            }
            (Concurrency::Processes, WorkerCount::AllProcessors) => {
                "Processes Based on Number of CPU(s)".to_string()
            }
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.concurrency {
            Concurrency::Threads => "threads",
            Concurrency::Processes => "processes",
        };

        match self.workers {
            WorkerCount::Fixed(count) => write!(f, "{count} {kind}"),
            WorkerCount::AllProcessors => write!(f, "{kind} per processor"),
        }
    }
}

/// Everything a benchmark run needs to know, injected at the entry point.
///
/// The binary always uses [`BenchConfig::standard()`]. Tests construct smaller configurations
/// so that a full run takes milliseconds instead of minutes.
#[derive(Clone, Debug)]
#[expect(
    clippy::exhaustive_structs,
    reason = "plain settings record, tests build it field by field"
)]
pub struct BenchConfig {
    /// The configurations to measure. They run and are printed in this order, one after
    /// another.
    pub configurations: Vec<Configuration>,

    /// How many batches to measure per configuration.
    pub repetitions: NonZero<usize>,

    /// The inputs every batch applies the workload to. Shared read-only by all workers.
    pub inputs: Arc<[u64]>,

    /// Where to write the report. An existing file is overwritten.
    pub report_path: PathBuf,
}

impl BenchConfig {
    /// The fixed configuration of the benchmark: four processes, one process per processor,
    /// one thread and four threads, five repetitions each, over [`STANDARD_INPUTS`].
    #[must_use]
    pub fn standard() -> Self {
        Self {
            configurations: vec![
                Configuration::processes(nz!(4)),
                Configuration::processes_per_processor(),
                Configuration::threads(nz!(1)),
                Configuration::threads(nz!(4)),
            ],
            repetitions: STANDARD_REPETITIONS,
            inputs: Arc::from(STANDARD_INPUTS),
            report_path: PathBuf::from(STANDARD_REPORT_FILE_NAME),
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::standard()
    }
}
