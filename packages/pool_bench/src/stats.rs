use std::fmt;
use std::num::NonZero;
use std::sync::Arc;
use std::time::Duration;

use crate::{BatchExecutor, ExecutionStrategy, Result};

/// Durations of repeated batches of one configuration, in the order they were measured.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DurationBatch {
    durations: Vec<Duration>,
}

impl DurationBatch {
    /// Creates a batch from already measured durations.
    #[must_use]
    pub fn new(durations: Vec<Duration>) -> Self {
        Self { durations }
    }

    /// Appends a measured duration.
    pub fn push(&mut self, duration: Duration) {
        self.durations.push(duration);
    }

    /// The durations, in measurement order.
    #[must_use]
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// Sorts the durations ascending.
    ///
    /// Sorting happens on the numeric values, never on their formatted representation, which
    /// would misorder values with different numbers of integer digits.
    #[must_use]
    pub fn into_sorted(mut self) -> SortedBatch {
        self.durations.sort_unstable();

        SortedBatch {
            durations: self.durations,
        }
    }
}

/// Durations of repeated batches of one configuration, sorted ascending.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SortedBatch {
    durations: Vec<Duration>,
}

impl SortedBatch {
    /// The durations, ascending.
    #[must_use]
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// Number of durations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// Whether the batch has no durations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// The middle element of the batch, or the lower of the two middle elements if the batch
    /// has an even length. `None` for an empty batch.
    ///
    /// For the standard five repetitions this is the third element.
    #[must_use]
    #[expect(
        clippy::integer_division,
        reason = "rounding down selects the lower middle element"
    )]
    pub fn median(&self) -> Option<Duration> {
        let index = self.durations.len().checked_sub(1)? / 2;

        self.durations.get(index).copied()
    }

    /// The durations in report format, ascending. See [`format_duration()`].
    #[must_use]
    pub fn formatted(&self) -> Vec<String> {
        self.durations.iter().copied().map(format_duration).collect()
    }
}

impl fmt::Display for SortedBatch {
    /// Formats the batch as a bracketed list of quoted report-format values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;

        for (index, duration) in self.durations.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            write!(f, "'{}'", format_duration(*duration))?;
        }

        write!(f, "]")
    }
}

/// Formats a batch duration for display in the report and on the console.
///
/// The value shown is twice the measured duration, in seconds with three decimal places.
/// The doubling is a long-standing convention of this report whose intent is unknown; it is
/// kept so results stay comparable with earlier reports.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format!("{:.3}", duration.saturating_mul(2).as_secs_f64())
}

/// Measures `times` batches with `strategy`, one after another.
pub fn repeat(
    executor: &BatchExecutor,
    strategy: &dyn ExecutionStrategy,
    inputs: &Arc<[u64]>,
    times: NonZero<usize>,
) -> Result<DurationBatch> {
    let mut batch = DurationBatch::new(Vec::with_capacity(times.get()));

    for _ in 0..times.get() {
        batch.push(executor.run_batch(strategy, inputs)?.elapsed());
    }

    Ok(batch)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use new_zealand::nz;

    use super::*;

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn median_of_five() {
        let sorted = DurationBatch::new(millis(&[500, 200, 900, 300, 100])).into_sorted();

        assert_eq!(sorted.durations(), millis(&[100, 200, 300, 500, 900]));
        assert_eq!(sorted.median(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn sorting_is_a_permutation() {
        let original = millis(&[7, 3, 3, 9, 1]);

        let sorted = DurationBatch::new(original.clone()).into_sorted();

        assert_eq!(sorted.len(), original.len());

        let mut expected = original;
        expected.sort();
        assert_eq!(sorted.durations(), expected);
    }

    #[test]
    fn sorting_is_numeric_not_lexicographic() {
        let sorted = DurationBatch::new(vec![Duration::from_secs(5), Duration::from_millis(4_500)])
            .into_sorted();

        // Formatted, "10.000" would sort before "9.000".
        assert_eq!(sorted.formatted(), ["9.000", "10.000"]);
    }

    #[test]
    fn median_of_even_length_is_lower_middle() {
        let sorted = DurationBatch::new(millis(&[4, 1, 3, 2])).into_sorted();

        assert_eq!(sorted.median(), Some(Duration::from_millis(2)));
    }

    #[test]
    fn median_of_single_and_empty() {
        assert_eq!(
            DurationBatch::new(millis(&[42])).into_sorted().median(),
            Some(Duration::from_millis(42))
        );

        let empty = DurationBatch::default().into_sorted();
        assert!(empty.is_empty());
        assert_eq!(empty.median(), None);
    }

    #[test]
    fn format_doubles_and_rounds() {
        assert_eq!(format_duration(Duration::from_millis(1_500)), "3.000");
        assert_eq!(format_duration(Duration::from_micros(1_234_567)), "2.469");
        assert_eq!(format_duration(Duration::ZERO), "0.000");
    }

    #[test]
    fn display_lists_formatted_values() {
        let sorted = DurationBatch::new(millis(&[250, 100])).into_sorted();

        assert_eq!(sorted.to_string(), "['0.200', '0.500']");
    }

    #[derive(Debug, Default)]
    struct CountingStrategy {
        calls: Cell<usize>,
    }

    impl ExecutionStrategy for CountingStrategy {
        fn execute(&self, inputs: &Arc<[u64]>) -> Result<Box<[u128]>> {
            self.calls.set(self.calls.get() + 1);
            Ok(inputs.iter().map(|&n| u128::from(n)).collect())
        }
    }

    #[test]
    fn repeat_runs_requested_number_of_batches() {
        let strategy = CountingStrategy::default();
        let inputs: Arc<[u64]> = Arc::from([1, 2]);

        let batch = repeat(&BatchExecutor, &strategy, &inputs, nz!(5)).unwrap();

        assert_eq!(strategy.calls.get(), 5);
        assert_eq!(batch.durations().len(), 5);
    }
}
