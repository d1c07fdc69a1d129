use std::hint::black_box;

/// The CPU-bound workload that every configuration executes.
///
/// Computes `Σ (num - i) * i` for `i` in `1..=num` with an explicit accumulation loop. The work
/// is linear in `num`, which is what makes the function a meaningful timing target - a closed
/// form would finish instantly regardless of the concurrency model in use.
///
/// The result is 128 bits wide because the largest inputs of the standard configuration
/// produce values around 10^23.
///
/// # Examples
///
/// ```
/// use pool_bench::summation;
///
/// assert_eq!(summation(4), 10);
/// ```
#[must_use]
#[expect(
    clippy::arithmetic_side_effects,
    reason = "i <= num and the total is at most num^3 / 6, which fits in u128 for any u64 input"
)]
pub fn summation(num: u64) -> u128 {
    let num = u128::from(num);
    let mut result: u128 = 0;

    for i in 1..=num {
        // Keeps the optimizer from collapsing the loop into a closed form.
        let i = black_box(i);

        result += (num - i) * i;
    }

    result
}
