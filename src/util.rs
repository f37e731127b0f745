/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// # use deepq::assert_interval;
/// let eps_end = 2.0;
/// assert_interval!(eps_end, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`eps_end\`. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

/// Arithmetic mean of a sequence of scores, `0.0` when empty
pub(crate) fn mean<'a>(values: impl IntoIterator<Item = &'a f32>) -> f32 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0f32, 0usize), |(sum, n), x| (sum + x, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}
