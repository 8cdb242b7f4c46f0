//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linearly interpolate `value` over a table of breakpoints and values.
///
/// Values below the first breakpoint clamp to the first value, values above
/// the last breakpoint clamp to the last value, and a value exactly on a
/// breakpoint returns that breakpoint's value exactly. Breakpoints are
/// expected to be non-decreasing. If the tables differ in length only the
/// common prefix is used, and an empty table gives zero.
pub fn interp<T>(value: T, breakpoints: &[T], values: &[T]) -> T
where
    T: Float
{
    let n = breakpoints.len().min(values.len());
    let bp = &breakpoints[..n];
    let v = &values[..n];

    // Index of the first breakpoint at or above the value
    let hi = match bp.iter().position(|b| value <= *b) {
        Some(h) => h,
        None => return v.last().copied().unwrap_or_else(T::zero)
    };

    if hi == 0 || value == bp[hi] {
        return v[hi];
    }

    let lo = hi - 1;
    (value - bp[lo]) * (v[hi] - v[lo]) / (bp[hi] - bp[lo]) + v[lo]
}

/// Apply polynomial coefficients to a value.
///
/// Coefficients are ordered highest power first, so `[a, b, c]` gives
/// `a*x^2 + b*x + c`.
pub fn poly_val<T>(value: &T, coeffs: &[T]) -> T
where
    T: Float
{
    let n = coeffs.len() as i32;

    coeffs
        .iter()
        .enumerate()
        .fold(T::zero(), |acc, (i, c)| acc + value.powi(n - 1 - i as i32) * *c)
}

/// Clamp a value between a minimum and a maximum.
///
/// Unlike `f64::clamp` this never panics: if `min > max` the minimum wins,
/// and NaN bounds are ignored.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}
