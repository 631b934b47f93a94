//! Metric normalization shared by every report
//!
//! All derived numeric columns (rates, shares, rankings) go through this module
//! so that the same input yields the same bits in every report:
//!
//! - `percentage` never divides by zero and never yields NaN/Infinity
//! - displayed percentages are rounded half-up to one decimal place
//! - rankings use a stable sort with an explicit, total tie-break chain

use std::cmp::Ordering;

/// Nudge for values that land a hair under a .x5 boundary after binary scaling
const ROUNDING_EPSILON: f64 = 1e-9;

/// Round half-up to one decimal place. Non-finite input becomes 0.
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let rounded = ((value * 10.0) + 0.5 + ROUNDING_EPSILON).floor() / 10.0;
    // Avoid serialising -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `numerator / denominator * 100`, rounded for display.
///
/// Returns 0 when the denominator is zero, negative or non-finite. Values above
/// 100 are returned as-is; callers decide whether that is an anomaly.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if !numerator.is_finite() || !denominator.is_finite() || denominator <= 0.0 {
        return 0.0;
    }
    round_one_decimal(numerator * 100.0 / denominator)
}

/// Completed claims over all claims, as a display percentage
pub fn success_rate(completed: u64, total: u64) -> f64 {
    percentage(completed as f64, total as f64)
}

/// Shares of `values` in one-decimal percentages that add up to exactly 100.0.
///
/// Largest-remainder apportionment over 1000 tenths: every share is floored,
/// then the leftover tenths go to the largest remainders, ties broken by
/// `labels` ascending. A zero, negative or non-finite total yields all zeros.
pub fn apportion_percentages(values: &[f64], labels: &[&str]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if values.is_empty()
        || !total.is_finite()
        || total <= 0.0
        || values.iter().any(|v| !v.is_finite() || *v < 0.0)
    {
        return values.iter().map(|v| percentage(*v, total)).collect();
    }

    let exact: Vec<f64> = values.iter().map(|v| v * 1000.0 / total).collect();
    let mut tenths: Vec<u64> = exact
        .iter()
        .map(|e| (e + ROUNDING_EPSILON).floor() as u64)
        .collect();

    let assigned: u64 = tenths.iter().sum();
    let leftover = 1000u64.saturating_sub(assigned) as usize;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let rem_a = exact[a] - tenths[a] as f64;
        let rem_b = exact[b] - tenths[b] as f64;
        desc(rem_a, rem_b)
            .then_with(|| asc_text(labels.get(a).copied().unwrap_or(""), labels.get(b).copied().unwrap_or("")))
            .then_with(|| a.cmp(&b))
    });
    for &index in order.iter().cycle().take(leftover) {
        tenths[index] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}

/// Whether a set of shares adds up to 100 within `tolerance`
pub fn sums_to_hundred(values: &[f64], tolerance: f64) -> bool {
    let sum: f64 = values.iter().sum();
    (sum - 100.0).abs() <= tolerance + ROUNDING_EPSILON
}

/// Descending order for numeric ranking keys
pub fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Ascending order for text tie-breaks
pub fn asc_text(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// Stable sort with a caller-supplied comparator chain.
///
/// Equal elements keep their input order, so callers must end the chain on a
/// unique key to make the result independent of the store's row order.
pub fn rank<T, F>(mut rows: Vec<T>, compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    rows.sort_by(compare);
    rows
}
