//! Statistical functions for column profiling and imputation.

use crate::types::{CategoricalSummary, HistogramBin, NumericSummary, Quartiles};
use std::collections::HashMap;

/// Compute descriptive statistics over valid numeric values.
///
/// Returns `None` for an empty slice.
pub(crate) fn numeric_summary(values: &[f64], max_bins: usize) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    let quartiles = Quartiles {
        q25: quantile(&sorted, 0.25),
        q50: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
    };

    Some(NumericSummary {
        mean,
        median: quartiles.q50,
        std_dev: variance.sqrt(),
        min,
        max,
        quartiles,
        histogram: histogram(&sorted, max_bins),
    })
}

/// Pick the value at sorted index `floor(p * (n - 1))`.
///
/// `sorted` must be non-empty and ascending.
pub(crate) fn quantile(sorted: &[f64], p: f64) -> f64 {
    let idx = (p * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Conventional median: middle value, or the mean of the two middle values.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Bucket sorted values into `min(max_bins, distinct values)` equal-width bins.
///
/// Bins are right-open except the last, which also holds `max`. When every
/// value is equal there is a single bin holding all of them.
pub(crate) fn histogram(sorted: &[f64], max_bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };

    if min == max {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: sorted.len(),
        }];
    }

    let distinct = 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count();
    let bins = max_bins.min(distinct).max(1);
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in sorted {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}

/// Most frequent value and its count; the first-encountered value wins ties.
pub(crate) fn mode<'a>(values: &[&'a str]) -> Option<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(&'a str, usize)> = None;
    for &v in values {
        let count = counts[v];
        // Strictly greater keeps the earliest value on ties.
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((v, count));
        }
    }
    best
}

/// Frequency statistics over valid text values.
///
/// Returns `None` for an empty slice.
pub(crate) fn categorical_summary(values: &[&str]) -> Option<CategoricalSummary> {
    let (value, count) = mode(values)?;
    let unique_count = values
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len();

    Some(CategoricalSummary {
        unique_count,
        most_common_value: value.to_string(),
        most_common_count: count,
        most_common_share: count as f64 / values.len() as f64 * 100.0,
    })
}

/// Percentage of `part` in `total`, 0 for an empty total.
pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
