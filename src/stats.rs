//! Descriptive statistics over column values.
//!
//! All functions work on the observed (non-missing) values only. Quantiles use
//! linear interpolation between closest ranks, the same definition as the
//! default in most dataframe libraries.

use std::collections::BTreeMap;

/// Observed values of a numeric column, in row order.
pub fn observed(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// Observed values, sorted ascending.
pub fn sorted_observed(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted = observed(values);
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    Some(values.iter().sum::<f64>() / n)
}

/// Sample standard deviation (one delta degree of freedom).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let denom = (values.len() - 1) as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / denom;
    Some(var.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Quantile `q` of an already-sorted slice.
///
/// `None` for an empty slice, a `q` outside `0..=1`, or when the result is
/// not a finite number.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    let a = *sorted.get(lo)?;
    let b = *sorted.get(hi)?;
    // Weighted form: `b - a` can overflow for values of opposite sign.
    let value = if frac == 0.0 || a == b {
        a
    } else {
        a * (1.0 - frac) + b * frac
    };
    value.is_finite().then_some(value)
}

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Most frequent value; ties go to the smallest.
pub fn mode<T: Ord + Clone>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, so the first maximum wins ties.
    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v)
}

/// Numeric mode, comparing by total order.
pub fn mode_f64(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut best: Option<(f64, usize)> = None;
    let mut iter = sorted.into_iter().peekable();
    while let Some(v) = iter.next() {
        let mut count = 1;
        while iter.next_if(|next| next.total_cmp(&v).is_eq()).is_some() {
            count += 1;
        }
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((v, count));
        }
    }
    best.map(|(v, _)| v)
}

/// Tukey fences around the interquartile range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.lower, self.upper)
    }
}

/// Fences `[Q1 - k*IQR, Q3 + k*IQR]` over the observed values.
///
/// `None` when there are no observed values or the bounds do not form an
/// ordered range (a negative or `NaN` multiplier).
pub fn iqr_fences(values: &[Option<f64>], multiplier: f64) -> Option<Fences> {
    let sorted = sorted_observed(values);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return None;
    }
    Some(Fences {
        q1,
        q3,
        lower,
        upper,
    })
}
