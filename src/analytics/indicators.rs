//! Rolling indicators over a daily price sequence.
//!
//! Inputs are plain `f64` slices. Non-finite inputs (`NaN`, `±inf`) count as
//! missing cells and are skipped inside windows. Outputs use `None` as the
//! undefined marker; no `NaN` or infinity is ever returned.

/// Trailing mean over `window` positions. The window shrinks at the start of
/// the sequence instead of producing undefined values.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(finite(&values[start..=i]))
        })
        .collect()
}

/// Change against the value `periods` positions back, in percent.
///
/// Positions without a predecessor, and predecessors that are zero or
/// missing, yield `None`.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    let periods = periods.max(1);
    if values.len() < periods {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            let base = values[i - periods];
            let current = values[i];
            if !base.is_finite() || !current.is_finite() || base == 0.0 {
                return None;
            }
            Some((current - base) / base * 100.0)
        })
        .collect()
}

/// Day-over-day natural log returns. The first position is always `None`.
pub fn log_returns(values: &[f64]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            let r = (values[i] / values[i - 1]).ln();
            r.is_finite().then_some(r)
        })
        .collect()
}

/// Rolling sample standard deviation of log returns, scaled by `sqrt(window)`.
///
/// The scaling only keeps magnitudes comparable across window sizes; it is
/// not an annualization. A sequence shorter than `window` is undefined
/// throughout, and any window holding fewer than two returns is undefined.
pub fn volatility(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    if values.len() < window {
        return vec![None; values.len()];
    }

    let returns = log_returns(values);
    let scale = (window as f64).sqrt();

    (0..returns.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let in_window: Vec<f64> = returns[start..=i].iter().flatten().copied().collect();
            sample_std_dev(&in_window).map(|sd| sd * scale)
        })
        .collect()
}

/// Quantile with linear interpolation between closest ranks, the default
/// of numpy and pandas. `q` is clamped to [0, 1].
pub fn quantile_linear(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = finite(values);
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Number of distinct finite values.
pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = finite(values);
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

fn mean(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
