/// Normalized autocorrelation function Γ(δ) of a time series, for
/// `δ = 0..=max_lag`.
///
/// Γ(0) is 1. A constant series has no variance; its Γ is 1 at lag 0 and 0
/// elsewhere. Lags past the end of the series are 0.
pub fn autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let m = series.len();
    if m == 0 {
        return vec![0.0; max_lag + 1];
    }
    let mean = series.iter().sum::<f64>() / m as f64;
    let var = series.iter().map(|&o| (o - mean) * (o - mean)).sum::<f64>() / m as f64;

    (0..=max_lag)
        .map(|delta| {
            let count = m.saturating_sub(delta);
            if count == 0 || var <= 0.0 {
                return if delta == 0 { 1.0 } else { 0.0 };
            }
            let sum_prod: f64 = (delta..m)
                .map(|t| (series[t] - mean) * (series[t - delta] - mean))
                .sum();
            (sum_prod / count as f64) / var
        })
        .collect()
}

/// Integrated autocorrelation time with Sokal's automatic window: sum Γ
/// until the window `W` reaches `5 τ(W)`.
pub fn sokal_tau(gamma: &[f64]) -> f64 {
    let mut tau = 0.5;
    for (w, &g) in gamma.iter().enumerate().skip(1) {
        tau += g;
        if w as f64 >= 5.0 * tau {
            return tau;
        }
    }
    tau
}
