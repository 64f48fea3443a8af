use super::autocorrelation::{autocorrelation, sokal_tau};

/// Moments and integrated autocorrelation time of one recorded series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Population variance ⟨x²⟩ − ⟨x⟩².
    pub variance: f64,
    /// Integrated autocorrelation time in sweeps.
    pub tau: f64,
}

impl Summary {
    /// Summarize `series`. The autocorrelation window is capped at a quarter
    /// of the series length.
    pub fn from_series(series: &[f64]) -> Self {
        let count = series.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                variance: 0.0,
                tau: 0.5,
            };
        }
        let c = count as f64;
        let mean = series.iter().sum::<f64>() / c;
        let mean2 = series.iter().map(|x| x * x).sum::<f64>() / c;
        let max_lag = (count / 4).max(1);

        Self {
            count,
            mean,
            variance: (mean2 - mean * mean).max(0.0),
            tau: sokal_tau(&autocorrelation(series, max_lag)),
        }
    }

    /// Standard error of the mean, inflated by `2τ` for correlated samples.
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance * 2.0 * self.tau / self.count as f64).sqrt()
    }
}
