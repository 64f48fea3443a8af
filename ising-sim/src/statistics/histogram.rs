use std::fmt::Write;

/// Equal-width histogram over the range of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `series` into `bins` equal-width bins spanning `[min, max]`.
    /// The maximum lands in the last bin. A constant series fills bin 0.
    pub fn from_series(series: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let mut counts = vec![0u64; bins];
        if series.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                counts,
            };
        }

        let min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = max - min;
        for &x in series {
            let bin = if width > 0.0 {
                (((x - min) / width * bins as f64) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Self { min, max, counts }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Lower edge of each bin.
    pub fn lower_edges(&self) -> Vec<f64> {
        let step = (self.max - self.min) / self.counts.len() as f64;
        (0..self.counts.len())
            .map(|b| self.min + step * b as f64)
            .collect()
    }

    /// Horizontal bar chart, one line per bin, longest bar `width` columns.
    pub fn render(&self, width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let mut out = String::new();
        for (edge, &count) in self.lower_edges().iter().zip(self.counts.iter()) {
            let bar = (count as usize * width) / peak as usize;
            let _ = writeln!(out, "{edge:>12.4} | {:<width$} {count}", "#".repeat(bar));
        }
        out
    }
}
