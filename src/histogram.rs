use crate::min_and_max;

/// Equal width bins, the last one closed on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// bins + 1 edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// bins spanning the finite values, None if there are none
    pub fn new(values: &[f64], bins: usize) -> Option<Histogram> {
        let range = common_range(&[values])?;
        Some(Histogram::with_range(values, bins, range))
    }

    /// NAN and values outside the range are ignored,
    /// a degenerate range is widened by 0.5 on both sides
    pub fn with_range(values: &[f64], bins: usize, range: (f64, f64)) -> Histogram {
        let bins = bins.max(1);
        let (lo, hi) = if range.0 == range.1 {
            (range.0 - 0.5, range.1 + 0.5)
        } else {
            range
        };
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for &v in values.iter().filter(|v| v.is_finite()) {
            if v < lo || v > hi {
                continue;
            }
            let i = (((v - lo) / width) as usize).min(bins - 1);
            counts[i] += 1;
        }
        Histogram { edges, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// (left edge, right edge, count) per bin
    pub fn bars(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(self.counts.iter())
            .map(|(e, &c)| (e[0], e[1], c))
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }
}

/// range of the finite values over several columns
pub fn common_range(columns: &[&[f64]]) -> Option<(f64, f64)> {
    let finite: Vec<f64> = columns
        .iter()
        .flat_map(|c| c.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    min_and_max(&finite)
}
