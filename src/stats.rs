use crate::min_and_max;

/// Summary of one column, NAN values excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// sample standard deviation, NAN with less than two values
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub delta: f64,
}

impl ColumnStats {
    pub fn from_values(values: &[f64]) -> Option<ColumnStats> {
        let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let (min, max) = min_and_max(&valid)?;
        let count = valid.len();
        let mean = valid.iter().sum::<f64>() / count as f64;
        let std = if count < 2 {
            f64::NAN
        } else {
            let ss: f64 = valid.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        };
        Some(ColumnStats {
            count,
            mean,
            std,
            min,
            max,
            delta: max - min,
        })
    }

    /// one line description used in legends
    pub fn summary(&self) -> String {
        format!(
            "mean={:.2}, min={:.2}, max={:.2}, delta={:.2}",
            self.mean, self.min, self.max, self.delta
        )
    }
}

impl std::fmt::Display for ColumnStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={}, mean={:.2}, std={:.2}, min={:.2}, max={:.2}, delta={:.2}",
            self.count, self.mean, self.std, self.min, self.max, self.delta
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_nan() {
        let s = ColumnStats::from_values(&[2., f64::NAN, 4., 4., 4., 5., 5., 7., 9.]).unwrap();
        assert_eq!(s.count, 8);
        assert_eq!(s.mean, 5.);
        assert_eq!((s.min, s.max, s.delta), (2., 9., 7.));
        assert!((s.std - (32f64 / 7.).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn degenerate_columns() {
        assert!(ColumnStats::from_values(&[]).is_none());
        assert!(ColumnStats::from_values(&[f64::NAN]).is_none());
        let one = ColumnStats::from_values(&[3.]).unwrap();
        assert!(one.std.is_nan());
        assert_eq!(one.delta, 0.);
        assert_eq!(one.summary(), "mean=3.00, min=3.00, max=3.00, delta=0.00");
    }
}
