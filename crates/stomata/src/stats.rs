//! Small descriptive statistics over `f64` samples.
//!
//! Quantiles use midpoint interpolation: the virtual index `q * (n - 1)` is
//! resolved to the mean of its floor and ceiling elements.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Quantile `q` in `[0, 1]` of an already sorted slice; `None` when empty.
pub fn quantile_midpoint(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(0.5 * (sorted[lo] + sorted[hi]))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_midpoint(&sorted(values), 0.5)
}

/// Median and interquartile range of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustSpread {
    pub median: f64,
    pub iqr: f64,
}

impl RobustSpread {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let iqr = quantile_midpoint(&s, 0.75)? - quantile_midpoint(&s, 0.25)?;
        Some(Self {
            median: quantile_midpoint(&s, 0.5)?,
            iqr,
        })
    }

    pub fn lower_bound(&self, k: f64) -> f64 {
        self.median - k * self.iqr
    }

    pub fn upper_bound(&self, k: f64) -> f64 {
        self.median + k * self.iqr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn midpoint_quartiles() {
        let spread = RobustSpread::from_values(&[100.0, 10.0, 12.0, 11.0, 13.0]).unwrap();
        assert_abs_diff_eq!(spread.median, 12.0);
        assert_abs_diff_eq!(spread.iqr, 2.0);
        assert_abs_diff_eq!(spread.lower_bound(2.0), 8.0);
        assert_abs_diff_eq!(spread.upper_bound(2.0), 16.0);
    }

    #[test]
    fn fractional_index_averages_neighbours() {
        // q=0.25 over 4 values -> index 0.75 -> mean of elements 0 and 1.
        let s = [1.0, 3.0, 5.0, 9.0];
        assert_abs_diff_eq!(quantile_midpoint(&s, 0.25).unwrap(), 2.0);
        assert_abs_diff_eq!(median(&s).unwrap(), 4.0);
    }

    #[test]
    fn empty_samples_have_no_statistics() {
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
        assert!(RobustSpread::from_values(&[]).is_none());
        assert!(quantile_midpoint(&[], 0.5).is_none());
        assert_abs_diff_eq!(quantile_midpoint(&[7.0], 0.9).unwrap(), 7.0);
        assert_abs_diff_eq!(mean(&[2.0, 4.0]).unwrap(), 3.0);
    }
}
