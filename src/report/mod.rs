//! Reporting utilities: error statistics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::ErrorStats;

/// RMS, max |e| and peak-to-valley of an error curve.
pub fn compute_error_stats(error: &[f64]) -> ErrorStats {
    if error.is_empty() {
        return ErrorStats {
            rms: 0.0,
            max_abs: 0.0,
            peak_to_valley: 0.0,
        };
    }

    let mut sum_sq = 0.0;
    let mut max_abs = 0.0_f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &e in error {
        sum_sq += e * e;
        max_abs = max_abs.max(e.abs());
        min = min.min(e);
        max = max.max(e);
    }

    ErrorStats {
        rms: (sum_sq / error.len() as f64).sqrt(),
        max_abs,
        peak_to_valley: max - min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_stats_basic() {
        let stats = compute_error_stats(&[0.0, 0.3, -0.4]);
        assert!((stats.rms - (0.25_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.max_abs, 0.4);
        assert!((stats.peak_to_valley - 0.7).abs() < 1e-12);
    }

    #[test]
    fn error_stats_empty() {
        assert_eq!(compute_error_stats(&[]).rms, 0.0);
    }
}
