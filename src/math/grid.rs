//! Uniform sampling grids.

use crate::error::SurfaceError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// The last point is exactly `max` so the grid always reaches the vignetting
/// radius.
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, SurfaceError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(SurfaceError::InvalidInput(format!(
            "Invalid grid range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if steps < 2 {
        return Err(SurfaceError::InvalidInput("Grid steps must be >= 2.".to_string()));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    out[steps - 1] = max;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_space_includes_endpoints() {
        let v = lin_space(0.0, 420.0, 500).unwrap();
        assert_eq!(v.len(), 500);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[499], 420.0);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn lin_space_rejects_bad_range() {
        assert!(lin_space(1.0, 1.0, 10).is_err());
        assert!(lin_space(0.0, 1.0, 1).is_err());
        assert!(lin_space(0.0, f64::NAN, 10).is_err());
    }
}
