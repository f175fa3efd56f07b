//! Continuous R→Z and R→CRD curves from tabulated samples.
//!
//! Both curves are cubic splines over the same R knots. They differ only in
//! what happens outside the tabulated range:
//!
//! - R→Z extrapolates (the grid may extend to a vignetting radius slightly
//!   beyond the last tabulated point)
//! - R→CRD refuses with `SurfaceError::DomainError`

use crate::domain::CurveSamples;
use crate::error::SurfaceError;
use crate::math::CubicSpline;

/// How a curve behaves outside its knot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Continue the boundary polynomial.
    Allow,
    /// Evaluation outside the knots is an error.
    Forbid,
}

/// A single interpolated curve with an out-of-domain policy.
#[derive(Debug, Clone)]
pub struct InterpolatedCurve {
    spline: CubicSpline,
    extrapolation: Extrapolation,
}

impl InterpolatedCurve {
    pub fn new(xs: &[f64], ys: &[f64], extrapolation: Extrapolation) -> Result<Self, SurfaceError> {
        Ok(Self {
            spline: CubicSpline::new(xs, ys)?,
            extrapolation,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        self.spline.domain()
    }

    pub fn contains(&self, x: f64) -> bool {
        let (min, max) = self.domain();
        x >= min && x <= max
    }

    pub fn eval(&self, x: f64) -> Result<f64, SurfaceError> {
        self.check(x)?;
        Ok(self.spline.evaluate(x))
    }

    /// First derivative at `x`.
    pub fn derivative(&self, x: f64) -> Result<f64, SurfaceError> {
        self.check(x)?;
        Ok(self.spline.derivative(x))
    }

    /// Evaluate on every point of `xs`, failing on the first bad point.
    pub fn eval_many(&self, xs: &[f64]) -> Result<Vec<f64>, SurfaceError> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    fn check(&self, x: f64) -> Result<(), SurfaceError> {
        if !x.is_finite() {
            return Err(SurfaceError::InvalidInput(format!("non-finite evaluation point {x}")));
        }
        if self.extrapolation == Extrapolation::Forbid && !self.contains(x) {
            let (min, max) = self.domain();
            return Err(SurfaceError::DomainError { x, min, max });
        }
        Ok(())
    }
}

/// The pair of curves built from one project's table.
#[derive(Debug, Clone)]
pub struct CurveInterpolator {
    pub r2z: InterpolatedCurve,
    pub r2crd: InterpolatedCurve,
}

impl CurveInterpolator {
    /// Build R→Z (extrapolating) and R→CRD (strict) from the samples.
    pub fn from_samples(samples: &CurveSamples) -> Result<Self, SurfaceError> {
        if samples.z.len() != samples.r.len() || samples.crd.len() != samples.r.len() {
            return Err(SurfaceError::InvalidInput(format!(
                "column length mismatch: R={}, Z={}, CRD={}",
                samples.r.len(),
                samples.z.len(),
                samples.crd.len()
            )));
        }

        let r2z = InterpolatedCurve::new(&samples.r, &samples.z, Extrapolation::Allow)?;
        let r2crd = InterpolatedCurve::new(&samples.r, &samples.crd, Extrapolation::Forbid)?;
        log::debug!(
            "built cubic interpolators over R=[{:.3}, {:.3}] ({} knots)",
            r2z.domain().0,
            r2z.domain().1,
            samples.len()
        );
        Ok(Self { r2z, r2crd })
    }

    pub fn z(&self, r: f64) -> Result<f64, SurfaceError> {
        self.r2z.eval(r)
    }

    pub fn crd(&self, r: f64) -> Result<f64, SurfaceError> {
        self.r2crd.eval(r)
    }

    /// CRD at the points of `rs` that lie inside the tabulated domain.
    ///
    /// Points outside the domain, NaN included, are skipped.
    pub fn crd_within_domain(&self, rs: &[f64]) -> Vec<(f64, f64)> {
        rs.iter()
            .copied()
            .filter(|&r| self.r2crd.contains(r))
            .map(|r| (r, self.r2crd.spline.evaluate(r)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CurveSamples {
        let r: Vec<f64> = (0..8).map(|i| i as f64 * 50.0).collect();
        let z = r.iter().map(|x| -x * x / 2400.0 + 1e-9 * x * x * x).collect();
        let crd = r.iter().map(|x| 0.01 * x).collect();
        CurveSamples {
            r,
            z,
            crd,
            slope: None,
            bfs_slope: None,
        }
    }

    #[test]
    fn z_curve_reproduces_knots() {
        let samples = table();
        let interp = CurveInterpolator::from_samples(&samples).unwrap();
        for (r, z) in samples.r.iter().zip(samples.z.iter()) {
            assert!((interp.z(*r).unwrap() - z).abs() < 1e-10);
        }
    }

    #[test]
    fn z_curve_extrapolates() {
        let interp = CurveInterpolator::from_samples(&table()).unwrap();
        let beyond = 380.0;
        let expected = -beyond * beyond / 2400.0 + 1e-9 * beyond * beyond * beyond;
        let got = interp.z(beyond).unwrap();
        assert!((got - expected).abs() < 1e-8, "got {got}, expected {expected}");
    }

    #[test]
    fn crd_outside_domain_is_an_error() {
        let interp = CurveInterpolator::from_samples(&table()).unwrap();
        let err = interp.crd(351.0).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::DomainError {
                x: 351.0,
                min: 0.0,
                max: 350.0
            }
        );
        assert!(interp.crd(-1.0).is_err());
        assert!((interp.crd(350.0).unwrap() - 3.5).abs() < 1e-10);
    }

    #[test]
    fn crd_within_domain_drops_outside_points() {
        let interp = CurveInterpolator::from_samples(&table()).unwrap();
        let pts = interp.crd_within_domain(&[0.0, 100.0, 349.9, 360.0]);
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn crd_within_domain_skips_non_finite_points() {
        let interp = CurveInterpolator::from_samples(&table()).unwrap();
        let pts = interp.crd_within_domain(&[f64::NAN, f64::INFINITY, 10.0]);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].0, 10.0);
        assert!((pts[0].1 - interp.crd(10.0).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn three_points_are_insufficient() {
        let samples = CurveSamples {
            r: vec![0.0, 1.0, 2.0],
            z: vec![0.0, 1.0, 2.0],
            crd: vec![0.0, 0.0, 0.0],
            slope: None,
            bfs_slope: None,
        };
        let err = CurveInterpolator::from_samples(&samples).unwrap_err();
        assert!(matches!(err, SurfaceError::InsufficientData { needed: 4, got: 3 }));
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let mut samples = table();
        samples.crd.pop();
        assert!(matches!(
            CurveInterpolator::from_samples(&samples),
            Err(SurfaceError::InvalidInput(_))
        ));
    }
}
