//! Cubic spline through tabulated samples.
//!
//! The spline is stored as knot values plus second derivatives `M_i` at each
//! knot. End conditions are **not-a-knot**: the third derivative is continuous
//! across the second and the second-to-last knots, so the first two and last
//! two intervals share one cubic each. With exactly four knots this yields the
//! unique cubic through all four points.
//!
//! Between knots `x_lo < x_hi` with `h = x_hi - x_lo`, `A = (x_hi - x) / h`,
//! `B = (x - x_lo) / h`:
//!
//! ```text
//! S(x) = A y_lo + B y_hi + ((A³ - A) M_lo + (B³ - B) M_hi) h² / 6
//! ```
//!
//! Outside the knot range the boundary interval's polynomial is used as is.

use crate::error::SurfaceError;

/// Minimum knot count for a cubic spline.
pub const MIN_CUBIC_POINTS: usize = 4;

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    /// Build a not-a-knot cubic spline.
    ///
    /// `xs` must be finite and strictly increasing, `ys` finite and of the same
    /// length, and there must be at least [`MIN_CUBIC_POINTS`] knots.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, SurfaceError> {
        validate_knots(xs, ys)?;

        let n = xs.len();
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let d: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // Interior rows i = 1..n-2 in the unknowns M_1..M_{n-2}:
        // h_{i-1} M_{i-1} + 2 (h_{i-1} + h_i) M_i + h_i M_{i+1} = 6 (d_i - d_{i-1})
        let m = n - 2;
        let mut sub = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut sup = vec![0.0; m];
        let mut rhs = vec![0.0; m];
        for k in 0..m {
            let i = k + 1;
            sub[k] = h[i - 1];
            diag[k] = 2.0 * (h[i - 1] + h[i]);
            sup[k] = h[i];
            rhs[k] = 6.0 * (d[i] - d[i - 1]);
        }

        // Not-a-knot at x_1: M_0 = ((h0 + h1) M_1 - h0 M_2) / h1, folded into the first row.
        let (h0, h1) = (h[0], h[1]);
        sub[0] = 0.0;
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        sup[0] = (h1 * h1 - h0 * h0) / h1;

        // Not-a-knot at x_{n-2}: M_{n-1} = ((a + b) M_{n-2} - b M_{n-3}) / a, folded into the last row.
        let (a, b) = (h[n - 3], h[n - 2]);
        sub[m - 1] = (a * a - b * b) / a;
        diag[m - 1] = (a + b) * (2.0 * a + b) / a;
        sup[m - 1] = 0.0;

        let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs).ok_or_else(|| {
            SurfaceError::NumericalFailure("singular spline system".to_string())
        })?;

        let mut m_all = Vec::with_capacity(n);
        m_all.push(((h0 + h1) * inner[0] - h0 * inner[1]) / h1);
        m_all.extend_from_slice(&inner);
        m_all.push(((a + b) * inner[m - 1] - b * inner[m - 2]) / a);

        if m_all.iter().any(|v| !v.is_finite()) {
            return Err(SurfaceError::NumericalFailure(
                "non-finite spline coefficients".to_string(),
            ));
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m: m_all,
        })
    }

    /// Knot range `[x_min, x_max]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Evaluate `S(x)`, extrapolating with the boundary polynomials.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi, h, a, b) = self.locate(x);
        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.m[lo] + (b * b * b - b) * self.m[hi]) * h * h / 6.0
    }

    /// Evaluate `S'(x)`.
    pub fn derivative(&self, x: f64) -> f64 {
        let (lo, hi, h, a, b) = self.locate(x);
        (self.ys[hi] - self.ys[lo]) / h
            + (-(3.0 * a * a - 1.0) * self.m[lo] + (3.0 * b * b - 1.0) * self.m[hi]) * h / 6.0
    }

    fn locate(&self, x: f64) -> (usize, usize, f64, f64, f64) {
        let n = self.xs.len();
        let idx = self.xs.partition_point(|&k| k <= x);
        let lo = idx.saturating_sub(1).min(n - 2);
        let hi = lo + 1;
        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;
        (lo, hi, h, a, b)
    }
}

/// Thomas sweep for a tridiagonal system. `sub[0]` and `sup[last]` are ignored.
///
/// The spline rows are strictly diagonally dominant, so no pivoting is needed.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Option<Vec<f64>> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    let mut beta = diag[0];
    if beta == 0.0 {
        return None;
    }
    c[0] = sup[0] / beta;
    d[0] = rhs[0] / beta;
    for k in 1..n {
        beta = diag[k] - sub[k] * c[k - 1];
        if beta == 0.0 || !beta.is_finite() {
            return None;
        }
        c[k] = sup[k] / beta;
        d[k] = (rhs[k] - sub[k] * d[k - 1]) / beta;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for k in (0..n - 1).rev() {
        x[k] = d[k] - c[k] * x[k + 1];
    }
    Some(x)
}

fn validate_knots(xs: &[f64], ys: &[f64]) -> Result<(), SurfaceError> {
    if xs.len() != ys.len() {
        return Err(SurfaceError::InvalidInput(format!(
            "knot length mismatch: {} x values vs {} y values",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < MIN_CUBIC_POINTS {
        return Err(SurfaceError::InsufficientData {
            needed: MIN_CUBIC_POINTS,
            got: xs.len(),
        });
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(SurfaceError::InvalidInput("non-finite sample value".to_string()));
    }
    if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SurfaceError::InvalidInput(format!(
            "x values must be strictly increasing (x[{}]={} >= x[{}]={})",
            i,
            xs[i],
            i + 1,
            xs[i + 1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_passes_through_knots() {
        let xs = [0.0, 1.0, 2.5, 3.0, 4.2, 6.0];
        let ys = [2.0, 3.0, 5.0, 4.0, 1.0, -0.5];
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            let v = s.evaluate(*x);
            assert!((v - y).abs() < 1e-10, "S({x}) = {v}, expected {y}");
        }
    }

    #[test]
    fn four_points_reproduce_a_cubic_everywhere() {
        let f = |x: f64| 0.5 * x * x * x - 2.0 * x * x + x - 3.0;
        let df = |x: f64| 1.5 * x * x - 4.0 * x + 1.0;
        let xs = [0.0, 1.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let s = CubicSpline::new(&xs, &ys).unwrap();

        for &x in &[-1.0, 0.5, 2.0, 3.7, 6.0] {
            assert!((s.evaluate(x) - f(x)).abs() < 1e-9, "value at {x}");
            assert!((s.derivative(x) - df(x)).abs() < 1e-9, "slope at {x}");
        }
    }

    #[test]
    fn not_a_knot_is_exact_for_cubics_on_many_knots() {
        let f = |x: f64| -1e-6 * x * x * x + 2e-3 * x * x;
        let xs: Vec<f64> = (0..12).map(|i| i as f64 * 35.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for &x in &[12.0, 101.0, 377.0, 420.0] {
            assert!((s.evaluate(x) - f(x)).abs() < 1e-9);
        }
    }

    #[test]
    fn large_tables_build_in_linear_time() {
        let f = |x: f64| -1e-6 * x * x * x + 2e-3 * x * x;
        let xs: Vec<f64> = (0..10_000).map(|i| i as f64 * 0.05).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let s = CubicSpline::new(&xs, &ys).unwrap();
        assert_eq!(s.len(), 10_000);
        for &x in &[0.0, 0.012, 123.456, 499.9, 499.95] {
            assert!((s.evaluate(x) - f(x)).abs() < 1e-8, "value at {x}");
        }
    }

    #[test]
    fn tridiagonal_sweep_matches_hand_solution() {
        // [2 1 0; 1 3 1; 0 1 2] x = [3, 5, 3] -> x = [1, 1, 1]
        let x = solve_tridiagonal(&[0.0, 1.0, 1.0], &[2.0, 3.0, 2.0], &[1.0, 1.0, 0.0], &[3.0, 5.0, 3.0]).unwrap();
        for v in x {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let err = CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap_err();
        assert_eq!(err, SurfaceError::InsufficientData { needed: 4, got: 3 });
    }

    #[test]
    fn rejects_unsorted_knots() {
        let err = CubicSpline::new(&[0.0, 2.0, 1.0, 3.0], &[0.0; 4]).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidInput(_)));
    }
}
