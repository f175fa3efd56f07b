//! Sphere sag and its derivatives, parameterized by curvature `c = 1/R`.
//!
//! For `R > 0` the sag is `z(r) = sqrt(R² - r²) - R`. We evaluate it as
//!
//! ```text
//! z(r) = -c r² / (1 + sqrt(1 - c² r²))
//! ```
//!
//! which is the same number without the cancellation of two large terms near
//! the axis, stays finite for `c = 0`, and mirrors cleanly for `c < 0`.
//!
//! All functions return `None` when `|c r| > 1` (the point lies beyond the
//! sphere).

fn root_term(c: f64, r: f64) -> Option<f64> {
    let arg = 1.0 - c * c * r * r;
    if arg < 0.0 || !arg.is_finite() {
        return None;
    }
    Some(arg.sqrt())
}

/// Sag `z(r)` of the sphere with curvature `c`.
pub fn sag(c: f64, r: f64) -> Option<f64> {
    let q = root_term(c, r)?;
    Some(-c * r * r / (1.0 + q))
}

/// Partial derivative `∂z/∂c`, used as the Gauss–Newton Jacobian.
///
/// `∂z/∂c = -r² / (q (1 + q))` with `q = sqrt(1 - c² r²)`; undefined on the
/// sphere's rim where `q = 0`.
pub fn sag_dc(c: f64, r: f64) -> Option<f64> {
    let q = root_term(c, r)?;
    if q <= 0.0 {
        return None;
    }
    Some(-r * r / (q * (1.0 + q)))
}

/// Radial slope `dz/dr = -c r / q`.
pub fn slope(c: f64, r: f64) -> Option<f64> {
    let q = root_term(c, r)?;
    if q <= 0.0 {
        return None;
    }
    Some(-c * r / q)
}

/// Sag written in terms of the radius, `sqrt(R² - r²) - R` for `R > 0`.
pub fn sag_from_radius(radius: f64, r: f64) -> Option<f64> {
    if radius == 0.0 || !radius.is_finite() {
        return None;
    }
    sag(1.0 / radius, r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_form_matches_textbook_form() {
        let radius = 500.0_f64;
        for &r in &[0.0_f64, 10.0, 123.4, 499.0] {
            let textbook = (radius * radius - r * r).sqrt() - radius;
            let stable = sag_from_radius(radius, r).unwrap();
            assert!((textbook - stable).abs() < 1e-9, "r={r}");
        }
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let c = 1.0 / 750.0;
        let r = 300.0;
        let eps = 1e-10;
        let fd = (sag(c + eps, r).unwrap() - sag(c - eps, r).unwrap()) / (2.0 * eps);
        let an = sag_dc(c, r).unwrap();
        assert!((fd - an).abs() / an.abs() < 1e-5);
    }

    #[test]
    fn beyond_rim_is_undefined() {
        assert!(sag(1.0 / 100.0, 100.5).is_none());
        assert!(slope(1.0 / 128.0, 128.0).is_none());
    }
}
