//! Best-fit sphere (BFS) estimation.
//!
//! Given a sampled curve `(r_i, z_i)` we look for the curvature `c = 1/R`
//! minimizing
//!
//! ```text
//! Σ (z_i - z_sphere(r_i; c))^2
//! ```
//!
//! Procedure:
//! 1. Algebraic start: a circle centred on the axis satisfies
//!    `r² + z² + 2 z R = 0`, which is linear in `R`. Its least-squares solution
//!    is exact for spherical data and close for mildly aspheric data.
//! 2. Damped Gauss–Newton on `c`: the 1-column Jacobian `∂z/∂c` is solved with
//!    the SVD least-squares routine, and steps are halved until the cost does
//!    not increase and every sample stays inside the sphere.
//!
//! Working in curvature keeps the problem well-posed for nearly flat
//! surfaces, where `R` grows without bound.

use nalgebra::{DMatrix, DVector};

use crate::domain::{AngleUnit, BfsResult};
use crate::error::SurfaceError;
use crate::math::solve_least_squares;
use crate::math::sphere;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct BfsOptions {
    pub max_iterations: usize,
    /// Relative step size on the curvature below which we stop.
    pub tolerance: f64,
    /// Maximum number of step halvings per iteration.
    pub max_halvings: usize,
}

impl Default for BfsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-12,
            max_halvings: 40,
        }
    }
}

/// Fit the best sphere with default solver settings.
pub fn fit_bfs(r: &[f64], z: &[f64]) -> Result<BfsResult, SurfaceError> {
    fit_bfs_with(r, z, &BfsOptions::default())
}

/// Fit the best sphere through `(r, z)`.
pub fn fit_bfs_with(r: &[f64], z: &[f64], opts: &BfsOptions) -> Result<BfsResult, SurfaceError> {
    validate_samples(r, z)?;

    let r_max = r.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if r_max <= 0.0 {
        return Err(SurfaceError::NumericalFailure(
            "all samples lie on the axis; curvature is unconstrained".to_string(),
        ));
    }

    let mut c = algebraic_curvature(r, z)?;
    // Keep the start inside the sphere so the first cost is defined.
    if c.abs() * r_max >= 1.0 {
        c = c.signum() * 0.999 / r_max;
    }

    let Some(mut current_cost) = cost(c, r, z) else {
        return Err(SurfaceError::NumericalFailure(
            "initial curvature places samples beyond the sphere".to_string(),
        ));
    };

    let n = r.len();
    let mut converged = false;
    let mut iterations = 0;
    // Last unconstrained Gauss–Newton step, before any halving.
    let mut last_delta = 0.0;

    for iter in 1..=opts.max_iterations {
        iterations = iter;

        let mut jac = DMatrix::<f64>::zeros(n, 1);
        let mut res = DVector::<f64>::zeros(n);
        for i in 0..n {
            let (Some(s), Some(ds)) = (sphere::sag(c, r[i]), sphere::sag_dc(c, r[i])) else {
                return Err(SurfaceError::NumericalFailure(format!(
                    "sample r={} reaches the sphere rim at R={}",
                    r[i],
                    1.0 / c
                )));
            };
            jac[(i, 0)] = ds;
            res[i] = z[i] - s;
        }

        let delta = solve_least_squares(&jac, &res)
            .map(|d| d[0])
            .ok_or_else(|| SurfaceError::NumericalFailure("degenerate Jacobian".to_string()))?;
        last_delta = delta;

        let mut step = delta;
        let mut accepted = None;
        for _ in 0..=opts.max_halvings {
            let candidate = c + step;
            if let Some(next_cost) = cost(candidate, r, z) {
                if next_cost <= current_cost {
                    accepted = Some((candidate, next_cost));
                    break;
                }
            }
            step *= 0.5;
        }

        let scale = c.abs().max(f64::MIN_POSITIVE);
        match accepted {
            Some((next_c, next_cost)) => {
                log::debug!(
                    "bfs iter {iter}: c={next_c:.6e} step={step:.3e} cost={next_cost:.6e}"
                );
                c = next_c;
                current_cost = next_cost;
                if step.abs() <= opts.tolerance * scale {
                    converged = true;
                    break;
                }
            }
            None => {
                // No descent along the Gauss–Newton direction: we are at the
                // optimum to working precision if the proposed step was tiny.
                if delta.abs() <= opts.tolerance.sqrt() * scale {
                    converged = true;
                }
                break;
            }
        }
    }

    // Halving keeps every candidate inside the rim, so an optimum beyond it
    // shows up as a curvature pinned at `1/r_max` with the full step pointing out.
    if r_max * (c + last_delta).abs() >= 1.0 || r_max * c.abs() > 1.0 - 1e-9 {
        return Err(SurfaceError::NumericalFailure(format!(
            "least-squares sphere is smaller than the sampled radius r={r_max}"
        )));
    }
    if !converged {
        return Err(SurfaceError::NumericalFailure(format!(
            "sphere fit did not converge after {iterations} iterations"
        )));
    }
    if c == 0.0 || !c.is_finite() {
        return Err(SurfaceError::NumericalFailure(
            "fitted surface is flat; sphere radius is unbounded".to_string(),
        ));
    }

    let radius = 1.0 / c;
    if r_max >= radius.abs() {
        return Err(SurfaceError::NumericalFailure(format!(
            "r={r_max} exceeds the fitted sphere radius {radius}"
        )));
    }

    Ok(BfsResult {
        radius,
        curvature: c,
        rms: (current_cost / n as f64).sqrt(),
        iterations,
    })
}

/// Sag of the best-fit sphere, `sqrt(R² - r²) - R`, at every `r`.
pub fn bfs_sag_curve(radius: f64, r: &[f64]) -> Result<Vec<f64>, SurfaceError> {
    r.iter()
        .map(|&x| {
            sphere::sag_from_radius(radius, x).ok_or_else(|| {
                SurfaceError::NumericalFailure(format!("r={x} exceeds the sphere radius {radius}"))
            })
        })
        .collect()
}

/// Slope angle `atan(dz/dr)` of the best-fit sphere at every `r`.
pub fn bfs_slope_angles(radius: f64, r: &[f64], unit: AngleUnit) -> Result<Vec<f64>, SurfaceError> {
    let c = 1.0 / radius;
    r.iter()
        .map(|&x| {
            sphere::slope(c, x)
                .map(|s| unit.from_radians(s.atan()))
                .ok_or_else(|| {
                    SurfaceError::NumericalFailure(format!(
                        "slope undefined at r={x} for sphere radius {radius}"
                    ))
                })
        })
        .collect()
}

/// Slope angles from derivative values.
pub fn slope_angles(derivatives: &[f64], unit: AngleUnit) -> Vec<f64> {
    derivatives
        .iter()
        .map(|d| unit.from_radians(d.atan()))
        .collect()
}

fn validate_samples(r: &[f64], z: &[f64]) -> Result<(), SurfaceError> {
    if r.len() != z.len() {
        return Err(SurfaceError::InvalidInput(format!(
            "r and z lengths differ: {} vs {}",
            r.len(),
            z.len()
        )));
    }
    if r.len() < 2 {
        return Err(SurfaceError::InsufficientData {
            needed: 2,
            got: r.len(),
        });
    }
    if r.iter().chain(z.iter()).any(|v| !v.is_finite()) {
        return Err(SurfaceError::InvalidInput("non-finite sample value".to_string()));
    }
    Ok(())
}

fn algebraic_curvature(r: &[f64], z: &[f64]) -> Result<f64, SurfaceError> {
    // r² + z² + 2 z R = 0  =>  R = -Σ z (r² + z²) / (2 Σ z²)
    let szz: f64 = z.iter().map(|v| v * v).sum();
    let sz3: f64 = r
        .iter()
        .zip(z.iter())
        .map(|(ri, zi)| zi * (ri * ri + zi * zi))
        .sum();

    if szz <= 0.0 {
        return Err(SurfaceError::NumericalFailure(
            "curve is flat; sphere radius is unbounded".to_string(),
        ));
    }
    if sz3 == 0.0 {
        return Ok(0.0);
    }
    Ok(-2.0 * szz / sz3)
}

fn cost(c: f64, r: &[f64], z: &[f64]) -> Option<f64> {
    let mut sse = 0.0;
    for (ri, zi) in r.iter().zip(z.iter()) {
        let d = zi - sphere::sag(c, *ri)?;
        sse += d * d;
    }
    sse.is_finite().then_some(sse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sphere_samples(radius: f64, r: &[f64]) -> Vec<f64> {
        r.iter()
            .map(|&x| (radius * radius - x * x).sqrt() - radius)
            .collect()
    }

    #[test]
    fn four_point_sphere_recovers_radius() {
        let r = [0.0, 10.0, 20.0, 30.0];
        let z = sphere_samples(500.0, &r);
        let bfs = fit_bfs(&r, &z).unwrap();
        assert!((bfs.radius - 500.0).abs() < 1e-3, "radius={}", bfs.radius);
    }

    #[test]
    fn dense_sphere_converges_to_radius() {
        let rho = 11_067.0;
        let r: Vec<f64> = (0..500).map(|i| i as f64 * 0.95 * rho / 499.0).collect();
        let z = sphere_samples(rho, &r);
        let bfs = fit_bfs(&r, &z).unwrap();
        assert!(((bfs.radius - rho) / rho).abs() < 1e-6, "radius={}", bfs.radius);
        assert!(bfs.rms < 1e-6);
    }

    #[test]
    fn surfaces_curving_upward_fit_a_negative_radius() {
        let r: Vec<f64> = (0..50).map(|i| i as f64 * 8.0).collect();
        let z: Vec<f64> = sphere_samples(4000.0, &r).iter().map(|v| -v).collect();
        let bfs = fit_bfs(&r, &z).unwrap();
        assert!((bfs.radius + 4000.0).abs() < 1e-6, "radius={}", bfs.radius);
    }

    #[test]
    fn noisy_sphere_stays_close() {
        let mut rng = StdRng::seed_from_u64(7);
        let r: Vec<f64> = (0..400).map(|i| i as f64).collect();
        let z: Vec<f64> = sphere_samples(2000.0, &r)
            .into_iter()
            .map(|v| v + rng.gen_range(-1e-4..1e-4))
            .collect();
        let bfs = fit_bfs(&r, &z).unwrap();
        assert!(((bfs.radius - 2000.0) / 2000.0).abs() < 1e-3, "radius={}", bfs.radius);
        assert!(bfs.rms < 1e-3);
    }

    #[test]
    fn bfs_minimizes_residuals_for_aspheric_curve() {
        // Paraboloid: not a sphere, so the fit must balance residuals.
        let r: Vec<f64> = (0..200).map(|i| i as f64 * 2.0).collect();
        let z: Vec<f64> = r.iter().map(|x| -x * x / 3000.0).collect();
        let bfs = fit_bfs(&r, &z).unwrap();

        let sse = |c: f64| -> f64 {
            r.iter()
                .zip(z.iter())
                .map(|(ri, zi)| (zi - sphere::sag(c, *ri).unwrap()).powi(2))
                .sum()
        };
        let best = sse(bfs.curvature);
        assert!(best <= sse(bfs.curvature * (1.0 + 1e-4)));
        assert!(best <= sse(bfs.curvature * (1.0 - 1e-4)));
    }

    #[test]
    fn optimum_inside_sampled_radius_is_a_numerical_failure() {
        let r: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        for d in [20.0, 50.0] {
            let z: Vec<f64> = r.iter().map(|x| -x * x / d).collect();
            let result = fit_bfs(&r, &z);
            assert!(
                matches!(result, Err(SurfaceError::NumericalFailure(_))),
                "d={d}: {result:?}"
            );
        }
    }

    #[test]
    fn flat_curve_is_a_numerical_failure() {
        let r = [0.0, 1.0, 2.0, 3.0];
        let z = [0.0; 4];
        assert!(matches!(fit_bfs(&r, &z), Err(SurfaceError::NumericalFailure(_))));
    }

    #[test]
    fn samples_on_axis_are_a_numerical_failure() {
        let r = [0.0, 0.0, 0.0];
        let z = [0.0, -1.0, 1.0];
        assert!(matches!(fit_bfs(&r, &z), Err(SurfaceError::NumericalFailure(_))));
    }

    #[test]
    fn sag_curve_is_non_positive_and_symmetric() {
        let radius = 500.0;
        let r = [-300.0, -10.0, 0.0, 10.0, 300.0];
        let z = bfs_sag_curve(radius, &r).unwrap();
        assert_eq!(z[2], 0.0);
        assert!(z.iter().all(|v| *v <= 0.0));
        assert!((z[0] - z[4]).abs() < 1e-12);
        assert!((z[1] - z[3]).abs() < 1e-12);
    }

    #[test]
    fn sag_curve_beyond_radius_fails() {
        let err = bfs_sag_curve(100.0, &[0.0, 50.0, 120.0]).unwrap_err();
        assert!(matches!(err, SurfaceError::NumericalFailure(_)));
    }

    #[test]
    fn slope_angles_use_requested_unit() {
        let radius = 1000.0;
        let r = [0.0, 500.0];
        let deg = bfs_slope_angles(radius, &r, AngleUnit::Degrees).unwrap();
        let rad = bfs_slope_angles(radius, &r, AngleUnit::Radians).unwrap();
        assert_eq!(deg[0], 0.0);
        // At r = R/2 the sphere normal is tilted by 30 degrees.
        assert!((deg[1] + 30.0).abs() < 1e-9);
        assert!((rad[1] + std::f64::consts::FRAC_PI_6).abs() < 1e-12);
    }
}
