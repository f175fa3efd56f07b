//! Analytic even-asphere evaluation.
//!
//! Projects whose optical design is known in closed form carry an
//! `AsphereFormula`; the analysis compares it against the tabulated curve.

use crate::domain::AsphereFormula;
use crate::error::SurfaceError;

impl AsphereFormula {
    /// Radius beyond which the conic term is undefined (infinite for
    /// hyperboloids and flat surfaces).
    pub fn rim_radius(&self) -> f64 {
        let denom = (1.0 + self.conic) * self.curvature * self.curvature;
        if denom > 0.0 {
            1.0 / denom.sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Sag `z(r)`.
    pub fn sag(&self, r: f64) -> Result<f64, SurfaceError> {
        let c = self.curvature;
        let q = self.root_term(r)?;
        let mut z = c * r * r / (1.0 + q);

        let r2 = r * r;
        let mut power = r2 * r2;
        for a in &self.coefficients {
            z += a * power;
            power *= r2;
        }
        Ok(z)
    }

    /// Radial derivative `dz/dr`.
    pub fn slope(&self, r: f64) -> Result<f64, SurfaceError> {
        let c = self.curvature;
        let q = self.root_term(r)?;
        if q <= 0.0 {
            return Err(SurfaceError::DomainError {
                x: r,
                min: 0.0,
                max: self.rim_radius(),
            });
        }
        let mut dz = c * r / q;

        // d/dr a_i r^(2i+4) = (2i+4) a_i r^(2i+3)
        let r2 = r * r;
        let mut power = r2 * r;
        for (i, a) in self.coefficients.iter().enumerate() {
            dz += (2 * i + 4) as f64 * a * power;
            power *= r2;
        }
        Ok(dz)
    }

    fn root_term(&self, r: f64) -> Result<f64, SurfaceError> {
        let c = self.curvature;
        let arg = 1.0 - (1.0 + self.conic) * c * c * r * r;
        if arg < 0.0 || !arg.is_finite() {
            return Err(SurfaceError::DomainError {
                x: r,
                min: 0.0,
                max: self.rim_radius(),
            });
        }
        Ok(arg.sqrt())
    }
}
