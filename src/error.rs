/// Application-level error: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the numerical core (interpolation and sphere fitting).
///
/// These are kept matchable so callers (and tests) can tell a bad table apart
/// from a solver that gave up.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Too few samples for the requested interpolation order.
    InsufficientData { needed: usize, got: usize },
    /// Evaluation point outside the domain of a non-extrapolating curve.
    DomainError { x: f64, min: f64, max: f64 },
    /// Least-squares solve failed or hit an invalid region of the sphere equation.
    NumericalFailure(String),
    /// Malformed samples (length mismatch, non-finite values, unsorted R).
    InvalidInput(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::InsufficientData { needed, got } => {
                write!(f, "Insufficient data: need at least {needed} points, got {got}.")
            }
            SurfaceError::DomainError { x, min, max } => {
                write!(f, "Evaluation point {x} is outside the interpolation domain [{min}, {max}].")
            }
            SurfaceError::NumericalFailure(msg) => write!(f, "Numerical failure: {msg}"),
            SurfaceError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

impl From<SurfaceError> for AppError {
    fn from(err: SurfaceError) -> Self {
        let exit_code = match err {
            SurfaceError::InsufficientData { .. } | SurfaceError::InvalidInput(_) => 3,
            SurfaceError::DomainError { .. } | SurfaceError::NumericalFailure(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_errors_map_to_exit_codes() {
        let data: AppError = SurfaceError::InsufficientData { needed: 4, got: 2 }.into();
        assert_eq!(data.exit_code(), 3);

        let numeric: AppError = SurfaceError::NumericalFailure("diverged".to_string()).into();
        assert_eq!(numeric.exit_code(), 4);
        assert_eq!(numeric.to_string(), "Numerical failure: diverged");
    }
}
