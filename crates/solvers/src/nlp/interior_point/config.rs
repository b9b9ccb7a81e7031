use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the interior-point backend.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    max_iters: usize,
    tol: f64,
    constr_viol_tol: f64,
    mu_init: f64,
}

/// Errors that can occur when validating an interior-point config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tol must be finite and positive")]
    Tol,

    #[error("constr_viol_tol must be finite and positive")]
    ConstrViolTol,

    #[error("mu_init must be finite and positive")]
    MuInit,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(500, 1e-8, 1e-8, 0.1).unwrap()
    }
}

impl Config {
    /// Creates a new config with validated tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance or the initial barrier parameter is
    /// not finite and positive.
    pub fn new(
        max_iters: usize,
        tol: f64,
        constr_viol_tol: f64,
        mu_init: f64,
    ) -> Result<Self, ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(tol) {
            return Err(ConfigError::Tol);
        }
        if !positive(constr_viol_tol) {
            return Err(ConfigError::ConstrViolTol);
        }
        if !positive(mu_init) {
            return Err(ConfigError::MuInit);
        }

        Ok(Self {
            max_iters,
            tol,
            constr_viol_tol,
            mu_init,
        })
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the tolerance on the scaled optimality error.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Returns the tolerance on the largest absolute constraint violation.
    #[must_use]
    pub fn constr_viol_tol(&self) -> f64 {
        self.constr_viol_tol
    }

    /// Returns the initial barrier parameter.
    #[must_use]
    pub fn mu_init(&self) -> f64 {
        self.mu_init
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert_eq!(config.max_iters(), 500);
        assert_eq!(config.tol(), 1e-8);
        assert_eq!(config.mu_init(), 0.1);
    }

    #[test]
    fn rejects_bad_tolerances() {
        assert_eq!(Config::new(10, 0.0, 1e-8, 0.1), Err(ConfigError::Tol));
        assert_eq!(Config::new(10, 1e-8, f64::NAN, 0.1), Err(ConfigError::ConstrViolTol));
        assert_eq!(Config::new(10, 1e-8, 1e-8, -1.0), Err(ConfigError::MuInit));
    }
}
