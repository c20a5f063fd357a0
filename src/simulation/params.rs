//! Physical and numerical parameters for the simulation
//!
//! `Parameters` holds the fixed constants of the mechanism:
//! - masses of the crank/ring (`m1`), planet gear (`m2`) and arm (`m3`),
//! - ring radius `R` and planet radius `r`,
//! - damping `c`, applied torques `M1`, `M2` and gravity `g`
//!
//! `SolverParams` holds the integration settings: step size, error tolerances
//! and the step budget. The horizon and sampling live in the `TimeGrid`

use crate::configuration::config::IntegratorConfig;
use super::error::SimError;

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub m1: f64, // crank / ring gear mass
    pub m2: f64, // planet gear mass
    pub m3: f64, // arm mass
    pub R: f64,  // fixed ring radius
    pub r: f64,  // planet radius
    pub c: f64,  // damping coefficient
    pub M1: f64, // torque on theta
    pub M2: f64, // torque on phi
    pub g: f64,  // gravitational acceleration
}

impl Parameters {
    /// Reference mechanism: m1=2, m2=1, m3=1, R=1, r=0.2, c=0.5, M1=2, M2=1, g=9.81
    pub fn reference() -> Self {
        Self {
            m1: 2.0,
            m2: 1.0,
            m3: 1.0,
            R: 1.0,
            r: 0.2,
            c: 0.5,
            M1: 2.0,
            M2: 1.0,
            g: 9.81,
        }
    }

    /// Same geometry and masses with every load switched off
    pub fn unloaded(self) -> Self {
        Self { c: 0.0, M1: 0.0, M2: 0.0, g: 0.0, ..self }
    }

    /// Arm length `R - r`: distance from the fixed center to point A
    pub fn arm(&self) -> f64 {
        self.R - self.r
    }

    /// Checks geometry, masses and finiteness. The mass-matrix determinant is
    /// checked separately by the equations-of-motion model
    pub fn validate(&self) -> Result<(), SimError> {
        let named = [
            ("m1", self.m1),
            ("m2", self.m2),
            ("m3", self.m3),
            ("R", self.R),
            ("r", self.r),
            ("c", self.c),
            ("M1", self.M1),
            ("M2", self.M2),
            ("g", self.g),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::InvalidParameters {
                reason: format!("{name} must be finite, got {value}"),
            });
        }

        if let Some((name, value)) = named[..3].iter().find(|(_, v)| *v <= 0.0) {
            return Err(SimError::InvalidParameters {
                reason: format!("mass {name} must be positive, got {value}"),
            });
        }

        if self.r <= 0.0 {
            return Err(SimError::InvalidParameters {
                reason: format!("planet radius r must be positive, got {}", self.r),
            });
        }
        if self.R <= self.r {
            return Err(SimError::InvalidParameters {
                reason: format!("ring radius R = {} must exceed planet radius r = {}", self.R, self.r),
            });
        }

        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::reference()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    pub integrator: IntegratorConfig, // rk4 (fixed step) or dopri5 (adaptive)
    pub h0: f64,          // fixed step (rk4) or first trial step (dopri5)
    pub atol: f64,        // absolute error tolerance
    pub rtol: f64,        // relative error tolerance
    pub max_steps: usize, // step budget for the whole run
    pub h_min: f64,       // smallest step the adaptive controller may take
}

impl SolverParams {
    /// Reference tolerances; the output grid is chosen separately as a `TimeGrid`
    pub fn reference() -> Self {
        Self {
            integrator: IntegratorConfig::Dopri5,
            h0: 1.0e-2,
            atol: 1.0e-9,
            rtol: 1.0e-9,
            max_steps: 100_000,
            h_min: 1.0e-12,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason: String| -> Result<(), SimError> { Err(SimError::InvalidSolver { reason }) };

        if !(self.h0.is_finite() && self.h0 > 0.0) {
            return invalid(format!("h0 must be positive and finite, got {}", self.h0));
        }
        if !(self.atol >= 0.0 && self.rtol >= 0.0) || self.atol + self.rtol <= 0.0 {
            return invalid(format!(
                "tolerances must be non-negative and not both zero, got atol = {}, rtol = {}",
                self.atol, self.rtol
            ));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be at least 1".to_string());
        }
        if !(self.h_min >= 0.0 && self.h_min < self.h0) {
            return invalid(format!("h_min = {} must lie in [0, h0 = {})", self.h_min, self.h0));
        }
        Ok(())
    }
}

impl Default for SolverParams {
    fn default() -> Self {
        Self::reference()
    }
}
