//! Equations of motion for the planetary gear / crank mechanism
//!
//! The two generalized coordinates `theta` and `phi` are coupled through a
//! constant 2x2 mass matrix `A`. Each evaluation assembles the generalized
//! force vector `b(state)` and solves `A * [theta_ddot, phi_ddot] = b` by
//! Cramer's rule, no allocation and no dense-matrix solver involved

use super::error::SimError;
use super::params::Parameters;
use super::states::{Accelerations, NVec2, NVec4, State};

/// First-order ODE `dy/dt = f(t, y)` over the packed 4-vector state
/// Implementations must be pure: same `(t, y)` gives the same result
pub trait OdeSystem {
    fn rhs(&self, t: f64, y: &NVec4) -> Result<NVec4, SimError>;
}

/// Constant mass matrix of the mechanism
///
/// ```text
/// a11 = (m1 + m2) R^2 + m3 (R - r)^2
/// a12 = a21 = m2 R
/// a22 = (3 m2 + 2/3 m3) (R - r)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassMatrix {
    pub a11: f64,
    pub a12: f64,
    pub a21: f64,
    pub a22: f64,
}

impl MassMatrix {
    pub fn from_params(p: &Parameters) -> Self {
        let arm = p.arm();
        let a11 = (p.m1 + p.m2) * p.R * p.R + p.m3 * arm * arm;
        let a12 = p.m2 * p.R;
        let a22 = (3.0 * p.m2 + (2.0 / 3.0) * p.m3) * arm;

        Self { a11, a12, a21: a12, a22 }
    }

    pub fn det(&self) -> f64 {
        self.a11 * self.a22 - self.a12 * self.a21
    }

    /// `det` counts as zero when it is lost in the rounding of its two products
    pub fn is_singular(&self) -> bool {
        let det = self.det();
        let scale = (self.a11 * self.a22).abs() + (self.a12 * self.a21).abs();
        !det.is_finite() || det.abs() <= 16.0 * f64::EPSILON * scale
    }

    /// `A * x`
    pub fn apply(&self, x: &NVec2) -> NVec2 {
        NVec2::new(
            self.a11 * x[0] + self.a12 * x[1],
            self.a21 * x[0] + self.a22 * x[1],
        )
    }

    /// Solve `A * x = b` by Cramer's rule
    pub fn solve(&self, b: &NVec2) -> Result<NVec2, SimError> {
        if self.is_singular() {
            return Err(SimError::DegenerateSystem { det: self.det() });
        }
        let det = self.det();
        let x1 = (b[0] * self.a22 - b[1] * self.a12) / det;
        let x2 = (-b[0] * self.a21 + b[1] * self.a11) / det;
        Ok(NVec2::new(x1, x2))
    }
}

/// The planetary gear / crank model, bound to one validated parameter set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetaryCrank {
    params: Parameters,
    mass: MassMatrix,
}

impl PlanetaryCrank {
    /// Validates the parameters and rejects any set whose mass matrix is not
    /// positive definite in the determinant sense (`det <= 0`)
    pub fn new(params: Parameters) -> Result<Self, SimError> {
        params.validate()?;

        let mass = MassMatrix::from_params(&params);
        if mass.is_singular() || mass.det() <= 0.0 {
            return Err(SimError::DegenerateSystem { det: mass.det() });
        }

        Ok(Self { params, mass })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn mass_matrix(&self) -> MassMatrix {
        self.mass
    }

    /// Generalized force vector
    ///
    /// ```text
    /// b1 = 2 M1
    /// b2 = 2 c phi + 2 M2 - (2 m2 + m3) g sin(phi) (R - r)
    /// ```
    pub fn generalized_force(&self, state: &State) -> NVec2 {
        let p = &self.params;
        let b1 = 2.0 * p.M1;
        let b2 = 2.0 * p.c * state.phi + 2.0 * p.M2
            - (2.0 * p.m2 + p.m3) * p.g * state.phi.sin() * p.arm();
        NVec2::new(b1, b2)
    }

    /// Generalized accelerations at `(state, t)`. The model is autonomous, `t`
    /// is part of the contract only
    pub fn accelerations(&self, state: &State, _t: f64) -> Result<Accelerations, SimError> {
        let qdd = self.mass.solve(&self.generalized_force(state))?;
        Ok(Accelerations { theta_ddot: qdd[0], phi_ddot: qdd[1] })
    }

    /// `(theta_dot, theta_ddot, phi_dot, phi_ddot)`
    pub fn derivative(&self, state: &State, t: f64) -> Result<NVec4, SimError> {
        let acc = self.accelerations(state, t)?;
        Ok(NVec4::new(state.theta_dot, acc.theta_ddot, state.phi_dot, acc.phi_ddot))
    }

    /// `A * q_dot`, constant in time when every load is zero
    pub fn generalized_momentum(&self, state: &State) -> NVec2 {
        self.mass.apply(&state.velocities())
    }

    /// `1/2 q_dot^T A q_dot`
    pub fn kinetic_energy(&self, state: &State) -> f64 {
        let qd = state.velocities();
        0.5 * qd.dot(&self.mass.apply(&qd))
    }
}

impl OdeSystem for PlanetaryCrank {
    fn rhs(&self, t: f64, y: &NVec4) -> Result<NVec4, SimError> {
        self.derivative(&State::from_vector(y), t)
    }
}
