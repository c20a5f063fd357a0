//! Joint reaction force at A between the crank and the planet gear
//!
//! Newton's second law on the planet center of mass:
//!
//! ```text
//! NAx = m2 (R - r) (phi_dot cos(phi) - phi_ddot sin(phi))
//! NAy = m2 (-(R - r) (phi_dot sin(phi) + phi_ddot cos(phi)) + g)
//! ```

use super::dynamics::PlanetaryCrank;
use super::error::SimError;
use super::params::Parameters;
use super::states::{NVec2, Sample, State};

/// Reaction from a known `phi_ddot`
pub fn reaction_force(p: &Parameters, phi: f64, phi_dot: f64, phi_ddot: f64) -> NVec2 {
    let arm = p.arm();
    let (s, c) = phi.sin_cos();
    let nax = p.m2 * arm * (phi_dot * c - phi_ddot * s);
    let nay = p.m2 * (-arm * (phi_dot * s + phi_ddot * c) + p.g);
    NVec2::new(nax, nay)
}

/// Re-evaluates the equations of motion at `(state, t)` for `phi_ddot`
pub fn reaction(model: &PlanetaryCrank, state: &State, t: f64) -> Result<NVec2, SimError> {
    let acc = model.accelerations(state, t)?;
    Ok(reaction_force(model.params(), state.phi, state.phi_dot, acc.phi_ddot))
}

/// Uses the accelerations cached on the sample
pub fn reaction_at_sample(p: &Parameters, sample: &Sample) -> NVec2 {
    reaction_force(p, sample.state.phi, sample.state.phi_dot, sample.accel.phi_ddot)
}
