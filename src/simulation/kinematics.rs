//! Cartesian kinematics of the engagement point A
//!
//! A sits on the planet center, at distance `R - r` from the fixed gear center
//! along the orbit angle `phi`. Velocity and acceleration are the closed-form
//! time derivatives of that position, no finite differencing

use super::params::Parameters;
use super::states::{NVec2, Sample};

/// `xA = (R - r) cos(phi)`, `yA = (R - r) sin(phi)`
pub fn position(p: &Parameters, phi: f64) -> NVec2 {
    let arm = p.arm();
    NVec2::new(arm * phi.cos(), arm * phi.sin())
}

/// `vA = (R - r) phi_dot (-sin(phi), cos(phi))`
pub fn velocity(p: &Parameters, phi: f64, phi_dot: f64) -> NVec2 {
    let arm = p.arm();
    NVec2::new(-arm * phi_dot * phi.sin(), arm * phi_dot * phi.cos())
}

/// Tangential term from `phi_ddot` plus centripetal term from `phi_dot^2`
pub fn acceleration(p: &Parameters, phi: f64, phi_dot: f64, phi_ddot: f64) -> NVec2 {
    let arm = p.arm();
    let (s, c) = phi.sin_cos();
    let w2 = phi_dot * phi_dot;
    NVec2::new(-arm * (phi_ddot * s + w2 * c), arm * (phi_ddot * c - w2 * s))
}

/// Spin of the planet gear about its own center for crank angle `theta`
/// (rolling contact with ratio `R / r`)
pub fn planet_spin(p: &Parameters, theta: f64) -> f64 {
    -theta * p.R / p.r
}

/// Position, velocity and acceleration of A at one trajectory sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementKinematics {
    pub position: NVec2,
    pub velocity: NVec2,
    pub acceleration: NVec2,
}

impl EngagementKinematics {
    /// Uses the accelerations cached on the sample
    pub fn at(p: &Parameters, sample: &Sample) -> Self {
        let s = &sample.state;
        Self {
            position: position(p, s.phi),
            velocity: velocity(p, s.phi, s.phi_dot),
            acceleration: acceleration(p, s.phi, s.phi_dot, sample.accel.phi_ddot),
        }
    }
}
