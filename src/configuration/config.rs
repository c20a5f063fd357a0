//! Configuration types for loading mechanism scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`MechanismConfig`]    – masses, radii, damping, torques and gravity
//! - [`InitialStateConfig`] – generalized coordinates and velocities at t = 0
//! - [`SolverConfig`]       – integrator choice, horizon, output samples, tolerances
//! - [`ScenarioConfig`]     – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! The reference run expressed in this format:
//!
//! ```yaml
//! mechanism:
//!   m1: 2.0        # crank / ring gear mass
//!   m2: 1.0        # planet gear mass
//!   m3: 1.0        # arm mass
//!   R: 1.0         # fixed gear radius
//!   r: 0.2         # planet gear radius
//!   c: 0.5         # damping
//!   M1: 2.0        # torque on theta
//!   M2: 1.0        # torque on phi
//!   g: 9.81
//!
//! initial:
//!   theta: 1.5707963267948966
//!   theta_dot: 1.5707963267948966
//!   phi: 0.0
//!   phi_dot: 0.7853981633974483
//!
//! solver:
//!   integrator: "dopri5"   # or "rk4"
//!   t_end: 5.0
//!   samples: 250
//!   h0: 0.01               # optional
//!   atol: 1.0e-9           # optional
//!   rtol: 1.0e-9           # optional
//!   max_steps: 100000      # optional
//! ```
//!
//! `Scenario::build_scenario` maps this configuration into validated runtime types.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Deserialize, Serialize};

/// Which integrator advances the state
/// `integrator: "dopri5"` or `integrator: "rk4"`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[serde(rename = "rk4")] // Classical 4th-order Runge–Kutta, fixed step h0
    Rk4,

    #[default]
    #[serde(rename = "dopri5")] // Dormand–Prince 5(4), adaptive step with atol/rtol error control
    Dopri5,
}

/// Physical constants of the mechanism
#[allow(non_snake_case)]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MechanismConfig {
    pub m1: f64, // crank / ring gear mass
    pub m2: f64, // planet gear mass
    pub m3: f64, // arm mass
    pub R: f64,  // fixed gear radius, must exceed r
    pub r: f64,  // planet gear radius
    #[serde(default)]
    pub c: f64,  // damping coefficient
    #[serde(default)]
    pub M1: f64, // applied torque on theta
    #[serde(default)]
    pub M2: f64, // applied torque on phi
    #[serde(default = "default_gravity")]
    pub g: f64,  // gravitational acceleration
}

/// Initial generalized coordinates and velocities
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InitialStateConfig {
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub theta_dot: f64,
    #[serde(default)]
    pub phi: f64,
    #[serde(default)]
    pub phi_dot: f64,
}

/// Integration settings. Only the horizon and the output sample count are required
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SolverConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig,
    pub t_end: f64,     // horizon, output grid is uniform over [0, t_end]
    pub samples: usize, // number of output samples, both ends included
    pub h0: Option<f64>,
    pub atol: Option<f64>,
    pub rtol: Option<f64>,
    pub max_steps: Option<usize>,
    pub h_min: Option<f64>,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub mechanism: MechanismConfig,
    #[serde(default)]
    pub initial: InitialStateConfig,
    pub solver: SolverConfig,
}

fn default_gravity() -> f64 {
    9.81
}

impl ScenarioConfig {
    /// Reference run: 250 samples over 5 s from (pi/2, pi/2, 0, pi/4)
    pub fn reference() -> Self {
        Self {
            mechanism: MechanismConfig {
                m1: 2.0,
                m2: 1.0,
                m3: 1.0,
                R: 1.0,
                r: 0.2,
                c: 0.5,
                M1: 2.0,
                M2: 1.0,
                g: 9.81,
            },
            initial: InitialStateConfig {
                theta: FRAC_PI_2,
                theta_dot: FRAC_PI_2,
                phi: 0.0,
                phi_dot: FRAC_PI_4,
            },
            solver: SolverConfig {
                integrator: IntegratorConfig::Dopri5,
                t_end: 5.0,
                samples: 250,
                h0: None,
                atol: None,
                rtol: None,
                max_steps: None,
                h_min: None,
            },
        }
    }
}
