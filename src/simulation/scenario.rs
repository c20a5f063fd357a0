//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - the validated equations-of-motion model (`PlanetaryCrank`)
//! - the initial state at t = 0
//! - the output time grid
//! - solver settings (`SolverParams`)
//!
//! All validation happens here, before any integration step runs

use log::info;

use crate::configuration::config::{InitialStateConfig, MechanismConfig, ScenarioConfig};
use crate::simulation::dynamics::PlanetaryCrank;
use crate::simulation::error::SimError;
use crate::simulation::integrator::{integrate_model, TimeGrid};
use crate::simulation::params::{Parameters, SolverParams};
use crate::simulation::report::SampleReport;
use crate::simulation::states::{State, Trajectory};

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub model: PlanetaryCrank,
    pub initial: State,
    pub grid: TimeGrid,
    pub solver: SolverParams,
}

impl Scenario {
    #[allow(non_snake_case)]
    pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Self, SimError> {
        // Mechanism: MechanismConfig -> Parameters, validated with the mass matrix
        let MechanismConfig { m1, m2, m3, R, r, c, M1, M2, g } = cfg.mechanism;
        let model = PlanetaryCrank::new(Parameters { m1, m2, m3, R, r, c, M1, M2, g })?;

        let InitialStateConfig { theta, theta_dot, phi, phi_dot } = cfg.initial;
        let initial = State::new(theta, theta_dot, phi, phi_dot);

        // Solver: unset fields fall back to the reference settings
        let s_cfg = &cfg.solver;
        let defaults = SolverParams::reference();
        let solver = SolverParams {
            integrator: s_cfg.integrator,
            h0: s_cfg.h0.unwrap_or(defaults.h0),
            atol: s_cfg.atol.unwrap_or(defaults.atol),
            rtol: s_cfg.rtol.unwrap_or(defaults.rtol),
            max_steps: s_cfg.max_steps.unwrap_or(defaults.max_steps),
            h_min: s_cfg.h_min.unwrap_or(defaults.h_min),
        };
        solver.validate()?;

        let grid = TimeGrid::uniform(s_cfg.t_end, s_cfg.samples)?;

        Ok(Self { model, initial, grid, solver })
    }

    /// The reference run from `ScenarioConfig::reference`
    pub fn reference() -> Result<Self, SimError> {
        Self::build_scenario(&ScenarioConfig::reference())
    }

    pub fn params(&self) -> &Parameters {
        self.model.params()
    }

    pub fn run(&self) -> Result<Trajectory, SimError> {
        info!(
            "integrating {} samples over [{}, {}] with {:?}",
            self.grid.len(),
            self.grid.start(),
            self.grid.end(),
            self.solver.integrator
        );
        integrate_model(&self.model, self.initial, &self.grid, &self.solver)
    }

    /// Kinematics of A and the joint reaction for every sample
    pub fn report(&self, trajectory: &Trajectory) -> Vec<SampleReport> {
        trajectory
            .iter()
            .map(|s| SampleReport::from_sample(self.params(), s))
            .collect()
    }
}
