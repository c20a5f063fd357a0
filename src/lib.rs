pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{State, Accelerations, Sample, Trajectory, TrajectoryStats, NVec2, NVec4};
pub use simulation::params::{Parameters, SolverParams};
pub use simulation::error::SimError;
pub use simulation::dynamics::{OdeSystem, MassMatrix, PlanetaryCrank};
pub use simulation::integrator::{integrate, integrate_model, TimeGrid};
pub use simulation::kinematics::{position, velocity, acceleration, planet_spin, EngagementKinematics};
pub use simulation::reactions::{reaction, reaction_at_sample, reaction_force};
pub use simulation::report::{SampleReport, write_csv};
pub use simulation::scenario::Scenario;

pub use configuration::config::{IntegratorConfig, MechanismConfig, InitialStateConfig, SolverConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_integrators, bench_tolerance_curve};
