pub mod states;
pub mod params;
pub mod error;
pub mod dynamics;
pub mod integrator;
pub mod kinematics;
pub mod reactions;
pub mod report;
pub mod scenario;
