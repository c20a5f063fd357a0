//! Core state types for the planetary gear simulation.
//!
//! - `State`      generalized coordinates and velocities `(theta, theta_dot, phi, phi_dot)`
//! - `Sample`     one trajectory point: time, state and the accelerations at that state
//! - `Trajectory` the ordered samples produced once by the integrator
//!
//! Angles are unwrapped, never normalized into [0, 2pi)

use std::fmt;

use nalgebra::{Vector2, Vector4};

pub type NVec2 = Vector2<f64>;
pub type NVec4 = Vector4<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct State {
    pub theta: f64,     // crank / ring gear rotation
    pub theta_dot: f64, // crank angular velocity
    pub phi: f64,       // planet orbit angle about the fixed gear center
    pub phi_dot: f64,   // planet orbit angular velocity
}

impl State {
    pub fn new(theta: f64, theta_dot: f64, phi: f64, phi_dot: f64) -> Self {
        Self { theta, theta_dot, phi, phi_dot }
    }

    /// Packs the state in integration order `[theta, theta_dot, phi, phi_dot]`
    pub fn to_vector(&self) -> NVec4 {
        NVec4::new(self.theta, self.theta_dot, self.phi, self.phi_dot)
    }

    pub fn from_vector(y: &NVec4) -> Self {
        Self::new(y[0], y[1], y[2], y[3])
    }

    /// Generalized velocities `(theta_dot, phi_dot)`
    pub fn velocities(&self) -> NVec2 {
        NVec2::new(self.theta_dot, self.phi_dot)
    }

    pub fn is_finite(&self) -> bool {
        self.theta.is_finite()
            && self.theta_dot.is_finite()
            && self.phi.is_finite()
            && self.phi_dot.is_finite()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(theta = {:.6e}, theta_dot = {:.6e}, phi = {:.6e}, phi_dot = {:.6e})",
            self.theta, self.theta_dot, self.phi, self.phi_dot
        )
    }
}

/// Generalized accelerations solved from the mass matrix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Accelerations {
    pub theta_ddot: f64,
    pub phi_ddot: f64,
}

/// One trajectory point. `accel` is evaluated once at `state` while integrating
/// and reused by every downstream calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub state: State,
    pub accel: Accelerations,
}

/// Integrator bookkeeping for one run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrajectoryStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// Ordered samples, index i matches time-grid index i
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
    stats: TrajectoryStats,
}

impl Trajectory {
    pub(crate) fn new(samples: Vec<Sample>, stats: TrajectoryStats) -> Self {
        Self { samples, stats }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, i: usize) -> Option<&Sample> {
        self.samples.get(i)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.t)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn stats(&self) -> TrajectoryStats {
        self.stats
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
