//! Time integrators for the mechanism state
//!
//! Provides an adaptive Dormand–Prince 5(4) integrator and a fixed-step
//! classical RK4, both driven by an [`OdeSystem`] and [`SolverParams`].
//! Internal stepping is independent of the output grid: steps are only
//! clipped so that every grid time is hit exactly

use log::{debug, warn};

use super::dynamics::{OdeSystem, PlanetaryCrank};
use super::error::SimError;
use super::params::{Parameters, SolverParams};
use super::states::{Accelerations, NVec4, Sample, State, Trajectory, TrajectoryStats};
use crate::configuration::config::IntegratorConfig;

/// Output sampling times: finite, strictly increasing, at least one point
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    pub fn new(times: Vec<f64>) -> Result<Self, SimError> {
        if times.is_empty() {
            return Err(SimError::InvalidTimeGrid { reason: "grid is empty".to_string() });
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return Err(SimError::InvalidTimeGrid { reason: format!("non-finite time {t}") });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidTimeGrid {
                reason: format!("times not strictly increasing at index {}: {} -> {}", i + 1, times[i], times[i + 1]),
            });
        }
        Ok(Self { times })
    }

    /// `samples` evenly spaced times over `[0, t_end]`, both ends included
    pub fn uniform(t_end: f64, samples: usize) -> Result<Self, SimError> {
        if !(t_end.is_finite() && t_end > 0.0) {
            return Err(SimError::InvalidTimeGrid {
                reason: format!("t_end must be positive and finite, got {t_end}"),
            });
        }
        match samples {
            0 => Err(SimError::InvalidTimeGrid { reason: "at least one sample is required".to_string() }),
            1 => Self::new(vec![0.0]),
            n => {
                let dt = t_end / (n - 1) as f64;
                let mut times: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
                times[n - 1] = t_end;
                Self::new(times)
            }
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

/// Integrator output at one grid time: `y` and `dy = f(t, y)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub t: f64,
    pub y: NVec4,
    pub dy: NVec4,
}

/// Integrate the mechanism from `initial` over `grid`
///
/// Builds the equations-of-motion model (validating `params`) and delegates to
/// [`integrate_model`]
pub fn integrate(
    params: &Parameters,
    initial: State,
    grid: &TimeGrid,
    solver: &SolverParams,
) -> Result<Trajectory, SimError> {
    let model = PlanetaryCrank::new(*params)?;
    integrate_model(&model, initial, grid, solver)
}

/// Integrate an already-built model. Each sample caches the accelerations at
/// its own state, taken from the integrator's last derivative evaluation
pub fn integrate_model(
    model: &PlanetaryCrank,
    initial: State,
    grid: &TimeGrid,
    solver: &SolverParams,
) -> Result<Trajectory, SimError> {
    solver.validate()?;
    if !initial.is_finite() {
        return Err(SimError::InvalidParameters {
            reason: format!("initial state must be finite, got {initial}"),
        });
    }

    let y0 = initial.to_vector();
    let (points, stats) = match solver.integrator {
        IntegratorConfig::Dopri5 => dopri5(model, y0, grid, solver)?,
        IntegratorConfig::Rk4 => rk4(model, y0, grid, solver)?,
    };

    debug!(
        "integrated {} samples: {} accepted, {} rejected, {} evaluations",
        points.len(),
        stats.accepted_steps,
        stats.rejected_steps,
        stats.evaluations
    );
    if stats.rejected_steps > stats.accepted_steps {
        warn!(
            "step controller rejected {} of {} steps, consider a smaller h0",
            stats.rejected_steps,
            stats.accepted_steps + stats.rejected_steps
        );
    }

    let samples = points
        .into_iter()
        .map(|p| Sample {
            t: p.t,
            state: State::from_vector(&p.y),
            accel: Accelerations { theta_ddot: p.dy[1], phi_ddot: p.dy[3] },
        })
        .collect();

    Ok(Trajectory::new(samples, stats))
}

fn non_convergence(t: f64, y: &NVec4, steps: usize, reason: String) -> SimError {
    SimError::NonConvergence { t, state: State::from_vector(y), steps, reason }
}

// =========================================================================================
// Dormand–Prince 5(4)
// =========================================================================================

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
// 5th order weights, also the last stage row (FSAL)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// difference between 5th and embedded 4th order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// One Dormand–Prince step from `(t, y)` with `k1 = f(t, y)` already known
/// Returns `(y_new, f(t + h, y_new), scaled error norm)`
pub fn dopri5_step<S: OdeSystem + ?Sized>(
    sys: &S,
    t: f64,
    y: &NVec4,
    k1: &NVec4,
    h: f64,
    solver: &SolverParams,
) -> Result<(NVec4, NVec4, f64), SimError> {
    let k2 = sys.rhs(t + C2 * h, &(y + h * (A21 * k1)))?;
    let k3 = sys.rhs(t + C3 * h, &(y + h * (A31 * k1 + A32 * k2)))?;
    let k4 = sys.rhs(t + C4 * h, &(y + h * (A41 * k1 + A42 * k2 + A43 * k3)))?;
    let k5 = sys.rhs(t + C5 * h, &(y + h * (A51 * k1 + A52 * k2 + A53 * k3 + A54 * k4)))?;
    let k6 = sys.rhs(t + h, &(y + h * (A61 * k1 + A62 * k2 + A63 * k3 + A64 * k4 + A65 * k5)))?;

    let y_new = y + h * (B1 * k1 + B3 * k3 + B4 * k4 + B5 * k5 + B6 * k6);
    let k7 = sys.rhs(t + h, &y_new)?;

    let err = h * (E1 * k1 + E3 * k3 + E4 * k4 + E5 * k5 + E6 * k6 + E7 * k7);

    // max_i |err_i| / (atol + rtol * max(|y_i|, |y_new_i|))
    let norm = (0..4)
        .map(|i| {
            let scale = solver.atol + solver.rtol * y[i].abs().max(y_new[i].abs());
            (err[i] / scale).abs()
        })
        .fold(0.0_f64, |acc, e| if e.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(e) });

    Ok((y_new, k7, norm))
}

/// Adaptive Dormand–Prince integration sampled at every `grid` time
pub fn dopri5<S: OdeSystem + ?Sized>(
    sys: &S,
    y0: NVec4,
    grid: &TimeGrid,
    solver: &SolverParams,
) -> Result<(Vec<GridPoint>, TrajectoryStats), SimError> {
    let mut stats = TrajectoryStats::default();
    let mut out = Vec::with_capacity(grid.len());

    let mut t = grid.start();
    let mut y = y0;
    let mut dy = sys.rhs(t, &y)?;
    stats.evaluations += 1;
    out.push(GridPoint { t, y, dy });

    let mut h = solver.h0;

    for &target in &grid.times()[1..] {
        while t < target {
            let steps = stats.accepted_steps + stats.rejected_steps;
            if steps >= solver.max_steps {
                return Err(non_convergence(t, &y, steps, format!("step budget of {} exhausted", solver.max_steps)));
            }

            // Clip to land exactly on the grid time, absorbing a sliver of up to 1%
            let remaining = target - t;
            let landing = h * 1.01 >= remaining;
            let h_try = if landing { remaining } else { h };

            let (y_new, dy_new, err) = dopri5_step(sys, t, &y, &dy, h_try, solver)?;
            stats.evaluations += 6;

            if err <= 1.0 {
                stats.accepted_steps += 1;
                t = if landing { target } else { t + h_try };
                y = y_new;
                dy = dy_new;

                let factor = if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                // a clipped landing step says nothing about the step we could take
                h = if landing && factor >= 1.0 { (h_try * factor).max(h) } else { h_try * factor };
            } else {
                // also taken for NaN error: the trial state blew up, shrink hard
                stats.rejected_steps += 1;
                let factor = if err.is_finite() {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, 1.0)
                } else {
                    MIN_FACTOR
                };
                h = h_try * factor;

                if h < solver.h_min {
                    return Err(non_convergence(
                        t,
                        &y,
                        stats.accepted_steps + stats.rejected_steps,
                        format!("step size {h:e} fell below h_min = {:e}", solver.h_min),
                    ));
                }
            }
        }
        out.push(GridPoint { t, y, dy });
    }

    Ok((out, stats))
}

// =========================================================================================
// Classical RK4
// =========================================================================================

/// One classical RK4 step with `k1 = f(t, y)` already known
pub fn rk4_step<S: OdeSystem + ?Sized>(
    sys: &S,
    t: f64,
    y: &NVec4,
    k1: &NVec4,
    h: f64,
) -> Result<NVec4, SimError> {
    let half_h = 0.5 * h;

    let k2 = sys.rhs(t + half_h, &(y + half_h * k1))?;
    let k3 = sys.rhs(t + half_h, &(y + half_h * k2))?;
    let k4 = sys.rhs(t + h, &(y + h * k3))?;

    // y_n+1 = y_n + h/6 (k1 + 2 k2 + 2 k3 + k4)
    Ok(y + (h / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
}

/// Fixed-step RK4. Each grid interval is split into equal sub-steps no longer
/// than `solver.h0`
pub fn rk4<S: OdeSystem + ?Sized>(
    sys: &S,
    y0: NVec4,
    grid: &TimeGrid,
    solver: &SolverParams,
) -> Result<(Vec<GridPoint>, TrajectoryStats), SimError> {
    let mut stats = TrajectoryStats::default();
    let mut out = Vec::with_capacity(grid.len());

    let mut t = grid.start();
    let mut y = y0;
    let mut dy = sys.rhs(t, &y)?;
    stats.evaluations += 1;
    out.push(GridPoint { t, y, dy });

    for &target in &grid.times()[1..] {
        let span = target - t;
        let n = (span / solver.h0).ceil().max(1.0) as usize;
        let h = span / n as f64;

        for i in 0..n {
            if stats.accepted_steps >= solver.max_steps {
                return Err(non_convergence(
                    t,
                    &y,
                    stats.accepted_steps,
                    format!("step budget of {} exhausted", solver.max_steps),
                ));
            }

            let y_new = rk4_step(sys, t, &y, &dy, h)?;
            let t_new = if i + 1 == n { target } else { t + h };
            if !y_new.iter().all(|v| v.is_finite()) {
                return Err(non_convergence(t, &y, stats.accepted_steps, "state became non-finite".to_string()));
            }

            t = t_new;
            y = y_new;
            dy = sys.rhs(t, &y)?;
            stats.accepted_steps += 1;
            stats.evaluations += 4;
        }
        out.push(GridPoint { t, y, dy });
    }

    Ok((out, stats))
}
