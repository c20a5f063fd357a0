use std::time::Instant;

use crate::configuration::config::IntegratorConfig;
use crate::simulation::dynamics::PlanetaryCrank;
use crate::simulation::error::SimError;
use crate::simulation::integrator::{integrate_model, TimeGrid};
use crate::simulation::params::{Parameters, SolverParams};
use crate::simulation::states::State;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

fn reference_start() -> State {
    State::new(FRAC_PI_2, FRAC_PI_2, 0.0, FRAC_PI_4)
}

/// Time rk4 against dopri5 on the reference mechanism for growing output grids
pub fn bench_integrators() -> Result<(), SimError> {
    // Output grid sizes over the 5 s horizon
    let ns = [50, 250, 1000, 5000, 20000];
    let runs = 5; // repetitions per measurement

    let model = PlanetaryCrank::new(Parameters::reference())?;

    for n in ns {
        let grid = TimeGrid::uniform(5.0, n)?;

        let dopri = SolverParams::reference();
        let rk = SolverParams { integrator: IntegratorConfig::Rk4, h0: 1.0e-3, ..dopri.clone() };

        // Warm up
        integrate_model(&model, reference_start(), &grid, &dopri)?;

        let t0 = Instant::now();
        let mut evals_dopri = 0;
        for _ in 0..runs {
            evals_dopri = integrate_model(&model, reference_start(), &grid, &dopri)?.stats().evaluations;
        }
        let ms_dopri = t0.elapsed().as_secs_f64() * 1000.0 / runs as f64;

        let t1 = Instant::now();
        let mut evals_rk = 0;
        for _ in 0..runs {
            evals_rk = integrate_model(&model, reference_start(), &grid, &rk)?.stats().evaluations;
        }
        let ms_rk = t1.elapsed().as_secs_f64() * 1000.0 / runs as f64;

        println!(
            "N = {n:5}, dopri5 = {ms_dopri:8.3} ms ({evals_dopri:6} evals),   rk4 = {ms_rk:8.3} ms ({evals_rk:6} evals)"
        );
    }

    Ok(())
}

/// Accuracy/cost trade-off of dopri5 over rtol = atol = 1e-3 .. 1e-12
/// Paste output directly into a spreadsheet to graph
pub fn bench_tolerance_curve() -> Result<(), SimError> {
    let model = PlanetaryCrank::new(Parameters::reference())?;
    let grid = TimeGrid::uniform(5.0, 250)?;

    // Tight run as the accuracy baseline
    let tight = SolverParams { atol: 1.0e-13, rtol: 1.0e-13, max_steps: 1_000_000, ..SolverParams::reference() };
    let baseline = integrate_model(&model, reference_start(), &grid, &tight)?;
    let Some(end) = baseline.last() else {
        return Ok(());
    };
    let phi_ref = end.state.phi;

    println!("tol,ms,accepted,rejected,phi_err");

    for k in 3..=12 {
        let tol = 10f64.powi(-k);
        let solver = SolverParams { atol: tol, rtol: tol, ..SolverParams::reference() };

        let t0 = Instant::now();
        let traj = integrate_model(&model, reference_start(), &grid, &solver)?;
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        let stats = traj.stats();
        let phi_err = traj.last().map_or(f64::NAN, |s| (s.state.phi - phi_ref).abs());
        println!("{:e},{:.6},{},{},{:e}", tol, ms, stats.accepted_steps, stats.rejected_steps, phi_err);
    }

    Ok(())
}
