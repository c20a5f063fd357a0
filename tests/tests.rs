use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use approx::assert_relative_eq;

use gearsim::simulation::kinematics::{acceleration, position, velocity};
use gearsim::simulation::reactions::reaction;
use gearsim::{
    integrate, integrate_model, IntegratorConfig, Parameters, PlanetaryCrank, Scenario, ScenarioConfig,
    SimError, SolverParams, State, TimeGrid, Trajectory,
};

/// Initial state of the reference run
pub fn reference_state() -> State {
    State::new(FRAC_PI_2, FRAC_PI_2, 0.0, FRAC_PI_4)
}

/// Reference run with a denser output grid
pub fn dense_reference(samples: usize) -> (PlanetaryCrank, Trajectory) {
    let model = PlanetaryCrank::new(Parameters::reference()).unwrap();
    let grid = TimeGrid::uniform(5.0, samples).unwrap();
    let traj = integrate_model(&model, reference_state(), &grid, &SolverParams::reference()).unwrap();
    (model, traj)
}

/// Load a YAML file from the scenarios directory
pub fn load_scenario(name: &str) -> ScenarioConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name);
    let file = File::open(&path).unwrap();
    serde_yaml::from_reader(BufReader::new(file)).unwrap()
}

// ==================================================================================
// Equations of motion
// ==================================================================================

#[test]
fn unloaded_mechanism_at_rest_stays_put() {
    let p = Parameters::reference().unloaded();
    let start = State::new(0.3, 0.0, 1.1, 0.0);
    let grid = TimeGrid::uniform(5.0, 100).unwrap();

    let traj = integrate(&p, start, &grid, &SolverParams::reference()).unwrap();

    assert_eq!(traj.len(), 100);
    for s in &traj {
        assert!(
            (s.state.to_vector() - start.to_vector()).norm() < 1e-14,
            "state drifted at t = {}: {}",
            s.t,
            s.state
        );
    }
}

#[test]
fn reference_determinant_positive_for_every_phi() {
    let model = PlanetaryCrank::new(Parameters::reference()).unwrap();
    for k in 0..=72 {
        let phi = -2.0 * PI + k as f64 * PI / 18.0;
        let state = State::new(0.0, 0.0, phi, 0.0);
        assert!(model.mass_matrix().det() > 0.0);
        let acc = model.accelerations(&state, 0.0).unwrap();
        assert!(acc.theta_ddot.is_finite() && acc.phi_ddot.is_finite());
    }
}

#[test]
fn invalid_parameter_sets_rejected() {
    let grid = TimeGrid::uniform(1.0, 10).unwrap();
    let solver = SolverParams::reference();

    let equal_radii = Parameters { r: 1.0, ..Parameters::reference() };
    assert!(matches!(
        integrate(&equal_radii, reference_state(), &grid, &solver),
        Err(SimError::InvalidParameters { .. })
    ));

    let massless_planet = Parameters { m2: 0.0, ..Parameters::reference() };
    assert!(integrate(&massless_planet, reference_state(), &grid, &solver).is_err());

    let negative_det = Parameters { m2: 50.0, r: 0.999, ..Parameters::reference() };
    assert!(matches!(
        integrate(&negative_det, reference_state(), &grid, &solver),
        Err(SimError::DegenerateSystem { .. })
    ));
}

#[test]
fn generalized_momentum_conserved_without_loads() {
    let model = PlanetaryCrank::new(Parameters::reference().unloaded()).unwrap();
    let start = State::new(0.0, 1.3, 0.5, -0.7);
    let grid = TimeGrid::uniform(5.0, 250).unwrap();

    let traj = integrate_model(&model, start, &grid, &SolverParams::reference()).unwrap();

    let p0 = model.generalized_momentum(&start);
    let e0 = model.kinetic_energy(&start);
    for s in &traj {
        let p = model.generalized_momentum(&s.state);
        assert!((p - p0).norm() < 1e-9, "momentum changed at t = {}: {:?} vs {:?}", s.t, p, p0);
        assert_relative_eq!(model.kinetic_energy(&s.state), e0, epsilon = 1e-9);
    }
}

#[test]
fn angles_are_unwrapped() {
    let p = Parameters::reference().unloaded();
    let grid = TimeGrid::uniform(10.0, 11).unwrap();
    let traj = integrate(&p, State::new(0.0, 1.0, 0.0, 2.0), &grid, &SolverParams::reference()).unwrap();

    let end = traj.last().unwrap();
    assert_relative_eq!(end.state.theta, 10.0, epsilon = 1e-9);
    assert_relative_eq!(end.state.phi, 20.0, epsilon = 1e-9);
}

// ==================================================================================
// Integrator
// ==================================================================================

#[test]
fn reference_run_completes() {
    let scenario = Scenario::reference().unwrap();
    let traj = scenario.run().unwrap();

    assert_eq!(traj.len(), 250);
    assert_eq!(traj.first().unwrap().t, 0.0);
    assert_eq!(traj.last().unwrap().t, 5.0);
    assert_eq!(traj.first().unwrap().state, reference_state());
    assert!(traj.iter().all(|s| s.state.is_finite()));

    let grid: Vec<f64> = traj.times().collect();
    assert_eq!(grid.as_slice(), scenario.grid.times());
}

#[test]
fn cached_accelerations_match_reevaluation() {
    let (model, traj) = dense_reference(250);
    for s in &traj {
        let acc = model.accelerations(&s.state, s.t).unwrap();
        assert_eq!(acc, s.accel, "cached accelerations differ at t = {}", s.t);
    }
}

#[test]
fn rk4_and_dopri5_agree() {
    let model = PlanetaryCrank::new(Parameters::reference()).unwrap();
    let grid = TimeGrid::uniform(5.0, 250).unwrap();

    let adaptive = integrate_model(&model, reference_state(), &grid, &SolverParams::reference()).unwrap();
    let fixed = SolverParams { integrator: IntegratorConfig::Rk4, h0: 1.0e-3, ..SolverParams::reference() };
    let fixed = integrate_model(&model, reference_state(), &grid, &fixed).unwrap();

    for (a, b) in adaptive.iter().zip(fixed.iter()) {
        assert_eq!(a.t, b.t);
        let diff = (a.state.to_vector() - b.state.to_vector()).norm();
        assert!(diff < 1e-6, "rk4 and dopri5 diverge at t = {}: {}", a.t, diff);
    }
}

#[test]
fn integration_is_deterministic() {
    let (_, a) = dense_reference(250);
    let (_, b) = dense_reference(250);
    assert_eq!(a, b);
}

#[test]
fn exhausted_step_budget_is_reported() {
    let p = Parameters::reference();
    let grid = TimeGrid::uniform(5.0, 250).unwrap();
    let solver = SolverParams { max_steps: 3, ..SolverParams::reference() };

    match integrate(&p, reference_state(), &grid, &solver) {
        Err(SimError::NonConvergence { t, steps, state, .. }) => {
            assert_eq!(steps, 3);
            assert!(t < 5.0);
            assert!(state.is_finite());
        }
        other => panic!("expected NonConvergence, got {other:?}"),
    }
}

// ==================================================================================
// Kinematics and reactions
// ==================================================================================

#[test]
fn closed_form_velocity_matches_finite_differences() {
    let (model, traj) = dense_reference(2001);
    let p = model.params();
    let s = traj.samples();

    for i in 1..s.len() - 1 {
        let dt = s[i + 1].t - s[i - 1].t;
        let fd = (position(p, s[i + 1].state.phi) - position(p, s[i - 1].state.phi)) / dt;
        let v = velocity(p, s[i].state.phi, s[i].state.phi_dot);
        assert!((fd - v).norm() < 1e-4, "velocity mismatch at t = {}: {:?} vs {:?}", s[i].t, v, fd);
    }
}

#[test]
fn closed_form_acceleration_matches_finite_differences() {
    let (model, traj) = dense_reference(2001);
    let p = model.params();
    let s = traj.samples();

    for i in 1..s.len() - 1 {
        let dt = s[i + 1].t - s[i - 1].t;
        let v_next = velocity(p, s[i + 1].state.phi, s[i + 1].state.phi_dot);
        let v_prev = velocity(p, s[i - 1].state.phi, s[i - 1].state.phi_dot);
        let fd = (v_next - v_prev) / dt;
        let a = acceleration(p, s[i].state.phi, s[i].state.phi_dot, s[i].accel.phi_ddot);
        assert!((fd - a).norm() < 1e-3, "acceleration mismatch at t = {}: {:?} vs {:?}", s[i].t, a, fd);
    }
}

#[test]
fn reference_reaction_at_start() {
    let scenario = Scenario::reference().unwrap();
    let traj = scenario.run().unwrap();
    let reports = scenario.report(&traj);
    let p = scenario.params();

    let first = &traj.samples()[0];
    let n = reports[0].reaction;

    // phi = 0: NAx = m2 (R - r) phi_dot, NAy = m2 (g - (R - r) phi_ddot)
    assert_relative_eq!(n.x, 0.8 * FRAC_PI_4, epsilon = 1e-12);
    assert_relative_eq!(n.x, 0.628, epsilon = 1e-3);
    assert_relative_eq!(n.y, p.m2 * (p.g - p.arm() * first.accel.phi_ddot), epsilon = 1e-12);

    // b = (4, 2) at phi = 0, so phi_ddot = (2 a11 - 4 a21) / det
    let a = scenario.model.mass_matrix();
    assert_relative_eq!(first.accel.phi_ddot, (2.0 * a.a11 - 4.0 * a.a21) / a.det(), epsilon = 1e-12);

    assert_eq!(reaction(&scenario.model, &first.state, first.t).unwrap(), n);
}

#[test]
fn reversed_orbit_speed_mirrors_velocity() {
    let mut cfg = ScenarioConfig::reference();
    let forward = Scenario::build_scenario(&cfg).unwrap();
    cfg.initial.phi_dot = -cfg.initial.phi_dot;
    let backward = Scenario::build_scenario(&cfg).unwrap();

    let f = forward.report(&forward.run().unwrap())[0].kinematics.velocity;
    let b = backward.report(&backward.run().unwrap())[0].kinematics.velocity;

    assert_eq!(f, -b);
    assert_relative_eq!(f.y, 0.8 * FRAC_PI_4, epsilon = 1e-12);
}

// ==================================================================================
// Configuration
// ==================================================================================

#[test]
fn reference_yaml_matches_builtin_reference() {
    let cfg = load_scenario("reference.yaml");
    let from_file = Scenario::build_scenario(&cfg).unwrap();
    assert_eq!(from_file, Scenario::reference().unwrap());
}

#[test]
fn free_spin_yaml_uses_rk4() {
    let cfg = load_scenario("free_spin.yaml");
    let scenario = Scenario::build_scenario(&cfg).unwrap();

    assert_eq!(scenario.solver.integrator, IntegratorConfig::Rk4);
    assert_eq!(scenario.initial, State::new(0.0, 1.0, 0.0, -0.5));

    let traj = scenario.run().unwrap();
    assert_eq!(traj.len(), 500);
    assert_relative_eq!(traj.last().unwrap().state.theta, 10.0, epsilon = 1e-9);
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
mechanism: { m1: 2.0, m2: 1.0, m3: 1.0, R: 1.0, r: 0.2 }
solver: { t_end: 1.0, samples: 11 }
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.mechanism.g, 9.81);
    assert_eq!(cfg.mechanism.c, 0.0);
    assert_eq!(cfg.solver.integrator, IntegratorConfig::Dopri5);

    let scenario = Scenario::build_scenario(&cfg).unwrap();
    assert_eq!(scenario.initial, State::default());
    assert_eq!(scenario.solver.atol, SolverParams::reference().atol);
    assert_eq!(scenario.grid.len(), 11);
}

#[test]
fn unknown_integrator_rejected() {
    let yaml = r#"
mechanism: { m1: 2.0, m2: 1.0, m3: 1.0, R: 1.0, r: 0.2 }
solver: { integrator: "euler", t_end: 1.0, samples: 11 }
"#;
    assert!(serde_yaml::from_str::<ScenarioConfig>(yaml).is_err());
}
