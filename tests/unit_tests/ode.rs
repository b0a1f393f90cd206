use fluxcorr::error::EvaluationError;
use fluxcorr::evolution::Evolution;
use fluxcorr::ode::{ExplicitRungeKutta, OdeSolverKind, RateFunction};
use fluxcorr::problem::Problem;
use fluxcorr::procedural::{assemble_periodic_advection_1d, PeriodicSegment};
use fluxcorr::scheme::Scheme;
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use std::convert::Infallible;
use std::sync::Arc;
use util::assert_panics;

/// `du/dt = -u`.
struct Decay {
    len: usize,
}

impl RateFunction<f64> for Decay {
    type Error = Infallible;

    fn state_len(&self) -> usize {
        self.len
    }

    fn eval_rate_into(&self, x: &[f64], rate: &mut [f64]) -> Result<(), Self::Error> {
        for (r, x) in rate.iter_mut().zip(x) {
            *r = -x;
        }
        Ok(())
    }
}

fn decay_error(kind: OdeSolverKind, num_steps: usize) -> f64 {
    let mut solver = ExplicitRungeKutta::from_kind(kind);
    let mut x = DVector::from_element(1, 1.0);
    let dt = 1.0 / num_steps as f64;
    let summary = solver
        .integrate(&Decay { len: 1 }, &mut x, 1.0, dt, |_, _, _| {})
        .unwrap();
    assert_eq!(summary.steps, num_steps);
    (x[0] - f64::exp(-1.0)).abs()
}

#[test]
fn forward_euler_step_is_exact() {
    let mut solver = ExplicitRungeKutta::forward_euler();
    let mut x = DVector::from_vec(vec![1.0, -2.0]);
    let mut t = 0.0;
    solver.step(&Decay { len: 2 }, &mut x, &mut t, 0.25).unwrap();
    assert_eq!(x.as_slice(), &[0.75, -1.5]);
    assert_eq!(t, 0.25);
}

#[test]
fn heun_step_matches_taylor_expansion() {
    // For linear problems, Heun's method is the second-order Taylor polynomial of exp(-dt)
    let mut solver = ExplicitRungeKutta::heun();
    let mut x = DVector::from_element(1, 1.0);
    let mut t = 0.0;
    let dt = 0.1;
    solver.step(&Decay { len: 1 }, &mut x, &mut t, dt).unwrap();
    assert_scalar_eq!(x[0], 1.0 - dt + dt * dt / 2.0, comp = abs, tol = 1e-15);
}

#[test]
fn runge_kutta_methods_converge_with_expected_order() {
    let expected_orders = [
        (OdeSolverKind::ForwardEuler, 1.0),
        (OdeSolverKind::Heun, 2.0),
        (OdeSolverKind::SspRk3, 3.0),
        (OdeSolverKind::Rk4, 4.0),
    ];
    for (kind, order) in expected_orders {
        let coarse = decay_error(kind, 20);
        let fine = decay_error(kind, 40);
        let observed_order = f64::log2(coarse / fine);
        assert!(
            (observed_order - order).abs() < 0.1,
            "{}: observed order {}, expected {}",
            kind,
            observed_order,
            order
        );
    }
}

#[test]
fn verner_rk6_converges_with_sixth_order() {
    // Few steps, since the error otherwise drowns in round-off
    let coarse = decay_error(OdeSolverKind::Rk6, 4);
    let fine = decay_error(OdeSolverKind::Rk6, 8);
    assert!(coarse < 1e-9, "error {} after 4 steps", coarse);
    let observed_order = f64::log2(coarse / fine);
    assert!(observed_order > 5.9, "observed order {}", observed_order);
}

#[test]
fn integrate_truncates_final_step() {
    let mut solver = ExplicitRungeKutta::forward_euler();
    let mut x = DVector::from_element(1, 1.0);
    let mut observed = Vec::new();
    let summary = solver
        .integrate(&Decay { len: 1 }, &mut x, 1.0, 0.3, |step, t, _| observed.push((step, t)))
        .unwrap();

    assert_eq!(summary.steps, 4);
    assert_scalar_eq!(summary.final_time, 1.0, comp = abs, tol = 1e-14);
    assert_eq!(observed.len(), 4);
    assert_eq!(observed.iter().map(|(step, _)| *step).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_scalar_eq!(observed[2].1, 0.9, comp = abs, tol = 1e-14);
}

#[test]
fn integrate_to_zero_time_takes_no_steps() {
    let mut solver = ExplicitRungeKutta::heun();
    let mut x = DVector::from_element(1, 1.0);
    let summary = solver
        .integrate(&Decay { len: 1 }, &mut x, 0.0, 0.1, |_, _, _| panic!("no step expected"))
        .unwrap();
    assert_eq!(summary.steps, 0);
    assert_eq!(x[0], 1.0);
}

#[test]
fn integrate_panics_for_non_positive_time_step() {
    assert_panics!({
        let mut solver = ExplicitRungeKutta::forward_euler();
        let mut x = DVector::from_element(1, 1.0);
        let _ = solver.integrate(&Decay { len: 1 }, &mut x, 1.0, 0.0, |_, _, _| {});
    });
}

#[test]
fn from_tableau_rejects_implicit_methods() {
    assert_panics!(ExplicitRungeKutta::from_tableau("implicit", vec![1.0], vec![1.0]));
    assert_panics!(ExplicitRungeKutta::<f64>::from_tableau("empty", vec![], vec![]));
    assert_panics!(ExplicitRungeKutta::from_tableau("inconsistent", vec![0.0, 0.0], vec![0.5, 0.5]));
}

#[test]
fn step_propagates_evaluation_errors_without_modifying_state() {
    let graph = Arc::new(crate::periodic_unit_segment_8());
    let evolution = Evolution::new(Scheme::Mcl, graph, 1).unwrap();
    let mut solver = ExplicitRungeKutta::ssp_rk3();
    let mut x = DVector::from_element(5, 1.0);
    let mut t = 0.0;
    assert_eq!(
        solver.step(&evolution, &mut x, &mut t, 0.01),
        Err(EvaluationError::StateSizeMismatch { expected: 8, actual: 5 })
    );
    assert_eq!(x, DVector::from_element(5, 1.0));
    assert_eq!(t, 0.0);
}

#[test]
fn ssp_integration_of_mcl_preserves_global_bounds() {
    let segment = PeriodicSegment::<f64>::unit(50);
    let graph = Arc::new(assemble_periodic_advection_1d(&segment, 1.0));
    let problem = Problem::BumpAndStep;
    let mut x = problem.initial_state(&segment);
    let (x_min, x_max) = (x.min(), x.max());
    let dt = graph.max_stable_time_step().unwrap();

    for kind in [OdeSolverKind::ForwardEuler, OdeSolverKind::Heun, OdeSolverKind::SspRk3] {
        assert!(kind.is_ssp());
        let evolution = Evolution::new(Scheme::Mcl, graph.clone(), 1).unwrap();
        let mut solver = ExplicitRungeKutta::from_kind(kind);
        solver
            .integrate(&evolution, &mut x, 0.2, dt, |_, _, x| {
                assert!(x.min() >= x_min - 1e-12);
                assert!(x.max() <= x_max + 1e-12);
            })
            .unwrap();
    }
}

#[test]
fn ode_solver_kind_parsing() {
    for kind in OdeSolverKind::ALL {
        assert_eq!(kind.to_string().parse::<OdeSolverKind>().unwrap(), kind);
    }
    assert_eq!("1".parse::<OdeSolverKind>().unwrap(), OdeSolverKind::ForwardEuler);
    assert_eq!("2".parse::<OdeSolverKind>().unwrap(), OdeSolverKind::Heun);
    assert_eq!("3".parse::<OdeSolverKind>().unwrap(), OdeSolverKind::SspRk3);
    assert_eq!("4".parse::<OdeSolverKind>().unwrap(), OdeSolverKind::Rk4);
    assert_eq!("6".parse::<OdeSolverKind>().unwrap(), OdeSolverKind::Rk6);
    assert!("5".parse::<OdeSolverKind>().is_err());
    assert!(!OdeSolverKind::Rk6.is_ssp());
    assert_eq!(OdeSolverKind::default(), OdeSolverKind::Heun);
    assert_eq!(ExplicitRungeKutta::<f64>::from_kind(OdeSolverKind::Rk4).num_stages(), 4);
    assert_eq!(ExplicitRungeKutta::<f64>::from_kind(OdeSolverKind::Rk6).num_stages(), 8);
}
