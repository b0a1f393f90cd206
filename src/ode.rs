//! Explicit Runge-Kutta time integration of semi-discrete systems `du/dt = y(u)`.
use crate::error::EvaluationError;
use crate::evolution::Evolution;
use fluxcorr_traits::Real;
use log::{debug, trace};
use nalgebra::DVector;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// An autonomous right-hand side `y = f(x)`.
pub trait RateFunction<T: Real> {
    type Error: Error + Send + Sync + 'static;

    /// The length of state and rate vectors.
    fn state_len(&self) -> usize;

    fn eval_rate_into(&self, x: &[T], rate: &mut [T]) -> Result<(), Self::Error>;
}

impl<T: Real> RateFunction<T> for Evolution<T> {
    type Error = EvaluationError;

    fn state_len(&self) -> usize {
        Evolution::state_len(self)
    }

    fn eval_rate_into(&self, x: &[T], rate: &mut [T]) -> Result<(), Self::Error> {
        self.evaluate_into(x, rate)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OdeSolverKind {
    ForwardEuler,
    /// Heun's method, the two-stage strong-stability-preserving Runge-Kutta method.
    #[default]
    Heun,
    /// The three-stage third-order method of Shu and Osher.
    SspRk3,
    /// The classic fourth-order Runge-Kutta method.
    Rk4,
    /// Verner's eight-stage sixth-order method.
    Rk6,
}

impl OdeSolverKind {
    pub const ALL: [OdeSolverKind; 5] = [
        OdeSolverKind::ForwardEuler,
        OdeSolverKind::Heun,
        OdeSolverKind::SspRk3,
        OdeSolverKind::Rk4,
        OdeSolverKind::Rk6,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OdeSolverKind::ForwardEuler => "forward-euler",
            OdeSolverKind::Heun => "heun",
            OdeSolverKind::SspRk3 => "ssp-rk3",
            OdeSolverKind::Rk4 => "rk4",
            OdeSolverKind::Rk6 => "rk6",
        }
    }

    /// Whether every stage is a convex combination of forward Euler steps.
    ///
    /// Bounds preserved by forward Euler under a time step restriction are then preserved by
    /// the full method under the same restriction.
    pub fn is_ssp(&self) -> bool {
        !matches!(self, OdeSolverKind::Rk4 | OdeSolverKind::Rk6)
    }
}

impl Display for OdeSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOdeSolver(String);

impl Display for UnknownOdeSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown ODE solver '{}'. Expected one of: forward-euler (1), heun (2), ssp-rk3 (3), rk4 (4), rk6 (6).",
            self.0
        )
    }
}

impl Error for UnknownOdeSolver {}

impl FromStr for OdeSolverKind {
    type Err = UnknownOdeSolver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward-euler" | "forward_euler" | "euler" | "1" => Ok(OdeSolverKind::ForwardEuler),
            "heun" | "rk2" | "2" => Ok(OdeSolverKind::Heun),
            "ssp-rk3" | "ssp_rk3" | "rk3" | "3" => Ok(OdeSolverKind::SspRk3),
            "rk4" | "4" => Ok(OdeSolverKind::Rk4),
            "rk6" | "6" => Ok(OdeSolverKind::Rk6),
            _ => Err(UnknownOdeSolver(s.to_string())),
        }
    }
}

/// Outcome of [`ExplicitRungeKutta::integrate`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntegrationSummary<T> {
    pub steps: usize,
    pub final_time: T,
}

/// An explicit Runge-Kutta method given by its Butcher tableau.
///
/// Stage buffers are allocated on the first step and reused as long as the state length stays
/// the same.
#[derive(Debug, Clone)]
pub struct ExplicitRungeKutta<T: Real> {
    name: &'static str,
    num_stages: usize,
    /// Strictly lower triangular, row-major `num_stages x num_stages`.
    a: Vec<T>,
    b: Vec<T>,
    stages: Vec<DVector<T>>,
    stage_state: DVector<T>,
}

impl<T: Real> ExplicitRungeKutta<T> {
    /// Constructs a method from its Butcher tableau.
    ///
    /// Panics if `a` is not a `b.len() x b.len()` strictly lower triangular matrix in
    /// row-major order.
    pub fn from_tableau(name: &'static str, a: Vec<T>, b: Vec<T>) -> Self {
        let num_stages = b.len();
        assert!(num_stages > 0, "Method must have at least one stage.");
        assert_eq!(a.len(), num_stages * num_stages, "Tableau dimensions must be consistent.");
        for s in 0..num_stages {
            assert!(
                a[s * num_stages + s..(s + 1) * num_stages]
                    .iter()
                    .all(|a_sl| *a_sl == T::zero()),
                "Tableau must be strictly lower triangular for an explicit method."
            );
        }
        Self {
            name,
            num_stages,
            a,
            b,
            stages: Vec::new(),
            stage_state: DVector::zeros(0),
        }
    }

    pub fn forward_euler() -> Self {
        Self::from_tableau("forward-euler", vec![T::zero()], vec![T::one()])
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn heun() -> Self {
        #[rustfmt::skip]
        let a = vec![
            0.0, 0.0,
            1.0, 0.0,
        ];
        Self::from_tableau("heun", a, vec![0.5, 0.5])
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn ssp_rk3() -> Self {
        #[rustfmt::skip]
        let a = vec![
            0.0,  0.0,  0.0,
            1.0,  0.0,  0.0,
            0.25, 0.25, 0.0,
        ];
        Self::from_tableau("ssp-rk3", a, vec![1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0])
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn classic_rk4() -> Self {
        #[rustfmt::skip]
        let a = vec![
            0.0, 0.0, 0.0, 0.0,
            0.5, 0.0, 0.0, 0.0,
            0.0, 0.5, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
        ];
        Self::from_tableau("rk4", a, vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0])
    }

    /// Verner's sixth-order method with eight stages.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn verner_rk6() -> Self {
        let mut a = vec![0.0; 64];
        let lower = [
            0.06,
            0.019239962962962962962962962962962962962963,
            0.076693370370370370370370370370370370370370,
            0.035975,
            0.0,
            0.107925,
            1.318683415233148260919747276431735612861,
            0.0,
            -5.042058063628562225427761634715637693344,
            4.220674648395413964508014358283902080483,
            -41.87259166432751461803757780644346812905,
            0.0,
            159.4325621631374917700365669070346830453,
            -122.1192135650100309202516203389242140663,
            5.531743066200053768252631238332999150076,
            -54.43015693531650433250642051294142461271,
            0.0,
            207.0672513650184644273657173866509835987,
            -158.6108137845899991828742424365058599469,
            6.991816585950242321992597280791793907096,
            -0.01859723106220323397765171799549294623692,
            -54.66374178728197680241215648050386959351,
            0.0,
            207.9528062553893734515824816699834244238,
            -159.2889574744995071508959805871426654216,
            7.018743740796944434698170760964252490817,
            -0.01833878590504572306472782005141738268361,
            -0.0005119484997882099077875432497245168395840,
        ];
        let mut coefficients = lower.iter();
        for s in 1..8 {
            for l in 0..s {
                a[s * 8 + l] = *coefficients
                    .next()
                    .expect("Internal error: tableau has 28 sub-diagonal entries");
            }
        }
        let b = vec![
            0.03438957868357036009278820124728322386520,
            0.0,
            0.0,
            0.2582624555633503404659558098586120858767,
            0.4209371189673537150642551514069801967032,
            4.405396469669310170148836816197095664891,
            -176.4831190242986576151740942499002125029,
            172.3641334014150730294022582711902413315,
        ];
        Self::from_tableau("rk6", a, b)
    }

    pub fn from_kind(kind: OdeSolverKind) -> Self {
        match kind {
            OdeSolverKind::ForwardEuler => Self::forward_euler(),
            OdeSolverKind::Heun => Self::heun(),
            OdeSolverKind::SspRk3 => Self::ssp_rk3(),
            OdeSolverKind::Rk4 => Self::classic_rk4(),
            OdeSolverKind::Rk6 => Self::verner_rk6(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn num_stages(&self) -> usize {
        self.num_stages
    }

    /// Advances `x` from `t` to `t + dt`.
    ///
    /// If the rate function fails, its error is returned and neither `x` nor `t` is modified.
    pub fn step<R>(&mut self, rhs: &R, x: &mut DVector<T>, t: &mut T, dt: T) -> Result<(), R::Error>
    where
        R: RateFunction<T>,
    {
        self.ensure_buffers(x.len());
        let ns = self.num_stages;

        for s in 0..ns {
            self.stage_state.copy_from(x);
            for (l, &a_sl) in self.a[s * ns..s * ns + s].iter().enumerate() {
                if a_sl != T::zero() {
                    self.stage_state.axpy(dt * a_sl, &self.stages[l], T::one());
                }
            }
            rhs.eval_rate_into(self.stage_state.as_slice(), self.stages[s].as_mut_slice())?;
        }

        for (stage, &b_s) in self.stages.iter().zip(&self.b) {
            if b_s != T::zero() {
                x.axpy(dt * b_s, stage, T::one());
            }
        }
        *t += dt;
        Ok(())
    }

    /// Integrates from `t = 0` to `t_final` with steps of size `dt`.
    ///
    /// The final step is truncated so that `t_final` is hit exactly. Integration stops once
    /// `t >= t_final - 1e-8 dt`. The observer is called after every step with the number of
    /// steps taken so far, the current time and the current state.
    ///
    /// Panics if `dt` is not strictly positive.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn integrate<R, F>(
        &mut self,
        rhs: &R,
        x: &mut DVector<T>,
        t_final: T,
        dt: T,
        mut observer: F,
    ) -> Result<IntegrationSummary<T>, R::Error>
    where
        R: RateFunction<T>,
        F: FnMut(usize, T, &DVector<T>),
    {
        assert!(dt > 0.0, "Time step must be positive.");
        debug!(
            "Integrating to t = {} with {} (dt = {}, {} DOFs)",
            t_final,
            self.name,
            dt,
            x.len()
        );

        let mut t = T::zero();
        let mut steps = 0;
        while t < t_final - 1e-8 * dt {
            let dt_real = dt.min(t_final - t);
            self.step(rhs, x, &mut t, dt_real)?;
            steps += 1;
            trace!("Step {}: t = {}", steps, t);
            observer(steps, t, x);
        }

        Ok(IntegrationSummary { steps, final_time: t })
    }

    fn ensure_buffers(&mut self, len: usize) {
        if self.stage_state.len() != len || self.stages.len() != self.num_stages {
            self.stage_state = DVector::zeros(len);
            self.stages = vec![DVector::zeros(len); self.num_stages];
        }
    }
}
