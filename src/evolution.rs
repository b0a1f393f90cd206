//! Rate evaluation for multi-variable states.
//!
//! A state holds `num_vars` solution variables over the same graph, stored variable by
//! variable: the value of variable `n` at DOF `i` is `x[i + n * num_dofs]`. Every variable is
//! evolved independently with the same scheme.
use crate::error::EvaluationError;
use crate::graph::GraphOperator;
use crate::scheme::low_order::low_order_rate;
use crate::scheme::Scheme;
use fluxcorr_traits::Real;
use log::trace;
use nalgebra::DVector;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;
use thread_local::ThreadLocal;

/// Rows per rayon task. Rows are cheap, so very small tasks only cost scheduling overhead.
const MIN_ROWS_PER_TASK: usize = 256;

/// How the rows of a single evaluation are processed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Execution {
    #[default]
    Serial,
    /// Rows are distributed across the rayon thread pool. Every row is still summed in
    /// storage order, so the result is bitwise identical to serial execution.
    Parallel,
}

/// The right-hand side `du/dt = y(u)` of the semi-discrete transport problem.
///
/// The graph is shared and immutable. The only mutable state is the scratch buffer for the
/// auxiliary low-order rates, of which every thread that calls into the evolution owns its
/// own copy. An `Evolution` can therefore be shared across threads.
#[derive(Debug)]
pub struct Evolution<T: Real> {
    scheme: Scheme,
    graph: Arc<GraphOperator<T>>,
    num_vars: usize,
    execution: Execution,
    workspace: ThreadLocal<RefCell<Vec<T>>>,
}

impl<T: Real> Evolution<T> {
    pub fn new(scheme: Scheme, graph: Arc<GraphOperator<T>>, num_vars: usize) -> Result<Self, EvaluationError> {
        if num_vars == 0 {
            return Err(EvaluationError::NoVariables);
        }
        Ok(Self {
            scheme,
            graph,
            num_vars,
            execution: Execution::default(),
            workspace: ThreadLocal::new(),
        })
    }

    pub fn with_execution(self, execution: Execution) -> Self {
        Self { execution, ..self }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn graph(&self) -> &Arc<GraphOperator<T>> {
        &self.graph
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Length of state and rate vectors, `num_vars * num_dofs`.
    pub fn state_len(&self) -> usize {
        self.num_vars * self.graph.num_dofs()
    }

    /// Evaluates the rate of change of `x` into `y`.
    ///
    /// Both vectors must have length [`state_len`](Self::state_len). The sizes are checked
    /// before any computation takes place, and `y` is left untouched on error.
    pub fn evaluate_into(&self, x: &[T], y: &mut [T]) -> Result<(), EvaluationError> {
        let expected = self.state_len();
        if x.len() != expected {
            return Err(EvaluationError::StateSizeMismatch {
                expected,
                actual: x.len(),
            });
        }
        if y.len() != expected {
            return Err(EvaluationError::RateSizeMismatch {
                expected,
                actual: y.len(),
            });
        }

        trace!("Evaluating {} rates for {} variable(s)", self.scheme, self.num_vars);
        match self.workspace.get_or_default().try_borrow_mut() {
            Ok(mut z) => self.evaluate_with_workspace(x, y, &mut z),
            // Re-entrant call on this thread, e.g. from a nested rayon task
            Err(_) => self.evaluate_with_workspace(x, y, &mut Vec::new()),
        }
        Ok(())
    }

    /// Evaluates the rate of change of `x`.
    pub fn evaluate(&self, x: &[T]) -> Result<DVector<T>, EvaluationError> {
        let mut y = DVector::zeros(self.state_len());
        self.evaluate_into(x, y.as_mut_slice())?;
        Ok(y)
    }

    fn evaluate_with_workspace(&self, x: &[T], y: &mut [T], z: &mut Vec<T>) {
        let n = self.graph.num_dofs();
        if n == 0 {
            return;
        }
        z.resize(n, T::zero());
        for (x_var, y_var) in x.chunks_exact(n).zip(y.chunks_exact_mut(n)) {
            match self.execution {
                Execution::Serial => evaluate_variable(self.scheme, &self.graph, x_var, y_var, z),
                Execution::Parallel => par_evaluate_variable(self.scheme, &self.graph, x_var, y_var, z),
            }
        }
    }
}

/// Evaluates the rate of change of the state `x` with `num_vars` variables in one go.
///
/// This allocates the scratch buffer on every call. Use [`Evolution`] when evaluating
/// repeatedly.
pub fn evaluate<T: Real>(
    scheme: Scheme,
    graph: &GraphOperator<T>,
    num_vars: usize,
    x: &[T],
) -> Result<DVector<T>, EvaluationError> {
    if num_vars == 0 {
        return Err(EvaluationError::NoVariables);
    }
    let n = graph.num_dofs();
    if x.len() != num_vars * n {
        return Err(EvaluationError::StateSizeMismatch {
            expected: num_vars * n,
            actual: x.len(),
        });
    }

    let mut y = DVector::zeros(x.len());
    if n > 0 {
        let mut z = vec![T::zero(); n];
        for (x_var, y_var) in x.chunks_exact(n).zip(y.as_mut_slice().chunks_exact_mut(n)) {
            evaluate_variable(scheme, graph, x_var, y_var, &mut z);
        }
    }
    Ok(y)
}

fn evaluate_variable<T: Real>(scheme: Scheme, graph: &GraphOperator<T>, x: &[T], y: &mut [T], z: &mut [T]) {
    if scheme.requires_low_order_rates() {
        for (i, z_i) in z.iter_mut().enumerate() {
            *z_i = low_order_rate(graph, i, x);
        }
    }
    let z = &*z;
    for (i, y_i) in y.iter_mut().enumerate() {
        *y_i = scheme.row_rate(graph, i, x, z);
    }
}

fn par_evaluate_variable<T: Real>(scheme: Scheme, graph: &GraphOperator<T>, x: &[T], y: &mut [T], z: &mut [T]) {
    if scheme.requires_low_order_rates() {
        z.par_iter_mut()
            .with_min_len(MIN_ROWS_PER_TASK)
            .enumerate()
            .for_each(|(i, z_i)| *z_i = low_order_rate(graph, i, x));
    }
    let z = &*z;
    y.par_iter_mut()
        .with_min_len(MIN_ROWS_PER_TASK)
        .enumerate()
        .for_each(|(i, y_i)| *y_i = scheme.row_rate(graph, i, x, z));
}
