//! The low-order (first-order, monotone) scheme.
//!
//! $$ \dot u_i = \frac{1}{m_i} \sum_{j \neq i} (d_{ij} - k_{ij}) (u_j - u_i) $$
//!
//! All coefficients `d_ij - k_ij` are non-negative, so an explicit Euler step with a
//! sufficiently small time step is a convex combination of neighboring values.
use crate::graph::GraphOperator;
use fluxcorr_traits::Real;

/// Low-order rate of change of DOF `i` for the single-variable state `x`.
#[inline]
pub fn low_order_rate<T: Real>(graph: &GraphOperator<T>, i: usize, x: &[T]) -> T {
    let x_i = x[i];
    let rate = graph.row(i).edges().fold(T::zero(), |rate, edge| {
        rate + (edge.viscosity() - edge.k_ij) * (x[edge.j] - x_i)
    });
    rate / graph.lumped_mass()[i]
}

/// Computes the low-order rate of every DOF of the single-variable state `x` into `z`.
pub fn low_order_rates_into<T: Real>(graph: &GraphOperator<T>, x: &[T], z: &mut [T]) {
    assert_eq!(x.len(), graph.num_dofs(), "State length must match number of DOFs.");
    assert_eq!(z.len(), graph.num_dofs(), "Output length must match number of DOFs.");
    for (i, z_i) in z.iter_mut().enumerate() {
        *z_i = low_order_rate(graph, i, x);
    }
}
