//! The high-order target scheme.
//!
//! The Galerkin advection term is corrected by the consistent mass matrix applied to the
//! low-order rates `z`:
//!
//! $$ \dot u_i = \frac{1}{m_i} \sum_{j \neq i} \left( -k_{ij} (u_j - u_i) + m_{ij} (z_i - z_j) \right) $$
//!
//! This is not bounds-preserving. It serves as the unlimited target of the MCL scheme.
use crate::graph::GraphOperator;
use fluxcorr_traits::Real;

/// High-order rate of DOF `i`, given the state `x` and the low-order rates `z` of all DOFs.
#[inline]
pub fn high_order_rate<T: Real>(graph: &GraphOperator<T>, i: usize, x: &[T], z: &[T]) -> T {
    let x_i = x[i];
    let z_i = z[i];
    let rate = graph.row(i).edges().fold(T::zero(), |rate, edge| {
        let j = edge.j;
        rate - edge.k_ij * (x[j] - x_i) + edge.m_ij * (z_i - z[j])
    });
    rate / graph.lumped_mass()[i]
}

/// Computes the high-order rate of every DOF into `y`.
///
/// `z` must hold the low-order rates of `x`, see
/// [`low_order_rates_into`](crate::scheme::low_order::low_order_rates_into).
pub fn high_order_rates_into<T: Real>(graph: &GraphOperator<T>, x: &[T], z: &[T], y: &mut [T]) {
    assert_eq!(x.len(), graph.num_dofs(), "State length must match number of DOFs.");
    assert_eq!(z.len(), graph.num_dofs(), "Low-order rate length must match number of DOFs.");
    assert_eq!(y.len(), graph.num_dofs(), "Output length must match number of DOFs.");
    for (i, y_i) in y.iter_mut().enumerate() {
        *y_i = high_order_rate(graph, i, x, z);
    }
}
