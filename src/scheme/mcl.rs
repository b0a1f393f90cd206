//! Monolithic convex limiting (MCL).
//!
//! The MCL rate of DOF `i` is the low-order rate plus limited antidiffusive fluxes:
//!
//! $$ \dot u_i = \frac{1}{m_i} \sum_{j \neq i} \left( 2 d_{ij} (\bar u_{ij} - u_i) + f^*_{ij} \right),
//!    \qquad \bar u_{ij} = \frac{u_i + u_j}{2} - \frac{k_{ij} (u_j - u_i)}{2 d_{ij}} $$
//!
//! The target flux on the edge `(i, j)` is the difference between the high-order target
//! scheme and the low-order scheme,
//!
//! $$ f_{ij} = m_{ij} (z_i - z_j) + d_{ij} (u_i - u_j), $$
//!
//! and it is clipped so that the limited bar states
//! `(w_ij + f*_ij) / (2 d_ij)` and `(w_ji - f*_ij) / (2 d_ij)` stay within the local bounds of
//! `i` and `j` respectively, where `w_ij = 2 d_ij ū_ij`. Since the clipping interval depends
//! on both endpoints and the flux is odd in the edge direction, the same limited flux enters
//! both rows with opposite signs. `GraphOperator` only accepts bitwise symmetric mass
//! matrices, so `f*_ji == -f*_ij` holds exactly in floating point.
use crate::graph::{Edge, GraphOperator};
use fluxcorr_traits::Real;
use numeric_literals::replace_float_literals;

/// Limits the target flux of a single edge.
///
/// `bounds_i` and `bounds_j` are the `(min, max)` bounds over the closed neighborhoods of `i`
/// and `j`, and `z_i`, `z_j` the low-order rates of the two endpoints.
#[replace_float_literals(T::from_f64(literal).unwrap())]
#[inline]
pub fn limited_flux<T: Real>(
    edge: &Edge<T>,
    x_i: T,
    x_j: T,
    z_i: T,
    z_j: T,
    bounds_i: (T, T),
    bounds_j: (T, T),
) -> T {
    let (u_i_min, u_i_max) = bounds_i;
    let (u_j_min, u_j_max) = bounds_j;
    let d_ij = edge.viscosity();

    let f_ij = edge.m_ij * (z_i - z_j) + d_ij * (x_i - x_j);

    // Bar states scaled by 2 d_ij (note that d_ij = d_ji)
    let w_ij = d_ij * (x_i + x_j) - edge.k_ij * (x_j - x_i);
    let w_ji = d_ij * (x_i + x_j) - edge.k_ji * (x_i - x_j);

    if f_ij > 0.0 {
        let bound = (2.0 * d_ij * u_i_max - w_ij).min(w_ji - 2.0 * d_ij * u_j_min);
        f_ij.min(bound)
    } else {
        let bound = (2.0 * d_ij * u_i_min - w_ij).max(w_ji - 2.0 * d_ij * u_j_max);
        f_ij.max(bound)
    }
}

/// MCL rate of DOF `i`, given the state `x` and the low-order rates `z` of all DOFs.
///
/// The local bounds of every neighbor are recomputed from its own neighborhood for each edge.
#[inline]
pub fn mcl_rate<T: Real>(graph: &GraphOperator<T>, i: usize, x: &[T], z: &[T]) -> T {
    let row = graph.row(i);
    let bounds_i = row.local_bounds(x);
    let x_i = x[i];
    let z_i = z[i];

    let rate = row.edges().fold(T::zero(), |rate, edge| {
        let j = edge.j;
        let bounds_j = graph.row(j).local_bounds(x);
        let f_star = limited_flux(&edge, x_i, x[j], z_i, z[j], bounds_i, bounds_j);
        rate + (edge.viscosity() - edge.k_ij) * (x[j] - x_i) + f_star
    });
    rate / graph.lumped_mass()[i]
}

/// Computes the MCL rate of every DOF into `y`.
///
/// `z` must hold the low-order rates of `x`, see
/// [`low_order_rates_into`](crate::scheme::low_order::low_order_rates_into).
pub fn mcl_rates_into<T: Real>(graph: &GraphOperator<T>, x: &[T], z: &[T], y: &mut [T]) {
    assert_eq!(x.len(), graph.num_dofs(), "State length must match number of DOFs.");
    assert_eq!(z.len(), graph.num_dofs(), "Low-order rate length must match number of DOFs.");
    assert_eq!(y.len(), graph.num_dofs(), "Output length must match number of DOFs.");
    for (i, y_i) in y.iter_mut().enumerate() {
        *y_i = mcl_rate(graph, i, x, z);
    }
}

/// Computes the limited flux `f*_ij` of every stored entry `(i, j)`, in storage order.
///
/// Diagonal entries are zero. Mostly useful for diagnostics and testing, since the rate
/// evaluation never materializes the fluxes.
pub fn limited_fluxes<T: Real>(graph: &GraphOperator<T>, x: &[T], z: &[T]) -> Vec<T> {
    assert_eq!(x.len(), graph.num_dofs(), "State length must match number of DOFs.");
    assert_eq!(z.len(), graph.num_dofs(), "Low-order rate length must match number of DOFs.");
    let mut fluxes = Vec::with_capacity(graph.nnz());
    for i in 0..graph.num_dofs() {
        let row = graph.row(i);
        let bounds_i = row.local_bounds(x);
        let mut edges = row.edges();
        for &j in row.columns() {
            if j == i {
                fluxes.push(T::zero());
            } else {
                let edge = edges
                    .next()
                    .expect("Internal error: edges must follow the off-diagonal columns");
                let bounds_j = graph.row(j).local_bounds(x);
                fluxes.push(limited_flux(&edge, x[i], x[j], z[i], z[j], bounds_i, bounds_j));
            }
        }
    }
    fluxes
}
