//! Graph viscosity.
use fluxcorr_traits::Real;

/// Artificial diffusion coefficient of the edge `(i, j)`, given `k_ij = K(i, j)` and
/// `k_ji = K(j, i)`.
///
/// The result is `max(|k_ij|, |k_ji|)`. It is non-negative and symmetric in its arguments, so
/// `d_ij == d_ji` holds bitwise no matter from which endpoint the edge is visited. Adding
/// `d_ij (u_j - u_i)` to every edge of the discrete advection operator turns all
/// off-diagonal coefficients `d_ij - k_ij` non-negative, which is what makes the low-order
/// scheme monotone.
#[inline(always)]
pub fn graph_viscosity<T: Real>(k_ij: T, k_ji: T) -> T {
    k_ij.abs().max(k_ji.abs())
}
