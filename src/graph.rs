//! The sparse graph on which the transport schemes operate.
//!
//! A [`GraphOperator`] bundles the consistent mass matrix `M`, the discrete advection operator
//! `K` and the lumped mass vector `m_L`. All of them are produced by some external assembly
//! process; here they are only validated and traversed. The two matrices must share one
//! structurally symmetric sparsity pattern, so that for every stored entry `(i, j)` the entry
//! `(j, i)` is also stored. We exploit this by precomputing, for every storage offset, the
//! offset of the transposed entry. This makes `K(j, i)` available in constant time while
//! traversing row `i`, which the graph viscosity and the MCL bar states need.
use crate::error::{EvaluationError, GraphError};
use crate::viscosity::graph_viscosity;
use fluxcorr_traits::Real;
use itertools::izip;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;

/// Immutable mass/advection operator pair over a shared sparsity graph.
#[derive(Debug, Clone)]
pub struct GraphOperator<T: Real> {
    mass: CsrMatrix<T>,
    advection: CsrMatrix<T>,
    lumped_mass: DVector<T>,
    transpose_offsets: Vec<usize>,
}

/// A single off-diagonal entry of a graph row, as seen from the row DOF `i`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Edge<T> {
    /// The neighbor DOF.
    pub j: usize,
    /// `M(i, j)`.
    pub m_ij: T,
    /// `K(i, j)`.
    pub k_ij: T,
    /// `K(j, i)`.
    pub k_ji: T,
}

impl<T: Real> Edge<T> {
    /// The graph viscosity `d_ij` of this edge.
    #[inline(always)]
    pub fn viscosity(&self) -> T {
        graph_viscosity(self.k_ij, self.k_ji)
    }
}

/// A borrowed view of row `i` of the graph.
#[derive(Debug, Copy, Clone)]
pub struct GraphRow<'a, T> {
    dof: usize,
    columns: &'a [usize],
    mass: &'a [T],
    advection: &'a [T],
    transpose_offsets: &'a [usize],
    advection_storage: &'a [T],
}

impl<'a, T: Real> GraphRow<'a, T> {
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// All neighbor indices stored in this row, including the diagonal entry if stored.
    pub fn columns(&self) -> &'a [usize] {
        self.columns
    }

    /// Iterates over the off-diagonal entries of the row in storage order.
    ///
    /// The self-loop `(i, i)` is skipped.
    pub fn edges(&self) -> impl 'a + Iterator<Item = Edge<T>> {
        let dof = self.dof;
        let advection_storage = self.advection_storage;
        izip!(self.columns, self.mass, self.advection, self.transpose_offsets)
            .filter(move |&(&j, _, _, _)| j != dof)
            .map(move |(&j, &m_ij, &k_ij, &transpose_offset)| Edge {
                j,
                m_ij,
                k_ij,
                k_ji: advection_storage[transpose_offset],
            })
    }

    /// Minimum and maximum of `x` over the closed neighborhood of the row DOF.
    #[inline]
    pub fn local_bounds(&self, x: &[T]) -> (T, T) {
        let x_i = x[self.dof];
        self.columns
            .iter()
            .fold((x_i, x_i), |(u_min, u_max), &j| (u_min.min(x[j]), u_max.max(x[j])))
    }
}

impl<T: Real> GraphOperator<T> {
    /// Constructs the operator pair, with the lumped mass given by the row sums of `mass`.
    pub fn from_matrices(mass: CsrMatrix<T>, advection: CsrMatrix<T>) -> Result<Self, GraphError> {
        let lumped_mass = DVector::from_iterator(
            mass.nrows(),
            mass.row_iter()
                .map(|row| row.values().iter().fold(T::zero(), |sum, &m_ij| sum + m_ij)),
        );
        Self::with_lumped_mass(mass, advection, lumped_mass)
    }

    /// Constructs the operator pair with an explicitly provided lumped mass vector.
    pub fn with_lumped_mass(
        mass: CsrMatrix<T>,
        advection: CsrMatrix<T>,
        lumped_mass: DVector<T>,
    ) -> Result<Self, GraphError> {
        check_square("mass", &mass)?;
        check_square("advection", &advection)?;
        if mass.pattern() != advection.pattern() {
            return Err(GraphError::SparsityMismatch);
        }

        let transpose_offsets = compute_transpose_offsets(mass.pattern())?;
        check_symmetric_mass(&mass, &transpose_offsets)?;

        if lumped_mass.len() != mass.nrows() {
            return Err(GraphError::LumpedMassLength {
                expected: mass.nrows(),
                actual: lumped_mass.len(),
            });
        }
        // Written so that NaN is rejected as well
        if let Some(dof) = lumped_mass.iter().position(|m_i| !(*m_i > T::zero())) {
            return Err(GraphError::NonPositiveLumpedMass { dof });
        }

        debug!(
            "Constructed graph operator with {} DOFs and {} stored entries",
            mass.nrows(),
            mass.nnz()
        );

        Ok(Self {
            mass,
            advection,
            lumped_mass,
            transpose_offsets,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.lumped_mass.len()
    }

    pub fn nnz(&self) -> usize {
        self.mass.nnz()
    }

    pub fn mass(&self) -> &CsrMatrix<T> {
        &self.mass
    }

    pub fn advection(&self) -> &CsrMatrix<T> {
        &self.advection
    }

    pub fn lumped_mass(&self) -> &DVector<T> {
        &self.lumped_mass
    }

    pub fn pattern(&self) -> &SparsityPattern {
        self.mass.pattern()
    }

    /// For every storage offset `p` of an entry `(i, j)`, the storage offset of `(j, i)`.
    pub fn transpose_offsets(&self) -> &[usize] {
        &self.transpose_offsets
    }

    /// Returns a view of row `i`.
    ///
    /// Panics if `i` is out of bounds.
    #[inline]
    pub fn row(&self, i: usize) -> GraphRow<T> {
        let offsets = self.mass.row_offsets();
        let range = offsets[i]..offsets[i + 1];
        GraphRow {
            dof: i,
            columns: &self.mass.col_indices()[range.clone()],
            mass: &self.mass.values()[range.clone()],
            advection: &self.advection.values()[range.clone()],
            transpose_offsets: &self.transpose_offsets[range],
            advection_storage: self.advection.values(),
        }
    }

    /// The graph viscosity `d_ij`, or `None` if `(i, j)` is not stored in the graph.
    pub fn viscosity(&self, i: usize, j: usize) -> Option<T> {
        let offset = self.storage_offset(i, j)?;
        let k = self.advection.values();
        Some(graph_viscosity(k[offset], k[self.transpose_offsets[offset]]))
    }

    /// The largest explicit Euler time step for which the low-order and MCL schemes are
    /// guaranteed to preserve local bounds.
    ///
    /// This is `min_i m_L(i) / (2 sum_{j != i} d_ij)`. Returns `None` if no DOF is coupled to
    /// any other through a non-zero viscosity, in which case the step size is unrestricted.
    pub fn max_stable_time_step(&self) -> Option<T> {
        let two = T::one() + T::one();
        (0..self.num_dofs())
            .filter_map(|i| {
                let viscosity_sum = self
                    .row(i)
                    .edges()
                    .fold(T::zero(), |sum, edge| sum + edge.viscosity());
                (viscosity_sum > T::zero()).then(|| self.lumped_mass[i] / (two * viscosity_sum))
            })
            .reduce(|a, b| a.min(b))
    }

    /// The lumped-mass-weighted sum of every solution variable in `state`.
    ///
    /// All three schemes conserve these quantities whenever the off-diagonal row and column
    /// sums of `K` coincide, as is the case for divergence-free convection on periodic domains.
    pub fn total_mass(&self, state: &[T], num_vars: usize) -> Result<Vec<T>, EvaluationError> {
        if num_vars == 0 {
            return Err(EvaluationError::NoVariables);
        }
        let n = self.num_dofs();
        if state.len() != num_vars * n {
            return Err(EvaluationError::StateSizeMismatch {
                expected: num_vars * n,
                actual: state.len(),
            });
        }

        let totals = (0..num_vars)
            .map(|var| {
                let x = &state[var * n..(var + 1) * n];
                izip!(self.lumped_mass.iter(), x).fold(T::zero(), |sum, (&m_i, &x_i)| sum + m_i * x_i)
            })
            .collect();
        Ok(totals)
    }

    fn storage_offset(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.num_dofs() {
            return None;
        }
        let offsets = self.mass.row_offsets();
        let lane = self.pattern().lane(i);
        lane.binary_search(&j).ok().map(|local| offsets[i] + local)
    }
}

/// `M(i, j)` and `M(j, i)` must be bitwise equal, otherwise the limited fluxes of the two
/// rows no longer cancel.
fn check_symmetric_mass<T: Real>(mass: &CsrMatrix<T>, transpose_offsets: &[usize]) -> Result<(), GraphError> {
    let values = mass.values();
    for (i, row) in mass.row_iter().enumerate() {
        let offset_begin = mass.row_offsets()[i];
        for (local, &j) in row.col_indices().iter().enumerate() {
            let p = offset_begin + local;
            if values[p] != values[transpose_offsets[p]] {
                return Err(GraphError::MassNotSymmetric { row: i, col: j });
            }
        }
    }
    Ok(())
}

fn check_square<T>(name: &'static str, matrix: &CsrMatrix<T>) -> Result<(), GraphError> {
    if matrix.nrows() != matrix.ncols() {
        Err(GraphError::NotSquare {
            matrix: name,
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
        })
    } else {
        Ok(())
    }
}

/// Computes the storage offset of the transposed entry for every stored entry.
///
/// Minor indices of a `SparsityPattern` are sorted within each lane, so the transposed entry
/// is found by binary search.
fn compute_transpose_offsets(pattern: &SparsityPattern) -> Result<Vec<usize>, GraphError> {
    let offsets = pattern.major_offsets();
    let mut transpose_offsets = Vec::with_capacity(pattern.nnz());
    for i in 0..pattern.major_dim() {
        for &j in pattern.lane(i) {
            let local_index = pattern
                .lane(j)
                .binary_search(&i)
                .map_err(|_| GraphError::NotStructurallySymmetric { row: i, col: j })?;
            transpose_offsets.push(offsets[j] + local_index);
        }
    }
    Ok(transpose_offsets)
}
