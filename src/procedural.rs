//! Procedural generation of graph operators for simple test problems.
use crate::graph::GraphOperator;
use fluxcorr_traits::Real;
use nalgebra::{DVector, Matrix2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use numeric_literals::replace_float_literals;

/// A uniform mesh of the periodic segment `[0, length)`, where the right end point is
/// identified with the left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PeriodicSegment<T> {
    num_cells: usize,
    length: T,
}

impl<T: Real> PeriodicSegment<T> {
    /// Panics if `num_cells < 2` or if `length` is not strictly positive.
    pub fn new(num_cells: usize, length: T) -> Self {
        assert!(num_cells >= 2, "Periodic segment needs at least two cells.");
        assert!(length > T::zero(), "Segment length must be positive.");
        Self { num_cells, length }
    }

    pub fn unit(num_cells: usize) -> Self {
        Self::new(num_cells, T::one())
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Equal to the number of cells, since the last node coincides with the first.
    pub fn num_nodes(&self) -> usize {
        self.num_cells
    }

    pub fn length(&self) -> T {
        self.length
    }

    pub fn cell_size(&self) -> T {
        self.length / T::from_usize(self.num_cells).expect("Must be able to fit usize in T")
    }

    pub fn node_coordinates(&self) -> DVector<T> {
        let h = self.cell_size();
        DVector::from_fn(self.num_nodes(), |i, _| {
            T::from_usize(i).expect("Must be able to fit usize in T") * h
        })
    }
}

/// Assembles piecewise linear mass and convection matrices for `du/dt + v du/dx = 0`.
///
/// Cell `e` connects nodes `e` and `e + 1 (mod num_cells)`. The element matrices are
/// `M_e = h/6 [[2, 1], [1, 2]]` and `K_e(a, b) = ∫ φ_a v φ_b'`, i.e.
/// `K_e = v/2 [[-1, 1], [-1, 1]]`, so that the semi-discrete system reads `M du/dt = -K u`.
/// The lumped mass is `h` for every node.
///
/// The diagonal of `K` is stored, even though it is identically zero, so that both matrices
/// share the pattern of the closed neighborhoods.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn assemble_periodic_advection_1d<T: Real>(segment: &PeriodicSegment<T>, velocity: T) -> GraphOperator<T> {
    let n = segment.num_nodes();
    let h = segment.cell_size();
    let element_mass = Matrix2::new(2.0, 1.0, 1.0, 2.0) * (h / 6.0);
    let element_convection = Matrix2::new(-1.0, 1.0, -1.0, 1.0) * (velocity / 2.0);

    let mut mass = CooMatrix::new(n, n);
    let mut convection = CooMatrix::new(n, n);
    for e in 0..segment.num_cells() {
        let nodes = [e, (e + 1) % n];
        for (a, &i) in nodes.iter().enumerate() {
            for (b, &j) in nodes.iter().enumerate() {
                mass.push(i, j, element_mass[(a, b)]);
                convection.push(i, j, element_convection[(a, b)]);
            }
        }
    }

    GraphOperator::from_matrices(CsrMatrix::from(&mass), CsrMatrix::from(&convection))
        .expect("Internal error: assembled periodic operator must be a valid graph")
}
