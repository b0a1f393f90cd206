//! Error types for graph construction and rate evaluation.
//!
//! Both kinds of error are contract violations: they are detected before any of the per-DOF
//! loops run, and no partial result is ever produced.
use std::error::Error;
use std::fmt;

/// The mass/advection operator pair handed to [`GraphOperator`](crate::graph::GraphOperator)
/// does not satisfy the structural requirements of the schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The named matrix is not square.
    NotSquare {
        matrix: &'static str,
        nrows: usize,
        ncols: usize,
    },
    /// The mass and advection matrices do not share the same sparsity pattern.
    SparsityMismatch,
    /// The entry `(row, col)` is stored, but `(col, row)` is not.
    NotStructurallySymmetric { row: usize, col: usize },
    /// `M(row, col)` and `M(col, row)` differ.
    MassNotSymmetric { row: usize, col: usize },
    /// The lumped mass vector does not have one entry per DOF.
    LumpedMassLength { expected: usize, actual: usize },
    /// The lumped mass of the given DOF is zero, negative or NaN.
    NonPositiveLumpedMass { dof: usize },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NotSquare { matrix, nrows, ncols } => {
                write!(f, "The {} matrix must be square, but has dimensions {}x{}.", matrix, nrows, ncols)
            }
            GraphError::SparsityMismatch => {
                write!(f, "The mass and advection matrices must have identical sparsity patterns.")
            }
            GraphError::NotStructurallySymmetric { row, col } => {
                write!(
                    f,
                    "Sparsity pattern is not structurally symmetric: ({}, {}) is stored, but ({}, {}) is not.",
                    row, col, col, row
                )
            }
            GraphError::MassNotSymmetric { row, col } => {
                write!(f, "Mass matrix is not symmetric: M({}, {}) differs from M({}, {}).", row, col, col, row)
            }
            GraphError::LumpedMassLength { expected, actual } => {
                write!(f, "Lumped mass vector has length {}, expected {}.", actual, expected)
            }
            GraphError::NonPositiveLumpedMass { dof } => {
                write!(f, "Lumped mass of DOF {} is not strictly positive.", dof)
            }
        }
    }
}

impl Error for GraphError {}

/// A rate evaluation was requested with inconsistent dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// An evolution operator must carry at least one solution variable.
    NoVariables,
    /// The state vector does not have length `num_vars * num_dofs`.
    StateSizeMismatch { expected: usize, actual: usize },
    /// The output rate vector does not have length `num_vars * num_dofs`.
    RateSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::NoVariables => write!(f, "Number of solution variables must be positive."),
            EvaluationError::StateSizeMismatch { expected, actual } => {
                write!(f, "State vector has length {}, expected {}.", actual, expected)
            }
            EvaluationError::RateSizeMismatch { expected, actual } => {
                write!(f, "Rate vector has length {}, expected {}.", actual, expected)
            }
        }
    }
}

impl Error for EvaluationError {}
