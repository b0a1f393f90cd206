//! Bounds-preserving flux-corrected transport on sparse graphs.
//!
//! The crate evaluates the semi-discrete right-hand side of linear transport problems
//! `M du/dt = -K u`, given an externally assembled mass matrix `M`, advection matrix `K` and
//! lumped mass vector, using one of three [schemes](scheme::Scheme): a low-order scheme
//! stabilized by graph viscosity, an unlimited high-order target scheme, and monolithic convex
//! limiting (MCL) between the two.
//!
//! Explicit time integrators, a simple 1D problem generator and run settings are included
//! for driving the schemes in tests, benchmarks and demos.
pub mod error;
pub mod evolution;
pub mod graph;
pub mod ode;
pub mod procedural;
pub mod problem;
pub mod scheme;
pub mod settings;
pub mod viscosity;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use fluxcorr_traits::Real;

pub use error::{EvaluationError, GraphError};
pub use evolution::{evaluate, Evolution, Execution};
pub use graph::GraphOperator;
pub use scheme::Scheme;
