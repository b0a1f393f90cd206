use nalgebra::RealField;

pub use nalgebra;

/// Scalar type used throughout `fluxcorr`.
///
/// The graph kernels only need ordered, copyable real numbers, so this is a trait alias for
/// `RealField + Copy`. `RealField` already implies `Send + Sync`, which the parallel
/// evaluation relies on.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
