//! The family of transport schemes.
//!
//! Every scheme computes the rate of change `y = du/dt` of a state `u` over a
//! [`GraphOperator`](crate::graph::GraphOperator), one row at a time:
//!
//! - [`Scheme::LowOrder`]: monotone, first-order, graph-viscosity stabilized.
//! - [`Scheme::HighOrderTarget`]: the low-order rates corrected towards the consistent-mass
//!   Galerkin rates. Not bounds-preserving.
//! - [`Scheme::Mcl`]: monolithic convex limiting of the antidiffusive fluxes between the two.
//!   Bounds-preserving.
//!
//! The high-order and MCL schemes need the low-order rates of all DOFs before any of their
//! own rows can be computed, hence every evaluation of those schemes is a two-pass process.
use crate::graph::GraphOperator;
use fluxcorr_traits::Real;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

pub mod high_order;
pub mod low_order;
pub mod mcl;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    #[default]
    LowOrder,
    #[serde(rename = "high-order", alias = "high-order-target")]
    HighOrderTarget,
    Mcl,
}

impl Scheme {
    pub const ALL: [Scheme; 3] = [Scheme::LowOrder, Scheme::HighOrderTarget, Scheme::Mcl];

    /// Whether an explicit Euler step below the CFL bound preserves local bounds.
    pub fn is_bounds_preserving(&self) -> bool {
        match self {
            Scheme::LowOrder | Scheme::Mcl => true,
            Scheme::HighOrderTarget => false,
        }
    }

    /// Whether the scheme needs the low-order rates of all DOFs (the first pass).
    pub fn requires_low_order_rates(&self) -> bool {
        !matches!(self, Scheme::LowOrder)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::LowOrder => "low-order",
            Scheme::HighOrderTarget => "high-order",
            Scheme::Mcl => "mcl",
        }
    }

    /// Rate of DOF `i` (the second pass).
    ///
    /// `z` is ignored by the low-order scheme and must otherwise hold the low-order rates of
    /// all DOFs.
    #[inline]
    pub fn row_rate<T: Real>(&self, graph: &GraphOperator<T>, i: usize, x: &[T], z: &[T]) -> T {
        match self {
            Scheme::LowOrder => low_order::low_order_rate(graph, i, x),
            Scheme::HighOrderTarget => high_order::high_order_rate(graph, i, x, z),
            Scheme::Mcl => mcl::mcl_rate(graph, i, x, z),
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScheme(String);

impl Display for UnknownScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown scheme '{}'. Expected one of: low-order (1), high-order (2), mcl (3).",
            self.0
        )
    }
}

impl Error for UnknownScheme {}

impl FromStr for Scheme {
    type Err = UnknownScheme;

    /// Parses a scheme name. The numeric identifiers `1`, `2` and `3` are accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low-order" | "low_order" | "lo" | "1" => Ok(Scheme::LowOrder),
            "high-order" | "high_order" | "high-order-target" | "ho" | "2" => Ok(Scheme::HighOrderTarget),
            "mcl" | "3" => Ok(Scheme::Mcl),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}
