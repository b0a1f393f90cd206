//! Initial data and velocities of the built-in 1D advection test problems.
use crate::procedural::PeriodicSegment;
use fluxcorr_traits::Real;
use nalgebra::DVector;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Problem {
    /// A smooth bump on `(0.5, 0.9)` next to a unit step on `(0.2, 0.4)`. One variable.
    #[default]
    BumpAndStep,
    /// A Gaussian pulse centered at `X = 0.5` in reference coordinates `X ∈ [-1, 1]`. Two
    /// variables of opposite sign.
    Gaussian,
}

impl Problem {
    pub const ALL: [Problem; 2] = [Problem::BumpAndStep, Problem::Gaussian];

    pub fn name(&self) -> &'static str {
        match self {
            Problem::BumpAndStep => "bump-and-step",
            Problem::Gaussian => "gaussian",
        }
    }

    pub fn num_vars(&self) -> usize {
        match self {
            Problem::BumpAndStep => 1,
            Problem::Gaussian => 2,
        }
    }

    pub fn velocity<T: Real>(&self) -> T {
        T::one()
    }

    /// Value of the first variable at the physical coordinate `x` of `segment`.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn initial_value<T: Real>(&self, segment: &PeriodicSegment<T>, x: T) -> T {
        match self {
            Problem::BumpAndStep => {
                if x > 0.5 && x < 0.9 {
                    T::exp(10.0) * T::exp(1.0 / (0.5 - x)) * T::exp(1.0 / (x - 0.9))
                } else if x > 0.2 && x < 0.4 {
                    1.0
                } else {
                    0.0
                }
            }
            Problem::Gaussian => {
                let length = segment.length();
                let center = 0.5 * length;
                let reference_x = 2.0 * (x - center) / length;
                T::exp(-40.0 * (reference_x - 0.5).powi(2))
            }
        }
    }

    /// The initial state over the nodes of `segment`, one block per variable.
    ///
    /// Variable `n` is `(-1)^n` times the first variable.
    pub fn initial_state<T: Real>(&self, segment: &PeriodicSegment<T>) -> DVector<T> {
        let first: Vec<T> = segment
            .node_coordinates()
            .iter()
            .map(|&x| self.initial_value(segment, x))
            .collect();

        let num_nodes = first.len();
        DVector::from_fn(self.num_vars() * num_nodes, |idx, _| {
            let (var, node) = (idx / num_nodes, idx % num_nodes);
            if var % 2 == 0 {
                first[node]
            } else {
                -first[node]
            }
        })
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProblem(String);

impl Display for UnknownProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown problem '{}'. Expected one of: bump-and-step (0), gaussian (2).",
            self.0
        )
    }
}

impl Error for UnknownProblem {}

impl FromStr for Problem {
    type Err = UnknownProblem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bump-and-step" | "bump_and_step" | "0" => Ok(Problem::BumpAndStep),
            "gaussian" | "2" => Ok(Problem::Gaussian),
            _ => Err(UnknownProblem(s.to_string())),
        }
    }
}
