//! Run configuration of a transport simulation.
use crate::evolution::Execution;
use crate::ode::OdeSolverKind;
use crate::problem::Problem;
use crate::scheme::Scheme;
use eyre::{eyre, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for a 1D periodic advection run.
///
/// Every field is optional in serialized form, and missing fields take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub problem: Problem,
    pub scheme: Scheme,
    pub ode_solver: OdeSolverKind,
    pub num_cells: usize,
    pub t_final: f64,
    pub dt: f64,
    /// Number of time steps between progress reports.
    pub vis_steps: usize,
    pub execution: Execution,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            problem: Problem::default(),
            scheme: Scheme::default(),
            ode_solver: OdeSolverKind::default(),
            num_cells: 64,
            t_final: 1.0,
            dt: 0.001,
            vis_steps: 10,
            execution: Execution::default(),
        }
    }
}

impl SimulationSettings {
    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).wrap_err_with(|| format!("failed to open settings file {}", path.display()))?;
        let settings: Self = serde_json::from_reader(BufReader::new(file))
            .wrap_err_with(|| format!("failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self).wrap_err("failed to serialize settings")
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if !(self.dt > 0.0) {
            return Err(eyre!("time step must be positive, got {}", self.dt));
        }
        if !(self.t_final >= 0.0) {
            return Err(eyre!("final time must be non-negative, got {}", self.t_final));
        }
        if self.vis_steps == 0 {
            return Err(eyre!("number of visualization steps must be positive"));
        }
        if self.num_cells < 2 {
            return Err(eyre!("periodic segment needs at least 2 cells, got {}", self.num_cells));
        }
        Ok(())
    }
}
