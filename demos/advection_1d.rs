//! Transport of a 1D profile around the periodic unit segment.
//!
//! Settings are read from an optional JSON file and then overridden by command-line flags.
//! The final state is written as CSV, one row per node.
use clap::Parser;
use eyre::WrapErr;
use fluxcorr::evolution::{Evolution, Execution};
use fluxcorr::ode::{ExplicitRungeKutta, OdeSolverKind};
use fluxcorr::problem::Problem;
use fluxcorr::procedural::{assemble_periodic_advection_1d, PeriodicSegment};
use fluxcorr::scheme::Scheme;
use fluxcorr::settings::SimulationSettings;
use log::{info, warn};
use nalgebra::DVector;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// JSON settings file. Flags given on the command line take precedence.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Problem setup: bump-and-step (0) or gaussian (2).
    #[arg(short, long)]
    problem: Option<Problem>,
    /// Scheme: low-order (1), high-order (2) or mcl (3).
    #[arg(short, long)]
    scheme: Option<Scheme>,
    /// ODE solver: forward-euler (1), heun (2), ssp-rk3 (3), rk4 (4) or rk6 (6).
    #[arg(long)]
    ode_solver: Option<OdeSolverKind>,
    /// Number of cells of the periodic mesh.
    #[arg(short = 'n', long)]
    cells: Option<usize>,
    #[arg(long)]
    t_final: Option<f64>,
    #[arg(long)]
    dt: Option<f64>,
    /// Number of time steps between progress reports.
    #[arg(long)]
    vis_steps: Option<usize>,
    /// Evaluate rows in parallel.
    #[arg(long)]
    parallel: bool,
    /// Where to write the final state.
    #[arg(short, long, value_name = "FILE", default_value = "advection_1d.csv")]
    output: PathBuf,
}

impl Args {
    fn settings(&self) -> eyre::Result<SimulationSettings> {
        let mut settings = match &self.config {
            Some(path) => SimulationSettings::from_json_file(path)?,
            None => SimulationSettings::default(),
        };
        if let Some(problem) = self.problem {
            settings.problem = problem;
        }
        if let Some(scheme) = self.scheme {
            settings.scheme = scheme;
        }
        if let Some(ode_solver) = self.ode_solver {
            settings.ode_solver = ode_solver;
        }
        if let Some(cells) = self.cells {
            settings.num_cells = cells;
        }
        if let Some(t_final) = self.t_final {
            settings.t_final = t_final;
        }
        if let Some(dt) = self.dt {
            settings.dt = dt;
        }
        if let Some(vis_steps) = self.vis_steps {
            settings.vis_steps = vis_steps;
        }
        if self.parallel {
            settings.execution = Execution::Parallel;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn write_csv(path: &Path, coordinates: &DVector<f64>, state: &DVector<f64>, num_vars: usize) -> eyre::Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let n = coordinates.len();

    write!(writer, "x")?;
    for var in 0..num_vars {
        write!(writer, ",u{}", var)?;
    }
    writeln!(writer)?;

    for (i, x) in coordinates.iter().enumerate() {
        write!(writer, "{}", x)?;
        for var in 0..num_vars {
            write!(writer, ",{}", state[i + var * n])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = args.settings()?;
    info!("Settings: {:?}", settings);

    let problem = settings.problem;
    let segment = PeriodicSegment::<f64>::unit(settings.num_cells);
    let graph = Arc::new(assemble_periodic_advection_1d(&segment, problem.velocity()));
    info!("Number of unknowns: {}", graph.num_dofs() * problem.num_vars());

    if let Some(dt_max) = graph.max_stable_time_step() {
        if settings.scheme.is_bounds_preserving() && settings.dt > dt_max {
            warn!(
                "Time step {} exceeds the bounds-preserving limit {} of the {} scheme",
                settings.dt, dt_max, settings.scheme
            );
        }
    }

    let evolution =
        Evolution::new(settings.scheme, graph.clone(), problem.num_vars())?.with_execution(settings.execution);
    let mut solver = ExplicitRungeKutta::from_kind(settings.ode_solver);
    let mut u = problem.initial_state(&segment);
    let initial_mass = graph.total_mass(u.as_slice(), problem.num_vars())?;
    info!(
        "Initial state: min = {:.6}, max = {:.6}, total mass = {:?}",
        u.min(),
        u.max(),
        initial_mass
    );

    let summary = solver.integrate(&evolution, &mut u, settings.t_final, settings.dt, |step, t, u| {
        if step % settings.vis_steps == 0 {
            info!("time step: {}, time: {:.6}, min: {:.6}, max: {:.6}", step, t, u.min(), u.max());
        }
    })?;

    let final_mass = graph.total_mass(u.as_slice(), problem.num_vars())?;
    info!(
        "Finished after {} steps at t = {:.6}: min = {:.6}, max = {:.6}, total mass = {:?}",
        summary.steps,
        summary.final_time,
        u.min(),
        u.max(),
        final_mass
    );

    write_csv(&args.output, &segment.node_coordinates(), &u, problem.num_vars())?;
    info!("Wrote final state to {}", args.output.display());
    Ok(())
}
