#[cfg(feature = "cli")]
pub mod cli;
pub mod teos10;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(feature = "cli")]
pub fn run() -> Result<(), crate::error::AppError> {
    use crate::adapters::cli::{Args, Command};

    init_tracing();
    let args = Args::parse();
    match &args.command {
        Command::Simulate(sim) => run_simulate(sim),
        Command::Solve(solve) => run_solve(solve),
    }
}

#[cfg(feature = "cli")]
fn run_simulate(args: &cli::SimulateArgs) -> Result<(), crate::error::AppError> {
    use crate::equilibrium::CarbonateEngine;
    use crate::io::{WriteMode, write_dat};
    use crate::titration::simulate::{simulate_isothermal, titrant_mass_sweep};
    use crate::titration::solver::EmfLeastSquares;
    use crate::titration::validate::fit_simulation;

    let doc = cli::parse_simulation(args)?;
    let engine = CarbonateEngine::new(doc.options.clone());
    let fitter = EmfLeastSquares::new(doc.solver.clone());

    let masses = titrant_mass_sweep(doc.sweep.start_g, doc.sweep.stop_g, doc.sweep.step_g)?;
    let simulation = simulate_isothermal(&engine, &doc.sample, &doc.titration, &masses)?;

    if let Some(path) = &args.dat {
        let mode = if args.append {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        };
        write_dat(path, &simulation.titration_points(), mode)?;
    }

    let fit = fit_simulation(&engine, &fitter, &doc.sample, &doc.titration, &simulation)?;
    let out = cli::SimulationOutput {
        points: simulation.points.len(),
        alkalinity: simulation.alkalinity,
        emf0: doc.titration.emf0,
        alkalinity_fitted: fit.alkalinity(),
        emf0_fitted: fit.emf0(),
        final_ph: simulation.points.last().map_or(f64::NAN, |p| p.ph_free),
        dat_file: args.dat.clone(),
    };
    cli::print_simulation(&out, args)
}

#[cfg(feature = "cli")]
fn run_solve(args: &cli::SolveArgs) -> Result<(), crate::error::AppError> {
    use crate::io::{read_table, write_table};
    use crate::titration::dataset::solve_dataset;

    let solver = args.solver_options()?;
    let mut rows = read_table(&args.table)?;
    let outcomes = solve_dataset(&mut rows, &cli::table_dir(&args.table), &solver);

    let report: Vec<cli::SolveOutput> = rows
        .iter()
        .zip(&outcomes)
        .map(|(row, outcome)| cli::SolveOutput {
            file_name: row.file_name.clone(),
            alkalinity: row.alkalinity,
            emf0: row.emf0,
            error: outcome.as_ref().err().map(ToString::to_string),
        })
        .collect();
    cli::print_solved(&report, args)?;

    if args.write {
        write_table(&args.table, &rows)?;
    }
    match outcomes.into_iter().find_map(Result::err) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
