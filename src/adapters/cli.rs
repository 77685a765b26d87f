use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::{EquilibriumOptions, SeawaterSample, SolverOptions, TitrationParameters};

#[derive(Parser, Debug)]
#[command(author, version, about = "Seawater titration simulator and EMF alkalinity solver", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a titration, optionally write it as a .dat file, and solve it back
    Simulate(SimulateArgs),
    /// Solve every titration listed in a dataset table (CSV)
    Solve(SolveArgs),
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    #[arg(long)]
    pub json: bool,
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with the simulation document; '-' reads from stdin"
    )]
    pub input: Option<String>,
    #[arg(
        long,
        value_name = "JSON",
        help = "Inline JSON simulation document (overrides --input)"
    )]
    pub inputs_json: Option<String>,
    #[arg(long, value_name = "FILE", help = "Write the simulated titration here")]
    pub dat: Option<PathBuf>,
    #[arg(long, help = "Append to the .dat file instead of overwriting it")]
    pub append: bool,
}

#[derive(clap::Args, Debug)]
pub struct SolveArgs {
    #[arg(long)]
    pub json: bool,
    #[arg(value_name = "TABLE", help = "Dataset table (CSV) listing .dat files")]
    pub table: PathBuf,
    #[arg(long, help = "Store fitted alkalinity and emf0 back into the table")]
    pub write: bool,
    #[arg(long, value_name = "PH", help = "Lower free-scale pH of the fitted points [default: 3]")]
    pub ph_min: Option<f64>,
    #[arg(long, value_name = "PH", help = "Upper free-scale pH of the fitted points [default: 4]")]
    pub ph_max: Option<f64>,
    #[arg(long, value_name = "N", help = "Least-squares iteration limit [default: 200]")]
    pub max_iterations: Option<usize>,
}

impl SolveArgs {
    /// Solver settings with the command-line overrides applied.
    pub fn solver_options(&self) -> Result<SolverOptions, AppError> {
        let defaults = SolverOptions::default();
        let options = SolverOptions {
            ph_min: self.ph_min.unwrap_or(defaults.ph_min),
            ph_max: self.ph_max.unwrap_or(defaults.ph_max),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            ..defaults
        };
        if !(options.ph_min < options.ph_max) {
            return Err(AppError::invalid(format!(
                "pH window {}..{} is empty",
                options.ph_min, options.ph_max
            )));
        }
        if options.max_iterations == 0 {
            return Err(AppError::invalid("max-iterations must be at least 1"));
        }
        Ok(options)
    }
}

/// Titrant sweep in grams, end inclusive.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Sweep {
    pub start_g: f64,
    pub stop_g: f64,
    pub step_g: f64,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            start_g: 0.0,
            stop_g: 2.5,
            step_g: 0.05,
        }
    }
}

/// Input document of the `simulate` command; every section is optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDocument {
    pub sample: SeawaterSample,
    pub titration: TitrationParameters,
    pub sweep: Sweep,
    pub options: EquilibriumOptions,
    pub solver: SolverOptions,
}

fn parse_document(doc: &str, inline: bool) -> Result<SimulationDocument, AppError> {
    serde_json::from_str(doc).map_err(|source| {
        if inline {
            AppError::ParseInputsJson { source }
        } else {
            AppError::ParseCmdInputJson { source }
        }
    })
}

pub fn parse_simulation(args: &SimulateArgs) -> Result<SimulationDocument, AppError> {
    match (&args.inputs_json, &args.input) {
        (Some(inputs_json), _) => parse_document(inputs_json, true),
        (None, Some(path)) if path == "-" => {
            let mut s = String::new();
            io::stdin()
                .read_to_string(&mut s)
                .map_err(|source| AppError::ReadStdin { source })?;
            parse_document(&s, false)
        }
        (None, Some(path)) => {
            let s = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
                path: PathBuf::from(path),
                source,
            })?;
            parse_document(&s, false)
        }
        (None, None) => Err(AppError::MissingInputData),
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SimulationOutput {
    pub points: usize,
    pub alkalinity: f64,
    pub emf0: f64,
    pub alkalinity_fitted: f64,
    pub emf0_fitted: f64,
    pub final_ph: f64,
    pub dat_file: Option<PathBuf>,
}

pub fn print_simulation(out: &SimulationOutput, args: &SimulateArgs) -> Result<(), AppError> {
    if args.json {
        let s = serde_json::to_string_pretty(&out)
            .map_err(|source| AppError::SerializeOutput { source })?;
        println!("{}", s);
    } else {
        println!("Points: {}", out.points);
        println!("Alkalinity: {:.6} µmol/kg", out.alkalinity);
        println!("Alkalinity (solved): {:.6} µmol/kg", out.alkalinity_fitted);
        println!("EMF0: {:.6} mV", out.emf0);
        println!("EMF0 (solved): {:.6} mV", out.emf0_fitted);
        println!("Final pH (free): {:.4}", out.final_ph);
        if let Some(path) = &out.dat_file {
            println!("Written: {}", path.display());
        }
    }

    Ok(())
}

#[derive(Serialize, Debug, Clone)]
pub struct SolveOutput {
    pub file_name: String,
    pub alkalinity: Option<f64>,
    pub emf0: Option<f64>,
    pub error: Option<String>,
}

pub fn print_solved(rows: &[SolveOutput], args: &SolveArgs) -> Result<(), AppError> {
    if args.json {
        let s = serde_json::to_string_pretty(rows)
            .map_err(|source| AppError::SerializeOutput { source })?;
        println!("{}", s);
    } else {
        for row in rows {
            match (row.alkalinity, &row.error) {
                (Some(alk), _) => println!("{}: {:.4} µmol/kg", row.file_name, alk),
                (None, Some(e)) => println!("{}: failed ({e})", row.file_name),
                (None, None) => println!("{}: not solved", row.file_name),
            }
        }
    }

    Ok(())
}

/// Directory that relative `.dat` paths in `table` are resolved against.
pub fn table_dir(table: &Path) -> PathBuf {
    table
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
