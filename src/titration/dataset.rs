//! Solving every titration listed in a dataset table.
use std::path::Path;

use tracing::{info, warn};

use super::diluted_chemistry;
use super::solver::{EmfLeastSquares, FitInput, FitResult, TitrationFitter};
use crate::adapters::teos10::analyte_mass_from_volume;
use crate::equilibrium::{CarbonateEngine, EquilibriumEngine};
use crate::error::AppError;
use crate::io::{DatasetRow, read_dat};
use crate::models::{
    EquilibriumOptions, SeawaterSample, SolverOptions, TitrationParameters, TitrationPoint,
};

impl DatasetRow {
    pub fn equilibrium_options(&self) -> EquilibriumOptions {
        let defaults = EquilibriumOptions::default();
        EquilibriumOptions {
            opt_k_carbonic: self.opt_k_carbonic.unwrap_or(defaults.opt_k_carbonic),
            opt_total_borate: self.opt_total_borate.unwrap_or(defaults.opt_total_borate),
        }
    }

    /// Analyte mass in kg, from the mass column or else the volume column.
    pub fn resolved_analyte_mass(&self, temperature: f64) -> Result<f64, AppError> {
        match (self.analyte_mass, self.analyte_volume) {
            (Some(mass), _) => Ok(mass),
            (None, Some(volume)) => analyte_mass_from_volume(volume, self.salinity, temperature),
            (None, None) => Err(AppError::invalid(format!(
                "{}: neither analyte_mass nor analyte_volume is given",
                self.file_name
            ))),
        }
    }
}

/// Solve one row's titration file, resolving paths against `table_dir`.
pub fn solve_row(
    row: &DatasetRow,
    table_dir: &Path,
    solver: &SolverOptions,
) -> Result<FitResult, AppError> {
    let points: Vec<TitrationPoint> = read_dat(&row.dat_path(table_dir))?
        .into_iter()
        .map(|r| r.to_point(row.titrant_amount_unit))
        .collect();
    if let Some(p) = points.iter().find(|p| !p.titrant_mass.is_finite()) {
        return Err(AppError::invalid(format!(
            "{}: titrant amount {} is not a number",
            row.file_name, p.titrant_mass
        )));
    }
    if let Some(w) = points.windows(2).find(|w| w[1].titrant_mass <= w[0].titrant_mass) {
        return Err(AppError::invalid(format!(
            "{}: titrant amounts must strictly increase ({} followed by {})",
            row.file_name, w[0].titrant_mass, w[1].titrant_mass
        )));
    }

    let engine = CarbonateEngine::new(row.equilibrium_options());
    let params = TitrationParameters {
        titrant: row.titrant,
        titrant_molinity: row.titrant_molinity,
        alkalinity_factor: None,
        analyte_mass: row.resolved_analyte_mass(points[0].temperature)?,
        ..TitrationParameters::default()
    };
    params.validate()?;
    let sample = SeawaterSample {
        dic: row.dic.unwrap_or(0.0),
        salinity: row.salinity,
        temperature: points[0].temperature,
        ..SeawaterSample::default()
    };
    let sample_totals = engine.sample_totals(&sample)?;

    let masses: Vec<f64> = points.iter().map(|p| p.titrant_mass).collect();
    let temperatures: Vec<f64> = points.iter().map(|p| p.temperature).collect();
    let (totals, constants) = diluted_chemistry(
        &engine,
        row.salinity,
        &sample_totals,
        &params,
        &masses,
        &temperatures,
    )?;

    EmfLeastSquares::new(solver.clone()).fit(&FitInput {
        titrant_molinity: params.titrant_molinity,
        alkalinity_factor: params.factor(),
        analyte_mass: params.analyte_mass,
        points: &points,
        totals: &totals,
        constants: &constants,
    })
}

/// Solve every row, filling `alkalinity` and `emf0` in place.
///
/// Rows that fail keep empty results; their errors are returned alongside
/// the successes in row order.
pub fn solve_dataset(
    rows: &mut [DatasetRow],
    table_dir: &Path,
    solver: &SolverOptions,
) -> Vec<Result<FitResult, AppError>> {
    rows.iter_mut()
        .map(|row| {
            let outcome = solve_row(row, table_dir, solver);
            match &outcome {
                Ok(fit) => {
                    row.alkalinity = Some(fit.alkalinity());
                    row.emf0 = Some(fit.emf0());
                    info!(
                        file = %row.file_name,
                        alkalinity = fit.alkalinity(),
                        emf0 = fit.emf0(),
                        "solved titration"
                    );
                }
                Err(e) => {
                    row.alkalinity = None;
                    row.emf0 = None;
                    warn!(file = %row.file_name, error = %e, "titration could not be solved");
                }
            }
            outcome
        })
        .collect()
}
