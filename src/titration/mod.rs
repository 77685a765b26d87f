//! Titration simulation, fitting and validation.
pub mod dataset;
pub mod simulate;
pub mod solver;
pub mod titrant;
pub mod validate;

use crate::chemistry::constants::EquilibriumConstants;
use crate::equilibrium::EquilibriumEngine;
use crate::error::AppError;
use crate::models::{TitrationParameters, Totals};

/// Per-point totals and constants of the titration mixture.
///
/// Each point's totals are the sample totals diluted by the titrant (plus
/// what the titrant acid delivers), and its constants are evaluated for
/// those totals at the point's temperature.
pub fn diluted_chemistry<E: EquilibriumEngine + ?Sized>(
    engine: &E,
    salinity: f64,
    sample_totals: &Totals,
    params: &TitrationParameters,
    titrant_masses: &[f64],
    temperatures: &[f64],
) -> Result<(Vec<Totals>, Vec<EquilibriumConstants>), AppError> {
    let mut totals = Vec::with_capacity(titrant_masses.len());
    let mut constants = Vec::with_capacity(titrant_masses.len());
    for (&titrant_mass, &temperature) in titrant_masses.iter().zip(temperatures) {
        let point_totals = params.titrant.dilute_totals(
            sample_totals,
            params.titrant_molinity,
            titrant_mass,
            params.analyte_mass,
        );
        point_totals.ensure_non_negative()?;
        constants.push(engine.constants(temperature, salinity, &point_totals)?);
        totals.push(point_totals);
    }
    Ok((totals, constants))
}
