//! Forward simulation of an acid titration.
//!
//! Starting from a sample with known DIC and pH, the sample alkalinity is
//! found with one engine call. Each titrant addition then removes
//! `factor * molinity * titrant_mass` moles of alkalinity, every total is
//! diluted (and augmented by what the acid carries), and the engine solves
//! pH for the new mixture. The pH is reported as the EMF an electrode with
//! offset `emf0` would read.
use serde::Serialize;
use tracing::debug;

use super::diluted_chemistry;
use crate::chemistry::{MICRO, ph_to_emf};
use crate::equilibrium::EquilibriumEngine;
use crate::error::AppError;
use crate::models::{SeawaterSample, SimulatedPoint, TitrationParameters, TitrationPoint, Totals};

/// Result of a forward simulation.
#[derive(Clone, Debug, Serialize)]
pub struct Simulation {
    /// Alkalinity of the undiluted sample, µmol/kg.
    pub alkalinity: f64,
    /// Totals of the undiluted sample, mol/kg.
    pub totals: Totals,
    pub points: Vec<SimulatedPoint>,
}

impl Simulation {
    pub fn titration_points(&self) -> Vec<TitrationPoint> {
        self.points.iter().map(|p| p.point).collect()
    }
}

/// Upper bound on the number of points a sweep may produce.
pub const MAX_SWEEP_POINTS: usize = 1_000_000;

/// Cumulative titrant masses in kg for a sweep given in grams, end inclusive.
///
/// `titrant_mass_sweep(0.0, 2.5, 0.05)` yields 51 masses from 0 to 2.5 g.
pub fn titrant_mass_sweep(start_g: f64, stop_g: f64, step_g: f64) -> Result<Vec<f64>, AppError> {
    if !(step_g > 0.0) || !start_g.is_finite() || !stop_g.is_finite() || stop_g < start_g {
        return Err(AppError::invalid(format!(
            "invalid titrant sweep {start_g}..={stop_g} step {step_g}"
        )));
    }
    let steps = ((stop_g - start_g) / step_g + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_SWEEP_POINTS as f64 {
        return Err(AppError::invalid(format!(
            "titrant sweep {start_g}..={stop_g} step {step_g} exceeds {MAX_SWEEP_POINTS} points"
        )));
    }
    let steps = steps as usize;
    Ok((0..=steps)
        .map(|i| (start_g + i as f64 * step_g) * 1e-3)
        .collect())
}

/// Check that titrant masses start at zero and strictly increase.
pub fn validate_titrant_masses(masses: &[f64]) -> Result<(), AppError> {
    match masses.first() {
        None => return Err(AppError::invalid("titrant mass sequence is empty")),
        Some(&first) if first != 0.0 => {
            return Err(AppError::invalid(format!(
                "titrant mass sequence must start at 0, got {first}"
            )));
        }
        Some(_) => {}
    }
    if let Some(w) = masses
        .windows(2)
        .find(|w| !w[1].is_finite() || w[1] <= w[0])
    {
        return Err(AppError::invalid(format!(
            "titrant masses must strictly increase ({} followed by {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Simulate a titration.
///
/// `titrant_masses` are cumulative masses in kg and `temperatures` the
/// matching temperatures in °C.
pub fn simulate<E: EquilibriumEngine + ?Sized>(
    engine: &E,
    sample: &SeawaterSample,
    params: &TitrationParameters,
    titrant_masses: &[f64],
    temperatures: &[f64],
) -> Result<Simulation, AppError> {
    params.validate()?;
    validate_titrant_masses(titrant_masses)?;
    if temperatures.len() != titrant_masses.len() {
        return Err(AppError::invalid(format!(
            "{} temperatures given for {} titrant masses",
            temperatures.len(),
            titrant_masses.len()
        )));
    }

    let sample_totals = engine.sample_totals(sample)?;
    let core_constants = engine.constants(sample.temperature, sample.salinity, &sample_totals)?;
    let alkalinity = engine.alkalinity_from_dic_ph(sample.ph_free, &sample_totals, &core_constants)?;

    let (totals, constants) = diluted_chemistry(
        engine,
        sample.salinity,
        &sample_totals,
        params,
        titrant_masses,
        temperatures,
    )?;

    let factor = params.factor();
    let analyte_mass = params.analyte_mass;
    let mut points = Vec::with_capacity(titrant_masses.len());
    for (i, &titrant_mass) in titrant_masses.iter().enumerate() {
        let point_alkalinity = (alkalinity * analyte_mass
            - factor * titrant_mass * params.titrant_molinity)
            / (analyte_mass + titrant_mass);
        let ph_free = engine.ph_from_alkalinity_dic(point_alkalinity, &totals[i], &constants[i])?;
        points.push(SimulatedPoint {
            point: TitrationPoint {
                titrant_mass,
                emf: ph_to_emf(ph_free, params.emf0, temperatures[i]),
                temperature: temperatures[i],
            },
            alkalinity: point_alkalinity,
            totals: totals[i],
            ph_free,
        });
    }

    debug!(
        points = points.len(),
        alkalinity_umol_kg = alkalinity / MICRO,
        titrant = %params.titrant,
        "simulated titration"
    );
    Ok(Simulation {
        alkalinity: alkalinity / MICRO,
        totals: sample_totals,
        points,
    })
}

/// [`simulate`] with every point at the sample temperature.
pub fn simulate_isothermal<E: EquilibriumEngine + ?Sized>(
    engine: &E,
    sample: &SeawaterSample,
    params: &TitrationParameters,
    titrant_masses: &[f64],
) -> Result<Simulation, AppError> {
    let temperatures = vec![sample.temperature; titrant_masses.len()];
    simulate(engine, sample, params, titrant_masses, &temperatures)
}
