//! Round-trip validation: simulate, fit, and compare against the inputs.
use serde::Serialize;

use super::diluted_chemistry;
use super::simulate::{Simulation, simulate};
use super::solver::{FitInput, FitResult, TitrationFitter};
use crate::equilibrium::EquilibriumEngine;
use crate::error::AppError;
use crate::models::{SeawaterSample, TitrationParameters};

/// Largest accepted absolute deviations (alkalinity in µmol/kg, EMF0 in mV).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Tolerance {
    pub alkalinity: f64,
    pub emf0: f64,
}

impl Tolerance {
    /// Noise-free data kept in memory.
    pub const EXACT: Self = Self {
        alkalinity: 1e-8,
        emf0: 1e-8,
    };
    /// Data that went through the 4-decimal `.dat` file and the dataset table.
    pub const FILE_ROUNDED: Self = Self {
        alkalinity: 1e-3,
        emf0: 1e-4,
    };
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundTripReport {
    pub alkalinity_expected: f64,
    pub alkalinity_fitted: f64,
    pub emf0_expected: f64,
    pub emf0_fitted: f64,
    pub iterations: usize,
    pub points_used: usize,
}

impl RoundTripReport {
    pub fn alkalinity_deviation(&self) -> f64 {
        (self.alkalinity_fitted - self.alkalinity_expected).abs()
    }

    pub fn emf0_deviation(&self) -> f64 {
        (self.emf0_fitted - self.emf0_expected).abs()
    }
}

fn within(parameter: &'static str, expected: f64, actual: f64, tolerance: f64) -> Result<(), AppError> {
    let deviation = (actual - expected).abs();
    // NaN deviations must fail as well.
    if deviation <= tolerance {
        Ok(())
    } else {
        Err(AppError::RoundTrip {
            parameter,
            expected,
            actual,
            deviation,
            tolerance,
        })
    }
}

/// Compare a fit against the known alkalinity (µmol/kg) and EMF0 (mV).
pub fn check_recovery(
    alkalinity_expected: f64,
    emf0_expected: f64,
    fit: &FitResult,
    tolerance: Tolerance,
) -> Result<RoundTripReport, AppError> {
    within(
        "alkalinity",
        alkalinity_expected,
        fit.alkalinity(),
        tolerance.alkalinity,
    )?;
    within("emf0", emf0_expected, fit.emf0(), tolerance.emf0)?;
    Ok(RoundTripReport {
        alkalinity_expected,
        alkalinity_fitted: fit.alkalinity(),
        emf0_expected,
        emf0_fitted: fit.emf0(),
        iterations: fit.iterations,
        points_used: fit.points_used.len(),
    })
}

/// Fit a simulated titration.
///
/// The fitter gets totals and constants rebuilt from the sample rather than
/// the simulator's intermediates, so a dilution mismatch between the two
/// paths shows up as a failed recovery.
pub fn fit_simulation<E, F>(
    engine: &E,
    fitter: &F,
    sample: &SeawaterSample,
    params: &TitrationParameters,
    simulation: &Simulation,
) -> Result<FitResult, AppError>
where
    E: EquilibriumEngine + ?Sized,
    F: TitrationFitter + ?Sized,
{
    let points = simulation.titration_points();
    let masses: Vec<f64> = points.iter().map(|p| p.titrant_mass).collect();
    let temperatures: Vec<f64> = points.iter().map(|p| p.temperature).collect();

    let sample_totals = engine.sample_totals(sample)?;
    let (totals, constants) = diluted_chemistry(
        engine,
        sample.salinity,
        &sample_totals,
        params,
        &masses,
        &temperatures,
    )?;
    fitter.fit(&FitInput {
        titrant_molinity: params.titrant_molinity,
        alkalinity_factor: params.factor(),
        analyte_mass: params.analyte_mass,
        points: &points,
        totals: &totals,
        constants: &constants,
    })
}

/// Simulate a titration, fit it, and check the recovered parameters.
pub fn round_trip<E, F>(
    engine: &E,
    fitter: &F,
    sample: &SeawaterSample,
    params: &TitrationParameters,
    titrant_masses: &[f64],
    temperatures: &[f64],
    tolerance: Tolerance,
) -> Result<RoundTripReport, AppError>
where
    E: EquilibriumEngine + ?Sized,
    F: TitrationFitter + ?Sized,
{
    let simulation = simulate(engine, sample, params, titrant_masses, temperatures)?;
    let fit = fit_simulation(engine, fitter, sample, params, &simulation)?;
    check_recovery(simulation.alkalinity, params.emf0, &fit, tolerance)
}
