use serde::{Deserialize, Serialize};

use crate::chemistry::{self, MICRO};
use crate::error::AppError;
use crate::titration::titrant::Titrant;

/// Upper bound of the oceanographic salinity range accepted as input.
pub const MAX_SALINITY: f64 = 42.0;

/// Seawater sample before titration.
///
/// Concentrations are µmol/kg, pH is on the free scale. Optional totals
/// override the salinity-based estimates.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeawaterSample {
    pub dic: f64,
    pub ph_free: f64,
    pub salinity: f64,
    pub temperature: f64,
    pub total_borate: Option<f64>,
    pub total_fluoride: Option<f64>,
    pub total_sulfate: Option<f64>,
}

impl Default for SeawaterSample {
    fn default() -> Self {
        Self {
            dic: 2000.0,
            ph_free: 8.1,
            salinity: 35.0,
            temperature: 25.0,
            total_borate: None,
            total_fluoride: None,
            total_sulfate: None,
        }
    }
}

impl SeawaterSample {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=MAX_SALINITY).contains(&self.salinity) {
            return Err(AppError::invalid(format!(
                "salinity {} outside 0..={MAX_SALINITY}",
                self.salinity
            )));
        }
        if !self.ph_free.is_finite() || !self.temperature.is_finite() {
            return Err(AppError::invalid("pH and temperature must be finite"));
        }
        let named = [
            ("dic", Some(self.dic)),
            ("total_borate", self.total_borate),
            ("total_fluoride", self.total_fluoride),
            ("total_sulfate", self.total_sulfate),
        ];
        for (name, value) in named {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::invalid(format!("{name} must be >= 0, got {v}")));
                }
            }
        }
        Ok(())
    }

    /// Totals of the undiluted sample in mol/kg.
    ///
    /// Totals not given explicitly are estimated from salinity with the
    /// borate parameterization selected by `options`.
    pub fn totals(&self, options: &EquilibriumOptions) -> Result<Totals, AppError> {
        self.validate()?;
        let estimated = Totals::from_salinity(self.salinity, self.dic, options)?;
        Ok(Totals {
            dic: estimated.dic,
            borate: self.total_borate.map_or(estimated.borate, |v| v * MICRO),
            fluoride: self.total_fluoride.map_or(estimated.fluoride, |v| v * MICRO),
            sulfate: self.total_sulfate.map_or(estimated.sulfate, |v| v * MICRO),
        })
    }
}

/// Total concentrations (mol/kg) entering the alkalinity equation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub dic: f64,
    pub borate: f64,
    pub fluoride: f64,
    pub sulfate: f64,
}

impl Totals {
    /// Estimate conservative totals from salinity; `dic_umol_kg` is carried as-is.
    pub fn from_salinity(
        salinity: f64,
        dic_umol_kg: f64,
        options: &EquilibriumOptions,
    ) -> Result<Self, AppError> {
        Ok(Self {
            dic: dic_umol_kg * MICRO,
            borate: chemistry::total_borate(salinity, options.opt_total_borate)?,
            fluoride: chemistry::total_fluoride(salinity),
            sulfate: chemistry::total_sulfate(salinity),
        })
    }

    /// Scale every total by `factor` (dilution without additions).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dic: self.dic * factor,
            borate: self.borate * factor,
            fluoride: self.fluoride * factor,
            sulfate: self.sulfate * factor,
        }
    }

    pub(crate) fn ensure_non_negative(&self) -> Result<(), AppError> {
        let named = [
            ("dic", self.dic),
            ("borate", self.borate),
            ("fluoride", self.fluoride),
            ("sulfate", self.sulfate),
        ];
        for (name, v) in named {
            if !v.is_finite() || v < 0.0 {
                return Err(AppError::invalid(format!(
                    "total {name} became {v}; inputs are chemically inconsistent"
                )));
            }
        }
        Ok(())
    }
}

/// Titration hardware and reagent parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TitrationParameters {
    pub titrant: Titrant,
    /// mol/kg
    pub titrant_molinity: f64,
    /// Alkalinity equivalents per mole of titrant; the titrant's own value when absent.
    pub alkalinity_factor: Option<f64>,
    /// kg
    pub analyte_mass: f64,
    /// mV
    pub emf0: f64,
}

impl Default for TitrationParameters {
    fn default() -> Self {
        Self {
            titrant: Titrant::H2so4,
            titrant_molinity: 0.15,
            alkalinity_factor: None,
            analyte_mass: 0.2,
            emf0: 300.0,
        }
    }
}

impl TitrationParameters {
    pub fn factor(&self) -> f64 {
        self.alkalinity_factor
            .unwrap_or_else(|| self.titrant.alkalinity_factor())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let named = [
            ("titrant_molinity", self.titrant_molinity),
            ("analyte_mass", self.analyte_mass),
            ("alkalinity_factor", self.factor()),
        ];
        for (name, v) in named {
            if !v.is_finite() || v <= 0.0 {
                return Err(AppError::invalid(format!("{name} must be > 0, got {v}")));
            }
        }
        if !self.emf0.is_finite() {
            return Err(AppError::invalid("emf0 must be finite"));
        }
        Ok(())
    }
}

/// One recorded titration step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TitrationPoint {
    /// Cumulative titrant mass, kg.
    pub titrant_mass: f64,
    /// mV
    pub emf: f64,
    /// °C
    pub temperature: f64,
}

/// A simulated titration point together with the chemistry that produced it.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SimulatedPoint {
    pub point: TitrationPoint,
    /// Titration alkalinity at this point, mol/kg (negative past equivalence).
    pub alkalinity: f64,
    /// Diluted (and for sulfate, augmented) totals, mol/kg.
    pub totals: Totals,
    pub ph_free: f64,
}

/// Equilibrium constant parameterization choices.
///
/// Codes follow the CO2SYS option numbering.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumOptions {
    /// 10 = Lueker et al. (2000), 16 = Sulpis et al. (2020).
    pub opt_k_carbonic: u8,
    /// 1 = Uppström (1974), 2 = Lee et al. (2010).
    pub opt_total_borate: u8,
}

impl Default for EquilibriumOptions {
    fn default() -> Self {
        Self {
            opt_k_carbonic: 16,
            opt_total_borate: 1,
        }
    }
}

/// Settings for the EMF least-squares fit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Free-scale pH window of the points used in the final fit.
    pub ph_min: f64,
    pub ph_max: f64,
    pub max_iterations: usize,
    /// Relative step size below which the fit counts as converged.
    pub step_tolerance: f64,
    /// Initial Levenberg-Marquardt damping.
    pub damping: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            ph_min: 3.0,
            ph_max: 4.0,
            max_iterations: 200,
            step_tolerance: 1e-15,
            damping: 1e-3,
        }
    }
}
