//! Carbonate equilibrium engine seam.
//!
//! The simulator only needs two capabilities from an equilibrium engine:
//! solving for alkalinity when DIC and pH are known, and solving for pH when
//! alkalinity and DIC are known. Both work on one point's totals and
//! constants, so dilution stays the caller's business.
pub mod carbonate;

use crate::chemistry::constants::EquilibriumConstants;
use crate::error::AppError;
use crate::models::{SeawaterSample, Totals};

pub use carbonate::CarbonateEngine;

pub trait EquilibriumEngine {
    /// Totals (mol/kg) of an undiluted sample.
    fn sample_totals(&self, sample: &SeawaterSample) -> Result<Totals, AppError>;

    /// Free-scale constants for a solution with the given totals.
    fn constants(
        &self,
        temperature: f64,
        salinity: f64,
        totals: &Totals,
    ) -> Result<EquilibriumConstants, AppError>;

    /// Total alkalinity (mol/kg) from `totals.dic` and free-scale pH.
    fn alkalinity_from_dic_ph(
        &self,
        ph_free: f64,
        totals: &Totals,
        constants: &EquilibriumConstants,
    ) -> Result<f64, AppError>;

    /// Free-scale pH from total alkalinity (mol/kg) and `totals.dic`.
    fn ph_from_alkalinity_dic(
        &self,
        alkalinity: f64,
        totals: &Totals,
        constants: &EquilibriumConstants,
    ) -> Result<f64, AppError>;
}
