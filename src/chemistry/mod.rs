//! Chemistry module: physical constants, seawater totals and electrode conversions.
//!
//! This module provides:
//! - Physical constants for the Nernst relation (gas constant, Faraday constant)
//! - Total borate, fluoride and sulfate estimated from practical salinity
//! - Conversions between free-scale pH, hydrogen ion concentration and EMF
//! - The analyte dilution factor used at every titration point
//!
//! Units conventions:
//! - Totals returned here are mol/kg of seawater
//! - Public sample inputs are µmol/kg; multiply by [`MICRO`] to get mol/kg
//! - EMF and electrode offsets are mV, temperatures are °C
//!
//! The electrode model is `EMF = EMF0 + slope(T) * pH` with
//! `slope(T) = -ln(10) * R * T / F`, i.e. a negative slope of about
//! -59.16 mV per pH unit at 25 °C.
//!
//! # Examples
//! ```rust
//! use alkalinity_rs::chemistry::{emf_to_ph, ph_to_emf};
//!
//! let emf = ph_to_emf(8.1, 300.0, 25.0);
//! assert!((emf_to_ph(emf, 300.0, 25.0) - 8.1).abs() < 1e-12);
//! ```
//!
//! # See Also
//! - [`constants`] for the equilibrium constant parameterizations
pub mod constants;

use std::f64::consts::LN_10;

use crate::error::AppError;

/// Molar gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314_462_618;
/// Faraday constant, C/mol.
pub const FARADAY: f64 = 96_485.332_12;
/// 0 °C in kelvin.
pub const ZERO_CELSIUS: f64 = 273.15;
/// µmol/kg -> mol/kg.
pub const MICRO: f64 = 1e-6;

/// Molar mass of fluorine, g/mol.
pub const M_F: f64 = 18.998;
/// Molar mass of sulfate, g/mol.
pub const M_SO4: f64 = 96.062;
/// Chlorinity to practical salinity ratio (S = 1.80655 Cl).
pub const SALINITY_PER_CHLORINITY: f64 = 1.806_55;

/// Total borate per unit salinity (mol/kg at S = 35), Uppström (1974).
pub const BORATE_U74: f64 = 0.000_415_7;
/// Total borate per unit salinity (mol/kg at S = 35), Lee et al. (2010).
pub const BORATE_L10: f64 = 0.000_432_6;

pub fn kelvin(temperature: f64) -> f64 {
    temperature + ZERO_CELSIUS
}

/// Total borate (mol/kg) from practical salinity.
///
/// `opt_total_borate`: 1 = Uppström (1974), 2 = Lee et al. (2010).
pub fn total_borate(salinity: f64, opt_total_borate: u8) -> Result<f64, AppError> {
    let per_35 = match opt_total_borate {
        1 => BORATE_U74,
        2 => BORATE_L10,
        other => {
            return Err(AppError::invalid(format!(
                "unsupported opt_total_borate {other} (expected 1 or 2)"
            )));
        }
    };
    Ok(per_35 * salinity / 35.0)
}

/// Total fluoride (mol/kg), Riley (1965).
pub fn total_fluoride(salinity: f64) -> f64 {
    (0.000_067 / M_F) * (salinity / SALINITY_PER_CHLORINITY)
}

/// Total sulfate (mol/kg), Morris & Riley (1966).
pub fn total_sulfate(salinity: f64) -> f64 {
    (0.14 / M_SO4) * (salinity / SALINITY_PER_CHLORINITY)
}

/// `R·T/F` in mV.
pub fn nernst_factor(temperature: f64) -> f64 {
    1000.0 * GAS_CONSTANT * kelvin(temperature) / FARADAY
}

/// Electrode slope in mV per pH unit (negative).
pub fn nernst_slope(temperature: f64) -> f64 {
    -LN_10 * nernst_factor(temperature)
}

pub fn ph_to_emf(ph: f64, emf0: f64, temperature: f64) -> f64 {
    emf0 + nernst_slope(temperature) * ph
}

pub fn emf_to_ph(emf: f64, emf0: f64, temperature: f64) -> f64 {
    (emf - emf0) / nernst_slope(temperature)
}

/// Free hydrogen ion concentration (mol/kg) implied by an EMF reading.
pub fn emf_to_h(emf: f64, emf0: f64, temperature: f64) -> f64 {
    ((emf - emf0) / nernst_factor(temperature)).exp()
}

/// Fraction of the mixture mass that is original analyte.
pub fn dilution_factor(analyte_mass: f64, titrant_mass: f64) -> f64 {
    analyte_mass / (analyte_mass + titrant_mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slope_is_about_59_mv_at_25c() {
        assert_relative_eq!(nernst_slope(25.0), -59.159, epsilon = 1e-3);
    }

    #[test]
    fn emf_and_h_agree_with_ph() {
        let emf = ph_to_emf(3.5, 300.0, 20.0);
        let h = emf_to_h(emf, 300.0, 20.0);
        assert_relative_eq!(-h.log10(), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn seawater_totals_at_s35() {
        assert_relative_eq!(total_sulfate(35.0), 0.028_235, epsilon = 1e-5);
        assert_relative_eq!(total_fluoride(35.0), 6.832e-5, epsilon = 1e-7);
        assert_relative_eq!(total_borate(35.0, 1).unwrap(), 4.157e-4);
        assert!(total_borate(35.0, 7).is_err());
    }
}
