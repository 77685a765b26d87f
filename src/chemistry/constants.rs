//! Stoichiometric equilibrium constants of seawater.
//!
//! Carbonic acid, boric acid and water constants are published on the total
//! pH scale and are moved to the free scale with the bisulfate constant and
//! the total sulfate of the solution being modelled. Bisulfate and hydrogen
//! fluoride constants are free-scale already.
#![allow(clippy::excessive_precision)]

use serde::Serialize;

use super::kelvin;
use crate::error::AppError;

/// Free-scale equilibrium constants (mol/kg) at one temperature/composition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EquilibriumConstants {
    pub k1: f64,
    pub k2: f64,
    pub kb: f64,
    pub kw: f64,
    /// HSO4- dissociation.
    pub ks: f64,
    /// HF dissociation.
    pub kf: f64,
}

/// pK1, pK2 on the total scale, Lueker et al. (2000).
fn pk_carbonic_lueker(t_k: f64, s: f64) -> (f64, f64) {
    let ln_t = t_k.ln();
    let pk1 = 3633.86 / t_k - 61.2172 + 9.6777 * ln_t - 0.011_555 * s + 0.000_115_2 * s * s;
    let pk2 = 471.78 / t_k + 25.929 - 3.169_67 * ln_t - 0.017_81 * s + 0.000_112_2 * s * s;
    (pk1, pk2)
}

/// pK1, pK2 on the total scale, Sulpis et al. (2020).
fn pk_carbonic_sulpis(t_k: f64, s: f64) -> (f64, f64) {
    let ln_t = t_k.ln();
    let pk1 = 8510.63 / t_k - 172.4493 + 26.329_96 * ln_t - 0.011_555 * s + 0.000_115_2 * s * s;
    let pk2 = 4226.23 / t_k - 59.4636 + 9.608_17 * ln_t - 0.017_81 * s + 0.000_112_2 * s * s;
    (pk1, pk2)
}

/// Boric acid, total scale, Dickson (1990).
fn kb_dickson(t_k: f64, s: f64) -> f64 {
    let sq = s.sqrt();
    ((-8966.90 - 2890.53 * sq - 77.942 * s + 1.728 * s * sq - 0.0996 * s * s) / t_k
        + 148.0248
        + 137.1942 * sq
        + 1.621_42 * s
        - (24.4344 + 25.085 * sq + 0.2474 * s) * t_k.ln()
        + 0.053_105 * sq * t_k)
        .exp()
}

/// Water, total scale, Millero (1995).
fn kw_millero(t_k: f64, s: f64) -> f64 {
    let ln_t = t_k.ln();
    (148.9802 - 13_847.26 / t_k - 23.6521 * ln_t
        + (-5.977 + 118.67 / t_k + 1.0495 * ln_t) * s.sqrt()
        - 0.016_15 * s)
        .exp()
}

/// Bisulfate, free scale, Dickson (1990).
fn ks_dickson(t_k: f64, s: f64) -> f64 {
    let ionic = 19.924 * s / (1000.0 - 1.005 * s);
    let ln_t = t_k.ln();
    (-4276.1 / t_k + 141.328 - 23.093 * ln_t
        + (-13_856.0 / t_k + 324.57 - 47.986 * ln_t) * ionic.sqrt()
        + (35_474.0 / t_k - 771.54 + 114.723 * ln_t) * ionic
        - 2698.0 / t_k * ionic.powf(1.5)
        + 1776.0 / t_k * ionic * ionic
        + (1.0 - 0.001_005 * s).ln())
    .exp()
}

/// Hydrogen fluoride, free scale, Perez & Fraga (1987).
fn kf_perez_fraga(t_k: f64, s: f64) -> f64 {
    (874.0 / t_k - 9.68 + 0.111 * s.sqrt()).exp()
}

/// Free-scale constants for the given conditions.
///
/// `total_sulfate` (mol/kg) sets the total-to-free scale conversion and must
/// be the sulfate of the solution the constants are used for, which changes
/// along a sulfuric acid titration.
pub fn free_scale_constants(
    temperature: f64,
    salinity: f64,
    total_sulfate: f64,
    opt_k_carbonic: u8,
) -> Result<EquilibriumConstants, AppError> {
    let t_k = kelvin(temperature);
    let (pk1, pk2) = match opt_k_carbonic {
        10 => pk_carbonic_lueker(t_k, salinity),
        16 => pk_carbonic_sulpis(t_k, salinity),
        other => {
            return Err(AppError::invalid(format!(
                "unsupported opt_k_carbonic {other} (expected 10 or 16)"
            )));
        }
    };
    let ks = ks_dickson(t_k, salinity);
    let kf = kf_perez_fraga(t_k, salinity);
    let total_to_free = 1.0 / (1.0 + total_sulfate / ks);

    let constants = EquilibriumConstants {
        k1: 10f64.powf(-pk1) * total_to_free,
        k2: 10f64.powf(-pk2) * total_to_free,
        kb: kb_dickson(t_k, salinity) * total_to_free,
        kw: kw_millero(t_k, salinity) * total_to_free,
        ks,
        kf,
    };
    let all = [
        constants.k1,
        constants.k2,
        constants.kb,
        constants.kw,
        constants.ks,
        constants.kf,
    ];
    if all.iter().any(|k| !k.is_finite() || *k <= 0.0) {
        return Err(AppError::invalid(format!(
            "equilibrium constants undefined at T={temperature} °C, S={salinity}"
        )));
    }
    Ok(constants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carbonic_constants_are_in_the_seawater_range() {
        let k = free_scale_constants(25.0, 35.0, 0.028_235, 16).unwrap();
        let pk1 = -k.k1.log10();
        let pk2 = -k.k2.log10();
        assert!((5.8..6.1).contains(&pk1), "pK1 {pk1}");
        assert!((8.8..9.2).contains(&pk2), "pK2 {pk2}");
    }

    #[test]
    fn more_sulfate_lowers_free_scale_constants() {
        let low = free_scale_constants(25.0, 35.0, 0.028, 10).unwrap();
        let high = free_scale_constants(25.0, 35.0, 0.035, 10).unwrap();
        assert!(high.k1 < low.k1);
        assert_eq!(high.ks, low.ks);
    }

    #[test]
    fn rejects_unknown_option() {
        assert!(free_scale_constants(25.0, 35.0, 0.028, 3).is_err());
    }
}
