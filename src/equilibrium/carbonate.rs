use std::f64::consts::LN_10;

use tracing::trace;

use super::EquilibriumEngine;
use crate::chemistry::constants::{EquilibriumConstants, free_scale_constants};
use crate::error::AppError;
use crate::models::{EquilibriumOptions, SeawaterSample, Totals};

const PH_LOWEST: f64 = 0.0;
const PH_HIGHEST: f64 = 14.0;
const PH_START: f64 = 8.0;
const MAX_ITER: usize = 100;
/// Relative convergence threshold on ln[H+].
const LN_H_TOL: f64 = 1e-15;

/// Total alkalinity (mol/kg) on the free scale at hydrogen ion concentration `h`.
///
/// `TA = HCO3 + 2 CO3 + B(OH)4 + OH - H - HSO4 - HF`
pub fn alkalinity_from_h(h: f64, totals: &Totals, k: &EquilibriumConstants) -> f64 {
    let denom = h * h + k.k1 * h + k.k1 * k.k2;
    let carbonate = totals.dic * (k.k1 * h + 2.0 * k.k1 * k.k2) / denom;
    let borate = totals.borate * k.kb / (k.kb + h);
    let hydroxide = k.kw / h;
    let bisulfate = totals.sulfate * h / (h + k.ks);
    let hf = totals.fluoride * h / (h + k.kf);
    carbonate + borate + hydroxide - h - bisulfate - hf
}

/// d(TA)/d[H+]; strictly negative for non-negative totals.
pub fn alkalinity_slope(h: f64, totals: &Totals, k: &EquilibriumConstants) -> f64 {
    let denom = h * h + k.k1 * h + k.k1 * k.k2;
    let carbonate = -totals.dic * (k.k1 * h * h + 4.0 * k.k1 * k.k2 * h + k.k1 * k.k1 * k.k2)
        / (denom * denom);
    let borate = -totals.borate * k.kb / ((k.kb + h) * (k.kb + h));
    let hydroxide = -k.kw / (h * h);
    let bisulfate = -totals.sulfate * k.ks / ((h + k.ks) * (h + k.ks));
    let hf = -totals.fluoride * k.kf / ((h + k.kf) * (h + k.kf));
    carbonate + borate + hydroxide - 1.0 + bisulfate + hf
}

/// Default engine: carbonate, borate, water, bisulfate and fluoride
/// equilibria with CO2SYS-style constant options.
#[derive(Clone, Debug, Default)]
pub struct CarbonateEngine {
    pub options: EquilibriumOptions,
}

impl CarbonateEngine {
    pub fn new(options: EquilibriumOptions) -> Self {
        Self { options }
    }
}

impl EquilibriumEngine for CarbonateEngine {
    fn sample_totals(&self, sample: &SeawaterSample) -> Result<Totals, AppError> {
        sample.totals(&self.options)
    }

    fn constants(
        &self,
        temperature: f64,
        salinity: f64,
        totals: &Totals,
    ) -> Result<EquilibriumConstants, AppError> {
        free_scale_constants(
            temperature,
            salinity,
            totals.sulfate,
            self.options.opt_k_carbonic,
        )
    }

    fn alkalinity_from_dic_ph(
        &self,
        ph_free: f64,
        totals: &Totals,
        constants: &EquilibriumConstants,
    ) -> Result<f64, AppError> {
        if !ph_free.is_finite() {
            return Err(AppError::invalid(format!("pH must be finite, got {ph_free}")));
        }
        Ok(alkalinity_from_h(10f64.powf(-ph_free), totals, constants))
    }

    /// Safeguarded Newton iteration on x = ln[H+], bracketed between pH 0 and 14.
    fn ph_from_alkalinity_dic(
        &self,
        alkalinity: f64,
        totals: &Totals,
        constants: &EquilibriumConstants,
    ) -> Result<f64, AppError> {
        if !alkalinity.is_finite() {
            return Err(AppError::invalid(format!(
                "alkalinity must be finite, got {alkalinity}"
            )));
        }
        let residual = |x: f64| alkalinity_from_h(x.exp(), totals, constants) - alkalinity;

        // TA decreases with [H+]: positive residual means the root lies at higher x.
        let mut lo = -PH_HIGHEST * LN_10;
        let mut hi = -PH_LOWEST * LN_10;
        if residual(lo) < 0.0 || residual(hi) > 0.0 {
            return Err(AppError::invalid(format!(
                "alkalinity {alkalinity} mol/kg has no solution between pH {PH_LOWEST} and {PH_HIGHEST}"
            )));
        }

        let mut x = -PH_START * LN_10;
        for iteration in 0..MAX_ITER {
            let h = x.exp();
            let f = alkalinity_from_h(h, totals, constants) - alkalinity;
            if f == 0.0 {
                return Ok(-x / LN_10);
            }
            if f > 0.0 {
                lo = lo.max(x);
            } else {
                hi = hi.min(x);
            }
            let mut next = x - f / (alkalinity_slope(h, totals, constants) * h);
            if !(next > lo && next < hi) {
                next = 0.5 * (lo + hi);
            }
            if (next - x).abs() <= LN_H_TOL * x.abs().max(1.0) {
                trace!(iteration, ph = -next / LN_10, "pH solve converged");
                return Ok(-next / LN_10);
            }
            x = next;
        }
        Err(AppError::NumericDivergence {
            what: "pH from alkalinity and DIC".to_string(),
            iterations: MAX_ITER,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seawater() -> (Totals, EquilibriumConstants) {
        let totals = Totals::from_salinity(35.0, 2000.0, &EquilibriumOptions::default()).unwrap();
        let k = free_scale_constants(25.0, 35.0, totals.sulfate, 16).unwrap();
        (totals, k)
    }

    #[test]
    fn ph_solve_inverts_alkalinity() {
        let (totals, k) = seawater();
        let engine = CarbonateEngine::default();
        for ph in [8.1, 6.5, 4.2, 3.1] {
            let ta = engine.alkalinity_from_dic_ph(ph, &totals, &k).unwrap();
            let back = engine.ph_from_alkalinity_dic(ta, &totals, &k).unwrap();
            assert_relative_eq!(back, ph, epsilon = 1e-12);
        }
    }

    #[test]
    fn typical_seawater_alkalinity() {
        let (totals, k) = seawater();
        let ta = CarbonateEngine::default()
            .alkalinity_from_dic_ph(8.1, &totals, &k)
            .unwrap();
        assert!((2.1e-3..2.5e-3).contains(&ta), "TA {ta}");
    }

    #[test]
    fn slope_matches_finite_difference() {
        let (totals, k) = seawater();
        let h = 3.0e-6;
        let dh = h * 1e-6;
        let numeric = (alkalinity_from_h(h + dh, &totals, &k)
            - alkalinity_from_h(h - dh, &totals, &k))
            / (2.0 * dh);
        assert_relative_eq!(alkalinity_slope(h, &totals, &k), numeric, max_relative = 1e-6);
    }
}
