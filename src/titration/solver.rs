//! Fitting alkalinity and electrode offset to an EMF titration.
//!
//! The default [`EmfLeastSquares`] fitter works in two stages:
//!
//! 1. A Gran plot past the equivalence point gives first estimates of the
//!    equivalence titrant mass (hence alkalinity) and of EMF0.
//! 2. Points whose Gran pH falls inside the configured window are fitted by
//!    Levenberg-Marquardt. For a trial EMF0 every point's [H+] is known, so
//!    the full alkalinity equation back-calculates the sample alkalinity that
//!    point implies; the residual is that estimate minus the trial alkalinity.
//!
//! Residuals are in µmol/kg so both parameters are of comparable magnitude.
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use serde::Serialize;
use tracing::debug;

use crate::chemistry::constants::EquilibriumConstants;
use crate::chemistry::{MICRO, emf_to_h, emf_to_ph, nernst_factor};
use crate::equilibrium::carbonate::{alkalinity_from_h, alkalinity_slope};
use crate::error::AppError;
use crate::models::{SolverOptions, TitrationPoint, Totals};

/// Gran points lie strictly between these fractions of the largest Gran value.
const GRAN_LOWER: f64 = 0.1;
const GRAN_UPPER: f64 = 0.9;

/// Everything a fitter needs about one titration.
///
/// `totals` and `constants` are per point and must already account for the
/// dilution by the titrant.
#[derive(Clone, Copy, Debug)]
pub struct FitInput<'a> {
    /// mol/kg
    pub titrant_molinity: f64,
    pub alkalinity_factor: f64,
    /// kg
    pub analyte_mass: f64,
    pub points: &'a [TitrationPoint],
    pub totals: &'a [Totals],
    pub constants: &'a [EquilibriumConstants],
}

#[derive(Clone, Debug, Serialize)]
pub struct GranEstimate {
    /// µmol/kg
    pub alkalinity: f64,
    /// mV
    pub emf0: f64,
    /// Equivalence titrant mass, kg.
    pub equivalence_mass: f64,
    pub points_used: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct FitResult {
    /// Fitted parameters: `[alkalinity µmol/kg, emf0 mV]`.
    pub x: [f64; 2],
    pub iterations: usize,
    /// Root-mean-square residual, µmol/kg.
    pub rms_residual: f64,
    /// Indices of the points used in the least-squares stage.
    pub points_used: Vec<usize>,
    pub gran: GranEstimate,
}

impl FitResult {
    pub fn alkalinity(&self) -> f64 {
        self.x[0]
    }

    pub fn emf0(&self) -> f64 {
        self.x[1]
    }
}

pub trait TitrationFitter {
    fn fit(&self, input: &FitInput<'_>) -> Result<FitResult, AppError>;
}

#[derive(Clone, Debug, Default)]
pub struct EmfLeastSquares {
    pub options: SolverOptions,
}

impl EmfLeastSquares {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

fn check_input(input: &FitInput<'_>) -> Result<(), AppError> {
    let n = input.points.len();
    if input.totals.len() != n || input.constants.len() != n {
        return Err(AppError::invalid(format!(
            "{n} points but {} totals and {} constant sets",
            input.totals.len(),
            input.constants.len()
        )));
    }
    let named = [
        ("titrant_molinity", input.titrant_molinity),
        ("alkalinity_factor", input.alkalinity_factor),
        ("analyte_mass", input.analyte_mass),
    ];
    for (name, v) in named {
        if !v.is_finite() || v <= 0.0 {
            return Err(AppError::invalid(format!("{name} must be > 0, got {v}")));
        }
    }
    Ok(())
}

/// Gran estimate of alkalinity and EMF0.
///
/// The Gran function `(m_a + m_t) * exp(EMF / k)` grows linearly with
/// titrant mass once strong acid is in excess; its x-intercept is the
/// equivalence mass.
pub fn gran_estimate(input: &FitInput<'_>) -> Result<GranEstimate, AppError> {
    check_input(input)?;
    let ma = input.analyte_mass;
    let acid = input.titrant_molinity * input.alkalinity_factor;

    let gran: Vec<f64> = input
        .points
        .iter()
        .map(|p| (ma + p.titrant_mass) * (p.emf / nernst_factor(p.temperature)).exp())
        .collect();
    let g_max = gran.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let used: Vec<usize> = (0..gran.len())
        .filter(|&i| gran[i] > GRAN_LOWER * g_max && gran[i] < GRAN_UPPER * g_max)
        .collect();
    if used.len() < 2 {
        return Err(AppError::invalid(format!(
            "only {} points in the Gran region; the titration must run past the equivalence point",
            used.len()
        )));
    }

    // Regress on grams to keep the design matrix well scaled.
    let x = DMatrix::from_fn(used.len(), 2, |r, c| {
        if c == 0 {
            1.0
        } else {
            input.points[used[r]].titrant_mass * 1e3
        }
    });
    let y = DVector::from_iterator(used.len(), used.iter().map(|&i| gran[i]));
    let beta = x
        .svd(true, true)
        .solve(&y, 1e-12)
        .map_err(|e| AppError::invalid(format!("Gran regression failed: {e}")))?;
    let (intercept, slope) = (beta[0], beta[1]);
    if !(slope > 0.0) {
        return Err(AppError::invalid(
            "Gran function does not increase with titrant mass",
        ));
    }
    let equivalence_mass = -intercept / slope * 1e-3;

    let offsets: Vec<f64> = used
        .iter()
        .map(|&i| &input.points[i])
        .filter(|p| p.titrant_mass > equivalence_mass)
        .map(|p| {
            let excess = (p.titrant_mass - equivalence_mass) * acid / (ma + p.titrant_mass);
            p.emf - nernst_factor(p.temperature) * excess.ln()
        })
        .collect();
    if offsets.is_empty() {
        return Err(AppError::invalid(
            "no Gran points beyond the estimated equivalence mass",
        ));
    }
    let emf0 = offsets.iter().sum::<f64>() / offsets.len() as f64;

    Ok(GranEstimate {
        alkalinity: acid * equivalence_mass / ma / MICRO,
        emf0,
        equivalence_mass,
        points_used: used.len(),
    })
}

/// Sample alkalinity (µmol/kg) implied by point `i` for a trial EMF0, and
/// its derivative with respect to EMF0.
fn implied_alkalinity(input: &FitInput<'_>, i: usize, emf0: f64) -> (f64, f64) {
    let p = &input.points[i];
    let ma = input.analyte_mass;
    let mixture = ma + p.titrant_mass;
    let h = emf_to_h(p.emf, emf0, p.temperature);
    let ta = alkalinity_from_h(h, &input.totals[i], &input.constants[i]);
    let dh_demf0 = -h / nernst_factor(p.temperature);
    let dta = alkalinity_slope(h, &input.totals[i], &input.constants[i]) * dh_demf0;
    let acid = input.alkalinity_factor * input.titrant_molinity * p.titrant_mass;
    (
        (acid + mixture * ta) / ma / MICRO,
        mixture * dta / ma / MICRO,
    )
}

fn cost(input: &FitInput<'_>, used: &[usize], x: &Vector2<f64>) -> f64 {
    used.iter()
        .map(|&i| {
            let r = implied_alkalinity(input, i, x[1]).0 - x[0];
            r * r
        })
        .sum()
}

impl TitrationFitter for EmfLeastSquares {
    fn fit(&self, input: &FitInput<'_>) -> Result<FitResult, AppError> {
        let opts = &self.options;
        let gran = gran_estimate(input)?;

        let used: Vec<usize> = (0..input.points.len())
            .filter(|&i| {
                let p = &input.points[i];
                let ph = emf_to_ph(p.emf, gran.emf0, p.temperature);
                ph >= opts.ph_min && ph <= opts.ph_max
            })
            .collect();
        if used.len() < 2 {
            return Err(AppError::invalid(format!(
                "only {} points between pH {} and {}; need at least 2",
                used.len(),
                opts.ph_min,
                opts.ph_max
            )));
        }

        let mut x = Vector2::new(gran.alkalinity, gran.emf0);
        let mut current = cost(input, &used, &x);
        let mut damping = opts.damping;

        for iteration in 1..=opts.max_iterations {
            let mut jtj = Matrix2::zeros();
            let mut jtr = Vector2::zeros();
            for &i in &used {
                let (estimate, d_emf0) = implied_alkalinity(input, i, x[1]);
                let row = Vector2::new(-1.0, d_emf0);
                jtj += row * row.transpose();
                jtr += row * (estimate - x[0]);
            }
            let mut lhs = jtj;
            lhs[(0, 0)] *= 1.0 + damping;
            lhs[(1, 1)] *= 1.0 + damping;
            let step = lhs.lu().solve(&(-jtr)).ok_or_else(|| AppError::NumericDivergence {
                what: "EMF least-squares (singular normal equations)".to_string(),
                iterations: iteration,
            })?;

            let candidate = x + step;
            let candidate_cost = cost(input, &used, &candidate);
            if candidate_cost <= current {
                x = candidate;
                current = candidate_cost;
                damping /= 10.0;
                let converged = step
                    .iter()
                    .zip(x.iter())
                    .all(|(d, v)| d.abs() <= opts.step_tolerance * v.abs().max(1.0));
                debug!(
                    iteration,
                    alkalinity = x[0],
                    emf0 = x[1],
                    cost = current,
                    "least-squares step accepted"
                );
                if converged {
                    return Ok(FitResult {
                        x: [x[0], x[1]],
                        iterations: iteration,
                        rms_residual: (current / used.len() as f64).sqrt(),
                        points_used: used,
                        gran,
                    });
                }
            } else {
                damping *= 10.0;
            }
        }

        Err(AppError::NumericDivergence {
            what: "EMF least-squares fit".to_string(),
            iterations: opts.max_iterations,
        })
    }
}
