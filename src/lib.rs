pub mod adapters;
pub mod chemistry;
pub mod equilibrium;
pub mod error;
pub mod io;
pub mod models;
pub mod titration;

pub use crate::chemistry::constants::EquilibriumConstants;
pub use crate::equilibrium::{CarbonateEngine, EquilibriumEngine};
pub use crate::error::AppError;
pub use crate::models::{
    EquilibriumOptions, SeawaterSample, SimulatedPoint, SolverOptions, TitrationParameters,
    TitrationPoint, Totals,
};
pub use crate::titration::simulate::{
    Simulation, simulate, simulate_isothermal, titrant_mass_sweep,
};
pub use crate::titration::solver::{EmfLeastSquares, FitInput, FitResult, TitrationFitter};
pub use crate::titration::titrant::{AcidSpecies, Titrant};
pub use crate::titration::validate::{RoundTripReport, Tolerance, check_recovery, round_trip};
