//! Titrant acids and how they change the analyte's totals.
//!
//! Every analyte-referenced total is diluted by the titrant mass; an acid
//! that carries one of the tracked species (sulfuric acid brings sulfate)
//! additionally contributes its own amount. The contribution is supplied by
//! an [`AcidSpecies`] strategy so [`Titrant::dilute_totals`] stays the same
//! for every acid.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chemistry::dilution_factor;
use crate::models::Totals;

pub trait AcidSpecies {
    fn formula(&self) -> &'static str;

    /// Moles of alkalinity neutralized per mole of acid.
    fn alkalinity_factor(&self) -> f64;

    /// Totals (mol/kg of mixture) delivered by `titrant_mass` kg of acid at
    /// `titrant_molinity` into a mixture of `mixture_mass` kg.
    fn delivered_totals(&self, titrant_molinity: f64, titrant_mass: f64, mixture_mass: f64)
    -> Totals;
}

/// Hydrochloric acid: adds no tracked species.
pub struct Hydrochloric;

/// Sulfuric acid: every mole adds one mole of total sulfate.
pub struct Sulfuric;

const NOTHING: Totals = Totals {
    dic: 0.0,
    borate: 0.0,
    fluoride: 0.0,
    sulfate: 0.0,
};

impl AcidSpecies for Hydrochloric {
    fn formula(&self) -> &'static str {
        "HCl"
    }

    fn alkalinity_factor(&self) -> f64 {
        1.0
    }

    fn delivered_totals(&self, _: f64, _: f64, _: f64) -> Totals {
        NOTHING
    }
}

impl AcidSpecies for Sulfuric {
    fn formula(&self) -> &'static str {
        "H2SO4"
    }

    fn alkalinity_factor(&self) -> f64 {
        2.0
    }

    fn delivered_totals(
        &self,
        titrant_molinity: f64,
        titrant_mass: f64,
        mixture_mass: f64,
    ) -> Totals {
        Totals {
            sulfate: titrant_molinity * titrant_mass / mixture_mass,
            ..NOTHING
        }
    }
}

/// Tag selecting the titrant acid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Titrant {
    #[serde(rename = "HCl", alias = "hcl")]
    Hcl,
    #[serde(rename = "H2SO4", alias = "h2so4")]
    H2so4,
}

impl Titrant {
    pub fn species(self) -> &'static dyn AcidSpecies {
        match self {
            Self::Hcl => &Hydrochloric,
            Self::H2so4 => &Sulfuric,
        }
    }

    pub fn alkalinity_factor(self) -> f64 {
        self.species().alkalinity_factor()
    }

    /// Analyte totals after `titrant_mass` kg of titrant have been added.
    pub fn dilute_totals(
        self,
        totals: &Totals,
        titrant_molinity: f64,
        titrant_mass: f64,
        analyte_mass: f64,
    ) -> Totals {
        let diluted = totals.scaled(dilution_factor(analyte_mass, titrant_mass));
        let delivered = self.species().delivered_totals(
            titrant_molinity,
            titrant_mass,
            analyte_mass + titrant_mass,
        );
        Totals {
            dic: diluted.dic + delivered.dic,
            borate: diluted.borate + delivered.borate,
            fluoride: diluted.fluoride + delivered.fluoride,
            sulfate: diluted.sulfate + delivered.sulfate,
        }
    }
}

impl fmt::Display for Titrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.species().formula())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: Totals = Totals {
        dic: 2.0e-3,
        borate: 4.2e-4,
        fluoride: 6.8e-5,
        sulfate: 2.8e-2,
    };

    #[test]
    fn hydrochloric_only_dilutes() {
        let out = Titrant::Hcl.dilute_totals(&SAMPLE, 0.1, 0.002, 0.198);
        assert_relative_eq!(out.sulfate, SAMPLE.sulfate * 0.99, max_relative = 1e-14);
        assert_relative_eq!(out.dic, SAMPLE.dic * 0.99, max_relative = 1e-14);
    }

    #[test]
    fn sulfuric_adds_sulfate_as_mass_weighted_mix() {
        let (c, mt, ma) = (0.15, 0.0025, 0.2);
        let out = Titrant::H2so4.dilute_totals(&SAMPLE, c, mt, ma);
        let expected = (SAMPLE.sulfate * ma + c * mt) / (ma + mt);
        assert_relative_eq!(out.sulfate, expected, max_relative = 1e-14);
        assert_relative_eq!(out.borate, SAMPLE.borate * ma / (ma + mt), max_relative = 1e-14);
    }

    #[test]
    fn tags_parse_from_table_spelling() {
        let t: Titrant = serde_json::from_str("\"H2SO4\"").unwrap();
        assert_eq!(t, Titrant::H2so4);
        assert_eq!(Titrant::Hcl.to_string(), "HCl");
        assert_eq!(Titrant::H2so4.alkalinity_factor(), 2.0);
    }
}
