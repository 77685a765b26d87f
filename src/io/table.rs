//! Dataset table: one row per titration file, named columns, CSV on disk.
//!
//! Tables are read and written wholesale. There is no row index column;
//! empty cells are `None`. Floats are written in shortest round-trip form,
//! so values survive a write/read cycle unchanged.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::dat::TitrantAmountUnit;
use crate::error::AppError;
use crate::titration::titrant::Titrant;

fn default_titrant() -> Titrant {
    Titrant::Hcl
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub file_name: String,
    /// Directory of the `.dat` file, relative to the table's directory.
    #[serde(default)]
    pub file_path: Option<String>,
    pub salinity: f64,
    /// kg
    #[serde(default)]
    pub analyte_mass: Option<f64>,
    /// mL; converted to mass with the seawater density when no mass is given.
    #[serde(default)]
    pub analyte_volume: Option<f64>,
    /// mol/kg
    pub titrant_molinity: f64,
    #[serde(default)]
    pub titrant_amount_unit: TitrantAmountUnit,
    #[serde(default = "default_titrant")]
    pub titrant: Titrant,
    /// µmol/kg
    #[serde(default)]
    pub dic: Option<f64>,
    #[serde(default)]
    pub opt_k_carbonic: Option<u8>,
    #[serde(default)]
    pub opt_total_borate: Option<u8>,
    /// Fitted alkalinity, µmol/kg.
    #[serde(default)]
    pub alkalinity: Option<f64>,
    /// Fitted electrode offset, mV.
    #[serde(default)]
    pub emf0: Option<f64>,
}

impl DatasetRow {
    /// Location of the row's `.dat` file.
    pub fn dat_path(&self, table_dir: &Path) -> PathBuf {
        let mut path = table_dir.to_path_buf();
        if let Some(dir) = &self.file_path {
            path.push(dir);
        }
        path.push(&self.file_name);
        path
    }
}

pub fn read_table(path: &Path) -> Result<Vec<DatasetRow>, AppError> {
    let table_err = |source| AppError::Table {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(table_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<DatasetRow>, csv::Error>>()
        .map_err(table_err)
}

pub fn write_table(path: &Path, rows: &[DatasetRow]) -> Result<(), AppError> {
    let table_err = |source| AppError::Table {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(table_err)?;
    for row in rows {
        writer.serialize(row).map_err(table_err)?;
    }
    writer
        .flush()
        .map_err(|source| AppError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
}
