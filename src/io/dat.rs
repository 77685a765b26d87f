//! `.dat` titration files.
//!
//! Layout: a title line, a tab-separated column header line, then one
//! tab-separated row per titration point with titrant amount, EMF (mV) and
//! temperature (°C), each printed with four decimals. The simulator writes
//! titrant amounts in grams.
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::TitrationPoint;

pub const DAT_TITLE: &str = "Titration data exported by alkalinity_rs";
pub const DAT_COLUMNS: &str = "titrant_amount\temf\ttemperature";
/// Lines before the first data row.
pub const DAT_HEADER_LINES: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or overwrite.
    #[default]
    Truncate,
    Append,
}

/// Unit of the titrant amount column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitrantAmountUnit {
    #[default]
    G,
    Kg,
}

impl TitrantAmountUnit {
    pub fn to_kg(self, amount: f64) -> f64 {
        match self {
            Self::G => amount * 1e-3,
            Self::Kg => amount,
        }
    }
}

/// One data row as stored, titrant amount in file units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatRow {
    pub titrant_amount: f64,
    pub emf: f64,
    pub temperature: f64,
}

impl DatRow {
    pub fn to_point(self, unit: TitrantAmountUnit) -> TitrationPoint {
        TitrationPoint {
            titrant_mass: unit.to_kg(self.titrant_amount),
            emf: self.emf,
            temperature: self.temperature,
        }
    }
}

/// Write titration points with titrant masses in grams.
///
/// Header lines are only written when the file starts out empty, so
/// [`WriteMode::Append`] extends an existing titration.
pub fn write_dat(path: &Path, points: &[TitrationPoint], mode: WriteMode) -> Result<(), AppError> {
    let write_err = |source| AppError::WriteFile {
        path: path.to_path_buf(),
        source,
    };
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(mode == WriteMode::Append)
        .truncate(mode == WriteMode::Truncate)
        .open(path)
        .map_err(write_err)?;
    let fresh = file.metadata().map_err(write_err)?.len() == 0;
    let mut out = BufWriter::new(file);

    if fresh {
        writeln!(out, "{DAT_TITLE}").map_err(write_err)?;
        writeln!(out, "{DAT_COLUMNS}").map_err(write_err)?;
    }
    for p in points {
        writeln!(
            out,
            "{:.4}\t{:.4}\t{:.4}",
            p.titrant_mass * 1e3,
            p.emf,
            p.temperature
        )
        .map_err(write_err)?;
    }
    out.flush().map_err(write_err)
}

/// Read every data row of a `.dat` file. Blank lines are skipped.
pub fn read_dat(path: &Path) -> Result<Vec<DatRow>, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |line: usize, message: String| AppError::ParseDat {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(DAT_HEADER_LINES) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<f64>()
                    .map_err(|e| malformed(line_no, format!("'{field}': {e}")))
            })
            .collect::<Result<Vec<f64>, AppError>>()?;
        match values[..] {
            [titrant_amount, emf, temperature] => rows.push(DatRow {
                titrant_amount,
                emf,
                temperature,
            }),
            _ => {
                return Err(malformed(
                    line_no,
                    format!("expected 3 columns, found {}", values.len()),
                ));
            }
        }
    }
    if rows.is_empty() {
        return Err(malformed(DAT_HEADER_LINES, "no data rows".to_string()));
    }
    Ok(rows)
}
