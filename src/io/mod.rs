//! File formats: `.dat` titration files and the dataset table.
pub mod dat;
pub mod table;

pub use dat::{DatRow, TitrantAmountUnit, WriteMode, read_dat, write_dat};
pub use table::{DatasetRow, read_table, write_table};
