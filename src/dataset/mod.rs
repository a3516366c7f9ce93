//! Dataset module: run discovery, log tables, and the merged master table
//!
//! - `table`: heterogeneous CSV tables
//! - `runs`: finding FixMatch run directories and reading their logs
//! - `master`: merging runs and computing derived columns

pub mod master;
pub mod runs;
pub mod table;

pub use master::{build_master, BestRow, MasterTable, DEFAULT_FRACTION_THRESHOLD};
pub use runs::{infer_lpc, infer_model, scan_experiments, RunLog};
pub use table::{Cell, Table};
