//! # SSL Report
//!
//! Aggregates the per-run training logs written by FixMatch semi-supervised
//! experiments into one master table and renders comparison charts.
//!
//! ## Modules
//!
//! - `dataset`: Run discovery, CSV tables, and the merged master table
//! - `report`: The chart set, best-accuracy summary, and the end-to-end pipeline
//! - `config`: TOML-backed report configuration
//! - `utils`: Logging, SVG charts, and error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ssl_report::{generate_report, ReportConfig};
//!
//! let outputs = generate_report(&ReportConfig::default())?;
//! println!("{} charts in {:?}", outputs.charts.len(), outputs.output_dir);
//! # Ok::<(), ssl_report::ReportError>(())
//! ```

pub mod config;
pub mod dataset;
pub mod report;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::ReportConfig;
pub use dataset::{build_master, scan_experiments, Cell, MasterTable, RunLog, Table};
pub use report::{generate_report, ReportOutputs, RunSummary};
pub use utils::error::{ReportError, Result};

/// Training log file expected in every run directory
pub const LOG_FILE_NAME: &str = "training_logs.csv";

/// Column names shared by the training logs and the master table
pub const EPOCH_COLUMN: &str = "epoch";
pub const SOURCE_COLUMN: &str = "__source__";
pub const MODEL_COLUMN: &str = "model";
pub const LPC_COLUMN: &str = "lpc";
pub const LOSS_COLUMN: &str = "loss";
pub const SUP_LOSS_COLUMN: &str = "loss_x";
pub const UNSUP_LOSS_COLUMN: &str = "loss_u";
pub const TEST_LOSS_COLUMN: &str = "test_loss";
pub const TEST_ACC_COLUMN: &str = "test_acc";
pub const HYBRID_FLAG_COLUMN: &str = "is_hybrid_loss";

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
