//! Report configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! root = "runs/cifar10"
//! breakdown_lpcs = [1, 25, 400]
//! fraction_threshold = 0.9
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_FRACTION_THRESHOLD;
use crate::utils::error::{ReportError, Result};
use crate::LOG_FILE_NAME;

/// Name of the analysis directory created under the experiments root
pub const ANALYSIS_DIR_NAME: &str = "analysis";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory scanned for run directories
    pub root: PathBuf,
    /// Where charts and tables are written; `<root>/analysis` when unset
    pub output_dir: Option<PathBuf>,
    /// Training log file name inside each run directory
    pub log_file_name: String,
    /// Budgets that get the supervised/unsupervised/total loss breakdown
    pub breakdown_lpcs: Vec<u32>,
    /// Tick positions on the accuracy-vs-budget chart
    pub lpc_ticks: Vec<u32>,
    /// See [`crate::dataset::master::rescale_fraction_column`]
    pub fraction_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("experiments"),
            output_dir: None,
            log_file_name: LOG_FILE_NAME.to_string(),
            breakdown_lpcs: vec![1, 400],
            lpc_ticks: vec![1, 4, 25, 250, 400],
            fraction_threshold: DEFAULT_FRACTION_THRESHOLD,
        }
    }
}

impl ReportConfig {
    /// Load a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ReportError::Config(format!("Failed to read config {}: {e}", path.display())))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolved output directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.root.join(ANALYSIS_DIR_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_file_name.trim().is_empty() {
            return Err(ReportError::Config("log_file_name must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.fraction_threshold) {
            return Err(ReportError::Config(format!(
                "fraction_threshold must be within [0, 1], got {}",
                self.fraction_threshold
            )));
        }
        if self.lpc_ticks.contains(&0) {
            return Err(ReportError::Config(
                "lpc_ticks must be positive (log-scaled axis)".to_string(),
            ));
        }
        Ok(())
    }
}
