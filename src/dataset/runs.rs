//! Run discovery
//!
//! Finds FixMatch run directories below an experiments root, reads each
//! run's training log, and attaches the metadata encoded in the directory
//! name (model identity and labels-per-class budget).
//!
//! Expected layout (nesting depth is arbitrary):
//! ```text
//! experiments/
//! ├── FixMatch_4_labels_per_class/
//! │   └── training_logs.csv
//! ├── sweep_b/
//! │   └── FixMatch_400_labels_per_class_ResNet34/
//! │       └── training_logs.csv
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::dataset::table::{Cell, Table};
use crate::utils::error::{ReportError, Result};
use crate::{EPOCH_COLUMN, SOURCE_COLUMN};

const RUN_DIR_PREFIX: &str = "FixMatch_";
const RUN_DIR_MARKER: &str = "_labels_per_class";

fn model_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^FixMatch_\d+_labels_per_class(?:_(.+))?$").expect("valid model pattern")
    })
}

fn lpc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^FixMatch_(\d+)_labels_per_class(?:_.*)?$").expect("valid lpc pattern")
    })
}

/// One discovered run: its log table plus name-derived metadata
#[derive(Debug, Clone)]
pub struct RunLog {
    /// Path of the training log file
    pub source: PathBuf,
    /// `fixmatch` or `fixmatch_<backbone>`
    pub model: Option<String>,
    /// Labels per class
    pub lpc: Option<u32>,
    /// Log contents, with `epoch` and `__source__` guaranteed present
    pub table: Table,
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// Model identity from a run directory name.
///
/// `FixMatch_25_labels_per_class_ResNet34` gives `fixmatch_resnet34`,
/// `FixMatch_25_labels_per_class` gives `fixmatch`.
pub fn infer_model(path: &Path) -> Option<String> {
    let caps = model_pattern().captures(dir_name(path)?)?;
    match caps.get(1) {
        Some(backbone) => Some(format!("fixmatch_{}", backbone.as_str().to_lowercase())),
        None => Some("fixmatch".to_string()),
    }
}

/// Labels-per-class budget from a run directory name
pub fn infer_lpc(path: &Path) -> Option<u32> {
    let caps = lpc_pattern().captures(dir_name(path)?)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Whether a directory name matches `FixMatch_*_labels_per_class*`
pub fn is_run_dir_name(name: &str) -> bool {
    name.strip_prefix(RUN_DIR_PREFIX)
        .map(|rest| rest.contains(RUN_DIR_MARKER))
        .unwrap_or(false)
}

/// Load one run directory. `Ok(None)` means the run is skipped: no log file
/// or a log without data rows.
pub fn load_run(dir: &Path, log_file_name: &str) -> Result<Option<RunLog>> {
    let log_path = dir.join(log_file_name);
    if !log_path.is_file() {
        debug!("No {} in {:?}, skipping", log_file_name, dir);
        return Ok(None);
    }

    let mut table = Table::from_csv_path(&log_path)?;
    if table.is_empty() {
        debug!("Empty log {:?}, skipping", log_path);
        return Ok(None);
    }

    if !table.has_column(EPOCH_COLUMN) {
        let epochs = (0..table.len()).map(|i| Cell::Number(i as f64)).collect();
        table.insert_column(0, EPOCH_COLUMN, epochs)?;
    }

    let source = log_path.display().to_string();
    let sources = vec![Cell::Text(source); table.len()];
    table.set_column(SOURCE_COLUMN, sources)?;

    Ok(Some(RunLog {
        model: infer_model(dir),
        lpc: infer_lpc(dir),
        source: log_path,
        table,
    }))
}

/// Recursively scan `root` for run directories and load their logs.
///
/// Unreadable logs are logged and skipped. Runs are returned in path order.
pub fn scan_experiments(root: &Path, log_file_name: &str) -> Result<Vec<RunLog>> {
    let root = fs::canonicalize(root).map_err(|_| ReportError::PathNotFound(root.to_path_buf()))?;

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {:?}: {}", root, e);
                continue;
            }
        };
        // Linked run directories count, but the walk does not descend through links
        if entry.path().is_dir() && entry.file_name().to_str().map(is_run_dir_name).unwrap_or(false) {
            dirs.push(entry.into_path());
        }
    }
    dirs.sort();
    debug!("Found {} candidate run directories", dirs.len());

    let mut records = Vec::new();
    for dir in &dirs {
        match load_run(dir, log_file_name) {
            Ok(Some(run)) => {
                debug!(
                    "Loaded {:?}: model={:?} lpc={:?} rows={}",
                    run.source,
                    run.model,
                    run.lpc,
                    run.table.len()
                );
                records.push(run);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read {:?}: {}", dir.join(log_file_name), e),
        }
    }

    info!("Loaded {} runs from {:?}", records.len(), root);
    Ok(records)
}
