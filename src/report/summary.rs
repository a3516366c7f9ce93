//! Best-accuracy summary: JSON on disk plus a console table.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::dataset::MasterTable;
use crate::utils::error::Result;

/// Best accuracy reached by one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAccuracy {
    pub model: String,
    pub lpc: u32,
    /// Training log the value came from
    pub source: String,
    /// Best test accuracy, in percent
    pub best_acc: f64,
    pub best_epoch: Option<f64>,
}

/// Everything `summary.json` records about one report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Local>,
    /// Number of runs merged
    pub runs: usize,
    /// Rows in the master table
    pub rows: usize,
    pub columns: Vec<String>,
    pub finals: Vec<FinalAccuracy>,
}

/// Best accuracy per run, ordered by model then budget
pub fn final_accuracies(master: &MasterTable) -> Vec<FinalAccuracy> {
    master
        .best_rows()
        .into_iter()
        .map(|row| FinalAccuracy {
            model: row.model,
            lpc: row.lpc,
            source: row.source,
            best_acc: row.acc,
            best_epoch: row.epoch,
        })
        .collect()
}

impl RunSummary {
    pub fn new(master: &MasterTable, runs: usize) -> Self {
        Self {
            generated_at: Local::now(),
            runs,
            rows: master.len(),
            columns: master.table().columns().to_vec(),
            finals: final_accuracies(master),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Print the finals as an aligned console table
    pub fn print_table(&self) {
        if self.finals.is_empty() {
            println!("{}", "No accuracy values found.".yellow());
            return;
        }

        let width = self
            .finals
            .iter()
            .map(|f| f.model.len())
            .max()
            .unwrap_or(0)
            .max("Model".len());

        println!();
        println!(
            "{}",
            format!("{:<width$}  {:>6}  {:>9}  {:>6}", "Model", "LPC", "Best acc", "Epoch", width = width).bold()
        );
        println!("{}", "-".repeat(width + 31));
        for f in &self.finals {
            let epoch = f
                .best_epoch
                .map(|e| format!("{}", e))
                .unwrap_or_else(|| "-".to_string());
            let model = format!("{:<width$}", f.model, width = width);
            println!("{}  {:>6}  {:>8.2}%  {:>6}", model.cyan(), f.lpc, f.best_acc, epoch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::dataset::{build_master, Cell, RunLog, Table, DEFAULT_FRACTION_THRESHOLD};
    use crate::SOURCE_COLUMN;

    fn master() -> MasterTable {
        let mut table = Table::from_reader("epoch,test_acc\n0,0.41\n1,0.52\n2,0.5\n".as_bytes()).unwrap();
        let n = table.len();
        table
            .set_column(SOURCE_COLUMN, vec![Cell::Text("x/training_logs.csv".to_string()); n])
            .unwrap();
        let runs = vec![RunLog {
            source: PathBuf::from("x/training_logs.csv"),
            model: Some("fixmatch".to_string()),
            lpc: Some(4),
            table,
        }];
        build_master(&runs, DEFAULT_FRACTION_THRESHOLD).unwrap()
    }

    #[test]
    fn test_final_accuracies() {
        let finals = final_accuracies(&master());
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].model, "fixmatch");
        assert_eq!(finals[0].best_acc, 52.0);
        assert_eq!(finals[0].best_epoch, Some(1.0));
    }

    #[test]
    fn test_summary_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.json");

        let summary = RunSummary::new(&master(), 1);
        summary.save(&path).unwrap();
        let loaded = RunSummary::load(&path).unwrap();

        assert_eq!(loaded.runs, 1);
        assert_eq!(loaded.rows, 3);
        assert_eq!(loaded.finals, summary.finals);
        assert!(loaded.columns.contains(&"is_hybrid_loss".to_string()));
    }
}
