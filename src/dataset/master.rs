//! Master table: every run log stacked into one table with derived columns.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::dataset::runs::RunLog;
use crate::dataset::table::{Cell, Table};
use crate::utils::error::Result;
use crate::{
    EPOCH_COLUMN, HYBRID_FLAG_COLUMN, LOSS_COLUMN, LPC_COLUMN, MODEL_COLUMN, SOURCE_COLUMN,
    SUP_LOSS_COLUMN, TEST_ACC_COLUMN, UNSUP_LOSS_COLUMN,
};

/// Share of `test_acc` values that must lie in `[0, 1]` before the column is
/// treated as fractions and rescaled to percent
pub const DEFAULT_FRACTION_THRESHOLD: f64 = 0.8;

/// Best `test_acc` row of one run
#[derive(Debug, Clone, PartialEq)]
pub struct BestRow {
    pub model: String,
    pub lpc: u32,
    pub source: String,
    pub acc: f64,
    pub epoch: Option<f64>,
}

/// Merged view over all runs
#[derive(Debug, Clone, Default)]
pub struct MasterTable {
    table: Table,
}

/// `loss_x + loss_u`, an absent column counting as zero
fn reconstruct_loss(table: &Table) -> Vec<Cell> {
    let component = |row: usize, name: &str| -> Option<f64> {
        match table.get(row, name) {
            Some(cell) => cell.coerce_numeric().as_f64(),
            None => Some(0.0),
        }
    };

    (0..table.len())
        .map(|row| match (component(row, SUP_LOSS_COLUMN), component(row, UNSUP_LOSS_COLUMN)) {
            (Some(x), Some(u)) => Cell::number(x + u),
            _ => Cell::Missing,
        })
        .collect()
}

/// Attach run metadata and derived loss columns to one run's table
fn annotate(run: &RunLog) -> Result<Table> {
    let mut table = run.table.clone();
    let n = table.len();

    let model = run.model.clone().map(Cell::Text).unwrap_or(Cell::Missing);
    table.set_column(MODEL_COLUMN, vec![model; n])?;

    let lpc = run.lpc.map(|v| Cell::Number(v as f64)).unwrap_or(Cell::Missing);
    table.set_column(LPC_COLUMN, vec![lpc; n])?;

    if !table.has_column(LOSS_COLUMN)
        && (table.has_column(SUP_LOSS_COLUMN) || table.has_column(UNSUP_LOSS_COLUMN))
    {
        debug!("Reconstructing total loss for {:?}", run.source);
        let loss = reconstruct_loss(&table);
        table.push_column(LOSS_COLUMN, loss)?;
    }

    table.set_column(HYBRID_FLAG_COLUMN, vec![Cell::Bool(true); n])?;
    Ok(table)
}

/// Multiply `column` by 100 when more than `threshold` of its values lie in
/// `[0, 1]`. Columns holding any non-numeric value are left untouched.
/// Returns whether the column was rescaled.
pub fn rescale_fraction_column(table: &mut Table, column: &str, threshold: f64) -> bool {
    let values: Vec<&Cell> = match table.column(column) {
        Some(cells) => cells.filter(|c| !c.is_missing()).collect(),
        None => return false,
    };
    if values.is_empty() || values.iter().any(|c| c.as_f64().is_none()) {
        return false;
    }

    let in_unit = values
        .iter()
        .filter_map(|c| c.as_f64())
        .filter(|v| (0.0..=1.0).contains(v))
        .count();
    let share = in_unit as f64 / values.len() as f64;
    if share <= threshold {
        return false;
    }

    table.map_column(column, |cell| match cell {
        Cell::Number(v) => Cell::Number(v * 100.0),
        other => other.clone(),
    });
    true
}

/// Merge all runs into the master table.
pub fn build_master(records: &[RunLog], fraction_threshold: f64) -> Result<MasterTable> {
    if records.is_empty() {
        return Ok(MasterTable::default());
    }

    let tables = records.iter().map(annotate).collect::<Result<Vec<_>>>()?;
    let mut table = Table::concat(&tables);

    for column in [EPOCH_COLUMN, LPC_COLUMN] {
        table.map_column(column, Cell::coerce_numeric);
    }

    if rescale_fraction_column(&mut table, TEST_ACC_COLUMN, fraction_threshold) {
        info!("{} looks like fractions, rescaled to percent", TEST_ACC_COLUMN);
    }

    info!(
        "Master table: {} rows x {} columns from {} runs",
        table.len(),
        table.columns().len(),
        records.len()
    );
    Ok(MasterTable { table })
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl MasterTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.table.get(row, column).and_then(Cell::as_f64)
    }

    fn lpc_of(&self, row: usize) -> Option<u32> {
        self.number(row, LPC_COLUMN)
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    }

    fn model_of(&self, row: usize) -> Option<&str> {
        self.table.get(row, MODEL_COLUMN).and_then(Cell::as_str)
    }

    /// Distinct labels-per-class values, ascending
    pub fn lpcs(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = (0..self.len()).filter_map(|row| self.lpc_of(row)).collect();
        set.into_iter().collect()
    }

    /// Row indices whose `lpc` equals `lpc`
    pub fn rows_with_lpc(&self, lpc: u32) -> Vec<usize> {
        (0..self.len()).filter(|&row| self.lpc_of(row) == Some(lpc)).collect()
    }

    /// Split `rows` by model, sorted by model name. Rows without a model are dropped.
    pub fn group_by_model(&self, rows: &[usize]) -> BTreeMap<String, Vec<usize>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for &row in rows {
            if let Some(model) = self.model_of(row) {
                groups.entry(model.to_string()).or_default().push(row);
            }
        }
        groups
    }

    /// `(epoch, value)` pairs of `rows`, ordered by epoch. Rows missing either
    /// value are dropped; equal epochs keep row order.
    pub fn series(&self, rows: &[usize], column: &str) -> Vec<(f64, f64)> {
        let mut points: Vec<(f64, f64)> = rows
            .iter()
            .filter_map(|&row| Some((self.number(row, EPOCH_COLUMN)?, self.number(row, column)?)))
            .collect();
        points.sort_by(|a, b| cmp_f64(a.0, b.0));
        points
    }

    /// Mean of `column` per epoch over `rows`, ordered by epoch
    pub fn epoch_means(&self, rows: &[usize], column: &str) -> Vec<(f64, f64)> {
        let mut sums: Vec<(f64, f64, usize)> = Vec::new();
        for (epoch, value) in self.series(rows, column) {
            let same_epoch = sums.last().map_or(false, |last| last.0 == epoch);
            if !same_epoch {
                sums.push((epoch, 0.0, 0));
            }
            if let Some(last) = sums.last_mut() {
                last.1 += value;
                last.2 += 1;
            }
        }
        sums.into_iter()
            .map(|(epoch, sum, count)| (epoch, sum / count as f64))
            .collect()
    }

    /// Best `test_acc` row for every `(model, lpc, source)` run, ordered by
    /// those keys. Ties keep the earliest row.
    pub fn best_rows(&self) -> Vec<BestRow> {
        let mut best: BTreeMap<(String, u32, String), BestRow> = BTreeMap::new();

        for row in 0..self.len() {
            let (Some(model), Some(lpc), Some(source), Some(acc)) = (
                self.model_of(row),
                self.lpc_of(row),
                self.table.get(row, SOURCE_COLUMN).and_then(Cell::as_str),
                self.number(row, TEST_ACC_COLUMN),
            ) else {
                continue;
            };

            let key = (model.to_string(), lpc, source.to_string());
            let candidate = BestRow {
                model: key.0.clone(),
                lpc,
                source: key.2.clone(),
                acc,
                epoch: self.number(row, EPOCH_COLUMN),
            };
            let improves = best.get(&key).map_or(true, |current| acc > current.acc);
            if improves {
                best.insert(key, candidate);
            }
        }

        best.into_values().collect()
    }
}
