//! The fixed chart set rendered from the master table.
//!
//! Every function writes SVG files into `outdir` and returns the paths it
//! wrote, in the order written.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::dataset::MasterTable;
use crate::utils::charts::{DataPoint, DataSeries, LineChart, Tick, XScale};
use crate::utils::error::Result;
use crate::{LOSS_COLUMN, SUP_LOSS_COLUMN, TEST_ACC_COLUMN, TEST_LOSS_COLUMN, UNSUP_LOSS_COLUMN};

const EPOCH_LABEL: &str = "Epoch";

fn to_points(pairs: Vec<(f64, f64)>) -> Vec<DataPoint> {
    pairs.into_iter().map(|(x, y)| DataPoint::new(x, y)).collect()
}

/// One series per model over `rows`, built by `values`
fn model_series<F>(master: &MasterTable, rows: &[usize], values: F) -> Vec<DataSeries>
where
    F: Fn(&[usize]) -> Vec<(f64, f64)>,
{
    master
        .group_by_model(rows)
        .into_iter()
        .map(|(model, model_rows)| DataSeries::new(model, to_points(values(&model_rows))))
        .collect()
}

fn save(chart: &LineChart, path: PathBuf) -> Result<PathBuf> {
    chart.save(&path)?;
    debug!("Wrote {:?}", path);
    Ok(path)
}

/// Test loss per epoch, one chart per labels-per-class budget
pub fn plot_loss_curves_by_lpc(master: &MasterTable, outdir: &Path) -> Result<Vec<PathBuf>> {
    if !master.has_column(TEST_LOSS_COLUMN) {
        warn!("No {} column, skipping loss curves", TEST_LOSS_COLUMN);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for lpc in master.lpcs() {
        let rows = master.rows_with_lpc(lpc);
        let series = model_series(master, &rows, |r| master.series(r, TEST_LOSS_COLUMN));

        let chart = LineChart::new(
            format!("Test curves ({} labels/class)", lpc),
            EPOCH_LABEL,
            "Test loss",
        )
        .with_series(series);
        paths.push(save(&chart, outdir.join(format!("loss_curves_by_lpc_{}.svg", lpc)))?);
    }
    Ok(paths)
}

/// Best test accuracy of every run against its labels-per-class budget,
/// on a log-scaled budget axis. `None` when no run has an accuracy value.
pub fn plot_final_acc_vs_lpc(
    master: &MasterTable,
    outdir: &Path,
    lpc_ticks: &[u32],
) -> Result<Option<PathBuf>> {
    let finals = master.best_rows();
    if finals.is_empty() {
        warn!("No {} values, skipping accuracy-vs-budget chart", TEST_ACC_COLUMN);
        return Ok(None);
    }

    let mut series: Vec<DataSeries> = Vec::new();
    for row in finals {
        let point = DataPoint::new(row.lpc as f64, row.acc);
        match series.iter_mut().find(|s| s.name == row.model) {
            Some(s) => s.points.push(point),
            None => series.push(DataSeries::new(row.model, vec![point])),
        }
    }
    for s in &mut series {
        s.points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    let ticks = lpc_ticks
        .iter()
        .map(|&v| Tick {
            value: v as f64,
            label: v.to_string(),
        })
        .collect();

    let chart = LineChart::new(
        "Best test accuracy vs. labeled data",
        "Labels per class (log scale)",
        "Best test acc (%)",
    )
    .with_series(series)
    .with_x_scale(XScale::Log10)
    .with_x_ticks(ticks)
    .with_markers(true);

    save(&chart, outdir.join("final_acc_vs_lpc.svg")).map(Some)
}

/// Unsupervised, supervised and total loss per epoch (mean over runs of a
/// model) for each budget in `lpcs`. Budgets with no rows are skipped.
pub fn plot_hybrid_by_epoch_losses(
    master: &MasterTable,
    outdir: &Path,
    lpcs: &[u32],
) -> Result<Vec<PathBuf>> {
    let breakdown = [
        (UNSUP_LOSS_COLUMN, "hybrid_unsup_loss_by_epoch", "loss_u", "loss_u per epoch"),
        (SUP_LOSS_COLUMN, "hybrid_sup_loss_by_epoch", "loss_x", "loss_x per epoch"),
        (LOSS_COLUMN, "hybrid_total_loss_by_epoch", "loss (total)", "Total loss per epoch"),
    ];

    let mut made = Vec::new();
    for &lpc in lpcs {
        let rows = master.rows_with_lpc(lpc);
        if rows.is_empty() {
            debug!("No rows with lpc={}, skipping loss breakdown", lpc);
            continue;
        }

        for (column, stem, y_label, title) in breakdown {
            if !master.has_column(column) {
                warn!("No {} column, skipping {}_{}", column, stem, lpc);
                continue;
            }
            let series = model_series(master, &rows, |r| master.epoch_means(r, column));
            let chart = LineChart::new(format!("{} ({} labels/class)", title, lpc), EPOCH_LABEL, y_label)
                .with_series(series);
            made.push(save(&chart, outdir.join(format!("{}_{}.svg", stem, lpc)))?);
        }
    }
    Ok(made)
}

/// Test accuracy per epoch, one chart per budget
pub fn plot_hybrid_by_epoch_accuracy(master: &MasterTable, outdir: &Path) -> Result<Vec<PathBuf>> {
    if !master.has_column(TEST_ACC_COLUMN) {
        warn!("No {} column, skipping accuracy curves", TEST_ACC_COLUMN);
        return Ok(Vec::new());
    }

    let mut made = Vec::new();
    for lpc in master.lpcs() {
        let rows = master.rows_with_lpc(lpc);
        let series = model_series(master, &rows, |r| master.series(r, TEST_ACC_COLUMN));
        let chart = LineChart::new(
            format!("Test accuracy per epoch ({} labels/class)", lpc),
            EPOCH_LABEL,
            "Test accuracy (%)",
        )
        .with_series(series);
        made.push(save(&chart, outdir.join(format!("hybrid_accuracy_by_epoch_{}.svg", lpc)))?);
    }
    Ok(made)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::dataset::{build_master, Cell, RunLog, Table, DEFAULT_FRACTION_THRESHOLD};
    use crate::SOURCE_COLUMN;

    fn run(model: &str, lpc: u32, source: &str, csv: &str) -> RunLog {
        let mut table = Table::from_reader(csv.as_bytes()).unwrap();
        let n = table.len();
        table
            .set_column(SOURCE_COLUMN, vec![Cell::Text(source.to_string()); n])
            .unwrap();
        RunLog {
            source: PathBuf::from(source),
            model: Some(model.to_string()),
            lpc: Some(lpc),
            table,
        }
    }

    fn master() -> MasterTable {
        let runs = vec![
            run("fixmatch", 1, "a.csv", "epoch,loss_x,loss_u,test_loss,test_acc\n0,1.0,0.5,2.0,0.2\n1,0.8,0.4,1.5,0.3\n"),
            run("fixmatch_resnet34", 1, "b.csv", "epoch,loss_x,loss_u,test_loss,test_acc\n0,0.9,0.6,1.9,0.25\n"),
            run("fixmatch", 25, "c.csv", "epoch,loss_x,loss_u,test_loss,test_acc\n0,0.4,0.2,0.9,0.6\n"),
        ];
        build_master(&runs, DEFAULT_FRACTION_THRESHOLD).unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_loss_curves_one_chart_per_lpc() {
        let temp_dir = TempDir::new().unwrap();
        let paths = plot_loss_curves_by_lpc(&master(), temp_dir.path()).unwrap();

        assert_eq!(names(&paths), vec!["loss_curves_by_lpc_1.svg", "loss_curves_by_lpc_25.svg"]);
        let svg = fs::read_to_string(&paths[0]).unwrap();
        assert!(svg.contains("fixmatch_resnet34"));
        assert!(svg.contains("1 labels/class"));
    }

    #[test]
    fn test_final_acc_chart() {
        let temp_dir = TempDir::new().unwrap();
        let path = plot_final_acc_vs_lpc(&master(), temp_dir.path(), &[1, 4, 25, 250, 400])
            .unwrap()
            .unwrap();

        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.contains("(log scale)"));
        assert!(svg.contains(">250<"));
        // 2 points for fixmatch + 1 for resnet34
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_final_acc_chart_skipped_without_accuracy() {
        let temp_dir = TempDir::new().unwrap();
        let runs = vec![run("fixmatch", 1, "a.csv", "epoch,test_loss\n0,1.0\n")];
        let master = build_master(&runs, DEFAULT_FRACTION_THRESHOLD).unwrap();

        assert!(plot_final_acc_vs_lpc(&master, temp_dir.path(), &[1]).unwrap().is_none());
        assert!(plot_hybrid_by_epoch_accuracy(&master, temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_loss_breakdown_only_for_requested_budgets() {
        let temp_dir = TempDir::new().unwrap();
        let paths = plot_hybrid_by_epoch_losses(&master(), temp_dir.path(), &[1, 400]).unwrap();

        assert_eq!(
            names(&paths),
            vec![
                "hybrid_unsup_loss_by_epoch_1.svg",
                "hybrid_sup_loss_by_epoch_1.svg",
                "hybrid_total_loss_by_epoch_1.svg",
            ]
        );
    }

    #[test]
    fn test_loss_breakdown_skips_absent_columns() {
        let temp_dir = TempDir::new().unwrap();
        let runs = vec![run("fixmatch", 1, "a.csv", "epoch,loss_u\n0,0.5\n")];
        let master = build_master(&runs, DEFAULT_FRACTION_THRESHOLD).unwrap();

        let paths = plot_hybrid_by_epoch_losses(&master, temp_dir.path(), &[1]).unwrap();
        // loss is reconstructed from loss_u alone, loss_x stays absent
        assert_eq!(
            names(&paths),
            vec!["hybrid_unsup_loss_by_epoch_1.svg", "hybrid_total_loss_by_epoch_1.svg"]
        );
    }

    #[test]
    fn test_accuracy_curves_are_percent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = plot_hybrid_by_epoch_accuracy(&master(), temp_dir.path()).unwrap();

        assert_eq!(
            names(&paths),
            vec!["hybrid_accuracy_by_epoch_1.svg", "hybrid_accuracy_by_epoch_25.svg"]
        );
        let svg = fs::read_to_string(&paths[1]).unwrap();
        assert!(svg.contains("Test accuracy (%)"));
    }
}
