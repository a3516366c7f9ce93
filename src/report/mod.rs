//! Report generation: scan, merge, derive, plot.
//!
//! [`generate_report`] runs the whole pipeline for one [`ReportConfig`] and
//! returns the files it produced.

pub mod plots;
pub mod summary;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::ReportConfig;
use crate::dataset::{build_master, scan_experiments};
use crate::utils::error::Result;
use crate::utils::format_duration;

pub use plots::{
    plot_final_acc_vs_lpc, plot_hybrid_by_epoch_accuracy, plot_hybrid_by_epoch_losses,
    plot_loss_curves_by_lpc,
};
pub use summary::{final_accuracies, FinalAccuracy, RunSummary};

/// Master table file name inside the output directory
pub const MASTER_CSV_NAME: &str = "master_metrics.csv";
/// Summary file name inside the output directory
pub const SUMMARY_JSON_NAME: &str = "summary.json";

/// Files written by one report run
#[derive(Debug, Clone)]
pub struct ReportOutputs {
    pub output_dir: PathBuf,
    pub master_csv: PathBuf,
    pub summary_json: PathBuf,
    pub charts: Vec<PathBuf>,
    pub summary: RunSummary,
}

/// Run the full pipeline
pub fn generate_report(config: &ReportConfig) -> Result<ReportOutputs> {
    config.validate()?;
    let start = Instant::now();

    info!("Scanning {:?} ...", config.root);
    let records = scan_experiments(&config.root, &config.log_file_name)?;

    // Created only once the root is known to exist, since it defaults to a child of it
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)?;

    info!("Building master table from {} runs ...", records.len());
    let master = build_master(&records, config.fraction_threshold)?;
    let master_csv = output_dir.join(MASTER_CSV_NAME);
    master.table().to_csv_path(&master_csv)?;

    info!("Rendering charts ...");
    let mut charts = Vec::new();
    charts.extend(plot_loss_curves_by_lpc(&master, &output_dir)?);
    charts.extend(plot_final_acc_vs_lpc(&master, &output_dir, &config.lpc_ticks)?);
    charts.extend(plot_hybrid_by_epoch_losses(&master, &output_dir, &config.breakdown_lpcs)?);
    charts.extend(plot_hybrid_by_epoch_accuracy(&master, &output_dir)?);

    let summary = RunSummary::new(&master, records.len());
    let summary_json = output_dir.join(SUMMARY_JSON_NAME);
    summary.save(&summary_json)?;

    info!(
        "Wrote {} charts to {:?} in {}",
        charts.len(),
        output_dir,
        format_duration(start.elapsed().as_secs_f64())
    );

    Ok(ReportOutputs {
        output_dir,
        master_csv,
        summary_json,
        charts,
        summary,
    })
}
