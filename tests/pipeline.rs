//! End-to-end report generation over a synthetic experiments tree.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use ssl_report::{generate_report, ReportConfig, ReportError, RunSummary, Table};

fn write_log(root: &Path, rel: &str, contents: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("training_logs.csv"), contents).unwrap();
}

fn experiments(root: &Path) {
    write_log(
        root,
        "cifar10/FixMatch_1_labels_per_class",
        "epoch,loss_x,loss_u,test_loss,test_acc\n0,2.0,0.1,2.2,0.12\n1,1.6,0.3,1.9,0.18\n2,1.2,0.4,1.7,0.21\n",
    );
    write_log(
        root,
        "cifar10/FixMatch_1_labels_per_class_ResNet34",
        "loss_x,loss_u,test_loss,test_acc\n1.9,0.2,2.1,0.15\n1.4,0.3,1.8,0.24\n",
    );
    write_log(
        root,
        "cifar10/FixMatch_400_labels_per_class",
        "epoch,loss,loss_x,loss_u,test_loss,test_acc\n0,1.0,0.6,0.4,0.9,0.71\n1,0.8,0.5,0.3,0.7,0.83\n",
    );
    write_log(root, "cifar10/FixMatch_25_labels_per_class", "epoch,test_acc\n");
    write_log(root, "cifar10/FixMatch_4_labels_per_class", "a,b\n1,2,3\n");
    fs::create_dir_all(root.join("cifar10/FixMatch_250_labels_per_class")).unwrap();
}

fn config_for(root: &Path) -> ReportConfig {
    ReportConfig {
        root: root.to_path_buf(),
        ..ReportConfig::default()
    }
}

#[test]
fn test_full_report() {
    let temp_dir = TempDir::new().unwrap();
    experiments(temp_dir.path());

    let outputs = generate_report(&config_for(temp_dir.path())).unwrap();
    let outdir = temp_dir.path().join("analysis");
    assert_eq!(outputs.output_dir, outdir);

    let mut names: Vec<String> = outputs
        .charts
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "final_acc_vs_lpc.svg",
            "hybrid_accuracy_by_epoch_1.svg",
            "hybrid_accuracy_by_epoch_400.svg",
            "hybrid_sup_loss_by_epoch_1.svg",
            "hybrid_sup_loss_by_epoch_400.svg",
            "hybrid_total_loss_by_epoch_1.svg",
            "hybrid_total_loss_by_epoch_400.svg",
            "hybrid_unsup_loss_by_epoch_1.svg",
            "hybrid_unsup_loss_by_epoch_400.svg",
            "loss_curves_by_lpc_1.svg",
            "loss_curves_by_lpc_400.svg",
        ]
    );
    for chart in &outputs.charts {
        assert!(chart.starts_with(&outdir));
        assert!(fs::read_to_string(chart).unwrap().starts_with("<svg"));
    }

    let master = Table::from_csv_path(&outputs.master_csv).unwrap();
    assert_eq!(master.len(), 7);
    for column in ["epoch", "model", "lpc", "loss", "is_hybrid_loss", "__source__"] {
        assert!(master.has_column(column), "missing column {}", column);
    }

    let summary = RunSummary::load(&outputs.summary_json).unwrap();
    assert_eq!(summary.runs, 3);
    assert_eq!(summary.finals.len(), 3);
    let resnet = summary
        .finals
        .iter()
        .find(|f| f.model == "fixmatch_resnet34")
        .unwrap();
    assert_eq!(resnet.lpc, 1);
    assert_eq!(resnet.best_acc, 24.0);
    assert_eq!(resnet.best_epoch, Some(1.0));
}

#[test]
fn test_custom_output_dir_and_breakdown() {
    let temp_dir = TempDir::new().unwrap();
    experiments(temp_dir.path());
    let outdir = temp_dir.path().join("report");

    let config = ReportConfig {
        output_dir: Some(outdir.clone()),
        breakdown_lpcs: vec![400],
        ..config_for(temp_dir.path())
    };
    let outputs = generate_report(&config).unwrap();

    assert!(outdir.join("master_metrics.csv").is_file());
    assert!(outdir.join("hybrid_total_loss_by_epoch_400.svg").is_file());
    assert!(!outdir.join("hybrid_total_loss_by_epoch_1.svg").exists());
    assert_eq!(outputs.charts.len(), 8);
}

#[test]
fn test_empty_experiments_tree() {
    let temp_dir = TempDir::new().unwrap();

    let outputs = generate_report(&config_for(temp_dir.path())).unwrap();
    assert!(outputs.charts.is_empty());
    assert_eq!(outputs.summary.runs, 0);
    assert_eq!(fs::read_to_string(&outputs.master_csv).unwrap(), "");
}

#[test]
fn test_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = ReportConfig {
        root: temp_dir.path().join("missing"),
        output_dir: Some(temp_dir.path().join("out")),
        ..ReportConfig::default()
    };
    assert!(generate_report(&config).is_err());
}

#[test]
fn test_missing_root_with_default_output_dir_is_not_created() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("typo_experiments");

    let err = generate_report(&config_for(&root)).unwrap_err();
    assert!(matches!(err, ReportError::PathNotFound(_)));
    assert!(!root.exists());
}
