//! SSL Report CLI
//!
//! Scans an experiments directory for FixMatch runs, merges their training
//! logs, and writes the master table, charts, and a summary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use ssl_report::utils::format_number;
use ssl_report::utils::logging::{init_logging, LogConfig, LogLevel};
use ssl_report::{generate_report, ReportConfig};

/// Aggregate semi-supervised training logs and render comparison charts
#[derive(Parser, Debug)]
#[command(name = "ssl_report")]
#[command(version)]
#[command(about = "Aggregate FixMatch training logs into charts", long_about = None)]
struct Cli {
    /// Experiments directory to scan
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output directory (default: <root>/analysis)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML config file; command-line flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Budgets that get the loss breakdown charts, e.g. 1,400
    #[arg(long, value_delimiter = ',')]
    lpcs: Option<Vec<u32>>,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error); overrides --verbose/--quiet
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let mut log_config = if self.verbose {
            LogConfig::verbose()
        } else if self.quiet {
            LogConfig::quiet()
        } else {
            LogConfig::default()
        };
        if let Some(level) = &self.log_level {
            log_config.level = LogLevel::parse(level);
        }
        log_config
    }

    fn into_config(self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ReportConfig::default(),
        };

        if let Some(root) = self.root {
            config.root = root;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = Some(output_dir);
        }
        if let Some(lpcs) = self.lpcs {
            config.breakdown_lpcs = lpcs;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = init_logging(&cli.log_config());

    let config = cli.into_config()?;
    info!("Experiments root: {:?}", config.root);

    let outputs = generate_report(&config)
        .with_context(|| format!("Report generation failed for {}", config.root.display()))?;

    outputs.summary.print_table();

    println!();
    println!(
        "{} {} runs, {} rows, {} charts",
        "Done:".green().bold(),
        outputs.summary.runs,
        format_number(outputs.summary.rows),
        outputs.charts.len()
    );
    println!("  Master table: {}", outputs.master_csv.display());
    println!("  Summary:      {}", outputs.summary_json.display());
    println!("  Results in:   {}", outputs.output_dir.display().to_string().cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("report.toml");
        fs::write(
            &path,
            "root = \"from_file\"\noutput_dir = \"file_out\"\nbreakdown_lpcs = [25]\nfraction_threshold = 0.9\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = Cli::try_parse_from(["ssl_report"]).unwrap();
        assert_eq!(cli.into_config().unwrap(), ReportConfig::default());
    }

    #[test]
    fn test_config_file_values_are_used() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir);

        let cli = Cli::try_parse_from(["ssl_report", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.root, PathBuf::from("from_file"));
        assert_eq!(config.output_dir, Some(PathBuf::from("file_out")));
        assert_eq!(config.breakdown_lpcs, vec![25]);
        assert_eq!(config.fraction_threshold, 0.9);
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir);

        let cli = Cli::try_parse_from([
            "ssl_report",
            "--config",
            path.to_str().unwrap(),
            "--root",
            "from_flag",
            "--output-dir",
            "flag_out",
            "--lpcs",
            "1,400",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.root, PathBuf::from("from_flag"));
        assert_eq!(config.output_dir, Some(PathBuf::from("flag_out")));
        assert_eq!(config.breakdown_lpcs, vec![1, 400]);
        // Keys without a flag keep the file value
        assert_eq!(config.fraction_threshold, 0.9);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("none.toml");
        let cli = Cli::try_parse_from(["ssl_report", "-c", missing.to_str().unwrap()]).unwrap();
        assert!(cli.into_config().is_err());
    }

    #[test]
    fn test_log_level_flags() {
        let cli = Cli::try_parse_from(["ssl_report", "--quiet"]).unwrap();
        assert_eq!(cli.log_config().level, LogLevel::Error);

        let cli = Cli::try_parse_from(["ssl_report", "-v", "--log-level", "warn"]).unwrap();
        let log_config = cli.log_config();
        assert_eq!(log_config.level, LogLevel::Warn);
        assert!(log_config.include_target);

        assert!(Cli::try_parse_from(["ssl_report", "-v", "-q"]).is_err());
    }
}
