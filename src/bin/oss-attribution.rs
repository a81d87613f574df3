//! CLI tool for generating third-party attribution reports

use anyhow::Context;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use oss_attribution::{
    aggregate_licenses, prepare_license_infos, write_report, AttributionConfig,
    InstalledTreeReader,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "oss-attribution")]
#[command(
    about = "Calculate the npm modules used in this project and generate a third-party attribution (credits) text.",
    long_about = None
)]
#[command(version)]
#[command(after_help = "Examples:
  oss-attribution -o ./tpn
      write text and backing json to ./tpn
  oss-attribution -b ./some/path/to/projectDir
      scan the npm project in another directory
  oss-attribution -o tpn -b ./a -b ./b
      scan two projects and write the output to ./tpn")]
struct Cli {
    /// Output directory for attribution files [default: ./oss-attribution]
    #[arg(short = 'o', long = "output-dir", visible_alias = "outputDir")]
    output_dir: Option<PathBuf>,

    /// Base directory(ies) to scan for dependencies [default: current directory]
    #[arg(short = 'b', long = "base-dir", visible_alias = "baseDir", num_args = 1..)]
    base_dirs: Vec<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Maximum number of dependencies resolved at once [default: CPU count]
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Also attribute development dependencies of the scanned projects
    #[arg(long)]
    include_dev: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load config: {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Collecting licenses...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let started = Instant::now();
    let result = aggregate_licenses(&config, Arc::new(InstalledTreeReader)).await;

    spinner.finish_and_clear();
    info!("Total Processing: {:.2?}", started.elapsed());

    let resolved = match result {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("{} Failed to collect licenses: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let infos = match prepare_license_infos(&config, resolved).await {
        Ok(infos) => infos,
        Err(e) => {
            eprintln!("{} Failed to process overrides: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let summary = match write_report(&config, &infos).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!(
                "{} Failed to write attribution file: {}",
                "Error:".red().bold(),
                e
            );
            process::exit(1);
        }
    };

    println!(
        "Generated attribution for {} packages",
        summary.package_count
    );
    println!(
        "{} wrote {}",
        "Success:".green().bold(),
        summary.attribution_path.display()
    );
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file first, then command-line flags on top
fn build_config(cli: &Cli) -> anyhow::Result<AttributionConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AttributionConfig::default(),
    };

    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if !cli.base_dirs.is_empty() {
        config.base_dirs = cli.base_dirs.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if cli.include_dev {
        config.production_only = false;
    }

    let config = config.resolved()?;
    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> anyhow::Result<AttributionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: AttributionConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}
