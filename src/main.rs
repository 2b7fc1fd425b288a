//! DoF command line tool
//!
//! ## Usage
//!
//! ```bash
//! # Show dataset info and element count of an archive
//! dof inspect data.dof
//!
//! # Unpack an archive into the dataset directory
//! dof --dataset-dir ./dataset extract data.dof
//!
//! # Verify an already exploded dataset directory
//! dof --dataset-dir ./dataset check
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use dof::{Config, Dataset};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Labels and payloads are handled as untyped JSON values
type AnyDataset = Dataset<Value, Value>;

#[derive(Parser, Debug)]
#[command(name = "dof")]
#[command(about = "Pack and unpack DoF dataset archives")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "DOF_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset (exploded) directory
    #[arg(long, env = "DOF_DATASET_DIR")]
    dataset_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print dataset info and element count of an archive
    ///
    /// Opening an archive extracts it into the dataset directory.
    Inspect {
        archive: PathBuf,

        /// Also list every label
        #[arg(long)]
        labels: bool,
    },

    /// Extract an archive into the dataset directory
    Extract { archive: PathBuf },

    /// Check that the exploded dataset directory is complete
    Check,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dof=info".parse()?))
        .init();

    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(dof::config::default_config_path);
    let mut config = if config_path.is_file() {
        Config::load(&config_path)
            .with_context(|| format!("loading config {}", config_path.display()))?
    } else {
        Config::default()
    };
    if let Some(dir) = args.dataset_dir {
        config.dataset_dir = dir;
    }

    match args.command {
        Command::Inspect { archive, labels } => {
            let dataset = AnyDataset::read(&archive, &config)
                .with_context(|| format!("opening {}", archive.display()))?;
            if let Some(dataset_info) = dataset.info() {
                println!("{}", serde_json::to_string_pretty(dataset_info)?);
            }
            println!("elements: {}", dataset.len());
            if labels {
                for index in 0..dataset.len() {
                    println!("{}\t{}", index, dataset.label(index)?);
                }
            }
        }
        Command::Extract { archive } => {
            let dataset = AnyDataset::read(&archive, &config)
                .with_context(|| format!("extracting {}", archive.display()))?;
            info!(
                dir = %dataset.dataset_dir().display(),
                elements = dataset.len(),
                "Dataset ready"
            );
        }
        Command::Check => match AnyDataset::read_exploded(&config) {
            Ok(dataset) => {
                info!(elements = dataset.len(), "Dataset is complete");
            }
            Err(e) => {
                warn!(error = %e, "Dataset check failed");
                return Err(e.into());
            }
        },
    }

    Ok(())
}
