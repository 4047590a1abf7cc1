//! glucorisk: Diabetes risk training and inference
//!
//! Main entry point for the command-line tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glucorisk::adapters::FsArtifactStore;
use glucorisk::application::{open_artifact_dir, verify_artifacts};
use glucorisk::{InferenceService, PatientRecord, PipelineConfig, TrainingPipeline};

const LOG_FILE_ENV: &str = "GLUCORISK_LOG_FILE";

#[derive(Parser)]
#[command(name = "glucorisk")]
#[command(about = "Diabetes risk classification pipeline", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full training pipeline
    Train {
        /// Labelled CSV dataset
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact directory to write
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Score one patient record
    Predict {
        /// Patient record as a JSON object
        #[arg(short, long)]
        record: String,

        /// Artifact directory to read
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Check stored artifacts against the training manifest
    Verify {
        /// Artifact directory to read
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stdout unless a file is configured.
    let (writer, _guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(log_file) => {
            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                // Best-effort: open() below reports the real failure.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Cannot open log file {log_file}"))?;
            tracing_appender::non_blocking(file)
        }
        Err(_) => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    tracing::info!("Starting glucorisk...");

    let mut config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Train { data, artifacts } => {
            if let Some(data) = data {
                config.data_path = data;
            }
            if let Some(dir) = artifacts {
                config.artifacts_dir = dir;
            }
            let store = Arc::new(FsArtifactStore::new(&config.artifacts_dir)?);
            let outcome = TrainingPipeline::new(config, store).run()?;
            println!(
                "Trained on {} rows with {} features",
                outcome.n_rows, outcome.n_features
            );
            println!("{}", outcome.report);
        }
        Commands::Predict { record, artifacts } => {
            if let Some(dir) = artifacts {
                config.artifacts_dir = dir;
            }
            let record: PatientRecord =
                serde_json::from_str(&record).context("Invalid patient record JSON")?;
            let store = open_artifact_dir(&config.artifacts_dir)?;
            let service = InferenceService::load(&store, &config)?;
            let prediction = service.predict(&record)?;
            println!("{}", serde_json::to_string(&prediction)?);
        }
        Commands::Verify { artifacts } => {
            if let Some(dir) = artifacts {
                config.artifacts_dir = dir;
            }
            let store = open_artifact_dir(&config.artifacts_dir)?;
            let manifest = verify_artifacts(&store)?;
            println!(
                "{} artifacts verified (trained {})",
                manifest.files.len(),
                manifest.created_at
            );
        }
    }

    tracing::info!("glucorisk shutdown complete.");
    Ok(())
}
