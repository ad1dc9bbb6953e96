//! PdM Advisor - Main Entry Point

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use advisor::{
    init_logging, AdvisorConfig, AdvisorResult, ConsolePresenter, Pipeline, PipelineState,
};
use clap::Parser;
use inference_engine::{Classifier, OnnxClassifier, ThresholdClassifier};
use sensor_input::Prompter;
use storage::AuditStore;
use tracing::{info, warn};

/// Predictive-maintenance advisor CLI
#[derive(Parser)]
#[command(name = "pdm-advisor")]
#[command(about = "Classify a machine sensor reading and log the verdict", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PDM_CONFIG")]
    config: Option<String>,

    /// Audit database descriptor, e.g. sqlite://audit.db
    #[arg(long)]
    db: Option<String>,

    /// ONNX model file; threshold rules are used when absent
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(PipelineState::Done) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AdvisorResult<PipelineState> {
    let mut config = AdvisorConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(db) = cli.db {
        config.connection_strings.audit_db = Some(db);
    }
    if let Some(model) = cli.model {
        config.model.path = Some(model);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    init_logging(&config.logging)?;
    info!("=== PdM Advisor v{} ===", env!("CARGO_PKG_VERSION"));

    let store = AuditStore::new(config.audit_descriptor()?, config.storage.store_options())?;
    if config.storage.create_schema {
        if let Err(e) = store.ensure_schema().await {
            warn!("Audit schema bootstrap failed: {}", e);
        }
    }

    let classifier: Box<dyn Classifier> = match &config.model.path {
        Some(path) => {
            let model = OnnxClassifier::load(path)?;
            info!("Classifying with ONNX model {}", model.model_path().display());
            Box::new(model)
        }
        None => Box::new(ThresholdClassifier::new(config.model.thresholds.clone())?),
    };

    let pipeline = Pipeline::new(classifier, store);
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let color = !cli.no_color && io::stdout().is_terminal();
    let mut presenter = ConsolePresenter::new(io::stdout(), color);

    let report = pipeline.run(&mut prompter, &mut presenter).await;
    Ok(report.state)
}
