//! Predictive-Maintenance Advisor
//!
//! Collects one sensor reading from an operator, classifies its failure risk,
//! shows the verdict and records reading and verdict in the audit log.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod pipeline;
mod presenter;

pub use config::{
    AdvisorConfig, ConnectionStrings, LogConfig, ModelConfig, StorageConfig, DEFAULT_CONFIG_FILE,
    ENV_PREFIX,
};
pub use error::{AdvisorError, AdvisorResult};
pub use pipeline::{Pipeline, PipelineReport, PipelineState, Severity, StageFailure, Verdict};
pub use presenter::{ConsolePresenter, Presenter};

/// Initialize logging. Output goes to stderr so it never mixes with the
/// operator prompts on stdout.
pub fn init_logging(config: &LogConfig) -> AdvisorResult<()> {
    let level = Level::from_str(&config.level).map_err(|e| {
        AdvisorError::Logging(format!("invalid log level {:?}: {}", config.level, e))
    })?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| AdvisorError::Logging(e.to_string()))
}
