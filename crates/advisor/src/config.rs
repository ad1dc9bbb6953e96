//! Advisor configuration

use std::path::PathBuf;

use inference_engine::ThresholdConfig;
use serde::{Deserialize, Serialize};
use storage::StoreOptions;

use crate::error::AdvisorError;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "appsettings";

/// Prefix for environment overrides, e.g. `PDM_CONNECTION_STRINGS__AUDIT_DB`
pub const ENV_PREFIX: &str = "PDM";

/// Advisor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub connection_strings: ConnectionStrings,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub logging: LogConfig,
}

/// Store connection descriptors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionStrings {
    /// sqlx SQLite descriptor for the audit log, e.g. `sqlite://audit.db`
    pub audit_db: Option<String>,
}

/// Classifier selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX model file; the threshold rules are used when unset
    pub path: Option<PathBuf>,
    /// Limits for the threshold rules
    pub thresholds: ThresholdConfig,
}

/// Audit store behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Create the audit table at startup when missing
    pub create_schema: bool,
    /// Create the database file when missing
    pub create_if_missing: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            create_schema: true,
            create_if_missing: true,
        }
    }
}

impl StorageConfig {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            create_if_missing: self.create_if_missing,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from defaults, a settings file and `PDM_*`
    /// environment variables.
    ///
    /// An explicitly named file must exist; the default `appsettings` file
    /// is optional.
    pub fn load(path: Option<&str>) -> Result<Self, AdvisorError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&str>, env: config::Environment) -> Result<Self, AdvisorError> {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// The audit store descriptor; missing or blank is a configuration error
    pub fn audit_descriptor(&self) -> Result<&str, AdvisorError> {
        match self.connection_strings.audit_db.as_deref().map(str::trim) {
            Some(descriptor) if !descriptor.is_empty() => Ok(descriptor),
            _ => Err(AdvisorError::MissingConnectionString),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty_env() -> config::Environment {
        environment().source(Some(config::Map::new()))
    }

    fn write_settings(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("appsettings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert!(config.connection_strings.audit_db.is_none());
        assert!(config.model.path.is_none());
        assert!(config.storage.create_schema);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.model.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            &dir,
            r#"{
                "connection_strings": { "audit_db": "sqlite://plant.db" },
                "model": { "thresholds": { "temperature_max": 80.0 } },
                "storage": { "create_schema": false }
            }"#,
        );

        let config = AdvisorConfig::load_with(Some(&path), empty_env()).unwrap();

        assert_eq!(config.audit_descriptor().unwrap(), "sqlite://plant.db");
        assert_eq!(config.model.thresholds.temperature_max, 80.0);
        assert_eq!(config.model.thresholds.vibration_max, 5.0);
        assert!(!config.storage.create_schema);
        assert!(config.storage.create_if_missing);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            &dir,
            r#"{ "connection_strings": { "audit_db": "sqlite://plant.db" } }"#,
        );

        let mut vars = config::Map::new();
        vars.insert(
            "PDM_CONNECTION_STRINGS__AUDIT_DB".to_string(),
            "sqlite://override.db".to_string(),
        );
        vars.insert("PDM_LOGGING__LEVEL".to_string(), "debug".to_string());

        let config = AdvisorConfig::load_with(Some(&path), environment().source(Some(vars))).unwrap();

        assert_eq!(config.audit_descriptor().unwrap(), "sqlite://override.db");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_connection_string() {
        let config = AdvisorConfig::default();
        assert!(matches!(
            config.audit_descriptor(),
            Err(AdvisorError::MissingConnectionString)
        ));

        let config = AdvisorConfig {
            connection_strings: ConnectionStrings {
                audit_db: Some("   ".to_string()),
            },
            ..Default::default()
        };
        assert!(config.audit_descriptor().is_err());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json").display().to_string();

        let result = AdvisorConfig::load_with(Some(&missing), empty_env());
        assert!(matches!(result, Err(AdvisorError::Config(_))));
    }
}
