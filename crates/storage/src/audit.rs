//! Audit Log Implementation

use std::str::FromStr;

use crate::StorageError;
use inference_engine::ClassificationResult;
use sensor_input::SensorReading;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Transaction};
use tracing::{debug, info, warn};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS PredictionLog (
    LogID INTEGER PRIMARY KEY AUTOINCREMENT,
    MachineID TEXT NOT NULL,
    Temperature_Input REAL NOT NULL,
    Vibration_Input REAL NOT NULL,
    HoursRun_Input REAL NOT NULL,
    Pressure_Input REAL NOT NULL,
    Prediction_Result INTEGER NOT NULL,
    Logged_At TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const INSERT_SQL: &str = r#"
INSERT INTO PredictionLog
    (MachineID, Temperature_Input, Vibration_Input, HoursRun_Input, Pressure_Input, Prediction_Result)
VALUES
    (?, ?, ?, ?, ?, ?)
"#;

/// Connection options for the audit store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Create the database file when it does not exist (default: true)
    pub create_if_missing: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
        }
    }
}

/// One reading and the verdict reached for it.
///
/// The record timestamp is assigned by the store when the row is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    reading: SensorReading,
    classification: ClassificationResult,
}

impl AuditRecord {
    pub fn new(reading: SensorReading, classification: ClassificationResult) -> Self {
        Self {
            reading,
            classification,
        }
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classification
    }
}

/// Outcome of a single persistence attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PersistResult {
    /// Row inserted and committed
    Success { row_id: i64 },
    /// Insert acknowledged zero rows; transaction rolled back
    NoRowsAffected,
    /// Store or driver fault; transaction rolled back
    StoreError(String),
    /// Any other fault; transaction rolled back
    UnexpectedError(String),
}

/// Transactional audit log.
///
/// Each [`record`](AuditStore::record) call opens its own connection and
/// transaction and releases both before returning, whatever the outcome.
pub struct AuditStore {
    options: SqliteConnectOptions,
}

impl AuditStore {
    /// Create a store from an sqlx SQLite descriptor such as
    /// `sqlite://./audit.db`. Nothing is opened until first use.
    pub fn new(descriptor: &str, options: StoreOptions) -> Result<Self, StorageError> {
        let connect_options = SqliteConnectOptions::from_str(descriptor)
            .map_err(|e| StorageError::InvalidDescriptor(e.to_string()))?
            .create_if_missing(options.create_if_missing);

        info!("Creating audit store: {}", descriptor);
        Ok(Self {
            options: connect_options,
        })
    }

    /// Create the audit table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let created = sqlx::query(CREATE_TABLE_SQL).execute(&mut conn).await;
        close(conn).await;

        created?;
        debug!("Audit schema ready");
        Ok(())
    }

    /// Insert one audit record as a single all-or-nothing transaction
    pub async fn record(&self, entry: &AuditRecord) -> PersistResult {
        debug!(
            machine_id = entry.reading().machine_id(),
            label = entry.classification().label.as_str(),
            "Recording audit entry"
        );

        let outcome = match self.connect().await {
            Ok(mut conn) => {
                let outcome = insert(&mut conn, entry).await;
                close(conn).await;
                outcome
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(Some(row_id)) => PersistResult::Success { row_id },
            Ok(None) => PersistResult::NoRowsAffected,
            Err(StorageError::DatabaseError(e)) => PersistResult::StoreError(e.to_string()),
            Err(StorageError::Unexpected(detail)) => PersistResult::UnexpectedError(detail),
            Err(other) => PersistResult::UnexpectedError(other.to_string()),
        };

        match &result {
            PersistResult::Success { row_id } => info!("Audit record {} committed", row_id),
            other => warn!("Audit record not written: {:?}", other),
        }
        result
    }

    async fn connect(&self) -> Result<SqliteConnection, StorageError> {
        Ok(self.options.connect().await?)
    }
}

/// Insert inside a fresh transaction. `Ok(None)` means the store
/// acknowledged zero rows and the transaction was rolled back.
async fn insert(
    conn: &mut SqliteConnection,
    entry: &AuditRecord,
) -> Result<Option<i64>, StorageError> {
    let mut tx = conn.begin().await?;
    let reading = entry.reading();

    let inserted = sqlx::query(INSERT_SQL)
        .bind(reading.machine_id())
        .bind(reading.temperature())
        .bind(reading.vibration())
        .bind(reading.hours_run())
        .bind(reading.pressure())
        .bind(entry.classification().label.code())
        .execute(&mut *tx)
        .await;

    let done = match inserted {
        Ok(done) => done,
        Err(e) => {
            rollback(tx).await;
            return Err(e.into());
        }
    };

    if done.rows_affected() == 0 {
        warn!("Insert acknowledged no rows, rolling back");
        tx.rollback().await?;
        return Ok(None);
    }

    let row_id = done.last_insert_rowid();
    // On failure the dropped guard rolls the transaction back
    tx.commit().await?;
    Ok(Some(row_id))
}

async fn rollback(tx: Transaction<'_, sqlx::Sqlite>) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback failed: {}", e);
    }
}

async fn close(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close audit connection: {}", e);
    }
}
