/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation, initialization,
 * and provides async-safe access patterns using tokio's spawn_blocking.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::schema;
use crate::errors::RepositoryError;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "lexidrill.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "lexidrill";

/// Default time a statement waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        configure_connection(&conn, busy_timeout, true)?;
        schema::initialize_schema(&conn).context("Failed to initialize database schema")?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        configure_connection(&conn, DEFAULT_BUSY_TIMEOUT, false)?;
        schema::initialize_schema(&conn).context("Failed to initialize database schema")?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    ///
    /// This method acquires the mutex lock and executes the provided closure
    /// with access to the connection. For async contexts, use `execute_async`.
    pub fn execute<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connection.lock().map_err(|e| {
            RepositoryError::StorageUnavailable(format!("Failed to acquire database lock: {}", e))
        })?;

        f(&conn).map_err(RepositoryError::from)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    ///
    /// This is the preferred method for async contexts as it prevents
    /// blocking the async runtime.
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                RepositoryError::StorageUnavailable(format!(
                    "Failed to acquire database lock: {}",
                    e
                ))
            })?;

            f(&conn).map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| RepositoryError::StorageUnavailable(format!("Database task panicked: {}", e)))?
    }

    /// Begin an async transaction and execute operations within it
    ///
    /// The transaction is committed only when the closure succeeds; any error
    /// drops it, which rolls every statement back.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&rusqlite::Transaction) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                RepositoryError::StorageUnavailable(format!(
                    "Failed to acquire database lock: {}",
                    e
                ))
            })?;

            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .map_err(|e| {
            RepositoryError::StorageUnavailable(format!("Database transaction task panicked: {}", e))
        })?
    }
}

/// Apply per-connection pragmas
fn configure_connection(conn: &Connection, busy_timeout: Duration, wal: bool) -> Result<()> {
    conn.busy_timeout(busy_timeout)
        .context("Failed to set busy timeout")?;

    // Foreign keys are off by default in SQLite and must be enabled per connection
    conn.pragma_update(None, "foreign_keys", true)
        .context("Failed to enable foreign keys")?;

    if wal {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .context("Failed to enable WAL journal mode")?;
        debug!("Journal mode: {}", mode);
    }

    Ok(())
}
