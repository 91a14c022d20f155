use crate::error::{AppError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// JSON-file backed service collection
///
/// Records are kept as raw JSON objects; the only shape enforced here is a
/// top-level array. Reads are whole-file and lock-free. Mutations go through `write_lock` and
/// land via a temp file plus rename, so a reader never sees a partial write
/// and concurrent appends cannot lose each other's records.
pub struct ServiceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ServiceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the store file with an empty collection if it does not exist
    pub async fn ensure_exists(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create {}: {}", parent.display(), e);
                AppError::StoreUnavailable(format!("Failed to create store directory: {}", e))
            })?;
        }

        self.write_all(&[]).await?;
        tracing::info!("Created empty service store at {}", self.path.display());
        Ok(())
    }

    /// Return every record in on-disk order, exactly as stored
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the file cannot be read or is not a JSON
    /// array
    pub async fn read_all(&self) -> Result<Vec<Value>> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            tracing::error!("Error reading {}: {}", self.path.display(), e);
            AppError::StoreUnavailable(format!("Failed to read store: {}", e))
        })?;

        serde_json::from_str(&data).map_err(|e| {
            tracing::error!("Error parsing {}: {}", self.path.display(), e);
            AppError::StoreUnavailable(format!("Failed to parse store: {}", e))
        })
    }

    /// Append `record` as the last element of the collection
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` on read or write failure; the file is left
    /// untouched in that case
    pub async fn append(&self, record: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_all().await?;
        records.push(record);
        self.write_all(&records).await?;

        tracing::debug!(
            "Store {} now holds {} services",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    // Callers must hold `write_lock`
    async fn write_all(&self, records: &[Value]) -> Result<()> {
        let json = serde_json::to_string_pretty(records).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to serialize services: {}", e))
        })?;

        let temp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, json).await.map_err(|e| {
            tracing::error!("Error writing {}: {}", temp_path.display(), e);
            AppError::StoreUnavailable(format!("Failed to write store: {}", e))
        })?;

        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            tracing::error!(
                "Error replacing {} with {}: {}",
                self.path.display(),
                temp_path.display(),
                e
            );
            AppError::StoreUnavailable(format!("Failed to update store: {}", e))
        })
    }
}
