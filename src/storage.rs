use crate::errors::StoreError;
use crate::models::AppData;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::error;

const SNAPSHOT_FIELDS: [&str; 3] = ["habits", "completions", "moods"];

/// Reads a snapshot, falling back to an empty one when the file is missing or
/// unreadable.
pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, payload).await?;
    Ok(())
}

pub fn export_data(data: &AppData) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Parses an exported snapshot. The top level must carry all three arrays;
/// anything else rejects the whole import. Repeated completions and moods
/// collapse to their last record.
pub fn import_data(raw: &str) -> Result<AppData, StoreError> {
    let value: Value = serde_json::from_str(raw)?;
    let missing: Vec<&str> = SNAPSHOT_FIELDS
        .into_iter()
        .filter(|field| !value.get(*field).is_some_and(Value::is_array))
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::InvalidShape(format!("missing arrays: {}", missing.join(", "))));
    }
    let mut data: AppData = serde_json::from_value(value)?;
    data.dedup_records();
    Ok(data)
}
