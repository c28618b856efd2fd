//! Export/import envelope for task collections.
//!
//! Export wraps the collection as `{"tasks": [...], "exportedAt": ms,
//! "version": "1.0"}`. Import only requires the `tasks` array, and rejects
//! collections with repeated or colliding ids.

use crate::model::task::{validate_collection, Task};
use crate::store::task_store::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExport {
    pub tasks: Vec<Task>,
    pub exported_at: i64,
    pub version: String,
}

/// Encodes `tasks` as a pretty-printed export envelope.
pub fn encode_export(tasks: &[Task], exported_at: i64) -> StoreResult<String> {
    let envelope = TaskExport {
        tasks: tasks.to_vec(),
        exported_at,
        version: EXPORT_FORMAT_VERSION.to_string(),
    };
    serde_json::to_string_pretty(&envelope).map_err(StoreError::Serialize)
}

/// Decodes and validates the task array of an export envelope.
pub fn decode_import(data: &str) -> StoreResult<Vec<Task>> {
    let mut value: Value =
        serde_json::from_str(data).map_err(|err| StoreError::InvalidImport(err.to_string()))?;

    let tasks = match value.get_mut("tasks") {
        Some(tasks @ Value::Array(_)) => tasks.take(),
        _ => {
            return Err(StoreError::InvalidImport(
                "expected a `tasks` array".to_string(),
            ))
        }
    };

    let tasks: Vec<Task> = serde_json::from_value(tasks)
        .map_err(|err| StoreError::InvalidImport(err.to_string()))?;
    validate_collection(&tasks).map_err(|err| StoreError::InvalidImport(err.to_string()))?;
    Ok(tasks)
}
