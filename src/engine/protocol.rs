//! Wire types exchanged with the rendering engine and the status rules built on them.

use crate::error::EngineError;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier the engine assigns to a queued graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Body of a submit call: `{"prompt": <graph>, "client_id": "..."}`.
#[derive(Serialize, Debug, Clone)]
pub struct Submission<'a> {
    #[serde(rename = "prompt")]
    pub graph: &'a Graph,
    pub client_id: &'a str,
}

/// The engine's answer to a successful submit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    #[serde(rename = "prompt_id")]
    pub id: SubmissionId,
    #[serde(default)]
    pub number: u64,
}

/// Outstanding work on the engine, split into running and pending ids in queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub running: Vec<SubmissionId>,
    pub pending: Vec<SubmissionId>,
}

impl QueueSnapshot {
    /// Parses `{"queue_running": [[number, id, ...], ...], "queue_pending": [...]}`.
    pub fn from_json(value: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            running: queue_ids(value, "queue_running")?,
            pending: queue_ids(value, "queue_pending")?,
        })
    }
}

fn queue_ids(value: &Value, key: &str) -> Result<Vec<SubmissionId>, EngineError> {
    let Some(entries) = value.get(key) else {
        return Ok(Vec::new());
    };
    let entries = entries
        .as_array()
        .ok_or_else(|| EngineError::Protocol(format!("'{}' is not a list", key)))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .get(1)
                .and_then(Value::as_str)
                .map(SubmissionId::from)
                .ok_or_else(|| {
                    EngineError::Protocol(format!("'{}' entry has no submission id", key))
                })
        })
        .collect()
}

/// Where an output image lives on the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    /// Storage area tag, usually `output` or `temp`.
    #[serde(rename = "type", default = "default_storage")]
    pub storage: String,
    /// The output node that produced the image.
    #[serde(default)]
    pub node_id: String,
}

fn default_storage() -> String {
    "output".to_string()
}

impl ImageDescriptor {
    /// Query parameters of a binary fetch.
    pub fn query(&self) -> [(&'static str, &str); 3] {
        [
            ("filename", self.filename.as_str()),
            ("subfolder", self.subfolder.as_str()),
            ("type", self.storage.as_str()),
        ]
    }
}

/// Completed-work record of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: SubmissionId,
    pub images: Vec<ImageDescriptor>,
    pub status: Value,
}

#[derive(Deserialize)]
struct RawImage {
    filename: String,
    #[serde(default)]
    subfolder: String,
    #[serde(rename = "type", default = "default_storage")]
    storage: String,
}

impl HistoryEntry {
    /// Extracts the entry for `id` from `{id: {"outputs": {node: {"images": [...]}}, "status": ...}}`.
    ///
    /// Returns `Ok(None)` when the history holds nothing for `id`.
    pub fn from_json(id: &SubmissionId, value: &Value) -> Result<Option<Self>, EngineError> {
        let Some(record) = value.get(&id.0) else {
            return Ok(None);
        };

        let mut images = Vec::new();
        if let Some(outputs) = record.get("outputs").and_then(Value::as_object) {
            for (node_id, output) in outputs {
                let Some(list) = output.get("images") else {
                    continue;
                };
                let raw: Vec<RawImage> = serde_json::from_value(list.clone()).map_err(|e| {
                    EngineError::Protocol(format!("bad image list for node {}: {}", node_id, e))
                })?;
                images.extend(raw.into_iter().map(|image| ImageDescriptor {
                    filename: image.filename,
                    subfolder: image.subfolder,
                    storage: image.storage,
                    node_id: node_id.clone(),
                }));
            }
        }

        Ok(Some(Self {
            id: id.clone(),
            images,
            status: record.get("status").cloned().unwrap_or(Value::Null),
        }))
    }
}

/// Model files the engine reports as installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelInventory {
    pub checkpoints: Vec<String>,
    pub adapters: Vec<String>,
}

impl ModelInventory {
    /// Reads the loader input choices out of an `object_info` document. Missing sections
    /// give empty lists.
    pub fn from_object_info(value: &Value) -> Self {
        Self {
            checkpoints: loader_choices(value, "CheckpointLoaderSimple", "ckpt_name"),
            adapters: loader_choices(value, "LoraLoader", "lora_name"),
        }
    }
}

fn loader_choices(value: &Value, operation: &str, input: &str) -> Vec<String> {
    value
        .pointer(&format!("/{}/input/required/{}/0", operation, input))
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Where a submission stands.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Running,
    Pending { position: usize },
    Completed { images: Vec<ImageDescriptor> },
    NotFound,
}

impl SubmissionStatus {
    /// Running work first, then the pending queue (1-based position), then history. A
    /// history entry only counts as completed once it holds at least one image.
    pub fn derive(
        id: &SubmissionId,
        queue: &QueueSnapshot,
        history: Option<&HistoryEntry>,
    ) -> Self {
        if queue.running.contains(id) {
            return SubmissionStatus::Running;
        }
        if let Some(index) = queue.pending.iter().position(|pending| pending == id) {
            return SubmissionStatus::Pending {
                position: index + 1,
            };
        }
        match history {
            Some(entry) if !entry.images.is_empty() => SubmissionStatus::Completed {
                images: entry.images.clone(),
            },
            _ => SubmissionStatus::NotFound,
        }
    }

    /// Position in the queue: 0 once running or done, -1 when the engine does not know it.
    pub fn queue_position(&self) -> i64 {
        match self {
            SubmissionStatus::Running | SubmissionStatus::Completed { .. } => 0,
            SubmissionStatus::Pending { position } => *position as i64,
            SubmissionStatus::NotFound => -1,
        }
    }
}
