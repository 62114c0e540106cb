//! The boundary to the rendering engine that executes compiled graphs.
//!
//! This crate does not talk HTTP itself. A transport implements [`RenderEngine`]; the wire
//! shapes, status rules and live-relay forwarding around it live here.

pub mod protocol;
pub mod relay;
pub mod session;

pub use protocol::*;
pub use relay::{ClosedBy, RelayMessage, RelayOutcome, relay};
pub use session::{GenerationSession, Submitted};

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Operations a rendering engine collaborator provides.
///
/// Errors are reported as they happen. Implementations must not retry on their own.
pub trait RenderEngine {
    /// Queues a graph for execution.
    fn submit(&self, submission: &Submission<'_>) -> Result<SubmitReceipt, EngineError>;

    /// Current running and pending work.
    fn queue(&self) -> Result<QueueSnapshot, EngineError>;

    /// Completed-work record of one submission, `None` if the engine has none.
    fn history(&self, id: &SubmissionId) -> Result<Option<HistoryEntry>, EngineError>;

    /// Raw bytes of one output image.
    fn image(&self, descriptor: &ImageDescriptor) -> Result<Vec<u8>, EngineError>;

    /// The engine's node catalog document, used to list installed models.
    fn object_info(&self) -> Result<serde_json::Value, EngineError>;

    /// Stops the work currently executing. Best effort.
    fn interrupt(&self) -> bool;

    /// Drops all pending work. Best effort.
    fn clear_queue(&self) -> bool;

    /// Whether the engine answers at all. Never an error: an unreachable engine is `false`.
    fn is_reachable(&self) -> bool;
}

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8188";

/// Where the engine lives and who we are to it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub client_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn submit_url(&self) -> String {
        self.url("/prompt")
    }

    /// Read for polling; a POST to the same path clears the pending queue.
    pub fn queue_url(&self) -> String {
        self.url("/queue")
    }

    pub fn history_url(&self, id: &SubmissionId) -> String {
        self.url(&format!("/history/{}", id))
    }

    pub fn image_url(&self) -> String {
        self.url("/view")
    }

    pub fn object_info_url(&self) -> String {
        self.url("/object_info")
    }

    pub fn interrupt_url(&self) -> String {
        self.url("/interrupt")
    }

    /// Cheap read used as a connectivity check.
    pub fn system_stats_url(&self) -> String {
        self.url("/system_stats")
    }

    /// The live progress socket, on the same host with the websocket scheme.
    pub fn live_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws?clientId={}", base, self.client_id)
    }
}
