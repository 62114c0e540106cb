use super::protocol::{
    HistoryEntry, ImageDescriptor, ModelInventory, QueueSnapshot, Submission, SubmissionId,
    SubmissionStatus,
};
use super::{EngineConfig, RenderEngine};
use crate::compiler::Compiler;
use crate::error::{EngineError, SessionError};
use crate::request::GenerationRequest;

/// What a successful `generate` call hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub id: SubmissionId,
    pub seed: u64,
    /// Queue number the engine assigned.
    pub number: u64,
}

/// Ties a compiler to one rendering engine under one client id.
pub struct GenerationSession<E> {
    engine: E,
    compiler: Compiler,
    config: EngineConfig,
}

impl<E: RenderEngine> GenerationSession<E> {
    pub fn new(engine: E, compiler: Compiler, config: EngineConfig) -> Self {
        Self {
            engine,
            compiler,
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// Compiles the request and queues the graph. Nothing is submitted if compilation fails.
    pub fn generate(&self, request: &GenerationRequest) -> Result<Submitted, SessionError> {
        let workflow = self.compiler.compile(request)?;
        let submission = Submission {
            graph: &workflow.graph,
            client_id: &self.config.client_id,
        };

        let receipt = self.engine.submit(&submission).inspect_err(|e| {
            tracing::error!(error = %e, variant = %workflow.variant, "submission rejected");
        })?;

        tracing::info!(
            id = %receipt.id,
            number = receipt.number,
            seed = workflow.seed,
            "queued generation graph"
        );
        Ok(Submitted {
            id: receipt.id,
            seed: workflow.seed,
            number: receipt.number,
        })
    }

    /// Polls the queue, consulting history only when the id is no longer queued.
    pub fn status(&self, id: &SubmissionId) -> Result<SubmissionStatus, EngineError> {
        let queue: QueueSnapshot = self.engine.queue()?;
        let queued = queue.running.contains(id) || queue.pending.contains(id);
        let history = if queued {
            None
        } else {
            self.engine.history(id)?
        };
        let status = SubmissionStatus::derive(id, &queue, history.as_ref());
        tracing::debug!(id = %id, ?status, "polled submission status");
        Ok(status)
    }

    pub fn history(&self, id: &SubmissionId) -> Result<Option<HistoryEntry>, EngineError> {
        self.engine.history(id)
    }

    /// Downloads every image a completed submission produced, in history order.
    pub fn fetch_images(
        &self,
        id: &SubmissionId,
    ) -> Result<Vec<(ImageDescriptor, Vec<u8>)>, EngineError> {
        let Some(entry) = self.engine.history(id)? else {
            return Ok(Vec::new());
        };
        entry
            .images
            .into_iter()
            .map(|descriptor| {
                let bytes = self.engine.image(&descriptor)?;
                Ok((descriptor, bytes))
            })
            .collect()
    }

    pub fn inventory(&self) -> Result<ModelInventory, EngineError> {
        Ok(ModelInventory::from_object_info(&self.engine.object_info()?))
    }

    pub fn available_checkpoints(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.inventory()?.checkpoints)
    }

    pub fn available_adapters(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.inventory()?.adapters)
    }

    pub fn interrupt(&self) -> bool {
        let done = self.engine.interrupt();
        if !done {
            tracing::warn!("engine did not accept the interrupt");
        }
        done
    }

    pub fn is_reachable(&self) -> bool {
        let reachable = self.engine.is_reachable();
        if !reachable {
            tracing::warn!(client_id = %self.config.client_id, "rendering engine is not reachable");
        }
        reachable
    }

    pub fn clear_queue(&self) -> bool {
        let done = self.engine.clear_queue();
        if !done {
            tracing::warn!("engine did not clear its queue");
        }
        done
    }
}
