use super::stages::{Placement, SourceStage};
use crate::error::CompileError;
use crate::graph::allocator::IdAllocator;
use crate::graph::{DataKind, Emitted, Graph, Handle, Input, Node, Operation};
use crate::request::{AdapterSpec, GenerationRequest};

/// Owns the graph under construction and the id sequence of one compilation.
pub(super) struct Assembler {
    ids: IdAllocator,
    graph: Graph,
}

impl Assembler {
    pub(super) fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            graph: Graph::new(),
        }
    }

    /// Allocates the next id and inserts the node under it.
    pub(super) fn emit(
        &mut self,
        operation: Operation,
        inputs: Vec<(&'static str, Input)>,
    ) -> Result<Emitted, CompileError> {
        let id = self.ids.next_id();
        let emitted = self.graph.insert(id, Node::new(operation, inputs))?;
        tracing::trace!(node = %id, operation = %operation, "emitted node");
        Ok(emitted)
    }

    pub(super) fn finish(self) -> Graph {
        self.graph
    }
}

/// The handles threaded through the spine. Each stage takes one and returns its replacement.
#[derive(Debug, Clone, Copy)]
pub(super) struct PipelineState {
    pub model: Handle,
    pub clip: Handle,
    pub vae: Handle,
}

/// Everything the spine needs besides the request itself.
pub(super) struct SpineParams<'a> {
    pub seed: u64,
    pub denoise: f64,
    pub filename_prefix: &'a str,
    pub source: &'a dyn SourceStage,
}

fn load_checkpoint(asm: &mut Assembler, checkpoint: &str) -> Result<PipelineState, CompileError> {
    let loader = asm.emit(
        Operation::CheckpointLoader,
        vec![("ckpt_name", Input::text(checkpoint))],
    )?;
    Ok(PipelineState {
        model: loader.output(DataKind::Model)?,
        clip: loader.output(DataKind::Clip)?,
        vae: loader.output(DataKind::Vae)?,
    })
}

fn apply_vae_override(
    asm: &mut Assembler,
    state: PipelineState,
    vae: Option<&str>,
) -> Result<PipelineState, CompileError> {
    let Some(name) = vae else {
        return Ok(state);
    };
    let loader = asm.emit(Operation::VaeLoader, vec![("vae_name", Input::text(name))])?;
    Ok(PipelineState {
        vae: loader.output(DataKind::Vae)?,
        ..state
    })
}

fn apply_adapter(
    asm: &mut Assembler,
    state: PipelineState,
    adapter: &AdapterSpec,
) -> Result<PipelineState, CompileError> {
    let lora = asm.emit(
        Operation::LoraLoader,
        vec![
            ("lora_name", Input::text(adapter.name.as_str())),
            ("strength_model", Input::float(adapter.strength)),
            ("strength_clip", Input::float(adapter.strength)),
            ("model", state.model.into()),
            ("clip", state.clip.into()),
        ],
    )?;
    Ok(PipelineState {
        model: lora.output(DataKind::Model)?,
        clip: lora.output(DataKind::Clip)?,
        ..state
    })
}

fn apply_adapters(
    asm: &mut Assembler,
    state: PipelineState,
    adapters: &[AdapterSpec],
) -> Result<PipelineState, CompileError> {
    adapters
        .iter()
        .try_fold(state, |state, adapter| apply_adapter(asm, state, adapter))
}

fn encode_text(asm: &mut Assembler, clip: Handle, text: &str) -> Result<Handle, CompileError> {
    asm.emit(
        Operation::TextEncode,
        vec![("text", Input::text(text)), ("clip", clip.into())],
    )?
    .output(DataKind::Conditioning)
}

/// Builds the full pipeline for one request.
///
/// Order: checkpoint, optional VAE override, the source stage when it only needs pixels
/// and the VAE, the adapter chain, both prompt encoders, the source stage when it was
/// deferred, then sampler, decode and save.
pub(super) fn assemble(
    request: &GenerationRequest,
    params: &SpineParams<'_>,
) -> Result<Graph, CompileError> {
    let mut asm = Assembler::new();

    let state = load_checkpoint(&mut asm, &request.checkpoint)?;
    let state = apply_vae_override(&mut asm, state, request.vae.as_deref())?;

    let early_latent = match params.source.placement() {
        Placement::BeforeAdapters => Some(params.source.emit(&mut asm, state.vae)?),
        Placement::AfterConditioning => None,
    };

    let state = apply_adapters(&mut asm, state, &request.adapters)?;

    let positive = encode_text(&mut asm, state.clip, &request.prompt)?;
    let negative = encode_text(&mut asm, state.clip, &request.negative_prompt)?;

    let latent = match early_latent {
        Some(latent) => latent,
        None => params.source.emit(&mut asm, state.vae)?,
    };

    let sampled = asm
        .emit(
            Operation::Sampler,
            vec![
                ("seed", Input::integer(params.seed)),
                ("steps", Input::integer(request.steps)),
                ("cfg", Input::float(request.cfg_scale)),
                ("sampler_name", Input::text(request.sampler_name.as_str())),
                ("scheduler", Input::text(request.scheduler.as_str())),
                ("denoise", Input::float(params.denoise)),
                ("model", state.model.into()),
                ("positive", positive.into()),
                ("negative", negative.into()),
                ("latent_image", latent.into()),
            ],
        )?
        .output(DataKind::Latent)?;

    let decoded = asm
        .emit(
            Operation::VaeDecode,
            vec![("samples", sampled.into()), ("vae", state.vae.into())],
        )?
        .output(DataKind::Image)?;

    asm.emit(
        Operation::SaveImage,
        vec![
            ("images", decoded.into()),
            ("filename_prefix", Input::text(params.filename_prefix)),
        ],
    )?;

    Ok(asm.finish())
}
