use crate::error::CompileError;
use crate::graph::{Graph, NodeId, Operation};
use crate::request::{GenerationRequest, IntoRequest, RawGenerateRequest, Source, Variant};
use rand::Rng;
use serde::{Deserialize, Serialize};

mod spine;
mod stages;

use spine::SpineParams;
use stages::{EmptyLatent, EncodeImage, EncodeMasked, SourceStage};

/// Tunables of the compiler. Every field has a default, so a partial JSON object is enough.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompilerOptions {
    pub txt2img_prefix: String,
    pub img2img_prefix: String,
    pub inpaint_prefix: String,
    /// Margin in pixels the inpaint mask is grown by before encoding.
    pub grow_mask_by: u32,
    pub mask_channel: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            txt2img_prefix: "kousei_txt2img".to_string(),
            img2img_prefix: "kousei_img2img".to_string(),
            inpaint_prefix: "kousei_inpaint".to_string(),
            grow_mask_by: 6,
            mask_channel: "red".to_string(),
        }
    }
}

impl CompilerOptions {
    /// Output-name prefix tagged onto the save node of `variant`.
    pub fn filename_prefix(&self, variant: Variant) -> &str {
        match variant {
            Variant::Direct => &self.txt2img_prefix,
            Variant::ImageGuided => &self.img2img_prefix,
            Variant::Inpaint => &self.inpaint_prefix,
        }
    }

    fn filename_prefix_mut(&mut self, variant: Variant) -> &mut String {
        match variant {
            Variant::Direct => &mut self.txt2img_prefix,
            Variant::ImageGuided => &mut self.img2img_prefix,
            Variant::Inpaint => &mut self.inpaint_prefix,
        }
    }
}

/// The result of one compilation.
#[derive(Debug, Clone)]
pub struct CompiledWorkflow {
    pub variant: Variant,
    /// The seed recorded in the sampler node, after resolving the random sentinel.
    pub seed: u64,
    pub graph: Graph,
}

impl CompiledWorkflow {
    /// The save node every compiled graph ends with.
    pub fn terminal(&self) -> Option<NodeId> {
        self.graph
            .nodes_of(Operation::SaveImage)
            .map(|(id, _)| id)
            .last()
    }

    /// The graph in the rendering engine's wire format.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.graph)
    }
}

/// Translates generation requests into node graphs.
///
/// The compiler only holds immutable options; every call works on its own id sequence and
/// graph, so one instance can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

pub struct CompilerBuilder {
    options: CompilerOptions,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            options: CompilerOptions::default(),
        }
    }
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }
    pub fn with_filename_prefix(mut self, variant: Variant, prefix: &str) -> Self {
        *self.options.filename_prefix_mut(variant) = prefix.to_string();
        self
    }
    pub fn with_mask_growth(mut self, pixels: u32) -> Self {
        self.options.grow_mask_by = pixels;
        self
    }
    pub fn build(self) -> Compiler {
        Compiler {
            options: self.options,
        }
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles a request, drawing random seeds from the thread-local generator.
    pub fn compile(&self, request: &GenerationRequest) -> Result<CompiledWorkflow, CompileError> {
        self.compile_with_rng(request, &mut rand::rng())
    }

    /// Compiles a request, drawing random seeds from `rng`.
    pub fn compile_with_rng<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<CompiledWorkflow, CompileError> {
        let variant = request.variant();
        let seed = request.seed.resolve(rng);

        let empty;
        let encode;
        let masked;
        let source: &dyn SourceStage = match &request.source {
            Source::Direct { width, height } => {
                empty = EmptyLatent {
                    width: *width,
                    height: *height,
                    batch_size: request.batch_size,
                };
                &empty
            }
            Source::ImageGuided { image, .. } => {
                encode = EncodeImage { image };
                &encode
            }
            Source::Inpaint { image, mask, .. } => {
                masked = EncodeMasked {
                    image,
                    mask,
                    mask_channel: &self.options.mask_channel,
                    grow_mask_by: self.options.grow_mask_by,
                };
                &masked
            }
        };

        let params = SpineParams {
            seed,
            denoise: request.source.denoise(),
            filename_prefix: self.options.filename_prefix(variant),
            source,
        };
        let graph = spine::assemble(request, &params)?;

        tracing::debug!(
            variant = %variant,
            seed,
            nodes = graph.len(),
            adapters = request.adapters.len(),
            "compiled generation graph"
        );

        Ok(CompiledWorkflow {
            variant,
            seed,
            graph,
        })
    }

    /// Validates a caller-side request and compiles it. Invalid requests never reach the
    /// assembler.
    pub fn compile_request<T: IntoRequest>(&self, raw: T) -> Result<CompiledWorkflow, CompileError> {
        let request = raw.into_request()?;
        self.compile(&request)
    }

    /// Parses, validates and compiles a JSON request.
    pub fn compile_json(&self, json: &str) -> Result<CompiledWorkflow, CompileError> {
        self.compile_request(RawGenerateRequest::from_json(json)?)
    }
}
