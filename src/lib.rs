//! # Kousei - Generation Graph Compiler
//!
//! **Kousei** turns a flat image-generation request ("mode, prompt, steps, sampler, seed,
//! loras…") into the explicit node graph a diffusion rendering engine executes, and keeps
//! track of that graph once it is queued.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the request**: Build a `GenerationRequest` directly, or accept the flat
//!     wire shape (`RawGenerateRequest`, or your own type implementing `IntoRequest`) and let
//!     it validate. Caller errors stop here.
//! 2.  **Compile**: `Compiler::compile` assembles the graph. Every node is checked against
//!     the operation catalog as it is inserted and can only reference nodes emitted before
//!     it, so the result is always a well-typed DAG.
//! 3.  **Submit and track**: Hand the graph to a `RenderEngine` implementation, or use a
//!     `GenerationSession` to compile, submit, poll and download in one place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kousei::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut request = GenerationRequest::new(
//!         Source::Direct { width: 512, height: 512 },
//!         "a cat sitting on a windowsill",
//!     );
//!     request.seed = Seed::Fixed(42);
//!     request.adapters.push(AdapterSpec::new("watercolor.safetensors", 0.8));
//!
//!     let compiler = Compiler::builder()
//!         .with_filename_prefix(Variant::Direct, "cats")
//!         .build();
//!     let workflow = compiler.compile(&request)?;
//!
//!     println!("{}", visualize_graph(&workflow.graph, "cat"));
//!     println!("{}", serde_json::to_string_pretty(&workflow.graph)?);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod request;
pub mod visualizer;
