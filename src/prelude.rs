//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kousei crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use kousei::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let request = GenerationRequest::new(Source::Direct { width: 512, height: 512 }, "a cat");
//! let workflow = Compiler::default().compile(&request)?;
//! println!("{}", serde_json::to_string_pretty(&workflow.graph)?);
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompiledWorkflow, Compiler, CompilerBuilder, CompilerOptions};

// Graph IR
pub use crate::graph::{DataKind, Graph, Handle, Input, Literal, Node, NodeId, Operation};

// Requests
pub use crate::request::{
    AdapterSpec, GenerationRequest, IntoRequest, RawAdapter, RawGenerateRequest, Seed, Source,
    Variant, WireSeed,
};

// Engine boundary
pub use crate::engine::{
    EngineConfig, GenerationSession, ImageDescriptor, RenderEngine, SubmissionId,
    SubmissionStatus,
};

// Error types
pub use crate::error::{CompileError, EngineError, RequestError, SessionError};

// Debug output
pub use crate::visualizer::visualize_graph;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
