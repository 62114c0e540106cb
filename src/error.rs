use thiserror::Error;

/// Errors raised while turning a caller's request into a `GenerationRequest`.
///
/// These are rejected before compilation starts, so they never leave a partial graph behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Failed to parse request JSON: {0}")]
    JsonParseError(String),

    #[error("Unknown generation mode '{0}' (expected txt2img, img2img or inpaint)")]
    UnknownVariant(String),

    #[error("Field '{field}' is required for mode '{mode}'")]
    MissingField { field: &'static str, mode: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
}

/// Errors that can occur during graph compilation.
///
/// Apart from `Request`, every variant is an assembler defect: the emitted node does not
/// match the catalog. Compilation is all-or-nothing, the graph is discarded on any error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Node '{node_id}' ({operation}) violates the catalog schema: {message}")]
    Schema {
        node_id: String,
        operation: &'static str,
        message: String,
    },

    #[error("Node '{node_id}' references node '{target}', which has not been emitted yet")]
    ForwardReference { node_id: String, target: String },

    #[error("Node id '{0}' was emitted twice")]
    DuplicateNode(String),
}

/// Errors reported by a rendering engine collaborator. They are surfaced verbatim and
/// never retried here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Failed to reach the rendering engine: {0}")]
    Transport(String),

    #[error("Rendering engine returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Rendering engine did not answer in time")]
    Timeout,

    #[error("Unexpected response from the rendering engine: {0}")]
    Protocol(String),
}

/// Errors surfaced by a `GenerationSession`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Returned when parsing a wire `class_type` that is not part of the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown operation type '{0}'")]
pub struct UnknownOperation(pub String);

/// Structural problems found when verifying a finished graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Node '{node_id}' references node '{target}', which is not created before it")]
    NotTopological { node_id: String, target: String },

    #[error("Expected exactly one terminal node, found {0}")]
    TerminalCount(usize),

    #[error("Expected exactly one model source node, found {0}")]
    SourceCount(usize),

    #[error("Nodes not reachable from the terminal node: {0:?}")]
    Unreachable(Vec<String>),
}
