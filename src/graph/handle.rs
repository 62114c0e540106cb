use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

/// Identifier of a node within one compiled graph.
///
/// Ids are handed out by the `IdAllocator` and are only meaningful inside the graph that
/// produced them. On the wire they are decimal strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The kind of data flowing along an edge of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Model,
    /// The text-encodable model state (conditioning basis).
    Clip,
    Conditioning,
    Latent,
    Image,
    Mask,
    Vae,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Model => "MODEL",
            DataKind::Clip => "CLIP",
            DataKind::Conditioning => "CONDITIONING",
            DataKind::Latent => "LATENT",
            DataKind::Image => "IMAGE",
            DataKind::Mask => "MASK",
            DataKind::Vae => "VAE",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to one output slot of a node.
///
/// Handles are only created by the graph for nodes it already holds, which is what keeps
/// every compiled graph free of forward references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub node: NodeId,
    pub slot: u32,
    pub kind: DataKind,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{} ({})", self.node, self.slot, self.kind)
    }
}

// Wire form is `["<node id>", slot]`; the kind stays on this side.
impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.node)?;
        tuple.serialize_element(&self.slot)?;
        tuple.end()
    }
}
