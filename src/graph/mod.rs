//! The node-graph intermediate representation.

pub(crate) mod allocator;
pub mod analysis;
pub mod catalog;
pub mod handle;
pub mod node;

pub use catalog::{InputKind, InputSpec, LiteralKind, Operation};
pub use handle::{DataKind, Handle, NodeId};
pub use node::{Input, Literal, Node};

use crate::error::CompileError;
use ahash::AHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An insertion-ordered mapping from node id to node.
///
/// Insertion order is creation order. `insert` refuses any node whose handles point to a node
/// the graph does not hold yet, so every graph built through it is acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<(NodeId, Node)>,
    index: AHashMap<NodeId, usize>,
}

/// The outputs of a node that was just inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emitted {
    pub id: NodeId,
    pub operation: Operation,
}

impl Emitted {
    /// The handle of this node's first output of `kind`.
    pub fn output(&self, kind: DataKind) -> Result<Handle, CompileError> {
        let slot = self
            .operation
            .output_slot(kind)
            .ok_or_else(|| CompileError::Schema {
                node_id: self.id.to_string(),
                operation: self.operation.wire_name(),
                message: format!("operation has no {} output", kind),
            })?;
        Ok(Handle {
            node: self.id,
            slot,
            kind,
        })
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos].1)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Creation position of a node (0-based).
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Nodes of one operation kind, in creation order.
    pub fn nodes_of(&self, operation: Operation) -> impl Iterator<Item = (NodeId, &Node)> {
        self.iter().filter(move |(_, node)| node.operation == operation)
    }

    pub fn count_of(&self, operation: Operation) -> usize {
        self.nodes_of(operation).count()
    }

    /// Inserts a node after checking it against the catalog and the nodes already present.
    ///
    /// On error the graph is left unchanged.
    pub fn insert(&mut self, id: NodeId, node: Node) -> Result<Emitted, CompileError> {
        if self.contains(id) {
            return Err(CompileError::DuplicateNode(id.to_string()));
        }

        node.operation
            .check_inputs(&node.inputs)
            .map_err(|message| CompileError::Schema {
                node_id: id.to_string(),
                operation: node.operation.wire_name(),
                message,
            })?;

        for handle in node.links() {
            let source = self
                .get(handle.node)
                .ok_or_else(|| CompileError::ForwardReference {
                    node_id: id.to_string(),
                    target: handle.node.to_string(),
                })?;
            let produced = source.operation.outputs().get(handle.slot as usize);
            if produced != Some(&handle.kind) {
                return Err(CompileError::Schema {
                    node_id: id.to_string(),
                    operation: node.operation.wire_name(),
                    message: format!(
                        "handle {} does not match output slot {} of {}",
                        handle, handle.slot, source.operation
                    ),
                });
            }
        }

        let emitted = Emitted {
            id,
            operation: node.operation,
        };
        self.index.insert(id, self.nodes.len());
        self.nodes.push((id, node));
        Ok(emitted)
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for (id, node) in &self.nodes {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}
