//! Read-only structural queries over a compiled graph.

use super::{DataKind, Graph, NodeId};
use crate::error::TopologyError;
use ahash::{AHashMap, AHashSet};

/// Maps every node to the nodes that consume one of its outputs, in creation order.
pub fn consumers(graph: &Graph) -> AHashMap<NodeId, Vec<NodeId>> {
    let mut map: AHashMap<NodeId, Vec<NodeId>> =
        graph.iter().map(|(id, _)| (id, Vec::new())).collect();
    for (id, node) in graph.iter() {
        for handle in node.links() {
            let entry = map.entry(handle.node).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
    }
    map
}

/// Nodes whose outputs nobody consumes.
pub fn terminal_nodes(graph: &Graph) -> Vec<NodeId> {
    let consumers = consumers(graph);
    graph
        .iter()
        .map(|(id, _)| id)
        .filter(|id| consumers.get(id).is_none_or(|c| c.is_empty()))
        .collect()
}

/// Nodes without any incoming handle.
pub fn source_nodes(graph: &Graph) -> Vec<NodeId> {
    graph
        .iter()
        .filter(|(_, node)| node.links().next().is_none())
        .map(|(id, _)| id)
        .collect()
}

/// Every node `id` depends on, directly or transitively, in creation order.
pub fn ancestors(graph: &Graph, id: NodeId) -> Vec<NodeId> {
    let mut seen = AHashSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if let Some(node) = graph.get(current) {
            for handle in node.links() {
                if seen.insert(handle.node) {
                    stack.push(handle.node);
                }
            }
        }
    }
    let mut result: Vec<NodeId> = seen.into_iter().collect();
    result.sort_by_key(|id| graph.position(*id));
    result
}

/// Source nodes that start a model lineage. A well-formed graph has exactly one.
pub fn model_roots(graph: &Graph) -> Vec<NodeId> {
    source_nodes(graph)
        .into_iter()
        .filter(|id| {
            graph
                .get(*id)
                .is_some_and(|node| node.operation.outputs().contains(&DataKind::Model))
        })
        .collect()
}

/// Checks the structural invariants every compiled graph must satisfy.
///
/// - each handle points to a node created strictly earlier, so there are no cycles
/// - exactly one terminal node, and exactly one source node producing a model
/// - walking back from the terminal reaches every node
pub fn verify(graph: &Graph) -> Result<(), TopologyError> {
    for (position, (id, node)) in graph.iter().enumerate() {
        for handle in node.links() {
            match graph.position(handle.node) {
                Some(target) if target < position => {}
                _ => {
                    return Err(TopologyError::NotTopological {
                        node_id: id.to_string(),
                        target: handle.node.to_string(),
                    });
                }
            }
        }
    }

    let terminals = terminal_nodes(graph);
    if terminals.len() != 1 {
        return Err(TopologyError::TerminalCount(terminals.len()));
    }
    let roots = model_roots(graph);
    if roots.len() != 1 {
        return Err(TopologyError::SourceCount(roots.len()));
    }

    let terminal = terminals[0];
    let reached: AHashSet<NodeId> = ancestors(graph, terminal).into_iter().collect();
    let unreachable: Vec<String> = graph
        .iter()
        .map(|(id, _)| id)
        .filter(|id| *id != terminal && !reached.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !unreachable.is_empty() {
        return Err(TopologyError::Unreachable(unreachable));
    }

    Ok(())
}
