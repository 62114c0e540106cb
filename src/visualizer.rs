use crate::graph::{Graph, Input, analysis};
use itertools::Itertools;
use std::fmt::Write;

/// Formats a compiled graph into a human-readable listing for debugging.
///
/// One line per node in creation order, then its inputs. Links are shown as
/// `-> #<node>.<slot>` with the data kind they carry.
pub fn visualize_graph(graph: &Graph, title: &str) -> String {
    let mut output = String::new();
    let consumers = analysis::consumers(graph);

    let _ = writeln!(
        output,
        "======== GRAPH: {} ({} nodes) ========",
        title,
        graph.len()
    );

    for (id, node) in graph.iter() {
        let used_by = consumers
            .get(&id)
            .filter(|c| !c.is_empty())
            .map(|c| c.iter().map(|n| format!("#{}", n)).join(", "))
            .unwrap_or_else(|| "(terminal)".to_string());
        let _ = writeln!(
            output,
            "\n{:>4}: {:<24} used by {}",
            format!("#{}", id),
            node.operation.wire_name(),
            used_by
        );

        for (name, input) in &node.inputs {
            let value = match input {
                Input::Literal(literal) => literal.to_string(),
                Input::Link(handle) => {
                    format!("-> #{}.{} {}", handle.node, handle.slot, handle.kind)
                }
            };
            let _ = writeln!(output, "        {:<16} {}", name, value);
        }
    }

    let _ = writeln!(output, "\n================ END OF GRAPH ================");
    output
}
