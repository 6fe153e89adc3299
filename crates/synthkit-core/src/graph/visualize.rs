use petgraph::visit::EdgeRef;

use crate::graph::dag::DependencyGraph;

/// Output format for graph visualization.
pub enum GraphFormat {
    Mermaid,
    Dot,
}

/// Generate a visualization of the dependency graph. Edges render
/// parent → child, labelled with the referring column.
pub fn visualize(graph: &DependencyGraph, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => generate_mermaid(graph),
        GraphFormat::Dot => generate_dot(graph),
    }
}

fn generate_mermaid(graph: &DependencyGraph) -> String {
    let mut output = String::from("graph TD\n");

    for node in graph.graph.node_indices() {
        let name = graph.table_name(node);
        output.push_str(&format!("    {}[{}]\n", name, name));
    }

    output.push('\n');

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        output.push_str(&format!(
            "    {} -->|{}| {}\n",
            from,
            edge.weight().column,
            to
        ));
    }

    output
}

fn generate_dot(graph: &DependencyGraph) -> String {
    let mut output = String::from("digraph dependencies {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n\n");

    for edge in graph.graph.edge_references() {
        let from = graph.table_name(edge.source());
        let to = graph.table_name(edge.target());
        output.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from,
            to,
            edge.weight().column
        ));
    }

    output.push_str("}\n");
    output
}
