use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::error::{Result, SynthKitError};
use crate::schema::types::SchemaSpec;

/// A directed graph of table dependencies via foreign keys.
/// Edges point from referenced table to referring table (parent → child),
/// so a topological walk visits parents first. Nodes are added in schema
/// insertion order, which is what the planner's tie-breaking relies on.
#[derive(Debug)]
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    node_indices: HashMap<String, NodeIndex>,
}

/// Information about one foreign-key edge.
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    /// Referring column in the child table.
    pub column: String,
    /// Referenced column in the parent table.
    pub ref_column: String,
}

impl DependencyGraph {
    /// Build the graph from a schema. Fails when a foreign key references
    /// a table the schema does not declare.
    pub fn from_schema(schema: &SchemaSpec) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table_name in schema.tables.keys() {
            let idx = graph.add_node(table_name.clone());
            node_indices.insert(table_name.clone(), idx);
        }

        for (table_name, table) in &schema.tables {
            let child_idx = node_indices[table_name];
            for fk in &table.foreign_keys {
                let parent_idx = *node_indices.get(&fk.ref_table).ok_or_else(|| {
                    SynthKitError::UnknownReference {
                        table: table_name.clone(),
                        column: fk.column.clone(),
                        ref_table: fk.ref_table.clone(),
                    }
                })?;
                graph.add_edge(
                    parent_idx,
                    child_idx,
                    EdgeInfo {
                        column: fk.column.clone(),
                        ref_column: fk.ref_column.clone(),
                    },
                );
            }
        }

        Ok(Self {
            graph,
            node_indices,
        })
    }

    /// Table name for a node index.
    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Node index for a table name.
    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema_from_yaml;

    fn chain_schema() -> SchemaSpec {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  users:
    primary_key: id
    columns: { id: { type: uuid } }
  orders:
    primary_key: id
    foreign_keys:
      - { column: user_id, ref_table: users, ref_column: id }
    columns:
      id: { type: uuid }
      user_id: { type: uuid }
  order_items:
    primary_key: id
    foreign_keys:
      - { column: order_id, ref_table: orders, ref_column: id }
    columns:
      id: { type: uuid }
      order_id: { type: uuid }
"#;
        schema_from_yaml(yaml).unwrap().0
    }

    #[test]
    fn test_build_graph() {
        let schema = chain_schema();
        let graph = DependencyGraph::from_schema(&schema).unwrap();
        assert_eq!(graph.table_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unknown_ref_table_is_dependency_error() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  orders:
    primary_key: id
    foreign_keys:
      - { column: user_id, ref_table: ghosts, ref_column: id }
    columns:
      id: { type: uuid }
      user_id: { type: uuid }
"#;
        let schema = schema_from_yaml(yaml).unwrap().0;
        let err = DependencyGraph::from_schema(&schema).unwrap_err();
        assert!(matches!(err, SynthKitError::UnknownReference { .. }));
        assert!(err.to_string().contains("ghosts"));
    }
}
