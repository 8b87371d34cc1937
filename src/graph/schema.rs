//! Structural summary of a graph
//!
//! The schema graph has one vertex per distinct vertex label and one edge per
//! distinct (out-vertex label, edge label, in-vertex label) triple. Both carry
//! a `count` property with the number of source elements they summarize.
//! It is a snapshot, not a live view.

use super::element::Element;
use super::store::PropertyGraph;
use super::types::{Label, VertexId};
use crate::config::GraphConfig;
use crate::error::GraphResult;
use indexmap::IndexMap;
use tracing::debug;

/// Property holding the number of summarized elements
pub const COUNT_KEY: &str = "count";

impl PropertyGraph {
    pub fn schema_graph(&self, name: impl Into<String>) -> GraphResult<PropertyGraph> {
        let mut vertex_labels: IndexMap<&Label, i64> = IndexMap::new();
        for vertex in self.vertices() {
            *vertex_labels.entry(vertex.label()).or_insert(0) += 1;
        }

        let mut triples: IndexMap<(&Label, &Label, &Label), i64> = IndexMap::new();
        for edge in self.edges() {
            let out_label = self.vertex(edge.out_vertex())?.label();
            let in_label = self.vertex(edge.in_vertex())?.label();
            *triples
                .entry((out_label, edge.label(), in_label))
                .or_insert(0) += 1;
        }

        let mut schema = PropertyGraph::with_config(GraphConfig::new(name));
        let mut label_vertices: IndexMap<&Label, VertexId> = IndexMap::new();
        for (label, count) in vertex_labels {
            let id = schema.add_vertex_with(None, label.clone(), |v| {
                v.set_property(COUNT_KEY, count)?;
                Ok(())
            })?;
            label_vertices.insert(label, id);
        }
        for ((out_label, edge_label, in_label), count) in triples {
            let (Some(&out_vertex), Some(&in_vertex)) =
                (label_vertices.get(out_label), label_vertices.get(in_label))
            else {
                continue;
            };
            schema.add_edge_with(None, out_vertex, edge_label.clone(), in_vertex, |e| {
                e.set_property(COUNT_KEY, count)?;
                Ok(())
            })?;
        }

        debug!(
            "Derived schema graph '{}': {} vertex labels, {} edge triples",
            schema.name(),
            schema.vertex_count(),
            schema.edge_count()
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;

    #[test]
    fn test_schema_of_people_graph() {
        let mut graph = PropertyGraph::new();
        let alice = graph.add_vertex("person").unwrap();
        let bob = graph.add_vertex("person").unwrap();
        let carol = graph.add_vertex("person").unwrap();
        graph.add_edge(alice, "loves", bob).unwrap();
        graph.add_edge(bob, "loves", carol).unwrap();
        graph.add_edge(alice, "dislikes", carol).unwrap();

        let schema = graph.schema_graph("schema").unwrap();
        assert_eq!(schema.name(), "schema");
        assert_eq!(schema.vertex_count(), 1);

        let person = schema.vertices().next().unwrap();
        assert_eq!(person.label(), &Label::new("person"));
        assert_eq!(person.out_degree(), 2);
        assert_eq!(
            schema.get_property(person.id(), COUNT_KEY).unwrap(),
            PropertyValue::Integer(3)
        );

        let loves = schema
            .edges()
            .find(|e| e.has_label("loves"))
            .unwrap();
        assert_eq!(loves.properties().get(COUNT_KEY).unwrap(), &PropertyValue::Integer(2));
    }

    #[test]
    fn test_schema_of_empty_graph() {
        let schema = PropertyGraph::new().schema_graph("empty").unwrap();
        assert_eq!(schema.vertex_count(), 0);
        assert_eq!(schema.edge_count(), 0);
    }
}
