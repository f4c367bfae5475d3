use std::collections::BTreeMap;

use crate::error::{PlanarizationError, TopologyError};

/// Abstract input graph: a set of vertex ids plus an undirected edge list.
/// Geometry-free; everything the pipeline produces lives in the layout
/// result, never here.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub vertices: BTreeMap<u32, Vertex>,
    pub edges: Vec<Edge>,
    /// Caller-supplied combinatorial embedding. When present the embedder
    /// materializes it verbatim instead of computing its own.
    pub rotation: Option<RotationSystem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    pub id: u32,
}

/// Undirected edge between two vertex ids. Parallel edges and self-loops
/// are accepted here and canonicalized during embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub u: u32,
    pub v: u32,
}

impl Edge {
    pub fn other(&self, id: u32) -> u32 {
        if self.u == id { self.v } else { self.u }
    }
}

/// Per-vertex cyclic order of incident edges, counter-clockwise, given as
/// indices into `Graph::edges`. A self-loop appears twice in its vertex's
/// list, once per loop end.
#[derive(Debug, Clone, Default)]
pub struct RotationSystem {
    pub order: BTreeMap<u32, Vec<usize>>,
}

impl RotationSystem {
    /// Every vertex must list exactly its incident edges (with loop ends
    /// counted twice), otherwise the rotation cannot describe an embedding.
    pub fn validate(&self, graph: &Graph) -> Result<(), PlanarizationError> {
        for (&vid, _) in &graph.vertices {
            let mut expected: BTreeMap<usize, usize> = BTreeMap::new();
            for (idx, edge) in graph.edges.iter().enumerate() {
                let mut count = 0;
                if edge.u == vid {
                    count += 1;
                }
                if edge.v == vid {
                    count += 1;
                }
                if count > 0 {
                    expected.insert(idx, count);
                }
            }
            let listed = self.order.get(&vid).map(Vec::as_slice).unwrap_or(&[]);
            let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
            for &idx in listed {
                *seen.entry(idx).or_insert(0) += 1;
            }
            if seen != expected {
                return Err(PlanarizationError::InvalidRotation { vertex: vid });
            }
        }
        Ok(())
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_vertex(&mut self, id: u32) {
        self.vertices.entry(id).or_insert(Vertex { id });
    }

    /// Adds an undirected edge, creating missing endpoints, and returns its
    /// index in the edge list.
    pub fn add_edge(&mut self, u: u32, v: u32) -> usize {
        self.ensure_vertex(u);
        self.ensure_vertex(v);
        self.edges.push(Edge { u, v });
        self.edges.len() - 1
    }

    /// Builds a graph from an edge list alone.
    pub fn from_edges(edges: &[(u32, u32)]) -> Self {
        let mut graph = Self::new();
        for &(u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }

    /// Checks that every edge endpoint names a known vertex.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (idx, edge) in self.edges.iter().enumerate() {
            for endpoint in [edge.u, edge.v] {
                if !self.vertices.contains_key(&endpoint) {
                    return Err(TopologyError::UnknownEndpoint {
                        edge: idx,
                        vertex: endpoint,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_creates_endpoints() {
        let graph = Graph::from_edges(&[(0, 1), (1, 2)]);
        assert_eq!(graph.vertices.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_endpoint() {
        let mut graph = Graph::from_edges(&[(0, 1)]);
        graph.edges.push(Edge { u: 0, v: 9 });
        assert!(matches!(
            graph.validate(),
            Err(TopologyError::UnknownEndpoint { edge: 1, vertex: 9 })
        ));
    }

    #[test]
    fn rotation_validation_counts_loop_ends_twice() {
        let mut graph = Graph::new();
        graph.add_edge(0, 1);
        graph.add_edge(0, 0);
        let mut rotation = RotationSystem::default();
        rotation.order.insert(0, vec![0, 1, 1]);
        rotation.order.insert(1, vec![0]);
        assert!(rotation.validate(&graph).is_ok());

        rotation.order.insert(0, vec![0, 1]);
        assert!(matches!(
            rotation.validate(&graph),
            Err(PlanarizationError::InvalidRotation { vertex: 0 })
        ));
    }
}
