// This code is part of Zxopt.
//
// (C) Copyright Zxopt Developers 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

use hashbrown::HashSet;
use itertools::Itertools;
use rustworkx_core::petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use rustworkx_core::petgraph::visit::EdgeRef;

use crate::error::DiagramError;
use crate::{normalize_phase, BoundaryKind, PortIndex, SpiderColor, WireKind};

/// Vertex payload of a ZX-diagram.
///
/// Boundaries are diagram-external ports and must keep degree exactly one;
/// spiders are unrestricted and may carry self-loops and parallel wires.
/// `line` on a spider remembers which qubit line the translator placed it on.
/// It has no algebraic meaning and exists for rendering; rewrites inherit it
/// on a best-effort basis.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagramNode {
    Boundary {
        kind: BoundaryKind,
        port: PortIndex,
    },
    Spider {
        color: SpiderColor,
        phase: f64,
        line: Option<PortIndex>,
    },
}

/// A ZX-diagram: an undirected labelled multigraph of spiders and
/// boundaries connected by plain or Hadamard wires.
///
/// The graph is a `StableUnGraph`, so removing vertices never invalidates
/// the indices of surviving vertices.  The matcher and rewriter rely on that
/// guarantee: they compute vertex sets up front and submit removals as a
/// batch afterwards.
#[derive(Clone, Debug, Default)]
pub struct Diagram {
    graph: StableUnGraph<DiagramNode, WireKind>,
}

impl Diagram {
    pub fn new() -> Self {
        Diagram {
            graph: StableUnGraph::default(),
        }
    }

    // ---------------------------------------------------------------- vertices

    pub fn add_boundary(&mut self, kind: BoundaryKind, port: PortIndex) -> NodeIndex {
        self.graph.add_node(DiagramNode::Boundary { kind, port })
    }

    pub fn remove_boundary(&mut self, vertex: NodeIndex) {
        debug_assert!(self.is_boundary(vertex));
        self.graph.remove_node(vertex);
    }

    pub fn add_spider(&mut self, color: SpiderColor, phase: f64) -> NodeIndex {
        self.add_spider_on_line(color, phase, None)
    }

    pub fn add_spider_on_line(
        &mut self,
        color: SpiderColor,
        phase: f64,
        line: Option<PortIndex>,
    ) -> NodeIndex {
        self.graph.add_node(DiagramNode::Spider {
            color,
            phase: normalize_phase(phase),
            line,
        })
    }

    pub fn remove_spider(&mut self, vertex: NodeIndex) {
        debug_assert!(self.is_spider(vertex));
        self.graph.remove_node(vertex);
    }

    /// Remove a set of vertices along with all their incident wires.
    ///
    /// The batch form exists so callers can collect handles first and delete
    /// afterwards; handles of surviving vertices stay valid throughout.
    pub fn remove_vertices(&mut self, vertices: impl IntoIterator<Item = NodeIndex>) {
        for vertex in vertices {
            self.graph.remove_node(vertex);
        }
    }

    pub fn contains_vertex(&self, vertex: NodeIndex) -> bool {
        self.graph.node_weight(vertex).is_some()
    }

    #[inline]
    pub fn node(&self, vertex: NodeIndex) -> &DiagramNode {
        self.graph
            .node_weight(vertex)
            .expect("vertex not in diagram")
    }

    pub fn is_spider(&self, vertex: NodeIndex) -> bool {
        matches!(self.graph.node_weight(vertex), Some(DiagramNode::Spider { .. }))
    }

    pub fn is_boundary(&self, vertex: NodeIndex) -> bool {
        matches!(
            self.graph.node_weight(vertex),
            Some(DiagramNode::Boundary { .. })
        )
    }

    pub fn is_input(&self, vertex: NodeIndex) -> bool {
        matches!(
            self.graph.node_weight(vertex),
            Some(DiagramNode::Boundary {
                kind: BoundaryKind::Input,
                ..
            })
        )
    }

    pub fn is_output(&self, vertex: NodeIndex) -> bool {
        matches!(
            self.graph.node_weight(vertex),
            Some(DiagramNode::Boundary {
                kind: BoundaryKind::Output,
                ..
            })
        )
    }

    // ---------------------------------------------------------------- spiders

    pub fn spider_color(&self, vertex: NodeIndex) -> SpiderColor {
        match self.node(vertex) {
            DiagramNode::Spider { color, .. } => *color,
            DiagramNode::Boundary { .. } => panic!("boundary vertex has no color"),
        }
    }

    pub fn set_spider_color(&mut self, vertex: NodeIndex, color: SpiderColor) {
        match self.graph.node_weight_mut(vertex) {
            Some(DiagramNode::Spider { color: slot, .. }) => *slot = color,
            _ => panic!("boundary vertex has no color"),
        }
    }

    pub fn spider_phase(&self, vertex: NodeIndex) -> f64 {
        match self.node(vertex) {
            DiagramNode::Spider { phase, .. } => *phase,
            DiagramNode::Boundary { .. } => panic!("boundary vertex has no phase"),
        }
    }

    pub fn set_spider_phase(&mut self, vertex: NodeIndex, phase: f64) {
        match self.graph.node_weight_mut(vertex) {
            Some(DiagramNode::Spider { phase: slot, .. }) => *slot = normalize_phase(phase),
            _ => panic!("boundary vertex has no phase"),
        }
    }

    pub fn add_to_spider_phase(&mut self, vertex: NodeIndex, delta: f64) {
        let phase = self.spider_phase(vertex);
        self.set_spider_phase(vertex, phase + delta);
    }

    pub fn spider_line(&self, vertex: NodeIndex) -> Option<PortIndex> {
        match self.node(vertex) {
            DiagramNode::Spider { line, .. } => *line,
            DiagramNode::Boundary { .. } => None,
        }
    }

    // ---------------------------------------------------------------- wires

    pub fn add_wire(&mut self, a: NodeIndex, b: NodeIndex, kind: WireKind) -> EdgeIndex {
        debug_assert!(self.contains_vertex(a) && self.contains_vertex(b));
        self.graph.add_edge(a, b, kind)
    }

    pub fn remove_wire(&mut self, wire: EdgeIndex) {
        self.graph.remove_edge(wire);
    }

    /// Remove every wire between the two endpoints (parallel wires included).
    pub fn remove_wires_between(&mut self, a: NodeIndex, b: NodeIndex) {
        let wires = self.wires_between(a, b);
        for wire in wires {
            self.graph.remove_edge(wire);
        }
    }

    pub fn wire_kind(&self, wire: EdgeIndex) -> WireKind {
        *self.graph.edge_weight(wire).expect("wire not in diagram")
    }

    pub fn set_wire_kind(&mut self, wire: EdgeIndex, kind: WireKind) {
        *self
            .graph
            .edge_weight_mut(wire)
            .expect("wire not in diagram") = kind;
    }

    pub fn flip_wire_kind(&mut self, wire: EdgeIndex) {
        let kind = self.wire_kind(wire);
        self.set_wire_kind(wire, kind.flipped());
    }

    pub fn wire_endpoints(&self, wire: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.graph
            .edge_endpoints(wire)
            .expect("wire not in diagram")
    }

    pub fn is_self_loop(&self, wire: EdgeIndex) -> bool {
        let (a, b) = self.wire_endpoints(wire);
        a == b
    }

    /// All wires incident to `vertex` as `(wire, other endpoint, kind)`.
    /// A self-loop is reported once, with `other == vertex`.
    pub fn wires_of(
        &self,
        vertex: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, WireKind)> + '_ {
        self.graph.edges(vertex).map(move |edge| {
            let other = if edge.source() == vertex {
                edge.target()
            } else {
                edge.source()
            };
            (edge.id(), other, *edge.weight())
        })
    }

    pub fn wires_between(&self, a: NodeIndex, b: NodeIndex) -> Vec<EdgeIndex> {
        self.graph
            .edges(a)
            .filter(|edge| {
                let (s, t) = (edge.source(), edge.target());
                (s == a && t == b) || (s == b && t == a)
            })
            .map(|edge| edge.id())
            .collect()
    }

    /// Count wires between `a` and `b` of the given kind.  For `a == b` this
    /// counts self-loops, each once.
    pub fn wire_count_between(&self, a: NodeIndex, b: NodeIndex, kind: WireKind) -> usize {
        self.wires_between(a, b)
            .into_iter()
            .filter(|&wire| self.wire_kind(wire) == kind)
            .count()
    }

    /// Number of incident wires; a self-loop counts once.
    pub fn degree(&self, vertex: NodeIndex) -> usize {
        self.graph.edges(vertex).count()
    }

    // ---------------------------------------------------------------- queries

    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_wires(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn wires(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn spiders(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(move |&vertex| self.is_spider(vertex))
    }

    pub fn spiders_with_color(&self, color: SpiderColor) -> Vec<NodeIndex> {
        self.spiders()
            .filter(|&vertex| self.spider_color(vertex) == color)
            .collect()
    }

    pub fn boundaries(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(move |&vertex| self.is_boundary(vertex))
    }

    pub fn boundary_port(&self, vertex: NodeIndex) -> PortIndex {
        match self.node(vertex) {
            DiagramNode::Boundary { port, .. } => *port,
            DiagramNode::Spider { .. } => panic!("spider vertex has no port"),
        }
    }

    /// Input boundaries ordered by port index.
    pub fn inputs(&self) -> Vec<NodeIndex> {
        self.boundaries()
            .filter(|&vertex| self.is_input(vertex))
            .sorted_by_key(|&vertex| self.boundary_port(vertex))
            .collect()
    }

    /// Output boundaries ordered by port index.
    pub fn outputs(&self) -> Vec<NodeIndex> {
        self.boundaries()
            .filter(|&vertex| self.is_output(vertex))
            .sorted_by_key(|&vertex| self.boundary_port(vertex))
            .collect()
    }

    // ---------------------------------------------------------------- checks

    /// Check the structural invariants that every well-formed diagram (and
    /// every diagram produced by a sound rewrite) must satisfy.
    pub fn validate(&self) -> Result<(), DiagramError> {
        let mut seen_inputs: HashSet<PortIndex> = HashSet::new();
        let mut seen_outputs: HashSet<PortIndex> = HashSet::new();
        for vertex in self.graph.node_indices() {
            match self.node(vertex) {
                DiagramNode::Boundary { kind, port } => {
                    let degree = self.degree(vertex);
                    if degree != 1 {
                        return Err(DiagramError::BoundaryDegree {
                            vertex: vertex.index(),
                            degree,
                        });
                    }
                    let seen = match kind {
                        BoundaryKind::Input => &mut seen_inputs,
                        BoundaryKind::Output => &mut seen_outputs,
                    };
                    if !seen.insert(*port) {
                        return Err(DiagramError::DuplicatePort {
                            kind: *kind,
                            port: *port,
                        });
                    }
                }
                DiagramNode::Spider { phase, .. } => {
                    if !phase.is_finite() || *phase < 0.0 || *phase >= std::f64::consts::TAU {
                        return Err(DiagramError::PhaseOutOfRange {
                            vertex: vertex.index(),
                            phase: *phase,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
