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

//! Streaming enumeration of subgraph monomorphisms from a rule pattern into
//! a diagram.
//!
//! A backtracking search in the VF2 mold: pattern vertices are placed one at
//! a time in a most-constrained-first order, and every placement is checked
//! against the wires already required by earlier placements.  Wire kinds
//! must match exactly, per-kind multiplicities cover parallel wires and
//! self-loops, and only spiders are eligible (boundaries are matched
//! implicitly as the far ends of connecting wires).  Candidates are visited
//! in node-index order, so enumeration is deterministic for a given diagram.
//!
//! The iterator is lazy: the matcher inspects one candidate embedding at a
//! time and stops at the first one that survives its label passes.

use hashbrown::HashSet;
use rustworkx_core::petgraph::graph::NodeIndex;
use rustworkx_core::petgraph::visit::EdgeRef;

use zxopt_diagram::{Diagram, WireKind};

use crate::rule::PatternGraph;

/// Wires required between the vertex being placed and an already-placed one.
struct EdgeRequirement {
    position: usize,
    plain: usize,
    hadamard: usize,
}

struct Frame {
    candidates: Vec<NodeIndex>,
    cursor: usize,
}

pub(crate) struct Monomorphisms<'a> {
    diagram: &'a Diagram,
    /// Pattern vertices in placement order.
    order: Vec<NodeIndex>,
    /// Per placement position: wires back into the already-placed prefix.
    requirements: Vec<Vec<EdgeRequirement>>,
    /// Per placement position: required (plain, hadamard) self-loops.
    loops: Vec<(usize, usize)>,
    /// Per placement position: total pattern degree, used as a cheap prune.
    degrees: Vec<usize>,
    assigned: Vec<Option<NodeIndex>>,
    used: HashSet<NodeIndex>,
    stack: Vec<Frame>,
    exhausted: bool,
}

fn count_pattern_wires(pattern: &PatternGraph, a: NodeIndex, b: NodeIndex, kind: WireKind) -> usize {
    pattern
        .edges(a)
        .filter(|edge| {
            *edge.weight() == kind
                && ((edge.source() == a && edge.target() == b)
                    || (edge.source() == b && edge.target() == a))
        })
        .count()
}

impl<'a> Monomorphisms<'a> {
    pub fn new(pattern: &PatternGraph, diagram: &'a Diagram) -> Self {
        let n = pattern.node_count();

        // Most-constrained-first placement order: prefer vertices with the
        // most wires into the already-ordered prefix, then higher degree.
        let mut order: Vec<NodeIndex> = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        for _ in 0..n {
            let next = pattern
                .node_indices()
                .filter(|v| !placed[v.index()])
                .max_by_key(|&v| {
                    let anchored = pattern
                        .edges(v)
                        .filter(|edge| {
                            let other = if edge.source() == v {
                                edge.target()
                            } else {
                                edge.source()
                            };
                            other != v && placed[other.index()]
                        })
                        .count();
                    let degree = pattern.edges(v).count();
                    (anchored, degree, std::cmp::Reverse(v.index()))
                })
                .expect("pattern vertex available");
            placed[next.index()] = true;
            order.push(next);
        }

        let mut requirements = Vec::with_capacity(n);
        let mut loops = Vec::with_capacity(n);
        let mut degrees = Vec::with_capacity(n);
        for (i, &u) in order.iter().enumerate() {
            let mut reqs = Vec::new();
            for (j, &v) in order.iter().enumerate().take(i) {
                let plain = count_pattern_wires(pattern, u, v, WireKind::Plain);
                let hadamard = count_pattern_wires(pattern, u, v, WireKind::Hadamard);
                if plain + hadamard > 0 {
                    reqs.push(EdgeRequirement {
                        position: j,
                        plain,
                        hadamard,
                    });
                }
            }
            requirements.push(reqs);
            loops.push((
                count_pattern_wires(pattern, u, u, WireKind::Plain),
                count_pattern_wires(pattern, u, u, WireKind::Hadamard),
            ));
            degrees.push(pattern.edges(u).count());
        }

        let stack = if n == 0 {
            Vec::new()
        } else {
            vec![Frame {
                candidates: diagram.spiders().collect(),
                cursor: 0,
            }]
        };

        Monomorphisms {
            diagram,
            order,
            requirements,
            loops,
            degrees,
            assigned: vec![None; n],
            used: HashSet::new(),
            stack,
            exhausted: n == 0,
        }
    }

    fn candidates_for(&self, position: usize) -> Vec<NodeIndex> {
        match self.requirements[position].first() {
            // Anchored vertex: only neighbors of the anchor's image can fit.
            Some(req) => {
                let anchor = self.assigned[req.position].expect("anchor assigned");
                let mut seen = HashSet::new();
                let mut out = Vec::new();
                for (_, other, _) in self.diagram.wires_of(anchor) {
                    if other != anchor && self.diagram.is_spider(other) && seen.insert(other) {
                        out.push(other);
                    }
                }
                out
            }
            // Start of a new pattern component: anything goes.
            None => self.diagram.spiders().collect(),
        }
    }

    fn feasible(&self, position: usize, candidate: NodeIndex) -> bool {
        if self.used.contains(&candidate) || !self.diagram.is_spider(candidate) {
            return false;
        }
        if self.diagram.degree(candidate) < self.degrees[position] {
            return false;
        }
        let (plain_loops, hadamard_loops) = self.loops[position];
        if plain_loops > 0
            && self
                .diagram
                .wire_count_between(candidate, candidate, WireKind::Plain)
                < plain_loops
        {
            return false;
        }
        if hadamard_loops > 0
            && self
                .diagram
                .wire_count_between(candidate, candidate, WireKind::Hadamard)
                < hadamard_loops
        {
            return false;
        }
        for req in &self.requirements[position] {
            let anchor = self.assigned[req.position].expect("anchor assigned");
            if req.plain > 0
                && self
                    .diagram
                    .wire_count_between(candidate, anchor, WireKind::Plain)
                    < req.plain
            {
                return false;
            }
            if req.hadamard > 0
                && self
                    .diagram
                    .wire_count_between(candidate, anchor, WireKind::Hadamard)
                    < req.hadamard
            {
                return false;
            }
        }
        true
    }

    /// Assignment indexed by pattern vertex: `out[pattern.index()]` is the
    /// matched diagram vertex.
    fn emit(&self) -> Vec<NodeIndex> {
        let mut out = vec![NodeIndex::end(); self.order.len()];
        for (position, &pattern_vertex) in self.order.iter().enumerate() {
            out[pattern_vertex.index()] = self.assigned[position].expect("complete assignment");
        }
        out
    }
}

impl<'a> Iterator for Monomorphisms<'a> {
    type Item = Vec<NodeIndex>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let n = self.order.len();
        loop {
            if self.stack.is_empty() {
                self.exhausted = true;
                return None;
            }
            let depth = self.stack.len() - 1;

            // Advance the top frame to its next feasible candidate.
            let mut found = None;
            loop {
                let candidate = {
                    let frame = self.stack.last_mut().expect("stack non-empty");
                    let candidate = frame.candidates.get(frame.cursor).copied();
                    if candidate.is_some() {
                        frame.cursor += 1;
                    }
                    candidate
                };
                match candidate {
                    Some(candidate) => {
                        if self.feasible(depth, candidate) {
                            found = Some(candidate);
                            break;
                        }
                    }
                    None => break,
                }
            }

            match found {
                Some(candidate) => {
                    self.assigned[depth] = Some(candidate);
                    self.used.insert(candidate);
                    if depth + 1 == n {
                        let result = self.emit();
                        self.used.remove(&candidate);
                        self.assigned[depth] = None;
                        return Some(result);
                    }
                    let candidates = self.candidates_for(depth + 1);
                    self.stack.push(Frame {
                        candidates,
                        cursor: 0,
                    });
                }
                None => {
                    self.stack.pop();
                    if let Some(parent) = self.stack.len().checked_sub(1) {
                        if let Some(candidate) = self.assigned[parent].take() {
                            self.used.remove(&candidate);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::PhaseExpr;
    use crate::rule::{ColorClass, FlipCount, RewriteStructure, WireBound};
    use zxopt_diagram::{BoundaryKind, SpiderColor};

    fn pattern_spider(structure: &mut RewriteStructure) -> NodeIndex {
        structure.add_spider(
            ColorClass::Any,
            PhaseExpr::constant(0.0),
            WireBound::Any,
            FlipCount::NONE,
        )
    }

    fn embeddings(structure: &RewriteStructure, diagram: &Diagram) -> Vec<Vec<NodeIndex>> {
        Monomorphisms::new(structure.graph(), diagram).collect()
    }

    #[test]
    fn single_vertex_pattern_skips_boundaries() {
        let mut diagram = Diagram::new();
        let b = diagram.add_boundary(BoundaryKind::Input, 0);
        let s = diagram.add_spider(SpiderColor::Green, 0.0);
        diagram.add_wire(b, s, WireKind::Plain);

        let mut structure = RewriteStructure::new();
        pattern_spider(&mut structure);

        let found = embeddings(&structure, &diagram);
        assert_eq!(found, vec![vec![s]]);
    }

    #[test]
    fn edge_pattern_in_a_path() {
        let mut diagram = Diagram::new();
        let s1 = diagram.add_spider(SpiderColor::Green, 0.0);
        let s2 = diagram.add_spider(SpiderColor::Green, 0.0);
        let s3 = diagram.add_spider(SpiderColor::Green, 0.0);
        diagram.add_wire(s1, s2, WireKind::Plain);
        diagram.add_wire(s2, s3, WireKind::Plain);

        let mut structure = RewriteStructure::new();
        let p1 = pattern_spider(&mut structure);
        let p2 = pattern_spider(&mut structure);
        structure.add_wire(p1, p2, WireKind::Plain);

        // both wires, in both orientations
        let found = embeddings(&structure, &diagram);
        assert_eq!(found.len(), 4);
        for assignment in &found {
            assert_ne!(assignment[0], assignment[1]);
        }
    }

    #[test]
    fn wire_kinds_must_match_exactly() {
        let mut diagram = Diagram::new();
        let s1 = diagram.add_spider(SpiderColor::Green, 0.0);
        let s2 = diagram.add_spider(SpiderColor::Red, 0.0);
        diagram.add_wire(s1, s2, WireKind::Hadamard);

        let mut structure = RewriteStructure::new();
        let p1 = pattern_spider(&mut structure);
        let p2 = pattern_spider(&mut structure);
        structure.add_wire(p1, p2, WireKind::Plain);

        assert!(embeddings(&structure, &diagram).is_empty());

        let mut hadamard_structure = RewriteStructure::new();
        let h1 = pattern_spider(&mut hadamard_structure);
        let h2 = pattern_spider(&mut hadamard_structure);
        hadamard_structure.add_wire(h1, h2, WireKind::Hadamard);

        assert_eq!(embeddings(&hadamard_structure, &diagram).len(), 2);
    }

    #[test]
    fn parallel_wires_need_parallel_images() {
        let mut structure = RewriteStructure::new();
        let p1 = pattern_spider(&mut structure);
        let p2 = pattern_spider(&mut structure);
        structure.add_wire(p1, p2, WireKind::Plain);
        structure.add_wire(p1, p2, WireKind::Plain);

        let mut single = Diagram::new();
        let a = single.add_spider(SpiderColor::Green, 0.0);
        let b = single.add_spider(SpiderColor::Red, 0.0);
        single.add_wire(a, b, WireKind::Plain);
        assert!(embeddings(&structure, &single).is_empty());

        let mut double = single.clone();
        double.add_wire(a, b, WireKind::Plain);
        assert_eq!(embeddings(&structure, &double).len(), 2);
    }

    #[test]
    fn self_loops_are_required() {
        let mut structure = RewriteStructure::new();
        let p = pattern_spider(&mut structure);
        structure.add_wire(p, p, WireKind::Hadamard);

        let mut diagram = Diagram::new();
        let plain_loop = diagram.add_spider(SpiderColor::Green, 0.0);
        diagram.add_wire(plain_loop, plain_loop, WireKind::Plain);
        let hadamard_loop = diagram.add_spider(SpiderColor::Green, 0.0);
        diagram.add_wire(hadamard_loop, hadamard_loop, WireKind::Hadamard);

        let found = embeddings(&structure, &diagram);
        assert_eq!(found, vec![vec![hadamard_loop]]);
    }

    #[test]
    fn assignments_are_injective() {
        let mut structure = RewriteStructure::new();
        pattern_spider(&mut structure);
        pattern_spider(&mut structure);

        let mut diagram = Diagram::new();
        diagram.add_spider(SpiderColor::Green, 0.0);

        assert!(embeddings(&structure, &diagram).is_empty());
    }

    #[test]
    fn extra_diagram_wires_are_tolerated() {
        // a monomorphism, not an induced one: the triangle hosts the edge
        let mut diagram = Diagram::new();
        let s1 = diagram.add_spider(SpiderColor::Green, 0.0);
        let s2 = diagram.add_spider(SpiderColor::Green, 0.0);
        let s3 = diagram.add_spider(SpiderColor::Green, 0.0);
        diagram.add_wire(s1, s2, WireKind::Plain);
        diagram.add_wire(s2, s3, WireKind::Plain);
        diagram.add_wire(s3, s1, WireKind::Plain);

        let mut structure = RewriteStructure::new();
        let p1 = pattern_spider(&mut structure);
        let p2 = pattern_spider(&mut structure);
        structure.add_wire(p1, p2, WireKind::Plain);

        assert_eq!(embeddings(&structure, &diagram).len(), 6);
    }

    #[test]
    fn empty_pattern_never_matches() {
        let structure = RewriteStructure::new();
        let mut diagram = Diagram::new();
        diagram.add_spider(SpiderColor::Green, 0.0);
        assert!(embeddings(&structure, &diagram).is_empty());
    }
}
