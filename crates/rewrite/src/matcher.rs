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

//! Finding occurrences of a rule's source structure in a diagram.
//!
//! The monomorphism enumerator proposes embeddings lazily; each candidate is
//! then checked against the algebraic side-conditions with a fresh
//! [`MatchContext`]: color classes, phase expressions, and connecting-wire
//! bounds.  The first surviving candidate wins.

use hashbrown::HashSet;
use indexmap::IndexMap;
use log::trace;
use rustworkx_core::petgraph::graph::{EdgeIndex, NodeIndex};
use smallvec::SmallVec;

use zxopt_diagram::Diagram;

use crate::error::RewriteError;
use crate::isomorphism::Monomorphisms;
use crate::rewriter;
use crate::rule::{MatchContext, RewriteRule, RewriteStructure};

/// A wire of the matched region whose far endpoint lies outside it.  The
/// rewriter re-homes these; `hadamard ^ flip` decides the kind of each
/// replacement wire.
#[derive(Copy, Clone, Debug)]
pub struct ConnectingNeighbor {
    pub wire: EdgeIndex,
    pub neighbor: NodeIndex,
    pub hadamard: bool,
    pub flip: bool,
}

pub(crate) type NeighborList = SmallVec<[ConnectingNeighbor; 4]>;

/// A resolved occurrence of a rule source in a diagram: the vertex
/// assignment, the connecting wires collected per source vertex, and the
/// context holding every variable and color resolved along the way.
#[derive(Clone, Debug)]
pub struct RuleMatch {
    pub(crate) assignment: IndexMap<NodeIndex, NodeIndex>,
    pub(crate) externals: IndexMap<NodeIndex, NeighborList>,
    pub(crate) context: MatchContext,
}

impl RuleMatch {
    /// The diagram vertex a source vertex was matched to.
    pub fn image_of(&self, source: NodeIndex) -> Option<NodeIndex> {
        self.assignment.get(&source).copied()
    }

    /// The matched diagram vertices, in source-vertex order.
    pub fn image(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.assignment.values().copied()
    }

    pub fn externals_of(&self, source: NodeIndex) -> &[ConnectingNeighbor] {
        self.externals
            .get(&source)
            .map(|neighbors| neighbors.as_slice())
            .unwrap_or(&[])
    }

    pub fn context(&self) -> &MatchContext {
        &self.context
    }
}

/// Search `diagram` for an occurrence of `rule`'s source.  Purely a probe:
/// the diagram is untouched and the returned match carries all resolution
/// state.
pub fn find_match(diagram: &Diagram, rule: &RewriteRule) -> Option<RuleMatch> {
    if !rule.is_matchable() {
        return None;
    }
    let source = rule.source();
    let mut checked = 0usize;
    for assignment in Monomorphisms::new(source.graph(), diagram) {
        checked += 1;
        let mut context = MatchContext::new(rule);
        if !colors_match(diagram, source, &assignment, &mut context) {
            continue;
        }
        if !phases_match(diagram, source, &assignment, &mut context) {
            continue;
        }
        let Some(externals) = collect_connecting_wires(diagram, source, &assignment) else {
            continue;
        };
        trace!(
            "rule {} matched after {} candidate embeddings",
            rule.name(),
            checked
        );
        let assignment = source
            .vertices()
            .map(|vertex| (vertex, assignment[vertex.index()]))
            .collect();
        return Some(RuleMatch {
            assignment,
            externals,
            context,
        });
    }
    trace!(
        "rule {} found no match ({} candidate embeddings)",
        rule.name(),
        checked
    );
    None
}

/// Find a match and, if there is one, immediately apply the rule, returning
/// the match record of the rewrite that happened.
pub fn rewrite_first(
    diagram: &mut Diagram,
    rule: &RewriteRule,
) -> Result<Option<RuleMatch>, RewriteError> {
    match find_match(diagram, rule) {
        Some(found) => rewriter::apply(diagram, rule, found).map(Some),
        None => Ok(None),
    }
}

fn colors_match(
    diagram: &Diagram,
    source: &RewriteStructure,
    assignment: &[NodeIndex],
    context: &mut MatchContext,
) -> bool {
    source.vertices().all(|vertex| {
        let color = diagram.spider_color(assignment[vertex.index()]);
        context.colors.bind(source.spider(vertex).color, color)
    })
}

fn phases_match(
    diagram: &Diagram,
    source: &RewriteStructure,
    assignment: &[NodeIndex],
    context: &mut MatchContext,
) -> bool {
    source.vertices().all(|vertex| {
        let phase = diagram.spider_phase(assignment[vertex.index()]);
        source
            .spider(vertex)
            .phase
            .matches(phase, &mut context.vars)
    })
}

/// Collect, per source vertex, the wires leaving the matched region, and
/// check them against the vertex's connecting-wire bound.  Wires to other
/// matched vertices and self-loops are interior; they are consumed when the
/// region is excised.
fn collect_connecting_wires(
    diagram: &Diagram,
    source: &RewriteStructure,
    assignment: &[NodeIndex],
) -> Option<IndexMap<NodeIndex, NeighborList>> {
    let image: HashSet<NodeIndex> = assignment.iter().copied().collect();
    let mut externals = IndexMap::with_capacity(source.num_spiders());
    for vertex in source.vertices() {
        let matched = assignment[vertex.index()];
        let mut neighbors = NeighborList::new();
        for (wire, other, kind) in diagram.wires_of(matched) {
            if other == matched || image.contains(&other) {
                continue;
            }
            neighbors.push(ConnectingNeighbor {
                wire,
                neighbor: other,
                hadamard: kind.is_hadamard(),
                flip: false,
            });
        }

        let spider = source.spider(vertex);
        if !spider.bound.allows(neighbors.len()) {
            return None;
        }
        let flips = spider.flips.resolve(neighbors.len());
        for neighbor in &mut neighbors[..flips] {
            neighbor.flip = true;
        }
        externals.insert(vertex, neighbors);
    }
    Some(externals)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::rules::{bialgebra, hopf_law, identity_removal, pi_commutation, spider_fusion};
    use crate::testing::three_spider_diagram;
    use zxopt_diagram::{SpiderColor, WireKind};

    use SpiderColor::{Green, Red};

    #[test]
    fn fusion_needs_two_spiders_of_one_color() {
        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.5 * PI, Red), (0.25 * PI, Red)],
            [false; 4],
        );
        assert!(find_match(&diagram, &spider_fusion()).is_some());

        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Red), (0.5 * PI, Red), (0.25 * PI, Green)],
            [false; 4],
        );
        assert!(find_match(&diagram, &spider_fusion()).is_some());

        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.5 * PI, Red), (0.25 * PI, Green)],
            [false; 4],
        );
        assert!(find_match(&diagram, &spider_fusion()).is_none());
    }

    #[test]
    fn fusion_resolves_matched_phases() {
        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.5 * PI, Red), (0.25 * PI, Red)],
            [false; 4],
        );
        let rule = spider_fusion();
        let found = find_match(&diagram, &rule).unwrap();

        // the two red spiders matched; their phases resolved the variables
        let mut phases: Vec<f64> = found
            .image()
            .map(|vertex| diagram.spider_phase(vertex))
            .collect();
        phases.sort_by(f64::total_cmp);
        assert_eq!(phases, vec![0.25 * PI, 0.5 * PI]);
    }

    #[test]
    fn identity_removal_needs_phase_zero_and_degree_two() {
        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.0, Red), (1.0 * PI, Green)],
            [false; 4],
        );
        assert!(find_match(&diagram, &identity_removal()).is_some());

        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (1.0 * PI, Red), (0.0, Red)],
            [false; 4],
        );
        assert!(find_match(&diagram, &identity_removal()).is_some());

        // no spider carries phase 0
        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (1.0 * PI, Red), (0.1 * PI, Red)],
            [false; 4],
        );
        assert!(find_match(&diagram, &identity_removal()).is_none());
    }

    #[test]
    fn identity_removal_rejects_a_third_connecting_wire() {
        let (mut diagram, vertices) = three_spider_diagram(
            [(1.0 * PI, Red), (0.0, Red), (0.1 * PI, Red)],
            [false; 4],
        );
        let s4 = diagram.add_spider(Red, 0.5 * PI);
        diagram.add_wire(vertices.s2, s4, WireKind::Plain);

        assert!(find_match(&diagram, &identity_removal()).is_none());
    }

    #[test]
    fn probing_is_repeatable() {
        // state from one probe must never leak into the next
        let (diagram, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.5 * PI, Red), (0.25 * PI, Red)],
            [false; 4],
        );
        let rule = spider_fusion();
        let first = find_match(&diagram, &rule).unwrap();
        let second = find_match(&diagram, &rule).unwrap();
        assert_eq!(first.assignment, second.assignment);

        let (no_match, _) = three_spider_diagram(
            [(1.0 * PI, Green), (0.5 * PI, Red), (0.25 * PI, Green)],
            [false; 4],
        );
        assert!(find_match(&no_match, &rule).is_none());
        assert_eq!(find_match(&diagram, &rule).unwrap().assignment, first.assignment);
    }

    #[test]
    fn connecting_wires_are_recorded_with_their_kinds() {
        let (diagram, vertices) = three_spider_diagram(
            [(0.3 * PI, Green), (0.0, Red), (0.7 * PI, Red)],
            [true, true, false, false],
        );
        let rule = identity_removal();
        let found = find_match(&diagram, &rule).unwrap();

        let source_vertex = rule.source().vertices().next().unwrap();
        assert_eq!(found.image_of(source_vertex), Some(vertices.s2));
        let externals = found.externals_of(source_vertex);
        assert_eq!(externals.len(), 2);
        let hadamards: Vec<bool> = externals.iter().map(|n| n.hadamard).collect();
        assert!(hadamards.contains(&true) && hadamards.contains(&false));
        assert!(externals.iter().all(|n| !n.flip));
    }

    #[test]
    fn pi_commutation_binds_the_free_phase() {
        let mut diagram = Diagram::new();
        let g = diagram.add_spider(Green, 0.3 * PI);
        let r = diagram.add_spider(Red, PI);
        diagram.add_wire(g, r, WireKind::Plain);
        let b_in = diagram.add_boundary(zxopt_diagram::BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(zxopt_diagram::BoundaryKind::Output, 0);
        diagram.add_wire(b_in, g, WireKind::Plain);
        diagram.add_wire(r, b_out, WireKind::Plain);

        let rule = pi_commutation();
        let found = find_match(&diagram, &rule).unwrap();
        // the free side must have matched the green spider
        assert!(found.image().any(|vertex| vertex == g));
    }

    #[test]
    fn hopf_needs_a_parallel_pair_of_opposite_colors() {
        let mut diagram = Diagram::new();
        let g = diagram.add_spider(Green, 0.2);
        let r = diagram.add_spider(Red, 1.2);
        diagram.add_wire(g, r, WireKind::Plain);
        assert!(find_match(&diagram, &hopf_law()).is_none());

        diagram.add_wire(g, r, WireKind::Plain);
        assert!(find_match(&diagram, &hopf_law()).is_some());

        // same colors never satisfy the white/black unknowns
        let mut same = Diagram::new();
        let g1 = same.add_spider(Green, 0.0);
        let g2 = same.add_spider(Green, 0.0);
        same.add_wire(g1, g2, WireKind::Plain);
        same.add_wire(g1, g2, WireKind::Plain);
        assert!(find_match(&same, &hopf_law()).is_none());
    }

    #[test]
    fn bialgebra_matches_the_complete_bipartite_square() {
        let mut diagram = Diagram::new();
        let g1 = diagram.add_spider(Green, 0.0);
        let g2 = diagram.add_spider(Green, 0.0);
        let r1 = diagram.add_spider(Red, 0.0);
        let r2 = diagram.add_spider(Red, 0.0);
        for &g in &[g1, g2] {
            for &r in &[r1, r2] {
                diagram.add_wire(g, r, WireKind::Plain);
            }
        }
        assert!(find_match(&diagram, &bialgebra()).is_some());

        // remove one wire of the square: no match
        let wire = diagram.wires_between(g1, r1)[0];
        diagram.remove_wire(wire);
        assert!(find_match(&diagram, &bialgebra()).is_none());
    }
}
