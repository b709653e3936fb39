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

//! Splicing a rule's target structure into a diagram in place of a matched
//! source occurrence.
//!
//! The order of operations is load-bearing: target vertices are created
//! before any source vertex is deleted, so the vertex handles recorded in
//! the match stay valid until the final batch removal.  Every fallible step
//! (variable propagation, color resolution, phase evaluation) happens before
//! the first graph mutation, so a failure leaves the diagram untouched.

use hashbrown::HashMap;
use indexmap::IndexMap;
use itertools::Itertools;
use log::trace;
use rustworkx_core::petgraph::graph::NodeIndex;
use rustworkx_core::petgraph::visit::EdgeRef;

use zxopt_diagram::{Diagram, PortIndex, SpiderColor, WireKind};

use crate::error::RewriteError;
use crate::matcher::RuleMatch;
use crate::rule::{ExternalRouting, RewriteRule};

/// Apply `rule` at the occurrence described by `record`: excise the matched
/// vertices, build the target structure, and re-home every connecting wire.
/// Returns the record for observability (its vertex handles refer to the
/// excised region afterwards).
pub fn apply(
    diagram: &mut Diagram,
    rule: &RewriteRule,
    record: RuleMatch,
) -> Result<RuleMatch, RewriteError> {
    let RuleMatch {
        assignment,
        externals,
        mut context,
    } = record;

    // Transfer matched variable values from the source side to the target
    // side of the rule's variable namespace.
    for &(source_var, target_var) in rule.variable_map() {
        let value = context
            .vars
            .get(source_var)
            .ok_or(RewriteError::UnresolvedExpression(source_var.0))?;
        context.vars.resolve(target_var, value);
    }

    // Plan every target spider before touching the graph; this is where all
    // remaining failures can happen.
    let target = rule.target();
    let mut planned: Vec<(NodeIndex, SpiderColor, f64, Option<PortIndex>)> =
        Vec::with_capacity(target.num_spiders());
    for vertex in target.vertices() {
        let spider = target.spider(vertex);
        let color = context.colors.resolve(spider.color)?;
        let phase = spider.phase.evaluate(&context.vars)?;
        let line = inherited_line(diagram, rule, &assignment, vertex);
        planned.push((vertex, color, phase, line));
    }

    // Build the target: spiders first, then its interior wires.
    let mut target_to_diagram: HashMap<NodeIndex, NodeIndex> =
        HashMap::with_capacity(planned.len());
    for (vertex, color, phase, line) in planned {
        let created = diagram.add_spider_on_line(color, phase, line);
        target_to_diagram.insert(vertex, created);
    }
    for edge in target.graph().edge_references() {
        diagram.add_wire(
            target_to_diagram[&edge.source()],
            target_to_diagram[&edge.target()],
            *edge.weight(),
        );
    }

    // Re-home the connecting wires.
    for (source_vertex, neighbors) in &externals {
        let routing = rule
            .routing_of(*source_vertex)
            .expect("every source vertex carries a connecting-wire routing");
        match routing {
            ExternalRouting::To(target_vertex) => {
                let home = target_to_diagram[target_vertex];
                for neighbor in neighbors {
                    diagram.add_wire(
                        home,
                        neighbor.neighbor,
                        WireKind::from_hadamard(neighbor.hadamard ^ neighbor.flip),
                    );
                }
            }
            ExternalRouting::RoundRobin(targets) => {
                for (i, neighbor) in neighbors.iter().enumerate() {
                    let home = target_to_diagram[&targets[i % targets.len()]];
                    diagram.add_wire(
                        home,
                        neighbor.neighbor,
                        WireKind::from_hadamard(neighbor.hadamard ^ neighbor.flip),
                    );
                }
            }
            ExternalRouting::Fuse => {
                // The absorbed spider acted as the identity between its
                // neighbors: join them pairwise.
                for (a, b) in neighbors.iter().tuple_combinations() {
                    diagram.add_wire(
                        a.neighbor,
                        b.neighbor,
                        WireKind::from_hadamard(a.hadamard ^ a.flip ^ b.hadamard ^ b.flip),
                    );
                }
            }
        }
    }

    // Excise the matched region; interior wires and the consumed connecting
    // wires die with their endpoints.
    diagram.remove_vertices(assignment.values().copied());
    trace!(
        "rule {} rewrote {} vertices into {}",
        rule.name(),
        assignment.len(),
        target_to_diagram.len()
    );

    Ok(RuleMatch {
        assignment,
        externals,
        context,
    })
}

/// Qubit line for a new target spider, inherited from any source spider
/// whose connecting wires route to it.
fn inherited_line(
    diagram: &Diagram,
    rule: &RewriteRule,
    assignment: &IndexMap<NodeIndex, NodeIndex>,
    target_vertex: NodeIndex,
) -> Option<PortIndex> {
    for (source_vertex, matched) in assignment {
        let routed = match rule.routing_of(*source_vertex) {
            Some(ExternalRouting::To(target)) => *target == target_vertex,
            Some(ExternalRouting::RoundRobin(targets)) => targets.contains(&target_vertex),
            _ => false,
        };
        if routed {
            return diagram.spider_line(*matched);
        }
    }
    None
}
