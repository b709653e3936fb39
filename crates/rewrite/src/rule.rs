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

//! Rewrite rules: a source and a target pattern graph, the mappings that
//! connect them, and the per-match resolution state.
//!
//! Rules are immutable once built.  Everything a match attempt resolves
//! (phase variables, the colors behind the white/black unknowns) lives in a
//! [`MatchContext`] created per candidate, discarded on reject and consumed
//! by the rewriter on accept.

use hashbrown::HashMap;
use once_cell::sync::OnceCell;
use rustworkx_core::petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};

use zxopt_diagram::{SpiderColor, WireKind};

use crate::error::RewriteError;
use crate::expression::{PhaseExpr, VarBindings, VarId};

/// Color constraint on a pattern spider.
///
/// `White` and `Black` are unknowns: each must resolve to one concrete color
/// across the whole rule, and they must resolve to different colors.  `Any`
/// places no constraint at all.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColorClass {
    Fixed(SpiderColor),
    White,
    Black,
    Any,
}

/// Limit on the number of wires a matched spider may have leaving the
/// matched subgraph.  `AtMost(0)` makes the spider interior.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WireBound {
    Any,
    AtMost(u32),
}

impl WireBound {
    #[inline]
    pub fn allows(self, count: usize) -> bool {
        match self {
            WireBound::Any => true,
            WireBound::AtMost(k) => count <= k as usize,
        }
    }
}

/// How many of a spider's connecting wires toggle plain/hadamard during
/// rewriting.  `All` is what the color-change rule uses: recoloring a spider
/// is the same as flipping every wire attached to it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FlipCount {
    Count(u32),
    All,
}

impl FlipCount {
    pub const NONE: FlipCount = FlipCount::Count(0);

    #[inline]
    pub fn resolve(self, available: usize) -> usize {
        match self {
            FlipCount::All => available,
            FlipCount::Count(n) => (n as usize).min(available),
        }
    }

    fn merge(self, other: FlipCount) -> FlipCount {
        match (self, other) {
            (FlipCount::All, _) | (_, FlipCount::All) => FlipCount::All,
            (FlipCount::Count(a), FlipCount::Count(b)) => FlipCount::Count(a + b),
        }
    }
}

/// Vertex payload of a rule pattern graph.
#[derive(Clone, Debug)]
pub struct PatternSpider {
    pub color: ColorClass,
    pub phase: PhaseExpr,
    pub bound: WireBound,
    pub flips: FlipCount,
}

pub type PatternGraph = UnGraph<PatternSpider, WireKind>;

/// The source or target side of a rewrite rule: a pattern graph whose
/// vertices are all spiders (boundaries are only ever matched implicitly, as
/// the far ends of connecting wires).
#[derive(Clone, Debug, Default)]
pub struct RewriteStructure {
    graph: PatternGraph,
}

impl RewriteStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spider(
        &mut self,
        color: ColorClass,
        phase: PhaseExpr,
        bound: WireBound,
        flips: FlipCount,
    ) -> NodeIndex {
        self.graph.add_node(PatternSpider {
            color,
            phase,
            bound,
            flips,
        })
    }

    pub fn add_wire(&mut self, a: NodeIndex, b: NodeIndex, kind: WireKind) -> EdgeIndex {
        self.graph.add_edge(a, b, kind)
    }

    #[inline]
    pub fn spider(&self, vertex: NodeIndex) -> &PatternSpider {
        &self.graph[vertex]
    }

    pub(crate) fn spider_mut(&mut self, vertex: NodeIndex) -> &mut PatternSpider {
        &mut self.graph[vertex]
    }

    #[inline]
    pub fn graph(&self) -> &PatternGraph {
        &self.graph
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn num_spiders(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn variables(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        for spider in self.graph.node_weights() {
            spider.phase.collect_variables(&mut out);
        }
        out
    }
}

/// Where a source spider's connecting wires are re-homed by a rewrite.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalRouting {
    /// All connecting wires move to this target spider.
    To(NodeIndex),
    /// Connecting wires are distributed over these target spiders in order,
    /// wrapping around.
    RoundRobin(Vec<NodeIndex>),
    /// The spider is absorbed: its connecting wires are joined pairwise with
    /// each other (the identity-removal case).
    Fuse,
}

/// Resolution state of the white/black color unknowns during one match
/// attempt.
#[derive(Clone, Debug, Default)]
pub struct ColorBindings {
    white: Option<SpiderColor>,
    black: Option<SpiderColor>,
}

impl ColorBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a diagram color is assignable to the given class,
    /// recording the assignment for the unknown classes.
    pub fn bind(&mut self, class: ColorClass, color: SpiderColor) -> bool {
        match class {
            ColorClass::Fixed(fixed) => fixed == color,
            ColorClass::Any => true,
            ColorClass::White => {
                if self.black == Some(color) {
                    return false;
                }
                match self.white {
                    None => {
                        self.white = Some(color);
                        true
                    }
                    Some(bound) => bound == color,
                }
            }
            ColorClass::Black => {
                if self.white == Some(color) {
                    return false;
                }
                match self.black {
                    None => {
                        self.black = Some(color);
                        true
                    }
                    Some(bound) => bound == color,
                }
            }
        }
    }

    /// Concrete color for a target spider's class.  If only one of the two
    /// unknowns was bound during matching, the other resolves to the
    /// opposite color (spider colors form a two-element set).
    pub fn resolve(&self, class: ColorClass) -> Result<SpiderColor, RewriteError> {
        match class {
            ColorClass::Fixed(fixed) => Ok(fixed),
            ColorClass::White => self
                .white
                .or(self.black.map(SpiderColor::opposite))
                .ok_or(RewriteError::UnresolvedColorClass("white")),
            ColorClass::Black => self
                .black
                .or(self.white.map(SpiderColor::opposite))
                .ok_or(RewriteError::UnresolvedColorClass("black")),
            ColorClass::Any => Err(RewriteError::UnresolvedColorClass("any")),
        }
    }
}

/// Scoped state of one match attempt: phase-variable resolutions plus color
/// unknowns.
#[derive(Clone, Debug)]
pub struct MatchContext {
    pub vars: VarBindings,
    pub colors: ColorBindings,
}

impl MatchContext {
    pub fn new(rule: &RewriteRule) -> Self {
        MatchContext {
            vars: VarBindings::new(rule.var_count()),
            colors: ColorBindings::new(),
        }
    }
}

/// A rewrite rule: source and target structures, the variable mapping that
/// transfers matched phases, and the routing of connecting wires.
pub struct RewriteRule {
    name: String,
    source: RewriteStructure,
    target: RewriteStructure,
    variable_map: Vec<(VarId, VarId)>,
    routing: HashMap<NodeIndex, ExternalRouting>,
    var_count: u32,
    matchable: bool,
    self_inverse: bool,
    inverse: OnceCell<Box<RewriteRule>>,
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("variable_map", &self.variable_map)
            .field("matchable", &self.matchable)
            .finish()
    }
}

impl RewriteRule {
    pub fn new(name: impl Into<String>) -> Self {
        RewriteRule {
            name: name.into(),
            source: RewriteStructure::new(),
            target: RewriteStructure::new(),
            variable_map: Vec::new(),
            routing: HashMap::new(),
            var_count: 0,
            matchable: true,
            self_inverse: false,
            inverse: OnceCell::new(),
        }
    }

    /// Placeholder for a rule that cannot be applied; the matcher rejects it
    /// without searching.
    fn refusing(name: String) -> Self {
        let mut rule = RewriteRule::new(name);
        rule.matchable = false;
        rule
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &RewriteStructure {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut RewriteStructure {
        &mut self.source
    }

    pub fn target(&self) -> &RewriteStructure {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut RewriteStructure {
        &mut self.target
    }

    pub fn is_matchable(&self) -> bool {
        self.matchable
    }

    pub fn var_count(&self) -> u32 {
        self.var_count
    }

    /// Allocate a phase variable.  Source and target share the namespace.
    pub fn fresh_var(&mut self) -> VarId {
        let id = VarId(self.var_count);
        self.var_count += 1;
        id
    }

    /// Record that `target` receives the value matched for `source` when a
    /// rewrite fires.
    pub fn map_variable(&mut self, source: VarId, target: VarId) {
        self.variable_map.push((source, target));
    }

    pub fn variable_map(&self) -> &[(VarId, VarId)] {
        &self.variable_map
    }

    /// Declare where the connecting wires of a source spider go.
    pub fn route(&mut self, source: NodeIndex, routing: ExternalRouting) {
        if let ExternalRouting::RoundRobin(targets) = &routing {
            debug_assert!(!targets.is_empty(), "round-robin routing needs targets");
        }
        self.routing.insert(source, routing);
    }

    pub fn routing_of(&self, source: NodeIndex) -> Option<&ExternalRouting> {
        self.routing.get(&source)
    }

    /// Declare this rule structurally self-inverse (pi-commutation, color
    /// change): `inverse()` then returns the rule itself.
    pub fn mark_self_inverse(&mut self) {
        self.self_inverse = true;
    }

    /// A rule is algebraically invertible when its target is non-trivial and
    /// none of its source phases is an expression a match cannot invert.
    pub fn is_invertible(&self) -> bool {
        self.matchable
            && !self.target.is_empty()
            && self
                .source
                .graph()
                .node_weights()
                .all(|spider| !spider.phase.has_variable_binop())
    }

    /// This rule's inverse, built lazily on first request.
    ///
    /// Rules that are not algebraically invertible yield a placeholder that
    /// refuses to match.  (Inverses whose source phases are variable-bearing
    /// binary operations refuse at match time instead, because such an
    /// expression never unifies with a concrete phase.)
    pub fn inverse(&self) -> &RewriteRule {
        if self.self_inverse {
            return self;
        }
        self.inverse.get_or_init(|| Box::new(self.build_inverse()))
    }

    fn build_inverse(&self) -> RewriteRule {
        let name = format!("{}-inverse", self.name);
        if !self.is_invertible() {
            return RewriteRule::refusing(name);
        }

        let mut inverse = RewriteRule {
            name,
            source: self.target.clone(),
            target: self.source.clone(),
            variable_map: self
                .variable_map
                .iter()
                .map(|&(source, target)| (target, source))
                .collect(),
            routing: HashMap::new(),
            var_count: self.var_count,
            matchable: true,
            self_inverse: false,
            inverse: OnceCell::new(),
        };

        for vertex in self.target.vertices() {
            let preimages: Vec<NodeIndex> = self
                .source
                .vertices()
                .filter(|source| match self.routing.get(source) {
                    Some(ExternalRouting::To(target)) => *target == vertex,
                    Some(ExternalRouting::RoundRobin(targets)) => targets.contains(&vertex),
                    _ => false,
                })
                .collect();

            let routing = match preimages.as_slice() {
                [] => ExternalRouting::Fuse,
                [only] => ExternalRouting::To(*only),
                _ => ExternalRouting::RoundRobin(preimages.clone()),
            };
            inverse.routing.insert(vertex, routing);

            // Flip counts travel with the routing so that wire-flipping
            // rules keep flipping on the way back.
            let flips = preimages
                .iter()
                .map(|&source| self.source.spider(source).flips)
                .fold(FlipCount::NONE, FlipCount::merge);
            inverse.source.spider_mut(vertex).flips = flips;
        }

        inverse
    }
}
