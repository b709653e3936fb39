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

//! Housekeeping rules for parallel wires and self-loops between same-color
//! spiders.  They carry the spiders' phases through unchanged (adding pi
//! where a hadamard pair collapses onto a spider), so they apply anywhere.

use std::f64::consts::PI;

use rustworkx_core::petgraph::graph::NodeIndex;

use zxopt_diagram::WireKind;

use crate::expression::{PhaseExpr, VarId};
use crate::rule::{ColorClass, ExternalRouting, FlipCount, RewriteRule, WireBound};

/// Source side shared by the parallel-pair rules: two same-color spiders
/// with free phases joined by the given wire pair.
fn spider_pair(
    rule: &mut RewriteRule,
    first_wire: WireKind,
    second_wire: WireKind,
) -> (NodeIndex, NodeIndex, VarId, VarId) {
    let alpha = rule.fresh_var();
    let beta = rule.fresh_var();
    let s1 = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::Any,
        FlipCount::NONE,
    );
    let s2 = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(beta),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(s1, s2, first_wire);
    rule.source_mut().add_wire(s1, s2, second_wire);
    (s1, s2, alpha, beta)
}

/// Two parallel plain wires between same-color spiders collapse to one.
pub fn parallel_plain_pair() -> RewriteRule {
    let mut rule = RewriteRule::new("parallel-plain-pair");
    let (s1, s2, alpha, beta) = spider_pair(&mut rule, WireKind::Plain, WireKind::Plain);
    let alpha_t = rule.fresh_var();
    let beta_t = rule.fresh_var();

    let t1 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha_t),
        WireBound::Any,
        FlipCount::NONE,
    );
    let t2 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(beta_t),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.target_mut().add_wire(t1, t2, WireKind::Plain);

    rule.map_variable(alpha, alpha_t);
    rule.map_variable(beta, beta_t);
    rule.route(s1, ExternalRouting::To(t1));
    rule.route(s2, ExternalRouting::To(t2));
    rule
}

/// Two parallel hadamard wires between same-color spiders cancel entirely.
pub fn parallel_hadamard_pair() -> RewriteRule {
    let mut rule = RewriteRule::new("parallel-hadamard-pair");
    let (s1, s2, alpha, beta) = spider_pair(&mut rule, WireKind::Hadamard, WireKind::Hadamard);
    let alpha_t = rule.fresh_var();
    let beta_t = rule.fresh_var();

    let t1 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha_t),
        WireBound::Any,
        FlipCount::NONE,
    );
    let t2 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(beta_t),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.map_variable(beta, beta_t);
    rule.route(s1, ExternalRouting::To(t1));
    rule.route(s2, ExternalRouting::To(t2));
    rule
}

/// A plain wire in parallel with a hadamard wire keeps the plain wire and
/// shifts one phase by pi.
pub fn parallel_mixed_pair() -> RewriteRule {
    let mut rule = RewriteRule::new("parallel-mixed-pair");
    let (s1, s2, alpha, beta) = spider_pair(&mut rule, WireKind::Plain, WireKind::Hadamard);
    let alpha_t = rule.fresh_var();
    let beta_t = rule.fresh_var();

    let t1 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::add(PhaseExpr::var(alpha_t), PhaseExpr::constant(PI)),
        WireBound::Any,
        FlipCount::NONE,
    );
    let t2 = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(beta_t),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.target_mut().add_wire(t1, t2, WireKind::Plain);

    rule.map_variable(alpha, alpha_t);
    rule.map_variable(beta, beta_t);
    rule.route(s1, ExternalRouting::To(t1));
    rule.route(s2, ExternalRouting::To(t2));
    rule
}

/// A plain self-loop disappears.
pub fn plain_self_loop() -> RewriteRule {
    let mut rule = RewriteRule::new("plain-self-loop");
    let alpha = rule.fresh_var();
    let alpha_t = rule.fresh_var();

    let s = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(s, s, WireKind::Plain);

    let t = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha_t),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.route(s, ExternalRouting::To(t));
    rule
}

/// A hadamard self-loop disappears, adding pi to the spider's phase.
pub fn hadamard_self_loop() -> RewriteRule {
    let mut rule = RewriteRule::new("hadamard-self-loop");
    let alpha = rule.fresh_var();
    let alpha_t = rule.fresh_var();

    let s = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(s, s, WireKind::Hadamard);

    let t = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::add(PhaseExpr::var(alpha_t), PhaseExpr::constant(PI)),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.route(s, ExternalRouting::To(t));
    rule
}
