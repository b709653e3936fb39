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

//! The ZX-calculus rules proper.
//!
//! Every rule is written with the white/black color unknowns, so each one
//! covers both concrete colorings at once.  White and black always resolve
//! to different colors within one match.

use std::f64::consts::PI;

use zxopt_diagram::WireKind;

use crate::expression::PhaseExpr;
use crate::rule::{ColorClass, ExternalRouting, FlipCount, RewriteRule, WireBound};

/// Spider fusion (S1): two connected spiders of one color merge, adding
/// their phases.
pub fn spider_fusion() -> RewriteRule {
    let mut rule = RewriteRule::new("spider-fusion");
    let alpha = rule.fresh_var();
    let beta = rule.fresh_var();
    let alpha_t = rule.fresh_var();
    let beta_t = rule.fresh_var();

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
    rule.source_mut().add_wire(s1, s2, WireKind::Plain);

    let fused = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::add(PhaseExpr::var(alpha_t), PhaseExpr::var(beta_t)),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.map_variable(beta, beta_t);
    rule.route(s1, ExternalRouting::To(fused));
    rule.route(s2, ExternalRouting::To(fused));
    rule
}

/// Identity removal (S2): a phase-0 spider with two connecting wires drops
/// out; the wires fuse, XOR-ing their hadamard flags.
pub fn identity_removal() -> RewriteRule {
    let mut rule = RewriteRule::new("identity-removal");
    let s = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::constant(0.0),
        WireBound::AtMost(2),
        FlipCount::NONE,
    );
    rule.route(s, ExternalRouting::Fuse);
    rule
}

/// The bialgebra law: the complete bipartite square of two phase-0 spider
/// pairs of opposite colors contracts to a single wire.
///
/// The connecting wires cross colors: the externals held by the white pair
/// re-home to the new black spider and vice versa.  (Routing them to the
/// same-color survivor reads more naturally but denotes a different map;
/// the oracle rejects it.)
pub fn bialgebra() -> RewriteRule {
    let mut rule = RewriteRule::new("bialgebra");
    let zero = || PhaseExpr::constant(0.0);

    let w1 = rule.source_mut().add_spider(
        ColorClass::White,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let w2 = rule.source_mut().add_spider(
        ColorClass::White,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let b1 = rule.source_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let b2 = rule.source_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    for white in [w1, w2] {
        for black in [b1, b2] {
            rule.source_mut().add_wire(white, black, WireKind::Plain);
        }
    }

    let white_t = rule.target_mut().add_spider(
        ColorClass::White,
        zero(),
        WireBound::AtMost(2),
        FlipCount::NONE,
    );
    let black_t = rule.target_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(2),
        FlipCount::NONE,
    );
    rule.target_mut().add_wire(white_t, black_t, WireKind::Plain);

    rule.route(w1, ExternalRouting::To(black_t));
    rule.route(w2, ExternalRouting::To(black_t));
    rule.route(b1, ExternalRouting::To(white_t));
    rule.route(b2, ExternalRouting::To(white_t));
    rule
}

/// Pi-commutation: a pi spider pushes through a spider of the other color,
/// negating its phase.
pub fn pi_commutation() -> RewriteRule {
    let mut rule = RewriteRule::new("pi-commutation");
    let alpha = rule.fresh_var();
    let alpha_t = rule.fresh_var();

    let free = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let pi = rule.source_mut().add_spider(
        ColorClass::Black,
        PhaseExpr::constant(PI),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(free, pi, WireKind::Plain);

    let pi_t = rule.target_mut().add_spider(
        ColorClass::Black,
        PhaseExpr::constant(PI),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let negated_t = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::neg(PhaseExpr::var(alpha_t)),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    rule.target_mut().add_wire(pi_t, negated_t, WireKind::Plain);

    rule.map_variable(alpha, alpha_t);
    // the pi spider swaps sides: the free spider's wire now feeds the pi
    rule.route(free, ExternalRouting::To(pi_t));
    rule.route(pi, ExternalRouting::To(negated_t));
    rule.mark_self_inverse();
    rule
}

/// Color change: recoloring a spider toggles the hadamard flag of every
/// wire attached to it; the phase is untouched.
pub fn color_change() -> RewriteRule {
    let mut rule = RewriteRule::new("color-change");
    let alpha = rule.fresh_var();
    let alpha_t = rule.fresh_var();

    let s = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::Any,
        FlipCount::All,
    );
    let t = rule.target_mut().add_spider(
        ColorClass::Black,
        PhaseExpr::var(alpha_t),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.route(s, ExternalRouting::To(t));
    rule.mark_self_inverse();
    rule
}

/// The copy rule: a phase-0 state of one color copies through a phase-0
/// spider of the other color, one copy per connecting wire.
pub fn state_copy() -> RewriteRule {
    let mut rule = RewriteRule::new("state-copy");
    let zero = || PhaseExpr::constant(0.0);

    let state = rule.source_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(0),
        FlipCount::NONE,
    );
    let hub = rule.source_mut().add_spider(
        ColorClass::White,
        zero(),
        WireBound::AtMost(2),
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(state, hub, WireKind::Plain);

    let copy1 = rule.target_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );
    let copy2 = rule.target_mut().add_spider(
        ColorClass::Black,
        zero(),
        WireBound::AtMost(1),
        FlipCount::NONE,
    );

    rule.route(hub, ExternalRouting::RoundRobin(vec![copy1, copy2]));
    rule.route(state, ExternalRouting::Fuse);
    rule
}

/// The Hopf law: a parallel pair of plain wires between spiders of opposite
/// colors cancels.
pub fn hopf_law() -> RewriteRule {
    let mut rule = RewriteRule::new("hopf");
    let alpha = rule.fresh_var();
    let beta = rule.fresh_var();
    let alpha_t = rule.fresh_var();
    let beta_t = rule.fresh_var();

    let white = rule.source_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha),
        WireBound::Any,
        FlipCount::NONE,
    );
    let black = rule.source_mut().add_spider(
        ColorClass::Black,
        PhaseExpr::var(beta),
        WireBound::Any,
        FlipCount::NONE,
    );
    rule.source_mut().add_wire(white, black, WireKind::Plain);
    rule.source_mut().add_wire(white, black, WireKind::Plain);

    let white_t = rule.target_mut().add_spider(
        ColorClass::White,
        PhaseExpr::var(alpha_t),
        WireBound::Any,
        FlipCount::NONE,
    );
    let black_t = rule.target_mut().add_spider(
        ColorClass::Black,
        PhaseExpr::var(beta_t),
        WireBound::Any,
        FlipCount::NONE,
    );

    rule.map_variable(alpha, alpha_t);
    rule.map_variable(beta, beta_t);
    rule.route(white, ExternalRouting::To(white_t));
    rule.route(black, ExternalRouting::To(black_t));
    rule
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::denotation::{Denotation, TensorOracle};
    use crate::matcher::{find_match, rewrite_first};
    use crate::testing::three_spider_diagram;
    use zxopt_diagram::SpiderColor::{Green, Red};
    use zxopt_diagram::{BoundaryKind, Diagram, SpiderColor, WireKind};

    fn assert_sound(diagram: &Diagram, rule: &RewriteRule) {
        let oracle = TensorOracle::new();
        let before = oracle.denote(diagram);
        let mut rewritten = diagram.clone();
        rewrite_first(&mut rewritten, rule)
            .unwrap()
            .expect("rule should match the fixture");
        let after = oracle.denote(&rewritten);
        assert!(
            oracle.equivalent(&before, &after),
            "rule {} changed the denotation",
            rule.name()
        );
        rewritten.validate().unwrap();
    }

    #[test]
    fn spider_fusion_is_sound() {
        let (diagram, _) = three_spider_diagram(
            [(0.3 * PI, Green), (1.2 * PI, Green), (0.25 * PI, Red)],
            [true, false, false, false],
        );
        assert_sound(&diagram, &spider_fusion());
    }

    #[test]
    fn identity_removal_is_sound() {
        let (diagram, _) = three_spider_diagram(
            [(0.3 * PI, Green), (0.0, Red), (1.5 * PI, Red)],
            [false, true, false, true],
        );
        assert_sound(&diagram, &identity_removal());
    }

    #[test]
    fn bialgebra_is_sound() {
        let mut diagram = Diagram::new();
        let in0 = diagram.add_boundary(BoundaryKind::Input, 0);
        let in1 = diagram.add_boundary(BoundaryKind::Input, 1);
        let out0 = diagram.add_boundary(BoundaryKind::Output, 0);
        let out1 = diagram.add_boundary(BoundaryKind::Output, 1);
        let g1 = diagram.add_spider(Green, 0.0);
        let g2 = diagram.add_spider(Green, 0.0);
        let r1 = diagram.add_spider(Red, 0.0);
        let r2 = diagram.add_spider(Red, 0.0);
        for &g in &[g1, g2] {
            for &r in &[r1, r2] {
                diagram.add_wire(g, r, WireKind::Plain);
            }
        }
        diagram.add_wire(in0, g1, WireKind::Plain);
        diagram.add_wire(in1, g2, WireKind::Plain);
        diagram.add_wire(r1, out0, WireKind::Plain);
        diagram.add_wire(r2, out1, WireKind::Plain);

        assert_sound(&diagram, &bialgebra());
    }

    #[test]
    fn pi_commutation_is_sound() {
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let free = diagram.add_spider(Green, 0.6 * PI);
        let pi = diagram.add_spider(Red, PI);
        diagram.add_wire(b_in, free, WireKind::Plain);
        diagram.add_wire(free, pi, WireKind::Plain);
        diagram.add_wire(pi, b_out, WireKind::Plain);

        assert_sound(&diagram, &pi_commutation());
    }

    #[test]
    fn color_change_is_sound() {
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let s = diagram.add_spider(Green, 0.7 * PI);
        diagram.add_wire(b_in, s, WireKind::Plain);
        diagram.add_wire(s, b_out, WireKind::Hadamard);

        assert_sound(&diagram, &color_change());
    }

    #[test]
    fn state_copy_is_sound() {
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let hub = diagram.add_spider(Green, 0.0);
        let state = diagram.add_spider(Red, 0.0);
        diagram.add_wire(state, hub, WireKind::Plain);
        diagram.add_wire(b_in, hub, WireKind::Plain);
        diagram.add_wire(hub, b_out, WireKind::Plain);

        assert_sound(&diagram, &state_copy());
    }

    #[test]
    fn hopf_law_is_sound() {
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let g = diagram.add_spider(Green, 0.4 * PI);
        let r = diagram.add_spider(Red, 1.3 * PI);
        diagram.add_wire(b_in, g, WireKind::Plain);
        diagram.add_wire(g, r, WireKind::Plain);
        diagram.add_wire(g, r, WireKind::Plain);
        diagram.add_wire(r, b_out, WireKind::Plain);

        assert_sound(&diagram, &hopf_law());
    }

    #[test]
    fn fusion_applies_after_recoloring_but_not_before() {
        // the mixed chain has no same-color pair until the middle spider is
        // recolored
        let (diagram, vertices) = three_spider_diagram(
            [(PI, Green), (0.5 * PI, Red), (0.25 * PI, Red)],
            [false; 4],
        );
        let mut recolored = diagram.clone();
        recolored.set_spider_color(vertices.s2, Green);

        // (g, r, r): fusion finds the red pair; recolor to (g, g, r): it
        // finds the green pair instead
        let rule = spider_fusion();
        let red_match = find_match(&diagram, &rule).unwrap();
        assert!(red_match.image().all(|v| diagram.spider_color(v) == Red));

        let green_match = find_match(&recolored, &rule).unwrap();
        assert!(green_match
            .image()
            .all(|v| recolored.spider_color(v) == Green));
    }

    #[test]
    fn fused_spider_carries_the_phase_sum() {
        let (mut diagram, vertices) = three_spider_diagram(
            [(PI, Green), (0.5 * PI, Green), (0.25 * PI, Red)],
            [false; 4],
        );
        rewrite_first(&mut diagram, &spider_fusion())
            .unwrap()
            .unwrap();

        let fused = diagram
            .spiders_with_color(Green)
            .into_iter()
            .next()
            .unwrap();
        assert!((diagram.spider_phase(fused) - 1.5 * PI).abs() < 1e-9);
        assert!((diagram.spider_phase(vertices.s3) - 0.25 * PI).abs() < 1e-9);
    }

    #[test]
    fn bialgebra_inverse_restores_the_square() {
        let oracle = TensorOracle::new();
        let mut diagram = Diagram::new();
        let in0 = diagram.add_boundary(BoundaryKind::Input, 0);
        let in1 = diagram.add_boundary(BoundaryKind::Input, 1);
        let out0 = diagram.add_boundary(BoundaryKind::Output, 0);
        let out1 = diagram.add_boundary(BoundaryKind::Output, 1);
        let g1 = diagram.add_spider(Green, 0.0);
        let g2 = diagram.add_spider(Green, 0.0);
        let r1 = diagram.add_spider(Red, 0.0);
        let r2 = diagram.add_spider(Red, 0.0);
        for &g in &[g1, g2] {
            for &r in &[r1, r2] {
                diagram.add_wire(g, r, WireKind::Plain);
            }
        }
        diagram.add_wire(in0, g1, WireKind::Plain);
        diagram.add_wire(in1, g2, WireKind::Plain);
        diagram.add_wire(r1, out0, WireKind::Plain);
        diagram.add_wire(r2, out1, WireKind::Plain);

        let before = oracle.denote(&diagram);
        let rule = bialgebra();
        rewrite_first(&mut diagram, &rule).unwrap().unwrap();
        rewrite_first(&mut diagram, rule.inverse()).unwrap().unwrap();

        assert_eq!(diagram.spiders().count(), 4);
        assert!(oracle.equivalent(&before, &oracle.denote(&diagram)));
    }

    #[test]
    fn pi_commutation_round_trips() {
        let oracle = TensorOracle::new();
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let free = diagram.add_spider(Green, 0.6 * PI);
        let pi = diagram.add_spider(Red, PI);
        diagram.add_wire(b_in, free, WireKind::Plain);
        diagram.add_wire(free, pi, WireKind::Plain);
        diagram.add_wire(pi, b_out, WireKind::Plain);
        let before = oracle.denote(&diagram);

        let rule = pi_commutation();
        rewrite_first(&mut diagram, &rule).unwrap().unwrap();
        rewrite_first(&mut diagram, rule.inverse()).unwrap().unwrap();

        assert!(oracle.equivalent(&before, &oracle.denote(&diagram)));
        // and structurally: the phase next to the input is the original one
        let (_, by_input, _) = diagram.wires_of(b_in).next().unwrap();
        assert!((diagram.spider_phase(by_input) - 0.6 * PI).abs() < 1e-9);
        assert_eq!(diagram.spider_color(by_input), Green);
    }

    #[test]
    fn color_change_round_trips() {
        let oracle = TensorOracle::new();
        let mut diagram = Diagram::new();
        let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
        let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
        let s = diagram.add_spider(Green, 0.7 * PI);
        diagram.add_wire(b_in, s, WireKind::Plain);
        diagram.add_wire(s, b_out, WireKind::Hadamard);
        let before = oracle.denote(&diagram);

        let rule = color_change();
        rewrite_first(&mut diagram, &rule).unwrap().unwrap();
        assert_eq!(diagram.spiders_with_color(SpiderColor::Red).len(), 1);
        rewrite_first(&mut diagram, rule.inverse()).unwrap().unwrap();

        let survivor = diagram.spiders().next().unwrap();
        assert_eq!(diagram.spider_color(survivor), Green);
        assert!((diagram.spider_phase(survivor) - 0.7 * PI).abs() < 1e-9);
        assert!(oracle.equivalent(&before, &oracle.denote(&diagram)));
    }
}
