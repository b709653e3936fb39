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

//! Rule-selection strategies for the optimization loop.
//!
//! A [`Simplifier`] produces an ordered list of rules; a
//! [`RankedStrategy`] probes that list in order against the current diagram
//! and hands the first matching rule to the optimizer.  Probing never
//! mutates the diagram, and with per-attempt match contexts there is no rule
//! state to reset between probes.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use zxopt_diagram::Diagram;

use crate::matcher::find_match;
use crate::rule::RewriteRule;

/// Produces the ranked rule list a strategy works through.
pub trait Simplifier {
    fn rules(&mut self) -> Vec<&RewriteRule>;
}

/// A single rule.
pub struct SingleRuleSimplifier {
    rule: RewriteRule,
}

impl SingleRuleSimplifier {
    pub fn new(rule: RewriteRule) -> Self {
        SingleRuleSimplifier { rule }
    }
}

impl Simplifier for SingleRuleSimplifier {
    fn rules(&mut self) -> Vec<&RewriteRule> {
        vec![&self.rule]
    }
}

/// The inverse of a rule (built lazily by the rule itself).
pub struct InverseRuleSimplifier {
    rule: RewriteRule,
}

impl InverseRuleSimplifier {
    pub fn new(rule: RewriteRule) -> Self {
        InverseRuleSimplifier { rule }
    }
}

impl Simplifier for InverseRuleSimplifier {
    fn rules(&mut self) -> Vec<&RewriteRule> {
        vec![self.rule.inverse()]
    }
}

/// Concatenation of other simplifiers, in order.
pub struct CompoundSimplifier {
    simplifiers: Vec<Box<dyn Simplifier>>,
}

impl CompoundSimplifier {
    pub fn new(simplifiers: Vec<Box<dyn Simplifier>>) -> Self {
        CompoundSimplifier { simplifiers }
    }
}

impl Simplifier for CompoundSimplifier {
    fn rules(&mut self) -> Vec<&RewriteRule> {
        self.simplifiers
            .iter_mut()
            .flat_map(|simplifier| simplifier.rules())
            .collect()
    }
}

/// Concatenation with the combined list shuffled.  The permutation is drawn
/// afresh on every call, so repeated probes of a stuck diagram still explore
/// different rule orders.
pub struct RandomizedCompoundSimplifier {
    simplifiers: Vec<Box<dyn Simplifier>>,
    rng: Pcg64Mcg,
}

impl RandomizedCompoundSimplifier {
    pub fn new(simplifiers: Vec<Box<dyn Simplifier>>, seed: u64) -> Self {
        RandomizedCompoundSimplifier {
            simplifiers,
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }
}

impl Simplifier for RandomizedCompoundSimplifier {
    fn rules(&mut self) -> Vec<&RewriteRule> {
        let mut rules: Vec<&RewriteRule> = self
            .simplifiers
            .iter_mut()
            .flat_map(|simplifier| simplifier.rules())
            .collect();
        rules.shuffle(&mut self.rng);
        rules
    }
}

/// Chooses the rule the optimizer applies next, or `None` at a local fixed
/// point.
pub trait OptimizationStrategy {
    fn find_next_rule(&mut self, diagram: &Diagram) -> Option<&RewriteRule>;
}

/// Works through the simplifier's list in rank order and returns the first
/// rule with at least one occurrence in the diagram.
pub struct RankedStrategy {
    simplifier: Box<dyn Simplifier>,
}

impl RankedStrategy {
    pub fn new(simplifier: Box<dyn Simplifier>) -> Self {
        RankedStrategy { simplifier }
    }
}

impl OptimizationStrategy for RankedStrategy {
    fn find_next_rule(&mut self, diagram: &Diagram) -> Option<&RewriteRule> {
        self.simplifier
            .rules()
            .into_iter()
            .find(|rule| find_match(diagram, rule).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::rules::{identity_removal, spider_fusion};
    use crate::testing::three_spider_diagram;
    use zxopt_diagram::SpiderColor::{Green, Red};

    fn boxed(rule: crate::rule::RewriteRule) -> Box<dyn Simplifier> {
        Box::new(SingleRuleSimplifier::new(rule))
    }

    #[test]
    fn compound_concatenates_in_order() {
        let mut compound =
            CompoundSimplifier::new(vec![boxed(identity_removal()), boxed(spider_fusion())]);
        let names: Vec<&str> = compound.rules().iter().map(|rule| rule.name()).collect();
        assert_eq!(names, vec!["identity-removal", "spider-fusion"]);
    }

    #[test]
    fn randomized_compound_is_a_permutation() {
        let mut randomized = RandomizedCompoundSimplifier::new(
            vec![boxed(identity_removal()), boxed(spider_fusion())],
            7,
        );
        let mut names: Vec<String> = randomized
            .rules()
            .iter()
            .map(|rule| rule.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["identity-removal", "spider-fusion"]);
    }

    #[test]
    fn ranked_strategy_returns_the_first_matching_rule() {
        // identity removal ranks first but has no occurrence here
        let (diagram, _) = three_spider_diagram(
            [(PI, Green), (0.5 * PI, Red), (0.25 * PI, Red)],
            [false; 4],
        );
        let mut strategy = RankedStrategy::new(Box::new(CompoundSimplifier::new(vec![
            boxed(identity_removal()),
            boxed(spider_fusion()),
        ])));

        let rule = strategy.find_next_rule(&diagram).unwrap();
        assert_eq!(rule.name(), "spider-fusion");
    }

    #[test]
    fn ranked_strategy_reports_fixed_points() {
        let (diagram, _) = three_spider_diagram(
            [(PI, Green), (0.5 * PI, Red), (0.25 * PI, Green)],
            [false; 4],
        );
        let mut strategy =
            RankedStrategy::new(Box::new(CompoundSimplifier::new(vec![boxed(
                spider_fusion(),
            )])));
        assert!(strategy.find_next_rule(&diagram).is_none());
    }
}
