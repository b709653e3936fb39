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

//! The built-in rule library.  This is the only place rules are coded;
//! everything else treats them as data.

pub mod cleanup;
pub mod zx_calculus;

pub use cleanup::{
    hadamard_self_loop, parallel_hadamard_pair, parallel_mixed_pair, parallel_plain_pair,
    plain_self_loop,
};
pub use zx_calculus::{
    bialgebra, color_change, hopf_law, identity_removal, pi_commutation, spider_fusion, state_copy,
};

use crate::strategy::{
    CompoundSimplifier, InverseRuleSimplifier, RandomizedCompoundSimplifier, Simplifier,
    SingleRuleSimplifier,
};

fn single(rule: crate::rule::RewriteRule) -> Box<dyn Simplifier> {
    Box::new(SingleRuleSimplifier::new(rule))
}

fn inverse_of(rule: crate::rule::RewriteRule) -> Box<dyn Simplifier> {
    Box::new(InverseRuleSimplifier::new(rule))
}

/// The wire-housekeeping pass: parallel pairs, self-loops, and the Hopf law,
/// which together keep wire multiplicities from growing.
pub fn cleanup_simplifier() -> CompoundSimplifier {
    CompoundSimplifier::new(vec![
        single(plain_self_loop()),
        single(hadamard_self_loop()),
        single(parallel_plain_pair()),
        single(parallel_hadamard_pair()),
        single(parallel_mixed_pair()),
        single(hopf_law()),
    ])
}

/// The default ranked composition: most reducing and hardest-to-find rules
/// first, structure-shuffling rules last.  Note that pi-commutation and
/// color-change are their own inverses, so a strategy built from this list
/// can cycle; callers wanting a termination guarantee configure an iteration
/// limit on the optimizer.
pub fn default_simplifier(seed: u64) -> CompoundSimplifier {
    CompoundSimplifier::new(vec![
        Box::new(RandomizedCompoundSimplifier::new(
            vec![single(bialgebra())],
            seed,
        )),
        Box::new(RandomizedCompoundSimplifier::new(
            vec![
                single(spider_fusion()),
                single(identity_removal()),
                single(pi_commutation()),
            ],
            seed.wrapping_add(1),
        )),
        Box::new(RandomizedCompoundSimplifier::new(
            vec![
                single(state_copy()),
                inverse_of(state_copy()),
                single(hopf_law()),
                inverse_of(hopf_law()),
            ],
            seed.wrapping_add(2),
        )),
        inverse_of(bialgebra()),
        single(color_change()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Simplifier;

    #[test]
    fn cleanup_list_is_deterministic() {
        let mut simplifier = cleanup_simplifier();
        let names: Vec<String> = simplifier
            .rules()
            .iter()
            .map(|rule| rule.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "plain-self-loop",
                "hadamard-self-loop",
                "parallel-plain-pair",
                "parallel-hadamard-pair",
                "parallel-mixed-pair",
                "hopf",
            ]
        );
    }

    #[test]
    fn default_list_contains_the_whole_library() {
        let mut simplifier = default_simplifier(11);
        let rules = simplifier.rules();
        assert_eq!(rules.len(), 10);
        let names: Vec<&str> = rules.iter().map(|rule| rule.name()).collect();
        assert!(names.contains(&"bialgebra"));
        assert!(names.contains(&"bialgebra-inverse"));
        assert!(names.contains(&"state-copy-inverse"));
        assert!(names.contains(&"color-change"));
    }

    #[test]
    fn every_library_rule_is_matchable() {
        let mut simplifier = default_simplifier(3);
        for rule in simplifier.rules() {
            assert!(rule.is_matchable(), "{} should be matchable", rule.name());
        }
    }
}
