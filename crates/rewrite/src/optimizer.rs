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

//! The optimization loop: repeatedly ask the strategy for a rule, apply it,
//! and validate the rewrite against the denotation oracle.
//!
//! A failed validation is recorded and logged, not fatal — a human-authored
//! rule bug should be observable, not silently destructive, and whether to
//! halt on it is the caller's policy.  Structural invariant violations after
//! a rewrite are fatal.  The core imposes no iteration bound of its own;
//! callers may configure one.

use log::{debug, info, warn};

use zxopt_diagram::Diagram;

use crate::denotation::Denotation;
use crate::error::RewriteError;
use crate::matcher::rewrite_first;
use crate::strategy::OptimizationStrategy;

/// One applied rewrite.  `valid` is `None` when no oracle was configured.
#[derive(Clone, Debug)]
pub struct RewriteStep {
    pub rule: String,
    pub iteration: usize,
    pub valid: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct OptimizationReport {
    pub steps: Vec<RewriteStep>,
    pub iterations: usize,
}

impl OptimizationReport {
    /// Whether no applied rewrite failed validation.
    pub fn all_valid(&self) -> bool {
        self.steps.iter().all(|step| step.valid != Some(false))
    }

    pub fn invalid_steps(&self) -> impl Iterator<Item = &RewriteStep> {
        self.steps.iter().filter(|step| step.valid == Some(false))
    }
}

pub struct Optimizer {
    strategy: Box<dyn OptimizationStrategy>,
    oracle: Option<Box<dyn Denotation>>,
    iteration_limit: Option<usize>,
}

impl Optimizer {
    pub fn new(strategy: Box<dyn OptimizationStrategy>) -> Self {
        Optimizer {
            strategy,
            oracle: None,
            iteration_limit: None,
        }
    }

    /// Validate every rewrite against `oracle`.
    pub fn with_oracle(mut self, oracle: Box<dyn Denotation>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Stop after at most `limit` rewrites even if more rules still match.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Drive the diagram to a local fixed point of the strategy's rule list.
    pub fn optimize(&mut self, diagram: &mut Diagram) -> Result<OptimizationReport, RewriteError> {
        let mut report = OptimizationReport::default();
        loop {
            if let Some(limit) = self.iteration_limit {
                if report.iterations >= limit {
                    info!("stopping after configured limit of {limit} iterations");
                    break;
                }
            }
            let Some(rule) = self.strategy.find_next_rule(diagram) else {
                break;
            };
            report.iterations += 1;
            debug!("iteration {}: applying {}", report.iterations, rule.name());

            let before = self.oracle.as_deref().map(|oracle| oracle.denote(diagram));
            let applied = rewrite_first(diagram, rule)?;
            if applied.is_none() {
                // The strategy probed this same diagram, so a miss here
                // means the rule list changed between probe and apply; stop
                // rather than spin.
                warn!("rule {} matched during probing but not on apply", rule.name());
                break;
            }

            let valid = match (self.oracle.as_deref(), before) {
                (Some(oracle), Some(before)) => {
                    let after = oracle.denote(diagram);
                    let equivalent = oracle.equivalent(&before, &after);
                    if !equivalent {
                        warn!(
                            "iteration {}: rule {} changed the diagram denotation",
                            report.iterations,
                            rule.name()
                        );
                    }
                    Some(equivalent)
                }
                _ => None,
            };

            diagram.validate()?;
            report.steps.push(RewriteStep {
                rule: rule.name().to_string(),
                iteration: report.iterations,
                valid,
            });
        }
        info!("diagram optimization took {} iterations", report.iterations);
        Ok(report)
    }
}
