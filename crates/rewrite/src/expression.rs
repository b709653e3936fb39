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

//! Symbolic phase expressions carried by rule spiders.
//!
//! Expressions themselves are immutable; the values variables take during a
//! match attempt live in a [`VarBindings`] table scoped to that attempt.
//! Discarding the table discards every resolution, so a failed candidate can
//! never leak state into the next one.

use zxopt_diagram::phase_distance;

use crate::error::RewriteError;

/// Tolerance used when a phase expression is compared against a concrete
/// spider phase.
pub const PHASE_EPSILON: f64 = 1e-5;

/// Identifier of a phase variable within one rewrite rule.  Source and
/// target structures of a rule share a single variable namespace.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct VarId(pub u32);

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum PhaseOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl PhaseOp {
    #[inline]
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            PhaseOp::Add => lhs + rhs,
            PhaseOp::Sub => lhs - rhs,
            PhaseOp::Mul => lhs * rhs,
            PhaseOp::Div => lhs / rhs,
        }
    }
}

/// A phase expression tree.
#[derive(Clone, Debug)]
pub enum PhaseExpr {
    Const(f64),
    Var(VarId),
    BinOp {
        op: PhaseOp,
        lhs: Box<PhaseExpr>,
        rhs: Box<PhaseExpr>,
    },
}

impl PhaseExpr {
    pub fn constant(value: f64) -> Self {
        PhaseExpr::Const(value)
    }

    pub fn var(id: VarId) -> Self {
        PhaseExpr::Var(id)
    }

    pub fn binop(op: PhaseOp, lhs: PhaseExpr, rhs: PhaseExpr) -> Self {
        PhaseExpr::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: PhaseExpr, rhs: PhaseExpr) -> Self {
        Self::binop(PhaseOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: PhaseExpr, rhs: PhaseExpr) -> Self {
        Self::binop(PhaseOp::Sub, lhs, rhs)
    }

    /// `0 - e`, the negation used by the pi-commutation rule.
    pub fn neg(expr: PhaseExpr) -> Self {
        Self::sub(PhaseExpr::Const(0.0), expr)
    }

    /// Try to unify this expression with a concrete phase, resolving
    /// variables in `bindings` along the way.
    ///
    /// * a constant matches when it is within [`PHASE_EPSILON`] of `value`
    ///   on the circle;
    /// * an unresolved variable matches anything once, binding itself; a
    ///   resolved one only matches its stored value;
    /// * a binary operation is never inverted: it matches only when all of
    ///   its variables are already resolved and the evaluation agrees.
    pub fn matches(&self, value: f64, bindings: &mut VarBindings) -> bool {
        match self {
            PhaseExpr::Const(c) => phase_distance(*c, value) < PHASE_EPSILON,
            PhaseExpr::Var(id) => match bindings.get(*id) {
                Some(stored) => phase_distance(stored, value) < PHASE_EPSILON,
                None => {
                    bindings.resolve(*id, value);
                    true
                }
            },
            PhaseExpr::BinOp { .. } => match self.evaluate(bindings) {
                Ok(evaluated) => phase_distance(evaluated, value) < PHASE_EPSILON,
                Err(_) => false,
            },
        }
    }

    /// Evaluate the expression to a real number.  Fails when any variable is
    /// still unresolved, which is a rule or rewriter bug by the time this is
    /// called.
    pub fn evaluate(&self, bindings: &VarBindings) -> Result<f64, RewriteError> {
        match self {
            PhaseExpr::Const(c) => Ok(*c),
            PhaseExpr::Var(id) => bindings
                .get(*id)
                .ok_or(RewriteError::UnresolvedExpression(id.0)),
            PhaseExpr::BinOp { op, lhs, rhs } => {
                Ok(op.apply(lhs.evaluate(bindings)?, rhs.evaluate(bindings)?))
            }
        }
    }

    pub fn is_resolved(&self, bindings: &VarBindings) -> bool {
        match self {
            PhaseExpr::Const(_) => true,
            PhaseExpr::Var(id) => bindings.get(*id).is_some(),
            PhaseExpr::BinOp { lhs, rhs, .. } => {
                lhs.is_resolved(bindings) && rhs.is_resolved(bindings)
            }
        }
    }

    pub fn contains_variable(&self) -> bool {
        match self {
            PhaseExpr::Const(_) => false,
            PhaseExpr::Var(_) => true,
            PhaseExpr::BinOp { lhs, rhs, .. } => {
                lhs.contains_variable() || rhs.contains_variable()
            }
        }
    }

    /// Whether the expression contains a binary operation over variables.
    /// Such expressions cannot be unified against a concrete phase, so a
    /// rule with one in its source refuses to match (and a rule with one in
    /// its target is not invertible).
    pub fn has_variable_binop(&self) -> bool {
        match self {
            PhaseExpr::Const(_) | PhaseExpr::Var(_) => false,
            PhaseExpr::BinOp { .. } => self.contains_variable(),
        }
    }

    pub fn collect_variables(&self, out: &mut Vec<VarId>) {
        match self {
            PhaseExpr::Const(_) => {}
            PhaseExpr::Var(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            PhaseExpr::BinOp { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}

/// Resolution state of a rule's phase variables during one match attempt.
#[derive(Clone, Debug)]
pub struct VarBindings {
    values: Vec<Option<f64>>,
}

impl VarBindings {
    pub fn new(var_count: u32) -> Self {
        VarBindings {
            values: vec![None; var_count as usize],
        }
    }

    #[inline]
    pub fn get(&self, id: VarId) -> Option<f64> {
        self.values[id.0 as usize]
    }

    #[inline]
    pub fn resolve(&mut self, id: VarId, value: f64) {
        self.values[id.0 as usize] = Some(value);
    }
}
