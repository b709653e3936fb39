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

use thiserror::Error;

use zxopt_diagram::DiagramError;

/// Fatal failure modes of the rewriting machinery.
///
/// A failed match is not an error: the matcher signals it with `None`.
/// Everything here indicates a bug in a rule definition, the matcher, or the
/// rewriter, and terminates the optimization loop.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("phase variable v{0} was evaluated before it resolved")]
    UnresolvedExpression(u32),
    #[error("color class {0} was never bound during matching")]
    UnresolvedColorClass(&'static str),
    #[error("diagram invariant violated after rewrite: {0}")]
    InvariantViolation(#[from] DiagramError),
}
