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

use crate::{BoundaryKind, PortIndex};

/// Structural violations surfaced by [`crate::Diagram::validate`].  Any of
/// these after a rewrite indicates a bug in a rule or in the rewriter and is
/// treated as fatal by the optimization loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    #[error("boundary vertex {vertex} has degree {degree}, expected exactly 1")]
    BoundaryDegree { vertex: usize, degree: usize },
    #[error("port {port} appears on more than one {kind:?} boundary")]
    DuplicatePort { kind: BoundaryKind, port: PortIndex },
    #[error("spider vertex {vertex} carries phase {phase} outside [0, 2pi)")]
    PhaseOutOfRange { vertex: usize, phase: f64 },
}
