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

pub mod diagram;

mod error;

use std::f64::consts::TAU;

pub use diagram::{Diagram, DiagramNode};
pub use error::DiagramError;

/// Index of the qubit line a boundary (or a spider created by the circuit
/// translator) sits on.
pub type PortIndex = u32;

/// The two spider families of the calculus.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum SpiderColor {
    Green,
    Red,
}

impl SpiderColor {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            SpiderColor::Green => SpiderColor::Red,
            SpiderColor::Red => SpiderColor::Green,
        }
    }
}

/// Which side of the diagram a boundary vertex belongs to.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum BoundaryKind {
    Input,
    Output,
}

/// Edge label of a diagram wire.  A `Hadamard` wire composes a Hadamard gate
/// into the path it carries.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum WireKind {
    Plain,
    Hadamard,
}

impl WireKind {
    #[inline]
    pub fn is_hadamard(self) -> bool {
        matches!(self, WireKind::Hadamard)
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            WireKind::Plain => WireKind::Hadamard,
            WireKind::Hadamard => WireKind::Plain,
        }
    }

    #[inline]
    pub fn from_hadamard(hadamard: bool) -> Self {
        if hadamard {
            WireKind::Hadamard
        } else {
            WireKind::Plain
        }
    }
}

/// Map an angle into the canonical `[0, 2*pi)` range all spider phases live
/// in.
#[inline]
pub fn normalize_phase(phase: f64) -> f64 {
    let reduced = phase.rem_euclid(TAU);
    // rem_euclid can land exactly on TAU when the input is a tiny negative
    // number.
    if reduced >= TAU {
        0.0
    } else {
        reduced
    }
}

/// Distance between two angles on the circle.
#[inline]
pub fn phase_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(TAU);
    diff.min(TAU - diff)
}
