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

//! Shared fixtures for the unit tests of this crate.

use rustworkx_core::petgraph::graph::NodeIndex;

use zxopt_diagram::{BoundaryKind, Diagram, SpiderColor, WireKind};

pub(crate) struct ThreeSpiders {
    pub b_in: NodeIndex,
    pub b_out: NodeIndex,
    pub s1: NodeIndex,
    pub s2: NodeIndex,
    pub s3: NodeIndex,
}

/// `(in) - s1 - s2 - s3 - (out)` with the given `(phase, color)` per spider
/// and one hadamard flag per wire, in wire order.
pub(crate) fn three_spider_diagram(
    spiders: [(f64, SpiderColor); 3],
    hadamard: [bool; 4],
) -> (Diagram, ThreeSpiders) {
    let mut diagram = Diagram::new();
    let b_in = diagram.add_boundary(BoundaryKind::Input, 0);
    let b_out = diagram.add_boundary(BoundaryKind::Output, 0);
    let s1 = diagram.add_spider(spiders[0].1, spiders[0].0);
    let s2 = diagram.add_spider(spiders[1].1, spiders[1].0);
    let s3 = diagram.add_spider(spiders[2].1, spiders[2].0);
    diagram.add_wire(b_in, s1, WireKind::from_hadamard(hadamard[0]));
    diagram.add_wire(s1, s2, WireKind::from_hadamard(hadamard[1]));
    diagram.add_wire(s2, s3, WireKind::from_hadamard(hadamard[2]));
    diagram.add_wire(s3, b_out, WireKind::from_hadamard(hadamard[3]));
    (
        diagram,
        ThreeSpiders {
            b_in,
            b_out,
            s1,
            s2,
            s3,
        },
    )
}
