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

//! The denotation oracle: evaluate a diagram to the linear map it
//! represents, and compare two maps up to a nonzero global scalar.
//!
//! The optimization loop uses this only for validation.  Evaluation builds a
//! tensor network (every spider a Z-tensor after recoloring red spiders,
//! every wire an identity or Hadamard connector) and contracts it pairwise.
//! Equivalence is Monte-Carlo: both maps are applied to random input
//! vectors and the normalized output probability distributions are compared
//! componentwise, which quotients out the global scalar the calculus does
//! not track.

use std::f64::consts::FRAC_1_SQRT_2;

use hashbrown::HashMap;
use ndarray::{Array1, Array2, ArrayD, Axis, Dimension, IxDyn};
use ndarray_einsum_beta::tensordot;
use num_complex::Complex64;
use num_traits::Zero;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rustworkx_core::petgraph::graph::NodeIndex;

use zxopt_diagram::{Diagram, SpiderColor, WireKind};

/// Abstract oracle the optimizer validates against.  Implementations must
/// never mutate the diagram they are handed.
pub trait Denotation {
    fn denote(&self, diagram: &Diagram) -> Array2<Complex64>;
    fn equivalent(&self, a: &Array2<Complex64>, b: &Array2<Complex64>) -> bool;
}

/// Tensor-network evaluation with Monte-Carlo equivalence.
pub struct TensorOracle {
    pub trials: usize,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for TensorOracle {
    fn default() -> Self {
        TensorOracle {
            trials: 100,
            epsilon: 1e-5,
            seed: 0x5eed_cafe,
        }
    }
}

impl TensorOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        TensorOracle {
            seed,
            ..Self::default()
        }
    }
}

/// Probability mass below this is treated as a zero map.
const NORM_FLOOR: f64 = 1e-12;

impl Denotation for TensorOracle {
    fn denote(&self, diagram: &Diagram) -> Array2<Complex64> {
        let mut diagram = diagram.clone();
        recolor_red_spiders(&mut diagram);
        contract(&diagram)
    }

    fn equivalent(&self, a: &Array2<Complex64>, b: &Array2<Complex64>) -> bool {
        if a.dim() != b.dim() {
            return false;
        }
        let mut rng = Pcg64Mcg::seed_from_u64(self.seed);
        for _ in 0..self.trials {
            let input = Array1::from_shape_fn(a.ncols(), |_| Complex64::new(rng.gen::<f64>(), 0.0));
            let probs_a: Array1<f64> = a.dot(&input).mapv(|z| z.norm_sqr());
            let probs_b: Array1<f64> = b.dot(&input).mapv(|z| z.norm_sqr());
            let sum_a = probs_a.sum();
            let sum_b = probs_b.sum();
            if sum_a < NORM_FLOOR || sum_b < NORM_FLOOR {
                if (sum_a < NORM_FLOOR) != (sum_b < NORM_FLOOR) {
                    return false;
                }
                continue;
            }
            for (pa, pb) in probs_a.iter().zip(probs_b.iter()) {
                if (pa / sum_a - pb / sum_b).abs() > self.epsilon {
                    return false;
                }
            }
        }
        true
    }
}

/// Replace every red spider by a green one, flipping its incident wires.
/// Self-loops keep their kind: both of their legs pick up a Hadamard, which
/// cancels.
fn recolor_red_spiders(diagram: &mut Diagram) {
    for spider in diagram.spiders_with_color(SpiderColor::Red) {
        let wires: Vec<_> = diagram
            .wires_of(spider)
            .filter(|&(_, other, _)| other != spider)
            .map(|(wire, _, _)| wire)
            .collect();
        for wire in wires {
            diagram.flip_wire_kind(wire);
        }
        diagram.set_spider_color(spider, SpiderColor::Green);
    }
}

struct Tensor {
    data: ArrayD<Complex64>,
    labels: Vec<i64>,
}

/// Contract the whole network to a `(2^outputs, 2^inputs)` matrix.
///
/// Every wire end gets a label: a fresh positive one on a spider, a
/// negative one on a boundary (outputs first, then inputs, both in port
/// order).  Each positive label occurs on exactly two tensors (a connector
/// and a spider), so repeated pairwise `tensordot` drains them all; outer
/// products join disconnected components.
fn contract(diagram: &Diagram) -> Array2<Complex64> {
    let inputs = diagram.inputs();
    let outputs = diagram.outputs();

    let mut boundary_labels: HashMap<NodeIndex, i64> = HashMap::new();
    for (i, &boundary) in outputs.iter().chain(inputs.iter()).enumerate() {
        boundary_labels.insert(boundary, -(i as i64) - 1);
    }

    let mut next_label: i64 = 1;
    let mut spider_legs: HashMap<NodeIndex, Vec<i64>> = HashMap::new();
    let mut network: Vec<Tensor> = Vec::new();

    for wire in diagram.wires() {
        let (a, b) = diagram.wire_endpoints(wire);
        let mut end_label = |vertex: NodeIndex, next_label: &mut i64| match boundary_labels
            .get(&vertex)
        {
            Some(&label) => label,
            None => {
                let label = *next_label;
                *next_label += 1;
                spider_legs.entry(vertex).or_default().push(label);
                label
            }
        };
        let label_a = end_label(a, &mut next_label);
        let label_b = end_label(b, &mut next_label);
        let data = match diagram.wire_kind(wire) {
            WireKind::Plain => identity_tensor(),
            WireKind::Hadamard => hadamard_tensor(),
        };
        network.push(Tensor {
            data,
            labels: vec![label_a, label_b],
        });
    }

    for spider in diagram.spiders() {
        let legs = spider_legs.remove(&spider).unwrap_or_default();
        network.push(Tensor {
            data: z_tensor(legs.len(), diagram.spider_phase(spider)),
            labels: legs,
        });
    }

    while network.len() > 1 {
        let (i, j) = find_shared_pair(&network).unwrap_or((0, 1));
        let b = network.swap_remove(j);
        let a = network.swap_remove(i);
        network.push(contract_pair(a, b));
    }
    let result = network.pop().unwrap_or_else(|| Tensor {
        data: ArrayD::from_elem(IxDyn(&[]), Complex64::new(1.0, 0.0)),
        labels: Vec::new(),
    });

    debug_assert!(result.labels.iter().all(|&label| label < 0));
    let mut axis_order: Vec<usize> = (0..result.labels.len()).collect();
    axis_order.sort_by_key(|&axis| std::cmp::Reverse(result.labels[axis]));
    let permuted = result.data.permuted_axes(IxDyn(&axis_order));
    let standard = permuted.as_standard_layout().into_owned();

    let rows = 1usize << outputs.len();
    let cols = 1usize << inputs.len();
    standard
        .into_shape((rows, cols))
        .expect("external legs match the boundary count")
}

/// First pair of tensors sharing an internal label, `(i, j)` with `i < j`.
fn find_shared_pair(network: &[Tensor]) -> Option<(usize, usize)> {
    for (i, a) in network.iter().enumerate() {
        for (j, b) in network.iter().enumerate().skip(i + 1) {
            if a.labels
                .iter()
                .any(|label| *label > 0 && b.labels.contains(label))
            {
                return Some((i, j));
            }
        }
    }
    None
}

fn contract_pair(a: Tensor, b: Tensor) -> Tensor {
    let shared: Vec<i64> = a
        .labels
        .iter()
        .copied()
        .filter(|label| *label > 0 && b.labels.contains(label))
        .collect();
    if shared.is_empty() {
        return outer_product(a, b);
    }
    let position = |labels: &[i64], label: i64| {
        Axis(labels.iter().position(|&l| l == label).expect("shared label"))
    };
    let axes_a: Vec<Axis> = shared.iter().map(|&l| position(&a.labels, l)).collect();
    let axes_b: Vec<Axis> = shared.iter().map(|&l| position(&b.labels, l)).collect();
    let data = tensordot(&a.data, &b.data, &axes_a, &axes_b);

    let mut labels: Vec<i64> = a
        .labels
        .iter()
        .copied()
        .filter(|label| !shared.contains(label))
        .collect();
    labels.extend(b.labels.iter().copied().filter(|label| !shared.contains(label)));
    Tensor { data, labels }
}

fn outer_product(a: Tensor, b: Tensor) -> Tensor {
    let split = a.data.ndim();
    let mut shape: Vec<usize> = a.data.shape().to_vec();
    shape.extend_from_slice(b.data.shape());
    let data = ArrayD::from_shape_fn(IxDyn(&shape), |index| {
        let index = index.slice();
        a.data[IxDyn(&index[..split])] * b.data[IxDyn(&index[split..])]
    });
    let mut labels = a.labels;
    labels.extend(b.labels);
    Tensor { data, labels }
}

/// The Z-spider tensor: all-zeros except `1` at index `0…0` and `e^{i phase}`
/// at `1…1`.  With no legs it degenerates to the scalar `1 + e^{i phase}`.
fn z_tensor(legs: usize, phase: f64) -> ArrayD<Complex64> {
    let unit = Complex64::new(1.0, 0.0);
    let phased = Complex64::from_polar(1.0, phase);
    if legs == 0 {
        return ArrayD::from_elem(IxDyn(&[]), unit + phased);
    }
    let mut data = ArrayD::from_elem(IxDyn(&vec![2; legs]), Complex64::zero());
    data[IxDyn(&vec![0; legs])] = unit;
    data[IxDyn(&vec![1; legs])] = phased;
    data
}

fn identity_tensor() -> ArrayD<Complex64> {
    let unit = Complex64::new(1.0, 0.0);
    ArrayD::from_shape_vec(
        IxDyn(&[2, 2]),
        vec![unit, Complex64::zero(), Complex64::zero(), unit],
    )
    .expect("2x2 tensor")
}

fn hadamard_tensor() -> ArrayD<Complex64> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![h, h, h, -h]).expect("2x2 tensor")
}
