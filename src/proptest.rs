//! Strategies for random graph operators and states.
use crate::graph::GraphOperator;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::cmp::{max, min};
use std::collections::BTreeSet;

/// Parameters for random graph operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GraphParams {
    /// At least 3.
    pub max_nodes: usize,
    /// Edges added on top of the ring connecting all nodes.
    pub max_extra_edges: usize,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            max_nodes: 10,
            max_extra_edges: 12,
        }
    }
}

impl GraphParams {
    pub fn with_max_nodes(self, max_nodes: usize) -> Self {
        Self { max_nodes, ..self }
    }

    pub fn with_max_extra_edges(self, max_extra_edges: usize) -> Self {
        Self {
            max_extra_edges,
            ..self
        }
    }
}

/// Values attached to an undirected edge `(a, b)`, `a < b`.
#[derive(Debug, Copy, Clone)]
struct EdgeValues {
    m_ab: f64,
    k_ab: f64,
    k_ba: f64,
}

/// Returns `(num_nodes, edges)` with every edge `(a, b)` normalized to `a < b`.
///
/// The ring `0 - 1 - ... - (n-1) - 0` is always part of the graph, so the graph is connected.
fn undirected_edges(params: GraphParams) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    assert!(params.max_nodes >= 3, "Graph needs room for at least three nodes.");
    (3..=params.max_nodes)
        .prop_flat_map(move |n| (Just(n), vec((0..n, 0..n), 0..=params.max_extra_edges)))
        .prop_map(|(n, extra)| {
            let ring = (0..n).map(|i| (i, (i + 1) % n));
            let edges: BTreeSet<_> = ring
                .chain(extra)
                .filter(|(i, j)| i != j)
                .map(|(i, j)| (min(i, j), max(i, j)))
                .collect();
            (n, edges.into_iter().collect())
        })
}

fn is_ring_edge(n: usize, (a, b): (usize, usize)) -> bool {
    b == a + 1 || (a == 0 && b == n - 1)
}

fn build_graph_operator(
    n: usize,
    edges: &[(usize, usize)],
    values: &[EdgeValues],
    diagonal: &[(f64, f64)],
) -> GraphOperator<f64> {
    let mut mass = CooMatrix::new(n, n);
    let mut advection = CooMatrix::new(n, n);
    for (i, &(m_ii, k_ii)) in diagonal.iter().enumerate() {
        mass.push(i, i, m_ii);
        advection.push(i, i, k_ii);
    }
    for (&(a, b), v) in edges.iter().zip(values) {
        mass.push(a, b, v.m_ab);
        mass.push(b, a, v.m_ab);
        advection.push(a, b, v.k_ab);
        advection.push(b, a, v.k_ba);
    }
    GraphOperator::from_matrices(CsrMatrix::from(&mass), CsrMatrix::from(&advection))
        .expect("Internal error: generated graph operator must be valid")
}

/// Positive diagonal mass and arbitrary diagonal advection entries.
fn diagonal_entries(n: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    vec((0.01..1.0f64, -1.0..1.0f64), n)
}

/// Graph operators with structurally symmetric patterns, symmetric non-negative mass and
/// arbitrary advection entries.
///
/// Since `K` is unconstrained, the schemes generally do not conserve mass on these graphs.
pub fn graph_operator(params: GraphParams) -> impl Strategy<Value = GraphOperator<f64>> {
    undirected_edges(params).prop_flat_map(|(n, edges)| {
        let values = vec((0.0..1.0f64, -1.0..1.0f64, -1.0..1.0f64), edges.len())
            .prop_map(|values| {
                values
                    .into_iter()
                    .map(|(m_ab, k_ab, k_ba)| EdgeValues { m_ab, k_ab, k_ba })
                    .collect::<Vec<_>>()
            });
        (values, diagonal_entries(n))
            .prop_map(move |(values, diagonal)| build_graph_operator(n, &edges, &values, &diagonal))
    })
}

/// Graph operators whose advection matrix has equal off-diagonal row and column sums.
///
/// `K` is a symmetric part plus a uniform circulation around the ring, i.e.
/// `K(i, i+1) = s + c` and `K(i+1, i) = s - c`. This is the structure of a divergence-free
/// convection operator on a periodic domain, and all schemes conserve mass.
pub fn conservative_graph_operator(params: GraphParams) -> impl Strategy<Value = GraphOperator<f64>> {
    undirected_edges(params).prop_flat_map(|(n, edges)| {
        (vec((0.0..1.0f64, -1.0..1.0f64), edges.len()), -1.0..1.0f64, diagonal_entries(n)).prop_map(
            move |(symmetric, circulation, diagonal)| {
                let values: Vec<_> = edges
                    .iter()
                    .zip(symmetric)
                    .map(|(&(a, b), (m_ab, s))| {
                        let c = if !is_ring_edge(n, (a, b)) {
                            0.0
                        } else if b == a + 1 {
                            circulation
                        } else {
                            // The edge closing the ring runs from n - 1 to 0
                            -circulation
                        };
                        EdgeValues {
                            m_ab,
                            k_ab: s + c,
                            k_ba: s - c,
                        }
                    })
                    .collect();
                build_graph_operator(n, &edges, &values, &diagonal)
            },
        )
    })
}

/// States with `num_vars` variables, every value in `[-10, 10]`.
pub fn state(num_dofs: usize, num_vars: usize) -> impl Strategy<Value = DVector<f64>> {
    vec(-10.0..10.0f64, num_dofs * num_vars).prop_map(DVector::from_vec)
}

/// A graph operator together with a state on it.
pub fn graph_and_state(
    graph: impl Strategy<Value = GraphOperator<f64>>,
    num_vars: usize,
) -> impl Strategy<Value = (GraphOperator<f64>, DVector<f64>)> {
    graph.prop_flat_map(move |graph| {
        let n = graph.num_dofs();
        (Just(graph), state(n, num_vars))
    })
}
