use super::graph::{ring_graph, two_node_graph};
use fluxcorr::evolution::evaluate;
use fluxcorr::graph::Edge;
use fluxcorr::scheme::high_order::high_order_rates_into;
use fluxcorr::scheme::low_order::{low_order_rate, low_order_rates_into};
use fluxcorr::scheme::mcl::{limited_flux, limited_fluxes, mcl_rates_into};
use fluxcorr::scheme::Scheme;
use util::{assert_approx_slice_eq, euler_step};

fn rates(scheme: Scheme, x: &[f64]) -> Vec<f64> {
    let graph = crate::periodic_unit_segment_8();
    evaluate(scheme, &graph, 1, x).unwrap().as_slice().to_vec()
}

#[test]
fn low_order_two_node_example_is_exact() {
    let graph = two_node_graph();
    let x = [1.0, 0.0];
    let y = evaluate(Scheme::LowOrder, &graph, 1, &x).unwrap();
    assert_eq!(y.as_slice(), &[-2.0, 2.0]);
    assert_eq!(low_order_rate(&graph, 0, &x), -2.0);
}

#[test]
fn uniform_state_is_fixed_point_on_ring() {
    let graph = ring_graph(4, 0.5, -0.25);
    let x = [5.0, 5.0, 5.0, 5.0];
    for scheme in Scheme::ALL {
        let y = evaluate(scheme, &graph, 1, &x).unwrap();
        assert_eq!(y.as_slice(), &[0.0, 0.0, 0.0, 0.0], "scheme {}", scheme);
    }
}

#[test]
fn low_order_is_upwind_on_periodic_segment() {
    let step = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    assert_approx_slice_eq!(
        rates(Scheme::LowOrder, &step),
        [-8.0, 0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0],
        abstol = 1e-12
    );
}

#[test]
fn mcl_reduces_to_low_order_at_discontinuity() {
    let step = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    assert_approx_slice_eq!(
        rates(Scheme::Mcl, &step),
        [-8.0, 0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 0.0],
        abstol = 1e-12
    );
}

#[test]
fn high_order_target_overshoots_at_discontinuity() {
    // Documents expected behavior: the unlimited target scheme is not bounds-preserving
    let graph = crate::periodic_unit_segment_8();
    let step = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let y = evaluate(Scheme::HighOrderTarget, &graph, 1, &step).unwrap();
    assert_approx_slice_eq!([y[3]], [8.0 / 3.0], abstol = 1e-12);

    let dt = graph.max_stable_time_step().unwrap();
    let x_new = euler_step(&nalgebra::DVector::from_row_slice(&step), &y, dt);
    assert!(x_new[3] > 1.0 + 0.1, "expected overshoot, got {}", x_new[3]);

    // The bounds-preserving schemes stay within [0, 1] under the same step
    for scheme in [Scheme::LowOrder, Scheme::Mcl] {
        let y = evaluate(scheme, &graph, 1, &step).unwrap();
        let x_new = euler_step(&nalgebra::DVector::from_row_slice(&step), &y, dt);
        assert!(x_new.iter().all(|&v| (0.0..=1.0).contains(&v)), "scheme {}", scheme);
    }
}

#[test]
fn mcl_is_less_diffusive_than_low_order_on_smooth_data() {
    let tent = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
    let y_lo = rates(Scheme::LowOrder, &tent);
    let y_mcl = rates(Scheme::Mcl, &tent);
    assert_approx_slice_eq!([y_lo[1]], [-8.0], abstol = 1e-12);
    assert_approx_slice_eq!([y_mcl[1]], [-12.0], abstol = 1e-12);
}

#[test]
fn linear_schemes_superpose_but_mcl_does_not() {
    let tent = [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
    let superposition = |scheme: Scheme| {
        let mut sum = vec![0.0; 8];
        for (k, &weight) in tent.iter().enumerate() {
            let mut spike = [0.0; 8];
            spike[k] = 1.0;
            for (s, y_k) in sum.iter_mut().zip(rates(scheme, &spike)) {
                *s += weight * y_k;
            }
        }
        sum
    };

    for scheme in [Scheme::LowOrder, Scheme::HighOrderTarget] {
        assert_approx_slice_eq!(superposition(scheme), rates(scheme, &tent), abstol = 1e-10);
    }

    let y_mcl = rates(Scheme::Mcl, &tent);
    let y_superposed = superposition(Scheme::Mcl);
    assert!((y_mcl[1] - y_superposed[1]).abs() > 1.0);
}

#[test]
fn rates_into_agree_with_evaluate() {
    let graph = crate::periodic_unit_segment_8();
    let x = [0.3, -1.0, 2.5, 0.0, 4.0, 1.0, -2.0, 0.5];
    let mut z = vec![0.0; 8];
    let mut y = vec![0.0; 8];
    low_order_rates_into(&graph, &x, &mut z);
    assert_eq!(z, rates(Scheme::LowOrder, &x));

    high_order_rates_into(&graph, &x, &z, &mut y);
    assert_eq!(y, rates(Scheme::HighOrderTarget, &x));

    mcl_rates_into(&graph, &x, &z, &mut y);
    assert_eq!(y, rates(Scheme::Mcl, &x));
}

#[test]
fn limited_fluxes_are_antisymmetric() {
    let graph = crate::periodic_unit_segment_8();
    let x = [0.3, -1.0, 2.5, 0.0, 4.0, 1.0, -2.0, 0.5];
    let mut z = vec![0.0; 8];
    low_order_rates_into(&graph, &x, &mut z);

    let fluxes = limited_fluxes(&graph, &x, &z);
    assert_eq!(fluxes.len(), graph.nnz());
    for (p, &q) in graph.transpose_offsets().iter().enumerate() {
        assert_eq!(fluxes[q], -fluxes[p]);
    }
}

#[test]
fn limited_flux_clips_against_both_endpoints() {
    let edge = Edge {
        j: 1,
        m_ij: 1.0,
        k_ij: 0.0,
        k_ji: 0.0,
    };
    // Zero viscosity leaves no room for any antidiffusive flux
    assert_eq!(limited_flux(&edge, 1.0, 0.0, 5.0, -5.0, (0.0, 1.0), (0.0, 1.0)), 0.0);

    let edge = Edge {
        j: 1,
        m_ij: 1.0,
        k_ij: 0.5,
        k_ji: -0.5,
    };
    // f_ij = (z_i - z_j) + d (x_i - x_j) = 0.1 - 0.25 < 0, and well within bounds
    let f = limited_flux(&edge, 0.5, 1.0, 0.1, 0.0, (0.0, 2.0), (-1.0, 2.0));
    assert_approx_slice_eq!([f], [-0.15], abstol = 1e-15);

    // Both endpoints sit at their local extrema, so the flux is cut entirely
    let f = limited_flux(&edge, 1.0, 0.0, 10.0, 0.0, (0.0, 1.0), (0.0, 1.0));
    assert_eq!(f, 0.0);
}

#[test]
fn scheme_names_round_trip() {
    for scheme in Scheme::ALL {
        assert_eq!(scheme.to_string().parse::<Scheme>().unwrap(), scheme);
    }
    assert_eq!("1".parse::<Scheme>().unwrap(), Scheme::LowOrder);
    assert_eq!("2".parse::<Scheme>().unwrap(), Scheme::HighOrderTarget);
    assert_eq!(" MCL ".parse::<Scheme>().unwrap(), Scheme::Mcl);
    assert!("4".parse::<Scheme>().is_err());
    assert!(Scheme::LowOrder.is_bounds_preserving());
    assert!(!Scheme::HighOrderTarget.is_bounds_preserving());
    assert!(Scheme::Mcl.requires_low_order_rates());
    assert!(!Scheme::LowOrder.requires_low_order_rates());
}

#[test]
fn scheme_serde_names_match_display() {
    for scheme in Scheme::ALL {
        let json = serde_json::to_string(&scheme).unwrap();
        assert_eq!(json, format!("\"{}\"", scheme));
        assert_eq!(serde_json::from_str::<Scheme>(&json).unwrap(), scheme);
    }
    assert_eq!(
        serde_json::from_str::<Scheme>("\"high-order-target\"").unwrap(),
        Scheme::HighOrderTarget
    );
}
