//! End-to-end properties of the backward induction.

use transship_dp::io::demand::DemandSpec;
use transship_dp::io::reporting::{
    read_policy_table, read_value_table, write_policy_table, write_value_table,
};
use transship_dp::model::action::{Action, Transshipment};
use transship_dp::model::state::{Retailer, State};
use transship_dp::strategy::costs::{expected_retailer_cost, expected_warehouse_cost};
use transship_dp::{BellmanSolver, SolverConfig};

fn poisson_mass(lambda: f64, k: usize) -> f64 {
    let factorial: f64 = (1..=k).map(|i| i as f64).product();
    (-lambda).exp() * lambda.powi(k as i32) / factorial
}

fn concrete_config() -> SolverConfig {
    SolverConfig {
        periods: 1,
        warehouse_lead_time: 1,
        partial_lost_sales_chance: 0.8,
        partial_lost_sales_cost: 0.0,
        transshipment_cost: 1.0,
        holding_warehouse: 1.0,
        holding_retailer: 1.0,
        lost_sales_cost: 18.0,
        discount_factor: 0.999,
        demand: [DemandSpec::poisson(2.0), DemandSpec::poisson(2.0)],
        warehouse_truncation: 5,
        retailer_truncation: [5, 5],
        workers: 2,
        terminal_unit_cost: 0.0,
        probability_cutoff: 0.0,
    }
}

#[test]
fn test_empty_system_costs_expected_lost_sales() {
    let solver = BellmanSolver::new(concrete_config()).unwrap();
    let solution = solver.solve().unwrap();

    // Brute force: nothing on hand anywhere, so every unit of demand at either
    // retailer is a full lost sale.
    let mut oracle = 0.0;
    for _retailer in 0..2 {
        for d in 0..5 {
            oracle += poisson_mass(2.0, d) * 18.0 * d as f64;
        }
    }

    let empty = State::new(0, 0, 0);
    let value = solution.values.get(&empty).unwrap();
    assert!((value - oracle).abs() < 1e-9, "{} vs {}", value, oracle);
    assert_eq!(solution.policy.get(1, &empty), Some(Action::ZERO));
}

#[test]
fn test_zero_demand_single_period() {
    let config = concrete_config().with_demand(DemandSpec::poisson(0.0), DemandSpec::poisson(0.0));
    let solver = BellmanSolver::new(config).unwrap();
    let solution = solver.solve().unwrap();

    let empty = State::new(0, 0, 0);
    assert_eq!(solution.values.get(&empty), Some(0.0));
    assert_eq!(solution.policy.get(1, &empty), Some(Action::ZERO));

    // With an empty warehouse nothing can be shipped and moving stock between
    // retailers only adds cost, so only retailer holding remains.
    for a in 0..5 {
        for b in 0..5 {
            let state = State::new(0, a, b);
            assert_eq!(solution.policy.get(1, &state), Some(Action::ZERO));
            let value = solution.values.get(&state).unwrap();
            assert!((value - (a + b) as f64).abs() < 1e-12);
        }
    }

    // Stock shipped out of the warehouse is in transit and costs nothing this
    // period, so the warehouse ships as much as the retailers can take.
    for w in 1..5 {
        for a in 0..5 {
            for b in 0..5 {
                let state = State::new(w, a, b);
                let action = solution.policy.get(1, &state).unwrap();
                let shipped = w.min((4 - a) + (4 - b));
                assert_eq!(action.order_a + action.order_b, shipped, "state {}", state);
                assert_eq!(action.warehouse_order, 0);
                assert_eq!(action.transshipment, Transshipment::None);

                let holding = (w - shipped + a + b) as f64;
                let value = solution.values.get(&state).unwrap();
                assert!((value - holding).abs() < 1e-9, "{}: {} vs {}", state, value, holding);
            }
        }
    }
}

#[test]
fn test_immediate_costs_non_negative_everywhere() {
    let solver = BellmanSolver::new(concrete_config()).unwrap();
    let params = solver.cost_model().params();
    for state in solver.state_space().iter() {
        assert!(expected_warehouse_cost(params, solver.demand(), &state) >= 0.0);
        assert!(expected_retailer_cost(params, solver.demand(), &state) >= -1e-12);
        assert!(solver.cost_model().warehouse_cost(&state).unwrap() >= 0.0);
    }
}

#[test]
fn test_zero_action_generated_for_every_state() {
    let solver = BellmanSolver::new(concrete_config()).unwrap();
    for state in solver.state_space().iter() {
        assert!(solver.action_generator().generate(&state).contains(&Action::ZERO));
    }
}

#[test]
fn test_solves_are_deterministic_across_worker_counts() {
    let config = concrete_config()
        .with_periods(3)
        .with_truncation(4, 4, 3)
        .with_demand(DemandSpec::negative_binomial(2.0, 0.6), DemandSpec::poisson(1.2));

    let first = BellmanSolver::new(config.clone()).unwrap().solve().unwrap();
    let second = BellmanSolver::new(config.clone()).unwrap().solve().unwrap();
    let serial = BellmanSolver::new(config.with_workers(1)).unwrap().solve().unwrap();

    assert_eq!(first, second);
    assert_eq!(first, serial);
    for (a, b) in first.values.as_slice().iter().zip(serial.values.as_slice()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_exported_tables_round_trip() {
    let config = concrete_config().with_periods(2).with_truncation(3, 3, 3);
    let solver = BellmanSolver::new(config).unwrap();
    let solution = solver.solve().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let policy_path = dir.path().join("policy.csv");
    let value_path = dir.path().join("values.csv");
    write_policy_table(&policy_path, &solution.policy).unwrap();
    write_value_table(&value_path, &solution.values).unwrap();

    let space = *solver.state_space();
    assert_eq!(read_policy_table(&policy_path, space).unwrap(), solution.policy);
    assert_eq!(read_value_table(&value_path, space).unwrap(), solution.values);
}

#[test]
fn test_more_stock_never_raises_standalone_shortage() {
    use transship_dp::strategy::costs::expected_shortage;

    let solver = BellmanSolver::new(concrete_config()).unwrap();
    let params = solver.cost_model().params();
    for retailer in [Retailer::A, Retailer::B] {
        for stock in 0..4 {
            let now = expected_shortage(params, solver.demand(), retailer, stock);
            let more = expected_shortage(params, solver.demand(), retailer, stock + 1);
            assert!(more <= now);
        }
    }
}
