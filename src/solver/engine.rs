// src/solver/engine.rs

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::error::{Result, SolverError};
use crate::io::demand::{generate_pmf, DemandModel};
use crate::model::action::Action;
use crate::model::state::{Retailer, State, StateSpace};
use crate::solver::config::SolverConfig;
use crate::solver::tables::{PolicyTable, Solution, ValueTable};
use crate::strategy::actions::ActionGenerator;
use crate::strategy::costs::CostModel;
use crate::strategy::implementations::PerUnitTerminalCost;
use crate::strategy::traits::TerminalCost;

/// Finite-horizon backward induction over the two-retailer network.
///
/// Everything except the value tables is built once in [`BellmanSolver::new`]
/// and only read during a solve, so states within a period are evaluated in
/// parallel without locking.
#[derive(Debug)]
pub struct BellmanSolver {
    config: SolverConfig,
    space: StateSpace,
    demand: DemandModel,
    costs: CostModel,
    generator: ActionGenerator,
    terminal: Box<dyn TerminalCost>,
    pool: ThreadPool,
}

impl BellmanSolver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;

        let space = config.state_space();
        let [spec_a, spec_b] = &config.demand;
        let [max_a, max_b] = config.retailer_truncation;
        let demand = DemandModel::new(
            generate_pmf(spec_a, max_a)?,
            generate_pmf(spec_b, max_b)?,
            config.partial_lost_sales_chance,
            config.warehouse_truncation - 1,
            config.probability_cutoff,
        )?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| SolverError::InvalidConfig(format!("worker pool: {}", e)))?;

        debug!(
            states = space.len(),
            mass_a = demand.pmf(Retailer::A).total_mass(),
            mass_b = demand.pmf(Retailer::B).total_mass(),
            "precomputing immediate costs"
        );
        let costs = pool.install(|| CostModel::build(config.cost_parameters(), space, &demand));

        Ok(Self {
            terminal: Box::new(PerUnitTerminalCost::new(config.terminal_unit_cost)),
            generator: ActionGenerator::new(space),
            config,
            space,
            demand,
            costs,
            pool,
        })
    }

    /// Replaces the boundary rule used for `V[T+1]`.
    pub fn with_terminal_cost(mut self, terminal: impl TerminalCost + 'static) -> Self {
        self.terminal = Box::new(terminal);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state_space(&self) -> &StateSpace {
        &self.space
    }

    pub fn demand(&self) -> &DemandModel {
        &self.demand
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.costs
    }

    pub fn action_generator(&self) -> &ActionGenerator {
        &self.generator
    }

    /// `V[T+1]` under the configured terminal rule.
    pub fn terminal_values(&self) -> ValueTable {
        ValueTable::from_fn(self.space, |s| self.terminal.cost(s))
    }

    /// Immediate plus discounted future cost of taking `action` in `state`,
    /// given the next period's value table.
    ///
    /// Returns `None` if the state lies outside the space or the action is not
    /// feasible there.
    pub fn action_cost(&self, state: &State, action: &Action, next: &ValueTable) -> Option<f64> {
        if next.space() != &self.space || !action.is_feasible(state, &self.space) {
            return None;
        }
        self.space.index_of(state)?;
        Some(self.evaluate_action(state, action, next.as_slice()))
    }

    /// Runs backward induction from period `T` down to 1.
    pub fn solve(&self) -> Result<Solution> {
        let horizon = self.config.periods;
        info!(
            periods = horizon,
            states = self.space.len(),
            workers = self.config.workers,
            "starting backward induction"
        );

        let states = self.space.enumerate();
        let mut next = self.terminal_values();
        let mut current = next.clone();
        let mut policy = PolicyTable::empty(self.space, horizon);

        for period in (1..=horizon).rev() {
            let mut actions = vec![Action::ZERO; states.len()];
            let next_values = next.as_slice();

            self.pool.install(|| {
                states
                    .par_iter()
                    .zip(current.as_mut_slice().par_iter_mut())
                    .zip(actions.par_iter_mut())
                    .try_for_each(|((state, value), action)| -> Result<()> {
                        let (best, cost) = self.best_action(state, next_values)?;
                        *value = cost;
                        *action = best;
                        Ok(())
                    })
            })?;

            policy.set_period(period, actions);
            std::mem::swap(&mut current, &mut next);
            info!(period, "period solved");
        }

        Ok(Solution {
            policy,
            values: next,
        })
    }

    /// Expected discounted cost of following `policy` from period 1.
    ///
    /// The recursion is the same as [`solve`](Self::solve) with the minimum
    /// replaced by the action the table prescribes.
    pub fn evaluate_policy(&self, policy: &PolicyTable) -> Result<ValueTable> {
        if policy.space() != &self.space {
            return Err(SolverError::PolicyShape(
                "policy was built for a different state space".to_string(),
            ));
        }
        if policy.horizon() != self.config.periods {
            return Err(SolverError::PolicyShape(format!(
                "policy covers {} periods, solver horizon is {}",
                policy.horizon(),
                self.config.periods
            )));
        }

        let states = self.space.enumerate();
        let mut next = self.terminal_values();
        let mut current = next.clone();

        for period in (1..=policy.horizon()).rev() {
            let actions = policy.period(period).ok_or_else(|| {
                SolverError::PolicyShape(format!("missing period {}", period))
            })?;
            let next_values = next.as_slice();

            self.pool.install(|| {
                states
                    .par_iter()
                    .zip(actions.par_iter())
                    .zip(current.as_mut_slice().par_iter_mut())
                    .try_for_each(|((state, action), value)| -> Result<()> {
                        if !action.is_feasible(state, &self.space) {
                            return Err(SolverError::InfeasibleAction {
                                period,
                                state: *state,
                                action: *action,
                            });
                        }
                        *value = self.evaluate_action(state, action, next_values);
                        Ok(())
                    })
            })?;

            std::mem::swap(&mut current, &mut next);
            debug!(period, "policy period evaluated");
        }

        Ok(next)
    }

    /// First action of minimal total cost, in generation order.
    fn best_action(&self, state: &State, next: &[f64]) -> Result<(Action, f64)> {
        let mut best: Option<(Action, f64)> = None;
        for action in self.generator.generate(state) {
            let cost = self.evaluate_action(state, &action, next);
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((action, cost)),
            }
        }
        best.ok_or(SolverError::EmptyActionSet { state: *state })
    }

    /// Cost of a feasible action against `next` laid out in state index order.
    fn evaluate_action(&self, state: &State, action: &Action, next: &[f64]) -> f64 {
        let Some(post) = action.post_decision_state(state) else {
            return f64::INFINITY;
        };
        let post_index = self
            .space
            .index_unchecked(post.warehouse, post.retailer_a, post.retailer_b);
        let params = self.costs.params();

        let immediate = params.transshipment_cost * action.transshipment.units() as f64
            + self.costs.warehouse_cost_at(post_index)
            + self.costs.retailer_cost_at(post_index);

        immediate + params.discount_factor * self.future_cost(&post, action, next)
    }

    /// Expected next-period value after demand and partial fulfilment.
    ///
    /// Retailer stock rolls to `(post - demand)+ + order`; the warehouse keeps
    /// what partial fulfilment did not draw and receives its replenishment.
    fn future_cost(&self, post: &State, action: &Action, next: &[f64]) -> f64 {
        let w = post.warehouse;
        let table = self.demand.fulfillment();
        let cutoff = self.demand.probability_cutoff();
        let mut exp = 0.0;

        for (d1, p1) in self.demand.pmf(Retailer::A).iter() {
            if p1 <= cutoff {
                continue;
            }
            let next_a = post.retailer_a.saturating_sub(d1) + action.order_a;
            let row_a = table.row(d1.saturating_sub(post.retailer_a).min(w));

            for (d2, p2) in self.demand.pmf(Retailer::B).iter() {
                let p12 = p1 * p2;
                if p12 <= cutoff {
                    continue;
                }
                let next_b = post.retailer_b.saturating_sub(d2) + action.order_b;
                let excess_b = d2.saturating_sub(post.retailer_b);

                let mut inner = 0.0;
                for (beta_a, q1) in row_a.iter().enumerate() {
                    if p12 * q1 <= cutoff {
                        continue;
                    }
                    let remaining = w - beta_a;
                    for (beta_b, q2) in table.row(excess_b.min(remaining)).iter().enumerate() {
                        let next_w = remaining - beta_b + action.warehouse_order;
                        inner += q1 * q2 * next[self.space.index_unchecked(next_w, next_a, next_b)];
                    }
                }
                exp += p12 * inner;
            }
        }

        exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::demand::DemandSpec;
    use crate::model::action::Transshipment;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_config(periods: usize) -> SolverConfig {
        SolverConfig::default()
            .with_periods(periods)
            .with_truncation(4, 4, 4)
            .with_demand(DemandSpec::poisson(1.0), DemandSpec::poisson(1.5))
            .with_workers(2)
    }

    #[test]
    fn test_unsupported_lead_time_fails_construction() {
        let config = SolverConfig {
            warehouse_lead_time: 3,
            ..small_config(1)
        };
        assert!(matches!(
            BellmanSolver::new(config),
            Err(SolverError::UnsupportedLeadTime(3))
        ));
    }

    #[test]
    fn test_unknown_distribution_fails_construction() {
        let config = small_config(1).with_demand(
            DemandSpec {
                kind: "Uniform".to_string(),
                params: vec![0.0, 3.0],
            },
            DemandSpec::poisson(1.0),
        );
        assert!(matches!(
            BellmanSolver::new(config),
            Err(SolverError::UnsupportedDistribution(_))
        ));
    }

    #[test]
    fn test_zero_terminal_rule() {
        let solver = BellmanSolver::new(small_config(1)).unwrap();
        assert!(solver.terminal_values().as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_period_values_are_minimal_action_costs() {
        let solver = BellmanSolver::new(small_config(1)).unwrap();
        let solution = solver.solve().unwrap();
        let terminal = solver.terminal_values();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let index = rng.gen_range(0..solver.state_space().len());
            let state = solver.state_space().state_at(index).unwrap();
            let chosen = solution.policy.get(1, &state).unwrap();
            let value = solution.values.get(&state).unwrap();
            assert_eq!(solver.action_cost(&state, &chosen, &terminal), Some(value));
            for action in solver.action_generator().generate(&state) {
                assert!(solver.action_cost(&state, &action, &terminal).unwrap() >= value);
            }
        }
    }

    #[test]
    fn test_longer_horizon_never_cheaper() {
        let one = BellmanSolver::new(small_config(1)).unwrap().solve().unwrap();
        let two = BellmanSolver::new(small_config(2)).unwrap().solve().unwrap();
        for ((_, short), (_, long)) in one.values.iter().zip(two.values.iter()) {
            assert!(long >= short - 1e-12);
        }
        assert_eq!(two.policy.horizon(), 2);
    }

    #[test]
    fn test_evaluating_optimal_policy_reproduces_values() {
        let solver = BellmanSolver::new(small_config(3)).unwrap();
        let solution = solver.solve().unwrap();
        let evaluated = solver.evaluate_policy(&solution.policy).unwrap();
        assert_eq!(evaluated, solution.values);
    }

    #[test]
    fn test_no_transshipment_policy_is_not_better() {
        let solver = BellmanSolver::new(small_config(2)).unwrap();
        let solution = solver.solve().unwrap();
        let never = PolicyTable::from_fn(*solver.state_space(), 2, |_, _| Action::ZERO);
        let evaluated = solver.evaluate_policy(&never).unwrap();
        for ((_, optimal), (_, fixed)) in solution.values.iter().zip(evaluated.iter()) {
            assert!(fixed >= optimal - 1e-9);
        }
    }

    #[test]
    fn test_infeasible_policy_is_rejected() {
        let solver = BellmanSolver::new(small_config(1)).unwrap();
        let greedy = PolicyTable::from_fn(*solver.state_space(), 1, |_, _| Action {
            transshipment: Transshipment::AToB(1),
            ..Action::ZERO
        });
        assert!(matches!(
            solver.evaluate_policy(&greedy),
            Err(SolverError::InfeasibleAction { period: 1, .. })
        ));

        let short = PolicyTable::from_fn(*solver.state_space(), 2, |_, _| Action::ZERO);
        assert!(matches!(
            solver.evaluate_policy(&short),
            Err(SolverError::PolicyShape(_))
        ));
    }

    #[test]
    fn test_custom_terminal_rule() {
        let solver = BellmanSolver::new(small_config(1))
            .unwrap()
            .with_terminal_cost(PerUnitTerminalCost::new(2.0));
        let terminal = solver.terminal_values();
        assert_eq!(terminal.get(&State::new(3, 1, 2)), Some(12.0));
    }
}
