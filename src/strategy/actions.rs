// src/strategy/actions.rs

use crate::model::action::{Action, Transshipment};
use crate::model::state::{Retailer, State, StateSpace};

/// Enumerates every feasible decision for a state.
///
/// Bounds are the exclusive truncation bounds of the state space, so any action
/// produced here keeps the next state inside the space whatever the demand.
#[derive(Debug, Clone, Copy)]
pub struct ActionGenerator {
    space: StateSpace,
}

impl ActionGenerator {
    pub fn new(space: StateSpace) -> Self {
        Self { space }
    }

    /// Transshipment options for a pre-decision state, "none" first.
    ///
    /// Empty for a state outside the space.
    pub fn transshipments(&self, state: &State) -> Vec<Transshipment> {
        if !self.space.contains(state) {
            return Vec::new();
        }
        let room_a = self.space.max_retailer(Retailer::A) - 1 - state.retailer_a;
        let room_b = self.space.max_retailer(Retailer::B) - 1 - state.retailer_b;

        let mut options = vec![Transshipment::None];
        options.extend((1..=state.retailer_a.min(room_b)).map(Transshipment::AToB));
        options.extend((1..=state.retailer_b.min(room_a)).map(Transshipment::BToA));
        options
    }

    /// All feasible actions in a fixed order: transshipment option, then order
    /// to A, then order to B, then warehouse replenishment.
    ///
    /// The first action is always [`Action::ZERO`]. A state outside the space
    /// has no actions.
    pub fn generate(&self, state: &State) -> Vec<Action> {
        if !self.space.contains(state) {
            return Vec::new();
        }
        let w = state.warehouse;
        let max_a = self.space.max_retailer(Retailer::A);
        let max_b = self.space.max_retailer(Retailer::B);
        // Arrivals land on top of today's stock, so the warehouse may order up to
        // the space bound less what it holds now.
        let max_warehouse_order = self.space.max_warehouse() - 1 - w;

        let mut actions = Vec::new();
        for transshipment in self.transshipments(state) {
            let Some((stock_a, stock_b)) = transshipment.apply(state.retailer_a, state.retailer_b)
            else {
                continue;
            };

            for order_a in 0..=(max_a - 1 - stock_a).min(w) {
                for order_b in 0..=(max_b - 1 - stock_b).min(w - order_a) {
                    for warehouse_order in 0..=max_warehouse_order {
                        actions.push(Action {
                            warehouse_order,
                            order_a,
                            order_b,
                            transshipment,
                        });
                    }
                }
            }
        }
        actions
    }
}
