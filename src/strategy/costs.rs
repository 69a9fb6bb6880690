// src/strategy/costs.rs

//! Expected immediate costs of a post-decision state.
//!
//! Excess demand at a retailer is either lost outright or, with probability `p`
//! per unit, served from warehouse stock at the partial-lost-sale cost. Retailer
//! A's excess is always resolved against the warehouse before retailer B's, so B
//! only sees what A left behind.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::demand::DemandModel;
use crate::model::state::{Retailer, State, StateSpace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParameters {
    /// Per unit left at the warehouse at the end of a period.
    pub holding_warehouse: f64,
    /// Per unit left at a retailer at the end of a period.
    pub holding_retailer: f64,
    /// Full lost sale (underage) cost per unit of unmet demand.
    pub lost_sales_cost: f64,
    /// Cost per unit of excess demand served from the warehouse instead.
    pub partial_lost_sales_cost: f64,
    pub transshipment_cost: f64,
    pub discount_factor: f64,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            holding_warehouse: 1.0,
            holding_retailer: 1.0,
            lost_sales_cost: 18.0,
            partial_lost_sales_cost: 0.0,
            transshipment_cost: 1.0,
            discount_factor: 0.999,
        }
    }
}

/// `G_w` and `G_s` for every state, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CostModel {
    params: CostParameters,
    space: StateSpace,
    warehouse: Vec<f64>,
    retailer: Vec<f64>,
}

impl CostModel {
    /// Tabulates both expectations over the whole state space.
    ///
    /// States are evaluated on the current rayon pool.
    pub fn build(params: CostParameters, space: StateSpace, demand: &DemandModel) -> Self {
        let states = space.enumerate();
        let (warehouse, retailer): (Vec<f64>, Vec<f64>) = states
            .par_iter()
            .map(|state| {
                (
                    expected_warehouse_cost(&params, demand, state),
                    expected_retailer_cost(&params, demand, state),
                )
            })
            .unzip();

        debug!(states = states.len(), "immediate cost tables built");

        Self {
            params,
            space,
            warehouse,
            retailer,
        }
    }

    pub fn params(&self) -> &CostParameters {
        &self.params
    }

    /// `G_w` by state index.
    #[inline]
    pub fn warehouse_cost_at(&self, index: usize) -> f64 {
        self.warehouse[index]
    }

    /// `G_s` by state index.
    #[inline]
    pub fn retailer_cost_at(&self, index: usize) -> f64 {
        self.retailer[index]
    }

    pub fn warehouse_cost(&self, state: &State) -> Option<f64> {
        self.space.index_of(state).map(|i| self.warehouse[i])
    }

    pub fn retailer_cost(&self, state: &State) -> Option<f64> {
        self.space.index_of(state).map(|i| self.retailer[i])
    }
}

/// `G_w(state)`: expected end-of-period warehouse holding cost.
///
/// # Panics
/// If `state.warehouse` exceeds the largest stock the demand model's
/// fulfilment table was built for.
pub fn expected_warehouse_cost(
    params: &CostParameters,
    demand: &DemandModel,
    state: &State,
) -> f64 {
    let w = state.warehouse;
    let cutoff = demand.probability_cutoff();
    let table = demand.fulfillment();
    let mut exp = 0.0;

    for (d1, p1) in demand.pmf(Retailer::A).iter() {
        if p1 <= cutoff {
            continue;
        }
        let row_a = table.row(d1.saturating_sub(state.retailer_a).min(w));
        for (d2, p2) in demand.pmf(Retailer::B).iter() {
            let p12 = p1 * p2;
            if p12 <= cutoff {
                continue;
            }
            for (beta_a, q1) in row_a.iter().enumerate() {
                let weight = p12 * q1;
                if weight <= cutoff {
                    continue;
                }
                let remaining = w - beta_a;
                let row_b = table.row(d2.saturating_sub(state.retailer_b).min(remaining));
                for (beta_b, q2) in row_b.iter().enumerate() {
                    exp += weight * q2 * params.holding_warehouse * (remaining - beta_b) as f64;
                }
            }
        }
    }

    exp
}

/// `G_s(state)`: expected holding, lost-sale and partial-lost-sale cost at both
/// retailers.
///
/// # Panics
/// Same condition as [`expected_warehouse_cost`].
pub fn expected_retailer_cost(params: &CostParameters, demand: &DemandModel, state: &State) -> f64 {
    let w = state.warehouse;
    let cutoff = demand.probability_cutoff();
    let table = demand.fulfillment();
    let correction = params.partial_lost_sales_cost - params.lost_sales_cost;
    let mut exp = 0.0;

    for (d1, p1) in demand.pmf(Retailer::A).iter() {
        if p1 <= cutoff {
            continue;
        }
        if d1 <= state.retailer_a {
            exp += p1 * params.holding_retailer * (state.retailer_a - d1) as f64;
            continue;
        }
        let excess = d1 - state.retailer_a;
        exp += p1 * params.lost_sales_cost * excess as f64;
        for (beta, q) in table.row(excess.min(w)).iter().enumerate() {
            exp += p1 * q * correction * beta as f64;
        }
    }

    for (d2, p2) in demand.pmf(Retailer::B).iter() {
        if p2 <= cutoff {
            continue;
        }
        if d2 <= state.retailer_b {
            exp += p2 * params.holding_retailer * (state.retailer_b - d2) as f64;
            continue;
        }
        let excess = d2 - state.retailer_b;
        exp += p2 * params.lost_sales_cost * excess as f64;

        // Warehouse stock left for B depends on how much A drew.
        for (d1, p1) in demand.pmf(Retailer::A).iter() {
            let p12 = p1 * p2;
            if p12 <= cutoff {
                continue;
            }
            let row_a = table.row(d1.saturating_sub(state.retailer_a).min(w));
            for (beta_a, q1) in row_a.iter().enumerate() {
                let weight = p12 * q1;
                if weight <= cutoff {
                    continue;
                }
                let row_b = table.row(excess.min(w - beta_a));
                for (beta_b, q2) in row_b.iter().enumerate() {
                    exp += weight * q2 * correction * beta_b as f64;
                }
            }
        }
    }

    exp
}

/// Expected full lost-sale cost at one retailer holding `stock`, ignoring any
/// warehouse fulfilment.
pub fn expected_shortage(
    params: &CostParameters,
    demand: &DemandModel,
    retailer: Retailer,
    stock: usize,
) -> f64 {
    demand
        .pmf(retailer)
        .iter()
        .filter(|&(d, _)| d > stock)
        .map(|(d, p)| p * params.lost_sales_cost * (d - stock) as f64)
        .sum()
}
