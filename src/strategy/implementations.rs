// src/strategy/implementations.rs

use crate::model::state::State;
use crate::strategy::traits::TerminalCost;

/// Charges (or credits, if negative) a flat amount per unit of stock anywhere in
/// the system at the end of the horizon.
///
/// The default of zero leaves leftover stock worthless.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerUnitTerminalCost {
    unit_cost: f64,
}

impl PerUnitTerminalCost {
    pub fn new(unit_cost: f64) -> Self {
        Self { unit_cost }
    }
}

impl TerminalCost for PerUnitTerminalCost {
    fn cost(&self, state: &State) -> f64 {
        state
            .components()
            .iter()
            .map(|&units| units as f64 * self.unit_cost)
            .sum()
    }
}
