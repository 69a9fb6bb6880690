// src/strategy/traits.rs

use std::fmt::Debug;

use crate::model::state::State;

/// Boundary rule for the value function after the last decision period.
///
/// `Send + Sync` so the boundary table can be filled from the solver's pool.
pub trait TerminalCost: Debug + Send + Sync {
    /// Value `V[T+1]` assigned to a state left over at the end of the horizon.
    fn cost(&self, state: &State) -> f64;
}
