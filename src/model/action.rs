// src/model/action.rs

use std::fmt;

use crate::model::state::{Retailer, State, StateSpace};

/// Lateral movement of stock between the two retailers.
///
/// A decision moves stock in at most one direction, so the direction is part of
/// the type rather than two independent quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transshipment {
    #[default]
    None,
    AToB(usize),
    BToA(usize),
}

impl Transshipment {
    pub fn units(&self) -> usize {
        match *self {
            Transshipment::None => 0,
            Transshipment::AToB(q) | Transshipment::BToA(q) => q,
        }
    }

    /// Retailer stocks after the move, or `None` if the sender lacks the units.
    pub fn apply(&self, retailer_a: usize, retailer_b: usize) -> Option<(usize, usize)> {
        match *self {
            Transshipment::None => Some((retailer_a, retailer_b)),
            Transshipment::AToB(q) => Some((retailer_a.checked_sub(q)?, retailer_b + q)),
            Transshipment::BToA(q) => Some((retailer_a + q, retailer_b.checked_sub(q)?)),
        }
    }
}

/// One decision: `(warehouse_order, order_a, order_b, transship_a_to_b, transship_b_to_a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Action {
    /// Replenishment ordered by the warehouse, arriving next period.
    pub warehouse_order: usize,
    /// Units sent from the warehouse to retailer A, arriving next period.
    pub order_a: usize,
    pub order_b: usize,
    pub transshipment: Transshipment,
}

impl Action {
    pub const ZERO: Action = Action {
        warehouse_order: 0,
        order_a: 0,
        order_b: 0,
        transshipment: Transshipment::None,
    };

    pub fn transship_a_to_b(&self) -> usize {
        match self.transshipment {
            Transshipment::AToB(q) => q,
            _ => 0,
        }
    }

    pub fn transship_b_to_a(&self) -> usize {
        match self.transshipment {
            Transshipment::BToA(q) => q,
            _ => 0,
        }
    }

    pub fn as_tuple(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.warehouse_order,
            self.order_a,
            self.order_b,
            self.transship_a_to_b(),
            self.transship_b_to_a(),
        )
    }

    /// Rebuilds an action from its five-tuple form.
    ///
    /// Returns `None` when both transshipment quantities are non-zero.
    pub fn from_tuple(tuple: (usize, usize, usize, usize, usize)) -> Option<Self> {
        let (warehouse_order, order_a, order_b, a_to_b, b_to_a) = tuple;
        let transshipment = match (a_to_b, b_to_a) {
            (0, 0) => Transshipment::None,
            (q, 0) => Transshipment::AToB(q),
            (0, q) => Transshipment::BToA(q),
            _ => return None,
        };
        Some(Self {
            warehouse_order,
            order_a,
            order_b,
            transshipment,
        })
    }

    /// State after transshipment and the warehouse-to-retailer shipments leave.
    ///
    /// Retailer orders and the warehouse order are still in transit here; they
    /// only land in the next period's state.
    pub fn post_decision_state(&self, state: &State) -> Option<State> {
        let (retailer_a, retailer_b) = self
            .transshipment
            .apply(state.retailer_a, state.retailer_b)?;
        let warehouse = state
            .warehouse
            .checked_sub(self.order_a)?
            .checked_sub(self.order_b)?;
        Some(State::new(warehouse, retailer_a, retailer_b))
    }

    /// Whether this action is one the action generator could emit for `state`.
    pub fn is_feasible(&self, state: &State, space: &StateSpace) -> bool {
        let Some(post) = self.post_decision_state(state) else {
            return false;
        };
        post.retailer_a + self.order_a < space.max_retailer(Retailer::A)
            && post.retailer_b + self.order_b < space.max_retailer(Retailer::B)
            && state.warehouse + self.warehouse_order < space.max_warehouse()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, a, b, ab, ba) = self.as_tuple();
        write!(f, "({}, {}, {}, {}, {})", w, a, b, ab, ba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_conversion_rejects_two_way_transshipment() {
        assert_eq!(Action::from_tuple((0, 0, 0, 2, 1)), None);
        let action = Action::from_tuple((3, 1, 0, 0, 2)).unwrap();
        assert_eq!(action.transshipment, Transshipment::BToA(2));
        assert_eq!(action.as_tuple(), (3, 1, 0, 0, 2));
    }

    #[test]
    fn test_post_decision_state() {
        let action = Action {
            warehouse_order: 4,
            order_a: 1,
            order_b: 2,
            transshipment: Transshipment::AToB(2),
        };
        let post = action.post_decision_state(&State::new(5, 3, 1)).unwrap();
        assert_eq!(post, State::new(2, 1, 3));

        // Retailer B cannot send stock it does not have.
        let bad = Action {
            transshipment: Transshipment::BToA(2),
            ..Action::ZERO
        };
        assert_eq!(bad.post_decision_state(&State::new(0, 0, 1)), None);
    }

    #[test]
    fn test_feasibility_respects_bounds() {
        let space = StateSpace::new(5, 4, 4);
        let state = State::new(2, 3, 0);
        assert!(Action::ZERO.is_feasible(&state, &space));
        let overfill = Action {
            order_a: 1,
            ..Action::ZERO
        };
        assert!(!overfill.is_feasible(&state, &space));
        let too_much_warehouse = Action {
            warehouse_order: 3,
            ..Action::ZERO
        };
        assert!(!too_much_warehouse.is_feasible(&state, &space));
    }
}
