// src/model/state.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of warehouse pipeline stages the model tracks.
pub const LEAD_TIME: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Retailer {
    A,
    B,
}

/// A system state at the start of a decision period.
///
/// With a single pipeline stage the warehouse slot is the stock that is on hand
/// at the warehouse when the decision is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct State {
    pub warehouse: usize,
    pub retailer_a: usize,
    pub retailer_b: usize,
}

impl State {
    pub fn new(warehouse: usize, retailer_a: usize, retailer_b: usize) -> Self {
        Self {
            warehouse,
            retailer_a,
            retailer_b,
        }
    }

    pub fn retailer(&self, retailer: Retailer) -> usize {
        match retailer {
            Retailer::A => self.retailer_a,
            Retailer::B => self.retailer_b,
        }
    }

    /// Components in state-tuple order: pipeline stages, then retailer A, then B.
    pub fn components(&self) -> [usize; LEAD_TIME + 2] {
        [self.warehouse, self.retailer_a, self.retailer_b]
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.warehouse, self.retailer_a, self.retailer_b
        )
    }
}

/// The fixed, ordered domain of every state the model represents.
///
/// Each bound is exclusive. States are enumerated warehouse-major, then retailer A,
/// then retailer B, and a state's position in that order is its index into every
/// per-state table of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpace {
    max_warehouse: usize,
    max_retailer_a: usize,
    max_retailer_b: usize,
}

impl StateSpace {
    pub fn new(max_warehouse: usize, max_retailer_a: usize, max_retailer_b: usize) -> Self {
        Self {
            max_warehouse,
            max_retailer_a,
            max_retailer_b,
        }
    }

    pub fn max_warehouse(&self) -> usize {
        self.max_warehouse
    }

    pub fn max_retailer(&self, retailer: Retailer) -> usize {
        match retailer {
            Retailer::A => self.max_retailer_a,
            Retailer::B => self.max_retailer_b,
        }
    }

    pub fn len(&self) -> usize {
        self.max_warehouse * self.max_retailer_a * self.max_retailer_b
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, state: &State) -> bool {
        state.warehouse < self.max_warehouse
            && state.retailer_a < self.max_retailer_a
            && state.retailer_b < self.max_retailer_b
    }

    /// Position of `state` in the enumeration order, if it lies inside the bounds.
    pub fn index_of(&self, state: &State) -> Option<usize> {
        if !self.contains(state) {
            return None;
        }
        Some(self.index_unchecked(state.warehouse, state.retailer_a, state.retailer_b))
    }

    #[inline]
    pub(crate) fn index_unchecked(
        &self,
        warehouse: usize,
        retailer_a: usize,
        retailer_b: usize,
    ) -> usize {
        (warehouse * self.max_retailer_a + retailer_a) * self.max_retailer_b + retailer_b
    }

    pub fn state_at(&self, index: usize) -> Option<State> {
        if index >= self.len() {
            return None;
        }
        let retailer_b = index % self.max_retailer_b;
        let rest = index / self.max_retailer_b;
        let retailer_a = rest % self.max_retailer_a;
        let warehouse = rest / self.max_retailer_a;
        Some(State::new(warehouse, retailer_a, retailer_b))
    }

    /// Every state in index order.
    pub fn enumerate(&self) -> Vec<State> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.max_warehouse).flat_map(move |w| {
            (0..self.max_retailer_a)
                .flat_map(move |a| (0..self.max_retailer_b).map(move |b| State::new(w, a, b)))
        })
    }
}
