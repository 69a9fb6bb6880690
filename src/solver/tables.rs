// src/solver/tables.rs

//! Flat per-state tables keyed by the state's enumeration index.

use crate::error::{Result, SolverError};
use crate::model::action::Action;
use crate::model::state::{State, StateSpace};

/// One value per state of a [`StateSpace`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    space: StateSpace,
    values: Vec<f64>,
}

impl ValueTable {
    pub fn from_fn(space: StateSpace, f: impl Fn(&State) -> f64) -> Self {
        let values = space.iter().map(|s| f(&s)).collect();
        Self { space, values }
    }

    /// Wraps values given in enumeration order.
    pub fn from_values(space: StateSpace, values: Vec<f64>) -> Result<Self> {
        if values.len() != space.len() {
            return Err(SolverError::PolicyShape(format!(
                "expected {} values, got {}",
                space.len(),
                values.len()
            )));
        }
        Ok(Self { space, values })
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn get(&self, state: &State) -> Option<f64> {
        self.space.index_of(state).map(|i| self.values[i])
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (State, f64)> + '_ {
        self.space.iter().zip(self.values.iter().copied())
    }
}

/// The decision for every state in every period `1..=horizon`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    space: StateSpace,
    // periods[t - 1] holds period t, in state enumeration order.
    periods: Vec<Vec<Action>>,
}

impl PolicyTable {
    /// Builds a table from per-period action vectors, period 1 first.
    pub fn from_periods(space: StateSpace, periods: Vec<Vec<Action>>) -> Result<Self> {
        for (i, actions) in periods.iter().enumerate() {
            if actions.len() != space.len() {
                return Err(SolverError::PolicyShape(format!(
                    "period {} has {} actions for {} states",
                    i + 1,
                    actions.len(),
                    space.len()
                )));
            }
        }
        Ok(Self { space, periods })
    }

    /// Builds a table by asking `f` for the action of every `(period, state)`.
    pub fn from_fn(space: StateSpace, horizon: usize, f: impl Fn(usize, &State) -> Action) -> Self {
        let periods = (1..=horizon)
            .map(|t| space.iter().map(|s| f(t, &s)).collect())
            .collect();
        Self { space, periods }
    }

    pub(crate) fn empty(space: StateSpace, horizon: usize) -> Self {
        Self {
            space,
            periods: vec![Vec::new(); horizon],
        }
    }

    pub(crate) fn set_period(&mut self, period: usize, actions: Vec<Action>) {
        self.periods[period - 1] = actions;
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn horizon(&self) -> usize {
        self.periods.len()
    }

    /// Actions for `period` in state enumeration order.
    pub fn period(&self, period: usize) -> Option<&[Action]> {
        period
            .checked_sub(1)
            .and_then(|i| self.periods.get(i))
            .map(Vec::as_slice)
    }

    pub fn get(&self, period: usize, state: &State) -> Option<Action> {
        let index = self.space.index_of(state)?;
        self.period(period)?.get(index).copied()
    }

    /// `(period, state, action)` for every entry, period-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, State, Action)> + '_ {
        self.periods.iter().enumerate().flat_map(move |(i, actions)| {
            self.space
                .iter()
                .zip(actions.iter().copied())
                .map(move |(state, action)| (i + 1, state, action))
        })
    }
}

/// Output of a solve: the optimal policy for every period and `V[1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub policy: PolicyTable,
    pub values: ValueTable,
}
