// src/io/reporting.rs

//! CSV export and import of solved tables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SolverError};
use crate::model::action::Action;
use crate::model::state::{State, StateSpace};
use crate::solver::tables::{PolicyTable, ValueTable};

/// One row of an exported policy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub period: usize,
    pub warehouse: usize,
    pub retailer_a: usize,
    pub retailer_b: usize,
    pub warehouse_order: usize,
    pub order_a: usize,
    pub order_b: usize,
    pub transship_a_to_b: usize,
    pub transship_b_to_a: usize,
}

/// One row of an exported value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub warehouse: usize,
    pub retailer_a: usize,
    pub retailer_b: usize,
    pub value: f64,
}

/// Writes every `(period, state) -> action` entry, period-major.
pub fn write_policy_table(path: impl AsRef<Path>, policy: &PolicyTable) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    let mut rows = 0;
    for (period, state, action) in policy.iter() {
        let (warehouse_order, order_a, order_b, transship_a_to_b, transship_b_to_a) =
            action.as_tuple();
        wtr.serialize(PolicyRecord {
            period,
            warehouse: state.warehouse,
            retailer_a: state.retailer_a,
            retailer_b: state.retailer_b,
            warehouse_order,
            order_a,
            order_b,
            transship_a_to_b,
            transship_b_to_a,
        })?;
        rows += 1;
    }
    wtr.flush()?;

    info!(rows, path = %path.display(), "policy table exported");
    Ok(())
}

pub fn write_value_table(path: impl AsRef<Path>, values: &ValueTable) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    for (state, value) in values.iter() {
        wtr.serialize(ValueRecord {
            warehouse: state.warehouse,
            retailer_a: state.retailer_a,
            retailer_b: state.retailer_b,
            value,
        })?;
    }
    wtr.flush()?;

    info!(rows = values.as_slice().len(), path = %path.display(), "value table exported");
    Ok(())
}

/// Reads a policy table back; every state of `space` must appear once per period.
pub fn read_policy_table(path: impl AsRef<Path>, space: StateSpace) -> Result<PolicyTable> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut periods: Vec<Vec<Option<Action>>> = Vec::new();

    for record in rdr.deserialize() {
        let record: PolicyRecord = record?;
        let state = State::new(record.warehouse, record.retailer_a, record.retailer_b);
        let index = space
            .index_of(&state)
            .ok_or_else(|| SolverError::PolicyShape(format!("state {} outside the space", state)))?;
        let action = Action::from_tuple((
            record.warehouse_order,
            record.order_a,
            record.order_b,
            record.transship_a_to_b,
            record.transship_b_to_a,
        ))
        .ok_or_else(|| {
            SolverError::PolicyShape(format!(
                "two-way transshipment in period {} state {}",
                record.period, state
            ))
        })?;
        if record.period == 0 {
            return Err(SolverError::PolicyShape("periods start at 1".to_string()));
        }
        if periods.len() < record.period {
            periods.resize_with(record.period, || vec![None; space.len()]);
        }
        periods[record.period - 1][index] = Some(action);
    }

    let periods = periods
        .into_iter()
        .enumerate()
        .map(|(i, actions)| {
            actions
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| SolverError::PolicyShape(format!("period {} is incomplete", i + 1)))
        })
        .collect::<Result<Vec<_>>>()?;

    PolicyTable::from_periods(space, periods)
}

pub fn read_value_table(path: impl AsRef<Path>, space: StateSpace) -> Result<ValueTable> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut values = vec![None; space.len()];

    for record in rdr.deserialize() {
        let record: ValueRecord = record?;
        let state = State::new(record.warehouse, record.retailer_a, record.retailer_b);
        let index = space
            .index_of(&state)
            .ok_or_else(|| SolverError::PolicyShape(format!("state {} outside the space", state)))?;
        values[index] = Some(record.value);
    }

    let values = values
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| SolverError::PolicyShape("value table is incomplete".to_string()))?;
    ValueTable::from_values(space, values)
}
