// src/solver/config.rs

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SolverError};
use crate::io::demand::DemandSpec;
use crate::model::state::{StateSpace, LEAD_TIME};
use crate::strategy::costs::CostParameters;

/// Everything a solve needs, loadable from TOML.
///
/// ```
/// use transship_dp::solver::config::SolverConfig;
///
/// let config = SolverConfig::from_toml_str(r#"
///     periods = 3
///     lost_sales_cost = 12.0
///     retailer_truncation = [6, 8]
///
///     [[demand]]
///     kind = "Poisson"
///     params = [1.5]
///
///     [[demand]]
///     kind = "NegBin"
///     params = [2.0, 0.6]
/// "#).unwrap();
///
/// assert_eq!(config.periods, 3);
/// assert_eq!(config.demand[1].kind, "NegBin");
/// assert_eq!(config.warehouse_truncation, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Number of decision periods `T`.
    pub periods: usize,
    pub warehouse_lead_time: usize,
    /// Chance `p` that one unit of excess retailer demand is served from the
    /// warehouse rather than lost.
    pub partial_lost_sales_chance: f64,
    pub partial_lost_sales_cost: f64,
    pub transshipment_cost: f64,
    pub holding_warehouse: f64,
    pub holding_retailer: f64,
    /// Full lost sale (underage) cost.
    pub lost_sales_cost: f64,
    pub discount_factor: f64,
    /// Demand at retailer A then retailer B.
    pub demand: [DemandSpec; 2],
    /// Exclusive bound on warehouse stock.
    pub warehouse_truncation: usize,
    /// Exclusive bounds on retailer stock and demand, A then B.
    pub retailer_truncation: [usize; 2],
    /// Worker threads for the per-period sweep.
    pub workers: usize,
    /// Value per unit of leftover stock after the last period.
    pub terminal_unit_cost: f64,
    /// Expectation terms with weight at or below this are skipped.
    pub probability_cutoff: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            periods: 10,
            warehouse_lead_time: LEAD_TIME,
            partial_lost_sales_chance: 0.8,
            partial_lost_sales_cost: 0.0,
            transshipment_cost: 1.0,
            holding_warehouse: 1.0,
            holding_retailer: 1.0,
            lost_sales_cost: 18.0,
            discount_factor: 0.999,
            demand: [DemandSpec::default(), DemandSpec::default()],
            warehouse_truncation: 20,
            retailer_truncation: [10, 10],
            workers: 3,
            terminal_unit_cost: 0.0,
            probability_cutoff: 0.0,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_demand(mut self, retailer_a: DemandSpec, retailer_b: DemandSpec) -> Self {
        self.demand = [retailer_a, retailer_b];
        self
    }

    pub fn with_truncation(
        mut self,
        warehouse: usize,
        retailer_a: usize,
        retailer_b: usize,
    ) -> Self {
        self.warehouse_truncation = warehouse;
        self.retailer_truncation = [retailer_a, retailer_b];
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_terminal_unit_cost(mut self, unit_cost: f64) -> Self {
        self.terminal_unit_cost = unit_cost;
        self
    }

    pub fn state_space(&self) -> StateSpace {
        StateSpace::new(
            self.warehouse_truncation,
            self.retailer_truncation[0],
            self.retailer_truncation[1],
        )
    }

    pub fn cost_parameters(&self) -> CostParameters {
        CostParameters {
            holding_warehouse: self.holding_warehouse,
            holding_retailer: self.holding_retailer,
            lost_sales_cost: self.lost_sales_cost,
            partial_lost_sales_cost: self.partial_lost_sales_cost,
            transshipment_cost: self.transshipment_cost,
            discount_factor: self.discount_factor,
        }
    }

    /// Rejects configurations the solver cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.warehouse_lead_time != LEAD_TIME {
            return Err(SolverError::UnsupportedLeadTime(self.warehouse_lead_time));
        }
        if self.periods == 0 {
            return Err(invalid("periods must be at least 1"));
        }
        if !(self.discount_factor > 0.0 && self.discount_factor < 1.0) {
            return Err(invalid(format!(
                "discount factor must lie in (0, 1), got {}",
                self.discount_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.partial_lost_sales_chance) {
            return Err(invalid(format!(
                "partial lost sales chance must lie in [0, 1], got {}",
                self.partial_lost_sales_chance
            )));
        }
        let costs = [
            ("partial_lost_sales_cost", self.partial_lost_sales_cost),
            ("transshipment_cost", self.transshipment_cost),
            ("holding_warehouse", self.holding_warehouse),
            ("holding_retailer", self.holding_retailer),
            ("lost_sales_cost", self.lost_sales_cost),
        ];
        for (name, value) in costs {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.terminal_unit_cost.is_finite() {
            return Err(invalid("terminal_unit_cost must be finite"));
        }
        if self.warehouse_truncation == 0 || self.retailer_truncation.contains(&0) {
            return Err(invalid("truncation bounds must be at least 1"));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.probability_cutoff) {
            return Err(invalid("probability_cutoff must lie in [0, 1)"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> SolverError {
    SolverError::InvalidConfig(msg.into())
}
