// src/io/demand.rs

//! Truncated demand distributions and the partial-fulfilment binomial table.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, Discrete, NegativeBinomial, Poisson};

use crate::error::{Result, SolverError};
use crate::model::state::Retailer;

/// Demand specification as it appears in configuration: a kind name plus its
/// positional parameters.
///
/// Accepted kinds are `"Poisson"` with `[lambda]` and `"NegBin"` with `[r, p]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSpec {
    pub kind: String,
    pub params: Vec<f64>,
}

impl DemandSpec {
    pub fn poisson(lambda: f64) -> Self {
        Self {
            kind: "Poisson".to_string(),
            params: vec![lambda],
        }
    }

    pub fn negative_binomial(r: f64, p: f64) -> Self {
        Self {
            kind: "NegBin".to_string(),
            params: vec![r, p],
        }
    }

    pub fn to_distribution(&self) -> Result<DemandDistribution> {
        match self.kind.to_ascii_lowercase().as_str() {
            "poisson" | "p" => {
                let lambda = self.param(0)?;
                Ok(DemandDistribution::Poisson { lambda })
            }
            "negbin" | "negative_binomial" | "nbinom" | "n" => {
                let r = self.param(0)?;
                let p = self.param(1)?;
                Ok(DemandDistribution::NegativeBinomial { r, p })
            }
            _ => Err(SolverError::UnsupportedDistribution(self.kind.clone())),
        }
    }

    fn param(&self, i: usize) -> Result<f64> {
        self.params
            .get(i)
            .copied()
            .ok_or_else(|| SolverError::InvalidDistribution {
                kind: self.kind.clone(),
                reason: format!("missing parameter #{}", i + 1),
            })
    }
}

impl Default for DemandSpec {
    fn default() -> Self {
        Self::poisson(2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemandDistribution {
    Poisson { lambda: f64 },
    /// Number of failures before the `r`-th success, success probability `p`.
    NegativeBinomial { r: f64, p: f64 },
}

impl DemandDistribution {
    fn name(&self) -> &'static str {
        match self {
            DemandDistribution::Poisson { .. } => "Poisson",
            DemandDistribution::NegativeBinomial { .. } => "NegBin",
        }
    }

    /// Probability mass for every value in `0..max_d`.
    ///
    /// The tail above `max_d - 1` is dropped and the remainder is not
    /// renormalized.
    pub fn pmf(&self, max_d: usize) -> Result<Pmf> {
        let invalid = |reason: String| SolverError::InvalidDistribution {
            kind: self.name().to_string(),
            reason,
        };

        let probabilities: Vec<f64> = match *self {
            // A zero rate is all mass on zero demand.
            DemandDistribution::Poisson { lambda } if lambda == 0.0 => {
                (0..max_d).map(|v| if v == 0 { 1.0 } else { 0.0 }).collect()
            }
            DemandDistribution::Poisson { lambda } => {
                let dist = Poisson::new(lambda).map_err(|e| invalid(e.to_string()))?;
                (0..max_d).map(|v| dist.pmf(v as u64)).collect()
            }
            DemandDistribution::NegativeBinomial { r, p } => {
                let dist = NegativeBinomial::new(r, p).map_err(|e| invalid(e.to_string()))?;
                (0..max_d).map(|v| dist.pmf(v as u64)).collect()
            }
        };

        Ok(Pmf { probabilities })
    }
}

/// Builds the truncated PMF table for a configured demand.
pub fn generate_pmf(spec: &DemandSpec, max_d: usize) -> Result<Pmf> {
    spec.to_distribution()?.pmf(max_d)
}

/// Everything random in one period: both retailers' truncated demand and the
/// partial-fulfilment table.
#[derive(Debug, Clone)]
pub struct DemandModel {
    retailer_a: Pmf,
    retailer_b: Pmf,
    fulfillment: FulfillmentTable,
    probability_cutoff: f64,
}

impl DemandModel {
    /// `max_fulfilled` bounds how many units the warehouse can ever serve in a
    /// period, i.e. the largest warehouse stock the model represents.
    pub fn new(
        retailer_a: Pmf,
        retailer_b: Pmf,
        partial_lost_sales_chance: f64,
        max_fulfilled: usize,
        probability_cutoff: f64,
    ) -> Result<Self> {
        let fulfillment = FulfillmentTable::new(partial_lost_sales_chance, max_fulfilled)?;
        Ok(Self {
            retailer_a,
            retailer_b,
            fulfillment,
            probability_cutoff,
        })
    }

    pub fn pmf(&self, retailer: Retailer) -> &Pmf {
        match retailer {
            Retailer::A => &self.retailer_a,
            Retailer::B => &self.retailer_b,
        }
    }

    pub fn fulfillment(&self) -> &FulfillmentTable {
        &self.fulfillment
    }

    /// Joint weights at or below this value are skipped in expectations.
    pub fn probability_cutoff(&self) -> f64 {
        self.probability_cutoff
    }
}

/// A truncated probability mass table over `0..len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pmf {
    probabilities: Vec<f64>,
}

impl Pmf {
    /// Wraps raw probabilities, value `i` having mass `probabilities[i]`.
    pub fn from_probabilities(probabilities: Vec<f64>) -> Self {
        Self { probabilities }
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn probability(&self, value: usize) -> f64 {
        self.probabilities.get(value).copied().unwrap_or(0.0)
    }

    /// `(value, probability)` pairs in increasing value order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.probabilities.iter().copied().enumerate()
    }

    /// Probability mass kept by the truncation.
    pub fn total_mass(&self) -> f64 {
        self.probabilities.iter().sum()
    }
}

/// `Binomial(n, p)` masses for every `n` up to a bound, where `p` is the
/// chance one unit of excess demand is served from warehouse stock.
#[derive(Debug, Clone)]
pub struct FulfillmentTable {
    max_n: usize,
    // Row n starts at n * (n + 1) / 2 and holds n + 1 entries.
    masses: Vec<f64>,
}

impl FulfillmentTable {
    pub fn new(p: f64, max_n: usize) -> Result<Self> {
        let mut masses = Vec::with_capacity((max_n + 1) * (max_n + 2) / 2);
        for n in 0..=max_n {
            let dist = Binomial::new(p, n as u64).map_err(|e| {
                SolverError::InvalidConfig(format!("partial lost sales chance {}: {}", p, e))
            })?;
            masses.extend((0..=n).map(|k| dist.pmf(k as u64)));
        }
        Ok(Self { max_n, masses })
    }

    pub fn max_n(&self) -> usize {
        self.max_n
    }

    /// Masses of `Binomial(n, p)` at `0..=n`.
    ///
    /// # Panics
    /// If `n` exceeds the bound the table was built for.
    #[inline]
    pub fn row(&self, n: usize) -> &[f64] {
        assert!(n <= self.max_n, "fulfilment table built up to {}, asked for {}", self.max_n, n);
        let start = n * (n + 1) / 2;
        &self.masses[start..start + n + 1]
    }
}
