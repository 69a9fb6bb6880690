//! Optimal replenishment and lateral transshipment for a warehouse supplying two
//! retailers under partial lost sales.
//!
//! The solver runs finite-horizon backward induction over a truncated state
//! space. Demand is integrated out exactly against truncated PMFs; excess demand
//! at a retailer is served from warehouse stock unit by unit with probability
//! `p`, retailer A before retailer B.
//!
//! ```no_run
//! use transship_dp::solver::config::SolverConfig;
//! use transship_dp::solver::engine::BellmanSolver;
//! use transship_dp::model::state::State;
//!
//! let solver = BellmanSolver::new(SolverConfig::default().with_periods(3))?;
//! let solution = solver.solve()?;
//! let action = solution.policy.get(1, &State::new(5, 2, 0));
//! # Ok::<(), transship_dp::error::SolverError>(())
//! ```

pub mod error;
pub mod io;
pub mod model;
pub mod solver;
pub mod strategy;

pub use error::{Result, SolverError};
pub use solver::config::SolverConfig;
pub use solver::engine::BellmanSolver;
pub use solver::tables::{PolicyTable, Solution, ValueTable};
