pub mod actions;
pub mod costs;
pub mod implementations;
pub mod traits;
