pub mod action;
pub mod state;
