//! State Management
//!
//! Global application state and the API types it holds.

pub mod global;

pub use global::{provide_global_state, GlobalState, ShiftQuery, ShiftStatus};
