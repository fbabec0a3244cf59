//! Pages
//!
//! Top-level page components for each route.

pub mod account;
pub mod dashboard;
pub mod map;
pub mod shifts;

pub use account::Account;
pub use dashboard::Dashboard;
pub use map::Map;
pub use shifts::Shifts;
