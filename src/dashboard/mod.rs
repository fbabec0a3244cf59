//! Earnings dashboard
//!
//! The aggregation behind `GET /api/v1/dashboard` and `plantao-cli dashboard`.

pub mod summary;

pub use summary::{summarize, DashboardSummary, LocationStats, MonthlyStats, StatusTotals, Totals};
