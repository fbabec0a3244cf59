//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod hospitals;
pub mod session;
pub mod shifts;
pub mod subscription;
