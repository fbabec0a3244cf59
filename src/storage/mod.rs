//! Local Storage
//!
//! Plantão keeps its working data on the local machine, in two independent
//! key-value slots under the data directory:
//!
//! - **shifts**: the array of shift records
//! - **session**: demo/admin session flags
//!
//! Profiles are not stored here; they belong to the hosted backend (or the
//! local SQLite profile table when no backend is configured).
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   shifts.json      {"version": 1, "value": [ ...shift records... ]}
//!   session.json     {"version": 1, "value": {"demo": false, "admin": false, ...}}
//!   profiles.db      local profile table (SqliteProfileStore)
//! ```

pub mod error;
pub mod slot;

pub use error::{StorageError, StorageResult};
pub use slot::JsonSlot;

/// Slot name for shift records
pub const SHIFTS_SLOT: &str = "shifts";

/// Slot name for session flags
pub const SESSION_SLOT: &str = "session";
