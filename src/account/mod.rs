//! Accounts
//!
//! - [`profile`]: profiles, subscription status and access gating
//! - [`store`]: the profiles table
//! - [`session`]: demo and admin session flags
//! - [`service`]: sign-up, sign-in and cancellation flows

pub mod error;
pub mod profile;
pub mod service;
pub mod session;
pub mod store;

pub use error::{AccountError, AccountResult};
pub use profile::{
    AccessState, PlanType, Profile, ProfileUpdate, SubscriptionStatus, TRIAL_WARNING_DAYS,
};
pub use service::{AccountService, SignedIn};
pub use session::{SessionFlags, SessionStore};
pub use store::{ProfileStore, SqliteProfileStore};
