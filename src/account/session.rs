//! Demo and admin session flags
//!
//! Kept in the `session` slot, separate from shift records, so clearing the
//! session never touches logged shifts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::account::error::{AccountError, AccountResult};
use crate::storage::{JsonSlot, SESSION_SLOT};
use crate::text::constant_time_compare;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionFlags {
    /// Exploring without an account
    #[serde(default)]
    pub demo: bool,
    /// Signed in with the admin password
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionFlags {
    /// Demo and admin sessions may write shifts regardless of subscription
    pub fn bypasses_subscription(&self) -> bool {
        self.demo || self.admin
    }
}

pub struct SessionStore {
    slot: JsonSlot<SessionFlags>,
    admin_password: Option<String>,
}

impl SessionStore {
    pub fn open(data_dir: &Path, admin_password: Option<String>) -> AccountResult<Self> {
        Ok(Self {
            slot: JsonSlot::open(data_dir, SESSION_SLOT)?,
            admin_password: admin_password.filter(|p| !p.is_empty()),
        })
    }

    pub async fn flags(&self) -> SessionFlags {
        self.slot.get().await
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_password.is_some()
    }

    pub async fn enter_demo(&self) -> AccountResult<SessionFlags> {
        let flags = self
            .slot
            .update(|flags| {
                flags.demo = true;
                flags.updated_at = Some(Utc::now());
                Ok::<_, AccountError>(flags.clone())
            })
            .await?;

        tracing::info!("Demo session started");
        Ok(flags)
    }

    pub async fn sign_in_admin(&self, password: &str) -> AccountResult<SessionFlags> {
        let expected = self
            .admin_password
            .as_deref()
            .ok_or_else(|| AccountError::Unauthorized("admin sign-in is disabled".to_string()))?;

        if !constant_time_compare(expected, password) {
            tracing::warn!("Rejected admin sign-in");
            return Err(AccountError::Unauthorized("invalid admin password".to_string()));
        }

        let flags = self
            .slot
            .update(|flags| {
                flags.admin = true;
                flags.updated_at = Some(Utc::now());
                Ok::<_, AccountError>(flags.clone())
            })
            .await?;

        tracing::info!("Admin session started");
        Ok(flags)
    }

    /// Drop both flags
    pub async fn clear(&self) -> AccountResult<()> {
        self.slot.clear().await?;
        tracing::info!("Session cleared");
        Ok(())
    }
}
