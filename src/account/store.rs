//! Profile storage
//!
//! [`ProfileStore`] is the row-based profiles table. [`SqliteProfileStore`]
//! keeps it in a local SQLite file; the hosted backend client implements the
//! same trait over its REST table interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::account::error::{AccountError, AccountResult};
use crate::account::profile::{PlanType, Profile, ProfileUpdate};
use crate::storage::StorageError;

/// The profiles table
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Short label for logs and health output
    fn kind(&self) -> &'static str;

    async fn get(&self, id: &str) -> AccountResult<Option<Profile>>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Profile>>;

    async fn find_by_customer(&self, customer_id: &str) -> AccountResult<Option<Profile>>;

    async fn find_by_subscription(&self, subscription_id: &str) -> AccountResult<Option<Profile>>;

    /// Insert a new row; an existing id or email is a conflict
    async fn insert(&self, profile: Profile) -> AccountResult<Profile>;

    /// Apply a partial update, returning the new row
    async fn update(&self, id: &str, update: ProfileUpdate) -> AccountResult<Profile>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    subscription_status TEXT NOT NULL,
    trial_expires_at TEXT,
    plan_type TEXT,
    customer_id TEXT,
    subscription_id TEXT,
    created_at TEXT NOT NULL,
    last_login_at TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_profiles_email ON profiles(lower(email));
CREATE INDEX IF NOT EXISTS idx_profiles_customer ON profiles(customer_id);
CREATE INDEX IF NOT EXISTS idx_profiles_subscription ON profiles(subscription_id);
"#;

const COLUMNS: &str = "id, name, email, subscription_status, trial_expires_at, plan_type, \
                       customer_id, subscription_id, created_at, last_login_at";

/// Profiles in a local SQLite database
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the database file
    pub fn open(path: &Path) -> AccountResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::from)?;
        }
        let conn = Connection::open(path).map_err(StorageError::from)?;
        Self::with_connection(conn)
    }

    /// A throwaway database, for tests and demo runs
    pub fn in_memory() -> AccountResult<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AccountResult<Self> {
        conn.execute_batch(SCHEMA).map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AccountResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("profile store lock poisoned".to_string()).into())
    }

    fn select_one(&self, condition: &str, value: &str) -> AccountResult<Option<Profile>> {
        let conn = self.lock()?;
        select_where(&conn, condition, value)
    }
}

fn select_where(conn: &Connection, condition: &str, value: &str) -> AccountResult<Option<Profile>> {
    let sql = format!("SELECT {} FROM profiles WHERE {} LIMIT 1", COLUMNS, condition);
    let row = conn
        .query_row(&sql, params![value], ProfileRow::from_row)
        .optional()
        .map_err(StorageError::from)?;

    row.map(ProfileRow::into_profile).transpose()
}

/// Raw column values before timestamp and enum parsing
struct ProfileRow {
    id: String,
    name: String,
    email: String,
    subscription_status: String,
    trial_expires_at: Option<String>,
    plan_type: Option<String>,
    customer_id: Option<String>,
    subscription_id: Option<String>,
    created_at: String,
    last_login_at: Option<String>,
}

impl ProfileRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            subscription_status: row.get(3)?,
            trial_expires_at: row.get(4)?,
            plan_type: row.get(5)?,
            customer_id: row.get(6)?,
            subscription_id: row.get(7)?,
            created_at: row.get(8)?,
            last_login_at: row.get(9)?,
        })
    }

    fn into_profile(self) -> AccountResult<Profile> {
        let corrupt = |msg: String| AccountError::Storage(StorageError::Corruption(msg));

        Ok(Profile {
            subscription_status: self.subscription_status.parse().map_err(corrupt)?,
            trial_expires_at: self.trial_expires_at.as_deref().map(parse_time).transpose()?,
            plan_type: self
                .plan_type
                .as_deref()
                .map(str::parse::<PlanType>)
                .transpose()
                .map_err(corrupt)?,
            created_at: parse_time(&self.created_at)?,
            last_login_at: self.last_login_at.as_deref().map(parse_time).transpose()?,
            id: self.id,
            name: self.name,
            email: self.email,
            customer_id: self.customer_id,
            subscription_id: self.subscription_id,
        })
    }
}

fn parse_time(raw: &str) -> AccountResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::Corruption(format!("bad timestamp '{}' in profiles: {}", raw, e)).into()
        })
}

fn format_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339())
}

fn write_row(conn: &Connection, sql: &str, profile: &Profile) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        params![
            profile.id,
            profile.name,
            profile.email,
            profile.subscription_status.as_str(),
            format_time(profile.trial_expires_at),
            profile.plan_type.map(|p| p.as_str()),
            profile.customer_id,
            profile.subscription_id,
            profile.created_at.to_rfc3339(),
            format_time(profile.last_login_at),
        ],
    )
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, id: &str) -> AccountResult<Option<Profile>> {
        self.select_one("id = ?1", id)
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Profile>> {
        self.select_one("lower(email) = lower(?1)", email.trim())
    }

    async fn find_by_customer(&self, customer_id: &str) -> AccountResult<Option<Profile>> {
        self.select_one("customer_id = ?1", customer_id)
    }

    async fn find_by_subscription(&self, subscription_id: &str) -> AccountResult<Option<Profile>> {
        self.select_one("subscription_id = ?1", subscription_id)
    }

    async fn insert(&self, profile: Profile) -> AccountResult<Profile> {
        let conn = self.lock()?;

        if select_where(&conn, "id = ?1", &profile.id)?.is_some() {
            return Err(AccountError::Conflict(format!("profile {}", profile.id)));
        }
        if select_where(&conn, "lower(email) = lower(?1)", &profile.email)?.is_some() {
            return Err(AccountError::Conflict(format!("email {}", profile.email)));
        }

        let sql = format!(
            "INSERT INTO profiles ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            COLUMNS
        );
        write_row(&conn, &sql, &profile).map_err(StorageError::from)?;

        tracing::info!(profile_id = %profile.id, "Profile created");
        Ok(profile)
    }

    async fn update(&self, id: &str, update: ProfileUpdate) -> AccountResult<Profile> {
        let conn = self.lock()?;

        let mut profile = select_where(&conn, "id = ?1", id)?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        profile.apply(&update);

        write_row(
            &conn,
            "UPDATE profiles SET name = ?2, email = ?3, subscription_status = ?4, \
             trial_expires_at = ?5, plan_type = ?6, customer_id = ?7, subscription_id = ?8, \
             created_at = ?9, last_login_at = ?10 WHERE id = ?1",
            &profile,
        )
        .map_err(StorageError::from)?;

        tracing::debug!(profile_id = %id, status = %profile.subscription_status, "Profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::profile::SubscriptionStatus;
    use tempfile::tempdir;

    fn trial(id: &str, email: &str) -> Profile {
        Profile::new_trial(id, "Dr. Test", email, Utc::now(), 7)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteProfileStore::in_memory().unwrap();
        let profile = trial("u1", "ana@example.com");
        store.insert(profile.clone()).await.unwrap();

        let loaded = store.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.email, "ana@example.com");
        assert_eq!(loaded.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(
            loaded.trial_expires_at.map(|t| t.timestamp()),
            profile.trial_expires_at.map(|t| t.timestamp())
        );
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let store = SqliteProfileStore::in_memory().unwrap();
        store.insert(trial("u1", "Ana@Example.com")).await.unwrap();

        let found = store.find_by_email(" ana@example.COM ").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_duplicates_conflict() {
        let store = SqliteProfileStore::in_memory().unwrap();
        store.insert(trial("u1", "ana@example.com")).await.unwrap();

        assert!(matches!(
            store.insert(trial("u1", "other@example.com")).await,
            Err(AccountError::Conflict(_))
        ));
        assert!(matches!(
            store.insert(trial("u2", "ANA@example.com")).await,
            Err(AccountError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_provider_lookups() {
        let store = SqliteProfileStore::in_memory().unwrap();
        store.insert(trial("u1", "ana@example.com")).await.unwrap();

        let update = ProfileUpdate {
            subscription_status: Some(SubscriptionStatus::Active),
            plan_type: Some(PlanType::Monthly),
            customer_id: Some("cus_9".to_string()),
            subscription_id: Some("sub_9".to_string()),
            ..Default::default()
        };
        let updated = store.update("u1", update).await.unwrap();
        assert_eq!(updated.subscription_status, SubscriptionStatus::Active);

        let by_customer = store.find_by_customer("cus_9").await.unwrap().unwrap();
        assert_eq!(by_customer.plan_type, Some(PlanType::Monthly));
        let by_subscription = store.find_by_subscription("sub_9").await.unwrap().unwrap();
        assert_eq!(by_subscription.id, "u1");

        assert!(matches!(
            store.update("nobody", ProfileUpdate::default()).await,
            Err(AccountError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.db");
        {
            let store = SqliteProfileStore::open(&path).unwrap();
            store.insert(trial("u1", "ana@example.com")).await.unwrap();
        }
        let store = SqliteProfileStore::open(&path).unwrap();
        assert!(store.get("u1").await.unwrap().is_some());
    }
}
