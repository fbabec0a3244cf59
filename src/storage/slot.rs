//! JSON Slot - a named value persisted as a single JSON file
//!
//! Each slot lives at `<data_dir>/<name>.json` and is fully rewritten through a
//! temp file + rename on every change.
//!
//! # Usage
//! ```ignore
//! let slot: JsonSlot<Vec<Shift>> = JsonSlot::open(dir, "shifts")?;
//! slot.update(|shifts| { shifts.push(shift); Ok::<_, StorageError>(()) }).await?;
//! ```

use crate::storage::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const SLOT_VERSION: u32 = 1;

/// On-disk envelope
#[derive(Serialize, Deserialize)]
struct SlotData<T> {
    version: u32,
    value: T,
}

/// A persisted key-value slot holding one `T`
#[derive(Debug)]
pub struct JsonSlot<T> {
    name: String,
    path: PathBuf,
    value: RwLock<T>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    /// Open a slot, loading the file if it exists
    pub fn open(data_dir: &Path, name: &str) -> StorageResult<Self> {
        let path = data_dir.join(format!("{}.json", name));

        let value = if path.exists() {
            Self::load_from_file(&path, name)?
        } else {
            T::default()
        };

        Ok(Self {
            name: name.to_string(),
            path,
            value: RwLock::new(value),
        })
    }

    fn load_from_file(path: &Path, name: &str) -> StorageResult<T> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let data: SlotData<T> = serde_json::from_reader(reader).map_err(|e| {
            StorageError::Serialization(format!("Failed to load slot '{}': {}", name, e))
        })?;

        if data.version != SLOT_VERSION {
            return Err(StorageError::Corruption(format!(
                "slot '{}' has unsupported version {}",
                name, data.version
            )));
        }

        Ok(data.value)
    }

    /// Slot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current value
    pub async fn get(&self) -> T {
        self.value.read().await.clone()
    }

    /// Read-modify-write.
    ///
    /// `f` runs against a copy; the copy is persisted and only then becomes the
    /// live value. If `f` or the write fails, the slot is left untouched.
    pub async fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StorageError>,
    {
        let mut guard = self.value.write().await;
        let mut next = guard.clone();

        let result = f(&mut next)?;

        self.persist(&next)?;
        *guard = next;

        Ok(result)
    }

    /// Replace the whole value
    pub async fn replace(&self, value: T) -> StorageResult<()> {
        let mut guard = self.value.write().await;
        self.persist(&value)?;
        *guard = value;
        Ok(())
    }

    /// Reset to `T::default()`
    pub async fn clear(&self) -> StorageResult<()> {
        self.replace(T::default()).await
    }

    fn persist(&self, value: &T) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(
                &mut writer,
                &SlotData {
                    version: SLOT_VERSION,
                    value,
                },
            )?;
            writer.flush()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(slot = %self.name, "Persisted slot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_missing_slot_is_default() {
        let dir = tempdir().unwrap();
        let slot: JsonSlot<Vec<String>> = JsonSlot::open(dir.path(), "items").unwrap();

        assert!(slot.get().await.is_empty());
        assert!(!slot.path().exists());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let dir = tempdir().unwrap();

        {
            let slot: JsonSlot<Vec<String>> = JsonSlot::open(dir.path(), "items").unwrap();
            slot.update(|items| {
                items.push("a".to_string());
                items.push("b".to_string());
                Ok::<_, StorageError>(())
            })
            .await
            .unwrap();
        }

        let reopened: JsonSlot<Vec<String>> = JsonSlot::open(dir.path(), "items").unwrap();
        assert_eq!(reopened.get().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_value_untouched() {
        let dir = tempdir().unwrap();
        let slot: JsonSlot<Vec<u32>> = JsonSlot::open(dir.path(), "numbers").unwrap();
        slot.replace(vec![1, 2]).await.unwrap();

        let result: Result<(), StorageError> = slot
            .update(|numbers| {
                numbers.push(3);
                Err(StorageError::Corruption("rejected".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(slot.get().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let dir = tempdir().unwrap();
        let a: JsonSlot<Vec<u32>> = JsonSlot::open(dir.path(), "a").unwrap();
        let b: JsonSlot<Vec<u32>> = JsonSlot::open(dir.path(), "b").unwrap();

        a.replace(vec![1]).await.unwrap();
        b.clear().await.unwrap();

        assert_eq!(a.get().await, vec![1]);
        assert!(b.get().await.is_empty());
    }

    #[test]
    fn test_unknown_version_is_corruption() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("items.json"), r#"{"version": 9, "value": []}"#).unwrap();

        let result: StorageResult<JsonSlot<Vec<u32>>> = JsonSlot::open(dir.path(), "items");
        assert!(matches!(result, Err(StorageError::Corruption(_))));
    }
}
