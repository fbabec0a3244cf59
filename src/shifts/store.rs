//! Shift Store - CRUD over the `shifts` slot
//!
//! Every mutation runs inside a single slot update, so a record is either
//! fully validated and persisted or not stored at all.

use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::hospitals::HospitalCatalog;
use crate::shifts::error::{ShiftError, ShiftResult};
use crate::shifts::filter::ShiftFilter;
use crate::shifts::tax::TaxPolicy;
use crate::shifts::types::{NewShift, Shift, ShiftPatch, ShiftStatus};
use crate::storage::{JsonSlot, SHIFTS_SLOT};

/// Maximum records accepted by one import call
pub const MAX_IMPORT_BATCH: usize = 5_000;

/// Per-item outcome of an import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Ids of the stored records, in input order
    pub created: Vec<String>,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportError {
    /// Position in the submitted batch
    pub index: usize,
    pub error: String,
}

impl ImportReport {
    pub fn accepted(&self) -> usize {
        self.created.len()
    }

    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Persistent shift records
pub struct ShiftStore {
    slot: JsonSlot<Vec<Shift>>,
    policy: TaxPolicy,
    catalog: Arc<HospitalCatalog>,
}

impl ShiftStore {
    /// Open the store, loading `<data_dir>/shifts.json` if present
    pub fn open(
        data_dir: &Path,
        policy: TaxPolicy,
        catalog: Arc<HospitalCatalog>,
    ) -> ShiftResult<Self> {
        let slot = JsonSlot::open(data_dir, SHIFTS_SLOT)?;
        Ok(Self {
            slot,
            policy,
            catalog,
        })
    }

    pub fn policy(&self) -> &TaxPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &HospitalCatalog {
        &self.catalog
    }

    /// Directory holding the backing file
    pub fn data_dir(&self) -> &Path {
        self.slot.path().parent().unwrap_or_else(|| Path::new("."))
    }

    pub async fn count(&self) -> usize {
        self.slot.get().await.len()
    }

    /// All shifts, newest first
    pub async fn list(&self) -> Vec<Shift> {
        let mut shifts = self.slot.get().await;
        sort_newest_first(&mut shifts);
        shifts
    }

    /// Shifts matching `filter`, newest first
    pub async fn query(&self, filter: &ShiftFilter) -> ShiftResult<Vec<Shift>> {
        filter.validate()?;
        Ok(filter.apply(&self.list().await))
    }

    pub async fn get(&self, id: &str) -> ShiftResult<Shift> {
        self.slot
            .get()
            .await
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ShiftError::NotFound(id.to_string()))
    }

    /// Validate and store a new shift
    pub async fn create(&self, new: NewShift) -> ShiftResult<Shift> {
        let shift = self.build(new)?;

        let stored = self
            .slot
            .update(|shifts| {
                if shifts.iter().any(|s| s.id == shift.id) {
                    return Err(ShiftError::Conflict(shift.id.clone()));
                }
                shifts.push(shift.clone());
                Ok(shift)
            })
            .await?;

        tracing::info!(
            shift_id = %stored.id,
            location = %stored.location,
            date = %stored.date,
            "Shift created"
        );
        Ok(stored)
    }

    /// Apply an inline edit and re-validate the merged record
    pub async fn update(&self, id: &str, patch: ShiftPatch) -> ShiftResult<Shift> {
        if patch.is_empty() {
            return Err(ShiftError::Validation("Nothing to update".to_string()));
        }
        if patch.tax_amount.is_some() && (patch.recompute_tax || patch.tax_rate_percent.is_some()) {
            return Err(ShiftError::Validation(
                "Give either an explicit tax amount or a rate to recompute, not both".to_string(),
            ));
        }

        let updated = self
            .slot
            .update(|shifts| {
                let current = shifts
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| ShiftError::NotFound(id.to_string()))?;

                let merged = self.merge(current.clone(), patch)?;
                *current = merged.clone();
                Ok::<_, ShiftError>(merged)
            })
            .await?;

        tracing::info!(shift_id = %id, "Shift updated");
        Ok(updated)
    }

    /// Move a shift to another payment status
    pub async fn set_status(&self, id: &str, status: ShiftStatus) -> ShiftResult<Shift> {
        let updated = self
            .slot
            .update(|shifts| {
                let current = shifts
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| ShiftError::NotFound(id.to_string()))?;

                current.status = status;
                current.updated_at = Utc::now();
                Ok::<_, ShiftError>(current.clone())
            })
            .await?;

        tracing::info!(shift_id = %id, status = %status, "Shift status changed");
        Ok(updated)
    }

    /// Remove a shift, returning the deleted record
    pub async fn delete(&self, id: &str) -> ShiftResult<Shift> {
        let removed = self
            .slot
            .update(|shifts| {
                let idx = shifts
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or_else(|| ShiftError::NotFound(id.to_string()))?;
                Ok::<_, ShiftError>(shifts.remove(idx))
            })
            .await?;

        tracing::info!(shift_id = %id, "Shift deleted");
        Ok(removed)
    }

    /// Store many shifts at once, reporting failures per item.
    ///
    /// Valid items are kept even when others fail. The slot is written once.
    pub async fn import(&self, batch: Vec<NewShift>) -> ShiftResult<ImportReport> {
        if batch.is_empty() {
            return Err(ShiftError::Validation("Empty batch".to_string()));
        }
        if batch.len() > MAX_IMPORT_BATCH {
            return Err(ShiftError::Validation(format!(
                "Batch size exceeds maximum of {} shifts",
                MAX_IMPORT_BATCH
            )));
        }

        let mut report = ImportReport::default();
        let mut built = Vec::with_capacity(batch.len());
        for (index, new) in batch.into_iter().enumerate() {
            match self.build(new) {
                Ok(shift) => built.push((index, shift)),
                Err(e) => report.errors.push(ImportError {
                    index,
                    error: e.to_string(),
                }),
            }
        }

        if built.is_empty() {
            return Ok(report);
        }

        let report = self
            .slot
            .update(|shifts| {
                for (index, shift) in built {
                    if shifts.iter().any(|s| s.id == shift.id) {
                        report.errors.push(ImportError {
                            index,
                            error: ShiftError::Conflict(shift.id).to_string(),
                        });
                        continue;
                    }
                    report.created.push(shift.id.clone());
                    shifts.push(shift);
                }
                report.errors.sort_by_key(|e| e.index);
                Ok::<_, ShiftError>(report)
            })
            .await?;

        tracing::info!(
            accepted = report.accepted(),
            rejected = report.rejected(),
            "Shift import finished"
        );
        Ok(report)
    }

    /// Turn creation input into a full record
    fn build(&self, new: NewShift) -> ShiftResult<Shift> {
        new.validate()?;

        let tax_amount = match new.tax_amount {
            Some(tax) => tax,
            None => self
                .policy
                .withholding(new.gross_amount, new.tax_rate_percent)?,
        };

        let now = Utc::now();
        let mut shift = Shift {
            id: new
                .id
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            location: new.location.trim().to_string(),
            date: new.date,
            hours_worked: new.hours_worked,
            gross_amount: new.gross_amount,
            tax_amount,
            status: new.status,
            invoice_number: clean_invoice(new.invoice_number),
            coordinates: new.coordinates,
            facility_type: new.facility_type,
            created_at: now,
            updated_at: now,
        };

        self.enrich(&mut shift);
        shift.validate()?;
        Ok(shift)
    }

    fn merge(&self, mut shift: Shift, patch: ShiftPatch) -> ShiftResult<Shift> {
        let location_changed = match patch.location {
            Some(location) if location.trim() != shift.location => {
                shift.location = location.trim().to_string();
                true
            }
            _ => false,
        };

        if let Some(date) = patch.date {
            shift.date = date;
        }
        if let Some(hours) = patch.hours_worked {
            shift.hours_worked = hours;
        }
        if let Some(gross) = patch.gross_amount {
            shift.gross_amount = gross;
        }
        if let Some(tax) = patch.tax_amount {
            shift.tax_amount = tax;
        }
        if patch.recompute_tax || patch.tax_rate_percent.is_some() {
            shift.tax_amount = self
                .policy
                .withholding(shift.gross_amount, patch.tax_rate_percent)?;
        }
        if let Some(status) = patch.status {
            shift.status = status;
        }
        if patch.invoice_number.is_some() {
            shift.invoice_number = clean_invoice(patch.invoice_number);
        }

        // a new location invalidates coordinates that came with the old one
        if location_changed && patch.coordinates.is_none() && patch.facility_type.is_none() {
            shift.coordinates = None;
            shift.facility_type = None;
        }
        if let Some(coordinates) = patch.coordinates {
            shift.coordinates = Some(coordinates);
        }
        if let Some(facility_type) = patch.facility_type {
            shift.facility_type = Some(facility_type);
        }

        self.enrich(&mut shift);
        shift.updated_at = Utc::now();
        shift.validate()?;
        Ok(shift)
    }

    /// Fill coordinates and facility type from the reference list
    fn enrich(&self, shift: &mut Shift) {
        if shift.coordinates.is_some() && shift.facility_type.is_some() {
            return;
        }
        if let Some(hospital) = self.catalog.find_exact(&shift.location) {
            shift.coordinates.get_or_insert(hospital.coordinates);
            shift.facility_type.get_or_insert(hospital.facility_type);
        }
    }
}

fn clean_invoice(invoice: Option<String>) -> Option<String> {
    invoice
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn sort_newest_first(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shifts::types::{Coordinates, FacilityType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::{tempdir, TempDir};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_store() -> (TempDir, ShiftStore) {
        let dir = tempdir().unwrap();
        let store = ShiftStore::open(
            dir.path(),
            TaxPolicy::default(),
            Arc::new(HospitalCatalog::reference()),
        )
        .unwrap();
        (dir, store)
    }

    fn new_shift(location: &str, day: u32, gross: &str) -> NewShift {
        NewShift::new(location, date(2025, 3, day), dec("12"), dec(gross))
    }

    #[tokio::test]
    async fn test_create_derives_tax_and_id() {
        let (_dir, store) = open_store();
        let shift = store.create(new_shift("UPA Centro", 10, "1500.00")).await.unwrap();

        assert!(uuid::Uuid::parse_str(&shift.id).is_ok());
        assert_eq!(shift.tax_amount, dec("165.00"));
        assert_eq!(shift.net_amount(), dec("1335.00"));
        assert_eq!(shift.status, ShiftStatus::Receivable);
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_tax() {
        let (_dir, store) = open_store();
        let shift = store
            .create(new_shift("UPA Centro", 10, "1000").tax(dec("50")))
            .await
            .unwrap();
        assert_eq!(shift.tax_amount, dec("50"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let (_dir, store) = open_store();
        let bad = NewShift::new("UPA Centro", date(2025, 3, 1), Decimal::ZERO, dec("100"));

        assert!(matches!(store.create(bad).await, Err(ShiftError::Validation(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let (_dir, store) = open_store();
        let mut first = new_shift("UPA Centro", 10, "100");
        first.id = Some("shift-1".to_string());
        store.create(first.clone()).await.unwrap();

        assert!(matches!(store.create(first).await, Err(ShiftError::Conflict(_))));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_enriches_from_catalog() {
        let (_dir, store) = open_store();
        let shift = store
            .create(new_shift("hospital sirio-libanes", 10, "2000"))
            .await
            .unwrap();

        assert_eq!(shift.facility_type, Some(FacilityType::Hospital));
        assert!(shift.coordinates.is_some());

        let unknown = store.create(new_shift("Consultório Dr. Silva", 11, "300")).await.unwrap();
        assert!(unknown.coordinates.is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_persisted() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(HospitalCatalog::reference());
        {
            let store = ShiftStore::open(dir.path(), TaxPolicy::default(), catalog.clone()).unwrap();
            store.create(new_shift("A", 1, "100")).await.unwrap();
            store.create(new_shift("B", 20, "100")).await.unwrap();
            store.create(new_shift("C", 5, "100")).await.unwrap();
        }

        let store = ShiftStore::open(dir.path(), TaxPolicy::default(), catalog).unwrap();
        let locations: Vec<String> = store.list().await.into_iter().map(|s| s.location).collect();
        assert_eq!(locations, vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_update_merges_and_revalidates() {
        let (_dir, store) = open_store();
        let shift = store.create(new_shift("UPA Centro", 10, "1000")).await.unwrap();

        let patch = ShiftPatch {
            gross_amount: Some(dec("2000")),
            recompute_tax: true,
            invoice_number: Some("NF-123".to_string()),
            ..Default::default()
        };
        let updated = store.update(&shift.id, patch).await.unwrap();
        assert_eq!(updated.gross_amount, dec("2000"));
        assert_eq!(updated.tax_amount, dec("220.00"));
        assert_eq!(updated.invoice_number.as_deref(), Some("NF-123"));

        // Tax above the new gross is rejected and nothing changes
        let bad = ShiftPatch {
            gross_amount: Some(dec("10")),
            ..Default::default()
        };
        assert!(store.update(&shift.id, bad).await.is_err());
        assert_eq!(store.get(&shift.id).await.unwrap().gross_amount, dec("2000"));
    }

    #[tokio::test]
    async fn test_update_rate_only_recomputes_tax() {
        let (_dir, store) = open_store();
        let shift = store.create(new_shift("UPA Centro", 10, "1000")).await.unwrap();
        assert_eq!(shift.tax_amount, dec("110.00"));

        let patch = ShiftPatch {
            tax_rate_percent: Some(dec("5")),
            ..Default::default()
        };
        let updated = store.update(&shift.id, patch).await.unwrap();
        assert_eq!(updated.tax_amount, dec("50.00"));
        assert_eq!(updated.gross_amount, dec("1000"));
    }

    #[tokio::test]
    async fn test_create_rejects_amount_above_maximum() {
        let (_dir, store) = open_store();
        let huge = NewShift::new("X", date(2025, 3, 1), dec("12"), Decimal::MAX);

        assert!(matches!(store.create(huge).await, Err(ShiftError::Validation(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_clears_invoice_with_empty_string() {
        let (_dir, store) = open_store();
        let shift = store
            .create(new_shift("UPA Centro", 10, "1000").invoice("NF-1"))
            .await
            .unwrap();

        let patch = ShiftPatch {
            invoice_number: Some(String::new()),
            ..Default::default()
        };
        assert!(store.update(&shift.id, patch).await.unwrap().invoice_number.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_tax_with_recompute() {
        let (_dir, store) = open_store();
        let shift = store.create(new_shift("UPA Centro", 10, "1000")).await.unwrap();
        let patch = ShiftPatch {
            tax_amount: Some(dec("10")),
            recompute_tax: true,
            ..Default::default()
        };
        assert!(matches!(
            store.update(&shift.id, patch).await,
            Err(ShiftError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_location_change_resets_coordinates() {
        let (_dir, store) = open_store();
        let shift = store
            .create(
                new_shift("Consultório", 10, "500")
                    .at(Coordinates::new(-10.0, -40.0), FacilityType::Clinic),
            )
            .await
            .unwrap();

        let patch = ShiftPatch {
            location: Some("UPA Vergueiro".to_string()),
            ..Default::default()
        };
        let moved = store.update(&shift.id, patch).await.unwrap();
        assert_eq!(moved.facility_type, Some(FacilityType::EmergencyUnit));
        assert_ne!(moved.coordinates, Some(Coordinates::new(-10.0, -40.0)));
    }

    #[tokio::test]
    async fn test_set_status_and_delete() {
        let (_dir, store) = open_store();
        let shift = store.create(new_shift("UPA Centro", 10, "1000")).await.unwrap();

        let paid = store.set_status(&shift.id, ShiftStatus::Paid).await.unwrap();
        assert_eq!(paid.status, ShiftStatus::Paid);
        let late = store.set_status(&shift.id, ShiftStatus::Late).await.unwrap();
        assert_eq!(late.status, ShiftStatus::Late);

        let removed = store.delete(&shift.id).await.unwrap();
        assert_eq!(removed.id, shift.id);
        assert!(matches!(store.get(&shift.id).await, Err(ShiftError::NotFound(_))));
        assert!(matches!(store.delete(&shift.id).await, Err(ShiftError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_applies_filter() {
        let (_dir, store) = open_store();
        store.create(new_shift("UPA Centro", 1, "100")).await.unwrap();
        store
            .create(new_shift("UPA Centro", 15, "100").status(ShiftStatus::Paid))
            .await
            .unwrap();
        store.create(new_shift("Hospital X", 20, "100")).await.unwrap();

        let filter = ShiftFilter::new()
            .location("upa centro")
            .status(ShiftStatus::Receivable);
        let hits = store.query(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].date, date(2025, 3, 1));

        let inverted = ShiftFilter::new().between(date(2025, 3, 20), date(2025, 3, 1));
        assert!(store.query(&inverted).await.is_err());
    }

    #[tokio::test]
    async fn test_import_reports_per_item() {
        let (_dir, store) = open_store();
        let mut existing = new_shift("UPA Centro", 1, "100");
        existing.id = Some("dup".to_string());
        store.create(existing.clone()).await.unwrap();

        let batch = vec![
            new_shift("A", 2, "100"),
            NewShift::new("B", date(2025, 3, 3), dec("-1"), dec("100")),
            existing,
            new_shift("C", 4, "100"),
        ];
        let report = store.import(batch).await.unwrap();

        assert_eq!(report.accepted(), 2);
        let failed: Vec<usize> = report.errors.iter().map(|e| e.index).collect();
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(store.count().await, 3);
    }

    #[tokio::test]
    async fn test_import_rejects_empty_batch() {
        let (_dir, store) = open_store();
        assert!(store.import(Vec::new()).await.is_err());
    }
}
