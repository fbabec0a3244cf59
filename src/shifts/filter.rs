//! Shift filtering
//!
//! Filters compose by conjunction: a shift is kept only if it passes every
//! criterion that is set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shifts::error::{ShiftError, ShiftResult};
use crate::shifts::types::{Shift, ShiftStatus};
use crate::text::normalize;

/// Criteria for selecting shifts (also the query string of list endpoints)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShiftFilter {
    /// First date included
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Last date included
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Location name, compared case- and accent-insensitively
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

impl ShiftFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: inclusive date range
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Builder: location
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder: status
    pub fn status(mut self, status: ShiftStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> ShiftResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ShiftError::Validation(
                    "'from' date must not be after 'to' date".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Prepared form with the location normalized once
    fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            from: self.from,
            to: self.to,
            location: self
                .location
                .as_deref()
                .map(normalize)
                .filter(|l| !l.is_empty()),
            status: self.status,
        }
    }

    /// Whether a single shift passes
    pub fn matches(&self, shift: &Shift) -> bool {
        self.compile().matches(shift)
    }

    /// Keep matching shifts, preserving input order
    pub fn apply(&self, shifts: &[Shift]) -> Vec<Shift> {
        let compiled = self.compile();
        shifts
            .iter()
            .filter(|s| compiled.matches(s))
            .cloned()
            .collect()
    }
}

struct CompiledFilter {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    location: Option<String>,
    status: Option<ShiftStatus>,
}

impl CompiledFilter {
    fn matches(&self, shift: &Shift) -> bool {
        if let Some(from) = self.from {
            if shift.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if shift.date > to {
                return false;
            }
        }
        if let Some(status) = self.status {
            if shift.status != status {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if normalize(&shift.location) != *location {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn shift(id: &str, location: &str, date: (i32, u32, u32), status: ShiftStatus) -> Shift {
        Shift {
            id: id.to_string(),
            location: location.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            hours_worked: Decimal::from(12),
            gross_amount: Decimal::from(1000),
            tax_amount: Decimal::from(110),
            status,
            invoice_number: None,
            coordinates: None,
            facility_type: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Shift> {
        vec![
            shift("a", "Hospital São Luiz", (2025, 1, 5), ShiftStatus::Paid),
            shift("b", "UPA Centro", (2025, 1, 20), ShiftStatus::Receivable),
            shift("c", "Hospital São Luiz", (2025, 2, 1), ShiftStatus::Late),
            shift("d", "hospital sao luiz", (2025, 2, 15), ShiftStatus::Receivable),
        ]
    }

    fn ids(shifts: &[Shift]) -> Vec<&str> {
        shifts.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let all = sample();
        assert_eq!(ShiftFilter::new().apply(&all).len(), 4);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let all = sample();
        let filter = ShiftFilter::new().between(
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        assert_eq!(ids(&filter.apply(&all)), vec!["b", "c"]);
    }

    #[test]
    fn test_location_ignores_case_and_accents() {
        let all = sample();
        let filter = ShiftFilter::new().location("HOSPITAL SÃO LUIZ");
        assert_eq!(ids(&filter.apply(&all)), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_blank_location_is_ignored() {
        let all = sample();
        let filter = ShiftFilter::new().location("  ");
        assert_eq!(filter.apply(&all).len(), 4);
    }

    #[test]
    fn test_filters_compose() {
        let all = sample();
        let filter = ShiftFilter::new()
            .location("Hospital São Luiz")
            .between(
                NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            )
            .status(ShiftStatus::Receivable);
        assert_eq!(ids(&filter.apply(&all)), vec!["d"]);

        // Applying the criteria one at a time gives the same answer
        let step = ShiftFilter::new().location("Hospital São Luiz").apply(&all);
        let step = ShiftFilter::new()
            .between(
                NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            )
            .apply(&step);
        let step = ShiftFilter::new().status(ShiftStatus::Receivable).apply(&step);
        assert_eq!(ids(&step), vec!["d"]);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let filter = ShiftFilter::new().between(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_query_shape() {
        let filter: ShiftFilter =
            serde_json::from_str(r#"{"from": "2025-01-01", "status": "late"}"#).unwrap();
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filter.status, Some(ShiftStatus::Late));
        assert!(filter.to.is_none());
    }
}
