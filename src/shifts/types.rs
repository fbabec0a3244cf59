//! Core data types for shift records
//!
//! - `Shift`: one completed work shift (a "plantão")
//! - `NewShift`: creation input from a form submission
//! - `ShiftPatch`: inline edit replacing any subset of fields
//! - `ShiftStatus`, `FacilityType`, `Coordinates`

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shifts::error::{ShiftError, ShiftResult};

pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_INVOICE_LEN: usize = 60;
pub const MAX_HOURS_PER_SHIFT: i64 = 48;
/// Upper bound for the gross amount of one shift, in reais
pub const MAX_SHIFT_AMOUNT: i64 = 100_000_000;

/// Payment status of a shift
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    /// Payment received
    #[serde(alias = "pago")]
    Paid,
    /// Awaiting payment
    #[serde(alias = "a_receber")]
    Receivable,
    /// Payment overdue
    #[serde(alias = "atrasado")]
    Late,
}

impl ShiftStatus {
    pub fn all() -> &'static [ShiftStatus] {
        &[ShiftStatus::Paid, ShiftStatus::Receivable, ShiftStatus::Late]
    }

    /// Whether money is still owed for this shift
    pub fn is_outstanding(&self) -> bool {
        matches!(self, ShiftStatus::Receivable | ShiftStatus::Late)
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftStatus::Paid => write!(f, "paid"),
            ShiftStatus::Receivable => write!(f, "receivable"),
            ShiftStatus::Late => write!(f, "late"),
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paid" | "pago" => Ok(ShiftStatus::Paid),
            "receivable" | "a_receber" => Ok(ShiftStatus::Receivable),
            "late" | "atrasado" => Ok(ShiftStatus::Late),
            other => Err(ShiftError::Validation(format!(
                "Invalid status: {}. Use paid, receivable, or late",
                other
            ))),
        }
    }
}

/// Kind of facility, known when the location comes from the reference list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    Hospital,
    #[serde(alias = "clinica")]
    Clinic,
    #[serde(alias = "upa")]
    EmergencyUnit,
    Other,
}

impl std::fmt::Display for FacilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacilityType::Hospital => write!(f, "hospital"),
            FacilityType::Clinic => write!(f, "clinic"),
            FacilityType::EmergencyUnit => write!(f, "emergency_unit"),
            FacilityType::Other => write!(f, "other"),
        }
    }
}

/// WGS84 coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> ShiftResult<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ShiftError::Validation(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(ShiftError::Validation(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }
        Ok(())
    }
}

/// One completed work shift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shift {
    /// Opaque identifier
    pub id: String,
    /// Where the shift was worked
    pub location: String,
    /// Calendar date of the shift
    pub date: NaiveDate,
    /// Hours worked (> 0)
    pub hours_worked: Decimal,
    /// Gross amount received
    pub gross_amount: Decimal,
    /// Withheld tax
    pub tax_amount: Decimal,
    pub status: ShiftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<FacilityType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Gross minus withheld tax
    pub fn net_amount(&self) -> Decimal {
        self.gross_amount - self.tax_amount
    }

    /// Check the record invariants
    pub fn validate(&self) -> ShiftResult<()> {
        if self.id.trim().is_empty() {
            return Err(ShiftError::Validation("Shift id cannot be empty".to_string()));
        }
        validate_location(&self.location)?;
        validate_hours(self.hours_worked)?;
        validate_amounts(self.gross_amount, self.tax_amount)?;
        validate_invoice(self.invoice_number.as_deref())?;
        if let Some(coords) = &self.coordinates {
            coords.validate()?;
        }
        Ok(())
    }
}

/// Shift creation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShift {
    /// Client-generated id; one is generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub hours_worked: Decimal,
    pub gross_amount: Decimal,
    /// Explicit tax; derived from the rate when absent
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    /// Rate override for the derived tax
    #[serde(default)]
    pub tax_rate_percent: Option<Decimal>,
    #[serde(default = "default_status")]
    pub status: ShiftStatus,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub facility_type: Option<FacilityType>,
}

fn default_status() -> ShiftStatus {
    ShiftStatus::Receivable
}

impl NewShift {
    pub fn new(
        location: impl Into<String>,
        date: NaiveDate,
        hours_worked: Decimal,
        gross_amount: Decimal,
    ) -> Self {
        Self {
            id: None,
            location: location.into(),
            date,
            hours_worked,
            gross_amount,
            tax_amount: None,
            tax_rate_percent: None,
            status: default_status(),
            invoice_number: None,
            coordinates: None,
            facility_type: None,
        }
    }

    /// Builder: explicit tax amount
    pub fn tax(mut self, amount: Decimal) -> Self {
        self.tax_amount = Some(amount);
        self
    }

    /// Builder: payment status
    pub fn status(mut self, status: ShiftStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: invoice number
    pub fn invoice(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    /// Builder: coordinates and facility type
    pub fn at(mut self, coordinates: Coordinates, facility_type: FacilityType) -> Self {
        self.coordinates = Some(coordinates);
        self.facility_type = Some(facility_type);
        self
    }

    /// Validate the fields a form submission controls
    pub fn validate(&self) -> ShiftResult<()> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() || id.len() > 100 {
                return Err(ShiftError::Validation(
                    "Shift id must be 1-100 characters".to_string(),
                ));
            }
        }
        validate_location(&self.location)?;
        validate_hours(self.hours_worked)?;
        validate_amounts(self.gross_amount, self.tax_amount.unwrap_or(Decimal::ZERO))?;
        validate_invoice(self.invoice_number.as_deref())?;
        if let Some(coords) = &self.coordinates {
            coords.validate()?;
        }
        Ok(())
    }
}

/// Inline edit: every present field replaces the stored one.
///
/// An empty `invoice_number` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftPatch {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    #[serde(default)]
    pub gross_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_rate_percent: Option<Decimal>,
    /// Re-derive tax from the (possibly new) gross amount
    #[serde(default)]
    pub recompute_tax: bool,
    #[serde(default)]
    pub status: Option<ShiftStatus>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub facility_type: Option<FacilityType>,
}

impl ShiftPatch {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.date.is_none()
            && self.hours_worked.is_none()
            && self.gross_amount.is_none()
            && self.tax_amount.is_none()
            && !self.recompute_tax
            && self.tax_rate_percent.is_none()
            && self.status.is_none()
            && self.invoice_number.is_none()
            && self.coordinates.is_none()
            && self.facility_type.is_none()
    }
}

fn validate_location(location: &str) -> ShiftResult<()> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ShiftError::Validation("Location cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        return Err(ShiftError::Validation(format!(
            "Location exceeds maximum length of {} characters",
            MAX_LOCATION_LEN
        )));
    }
    Ok(())
}

fn validate_hours(hours: Decimal) -> ShiftResult<()> {
    if hours <= Decimal::ZERO {
        return Err(ShiftError::Validation(
            "Hours worked must be greater than zero".to_string(),
        ));
    }
    if hours > Decimal::from(MAX_HOURS_PER_SHIFT) {
        return Err(ShiftError::Validation(format!(
            "Hours worked cannot exceed {} per shift",
            MAX_HOURS_PER_SHIFT
        )));
    }
    Ok(())
}

fn validate_amounts(gross: Decimal, tax: Decimal) -> ShiftResult<()> {
    if gross.is_sign_negative() && !gross.is_zero() {
        return Err(ShiftError::Validation(
            "Gross amount cannot be negative".to_string(),
        ));
    }
    if tax.is_sign_negative() && !tax.is_zero() {
        return Err(ShiftError::Validation("Tax amount cannot be negative".to_string()));
    }
    if gross > Decimal::from(MAX_SHIFT_AMOUNT) {
        return Err(ShiftError::Validation(format!(
            "Gross amount exceeds maximum of {} per shift",
            MAX_SHIFT_AMOUNT
        )));
    }
    if tax > gross {
        return Err(ShiftError::Validation(
            "Tax amount cannot exceed the gross amount".to_string(),
        ));
    }
    Ok(())
}

fn validate_invoice(invoice: Option<&str>) -> ShiftResult<()> {
    if let Some(number) = invoice {
        if number.chars().count() > MAX_INVOICE_LEN {
            return Err(ShiftError::Validation(format!(
                "Invoice number exceeds maximum length of {} characters",
                MAX_INVOICE_LEN
            )));
        }
    }
    Ok(())
}
