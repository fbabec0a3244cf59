//! CSV export and import of shift records
//!
//! Export writes one row per shift with the derived net amount. Import is
//! lenient about formats people type into spreadsheets: `dd/mm/yyyy` dates,
//! `R$ 1.234,56` amounts and the Portuguese status names.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::shifts::error::{ShiftError, ShiftResult};
use crate::shifts::types::{NewShift, Shift};
use crate::storage::StorageError;

/// Exported row
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    date: String,
    location: &'a str,
    hours_worked: String,
    gross_amount: String,
    tax_amount: String,
    net_amount: String,
    status: String,
    invoice_number: Option<&'a str>,
    facility_type: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

/// Imported row; only location, date, hours and gross are required
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    hours_worked: Option<String>,
    #[serde(default)]
    gross_amount: Option<String>,
    #[serde(default)]
    tax_amount: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    invoice_number: Option<String>,
}

/// Parsed CSV: shifts ready for import plus per-line errors
#[derive(Debug, Default)]
pub struct CsvShifts {
    pub shifts: Vec<NewShift>,
    /// `(line number, message)`
    pub errors: Vec<(usize, String)>,
}

/// Render shifts as CSV with a header row
pub fn write_csv(shifts: &[Shift]) -> ShiftResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for shift in shifts {
        writer
            .serialize(ExportRow {
                id: &shift.id,
                date: shift.date.format("%Y-%m-%d").to_string(),
                location: &shift.location,
                hours_worked: shift.hours_worked.normalize().to_string(),
                gross_amount: shift.gross_amount.to_string(),
                tax_amount: shift.tax_amount.to_string(),
                net_amount: shift.net_amount().to_string(),
                status: shift.status.to_string(),
                invoice_number: shift.invoice_number.as_deref(),
                facility_type: shift.facility_type.map(|t| t.to_string()),
                lat: shift.coordinates.map(|c| c.lat),
                lng: shift.coordinates.map(|c| c.lng),
            })
            .map_err(csv_error)?;
    }

    if shifts.is_empty() {
        writer
            .write_record([
                "id",
                "date",
                "location",
                "hours_worked",
                "gross_amount",
                "tax_amount",
                "net_amount",
                "status",
                "invoice_number",
                "facility_type",
                "lat",
                "lng",
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()).into())
}

/// Parse CSV with a header row into shift inputs
pub fn read_csv<R: Read>(reader: R) -> CsvShifts {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parsed = CsvShifts::default();

    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        match result.map_err(|e| e.to_string()).and_then(to_new_shift) {
            Ok(shift) => parsed.shifts.push(shift),
            Err(e) => parsed.errors.push((line, e)),
        }
    }

    parsed
}

fn to_new_shift(row: ImportRow) -> Result<NewShift, String> {
    let location = required(row.location, "location")?;
    let date = parse_date(&required(row.date, "date")?)?;
    let hours = parse_amount(&required(row.hours_worked, "hours_worked")?)?;
    let gross = parse_amount(&required(row.gross_amount, "gross_amount")?)?;

    let mut shift = NewShift::new(location, date, hours, gross);
    shift.id = non_empty(row.id);
    if let Some(tax) = non_empty(row.tax_amount) {
        shift = shift.tax(parse_amount(&tax)?);
    }
    if let Some(status) = non_empty(row.status) {
        shift = shift.status(status.parse().map_err(|e: ShiftError| e.to_string())?);
    }
    if let Some(invoice) = non_empty(row.invoice_number) {
        shift = shift.invoice(invoice);
    }
    Ok(shift)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, column: &str) -> Result<String, String> {
    non_empty(value).ok_or_else(|| format!("missing {}", column))
}

/// `YYYY-MM-DD` or `DD/MM/YYYY`
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .map_err(|_| format!("Could not parse date: {}", input))
}

/// Accepts `1234.56`, `1234,56`, `1.234,56` and an optional `R$` prefix
pub fn parse_amount(input: &str) -> Result<Decimal, String> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let canonical = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    canonical
        .parse::<Decimal>()
        .map_err(|_| format!("Could not parse amount: {}", input.trim()))
}

fn csv_error(err: csv::Error) -> ShiftError {
    StorageError::Serialization(err.to_string()).into()
}
