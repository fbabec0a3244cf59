//! Shift records
//!
//! - [`types`]: the shift record, creation input and inline edits
//! - [`tax`]: simplified withholding
//! - [`filter`]: date range, location and status filters
//! - [`store`]: persistence in the `shifts` slot
//! - [`csv_io`]: spreadsheet export and import

pub mod csv_io;
pub mod error;
pub mod filter;
pub mod store;
pub mod tax;
pub mod types;

pub use csv_io::{read_csv, write_csv, CsvShifts};
pub use error::{ShiftError, ShiftResult};
pub use filter::ShiftFilter;
pub use store::{ImportError, ImportReport, ShiftStore, MAX_IMPORT_BATCH};
pub use tax::{to_cents, TaxPolicy};
pub use types::{
    Coordinates, FacilityType, NewShift, Shift, ShiftPatch, ShiftStatus, MAX_HOURS_PER_SHIFT,
    MAX_INVOICE_LEN, MAX_LOCATION_LEN, MAX_SHIFT_AMOUNT,
};
