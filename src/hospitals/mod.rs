//! Hospital reference data
//!
//! - [`catalog`]: the reference facility list and autocomplete
//! - [`map`]: map markers built from located shifts

pub mod catalog;
pub mod map;

pub use catalog::{
    Hospital, HospitalCatalog, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, MIN_QUERY_LEN,
};
pub use map::{map_markers, MapMarker};
