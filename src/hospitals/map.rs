//! Map markers for the shift map view

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::shifts::{Coordinates, FacilityType, Shift};
use crate::text::normalize;

/// One pin on the map: every located shift worked at the same place
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapMarker {
    pub location: String,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<FacilityType>,
    pub shift_count: usize,
    pub gross_amount: Decimal,
}

/// Group shifts with coordinates by location.
///
/// Locations are compared normalized. The first shift seen for a location
/// supplies its display name and coordinates. Markers come out sorted by shift
/// count descending, then name.
pub fn map_markers(shifts: &[Shift]) -> Vec<MapMarker> {
    let mut by_location: HashMap<String, MapMarker> = HashMap::new();

    for shift in shifts {
        let Some(coordinates) = shift.coordinates else {
            continue;
        };

        let marker = by_location
            .entry(normalize(&shift.location))
            .or_insert_with(|| MapMarker {
                location: shift.location.trim().to_string(),
                coordinates,
                facility_type: shift.facility_type,
                shift_count: 0,
                gross_amount: Decimal::ZERO,
            });

        marker.shift_count += 1;
        marker.gross_amount += shift.gross_amount;
        if marker.facility_type.is_none() {
            marker.facility_type = shift.facility_type;
        }
    }

    let mut markers: Vec<MapMarker> = by_location.into_values().collect();
    markers.sort_by(|a, b| {
        b.shift_count
            .cmp(&a.shift_count)
            .then_with(|| a.location.cmp(&b.location))
    });
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shifts::ShiftStatus;
    use chrono::{NaiveDate, Utc};

    fn shift(location: &str, gross: i64, coordinates: Option<Coordinates>) -> Shift {
        Shift {
            id: uuid::Uuid::new_v4().to_string(),
            location: location.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            hours_worked: Decimal::from(12),
            gross_amount: Decimal::from(gross),
            tax_amount: Decimal::ZERO,
            status: ShiftStatus::Paid,
            invoice_number: None,
            coordinates,
            facility_type: coordinates.map(|_| FacilityType::Hospital),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_groups_by_normalized_location() {
        let here = Some(Coordinates::new(-23.55, -46.63));
        let shifts = vec![
            shift("Hospital São Paulo", 1000, here),
            shift("hospital sao paulo", 500, here),
            shift("UPA Santana", 800, Some(Coordinates::new(-23.50, -46.62))),
        ];

        let markers = map_markers(&shifts);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].location, "Hospital São Paulo");
        assert_eq!(markers[0].shift_count, 2);
        assert_eq!(markers[0].gross_amount, Decimal::from(1500));
        assert_eq!(markers[1].location, "UPA Santana");
    }

    #[test]
    fn test_skips_shifts_without_coordinates() {
        let shifts = vec![shift("Consultório", 300, None)];
        assert!(map_markers(&shifts).is_empty());
    }
}
