//! Dashboard aggregation
//!
//! Folds a list of shifts into the figures the dashboard shows. Callers pass
//! the already-filtered shifts, so every total is exactly the sum of its
//! inputs. Sums saturate at `Decimal::MAX` instead of overflowing.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::shifts::{to_cents, Shift, ShiftStatus};
use crate::text::normalize;

/// Everything the dashboard renders
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub totals: Totals,
    /// One entry per status, always all three, in status order
    pub by_status: Vec<StatusTotals>,
    /// Gross still owed (receivable + late)
    pub receivable_amount: Decimal,
    /// Gross owed and overdue
    pub late_amount: Decimal,
    /// Sorted by gross descending, then name
    pub by_location: Vec<LocationStats>,
    /// Sorted by month ascending
    pub monthly: Vec<MonthlyStats>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Totals {
    pub shift_count: usize,
    pub hours: Decimal,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
    /// `None` without shifts
    pub average_gross_per_shift: Option<Decimal>,
    /// Gross per hour worked, `None` without hours
    pub average_hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusTotals {
    pub status: ShiftStatus,
    pub count: usize,
    pub gross: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationStats {
    pub location: String,
    pub count: usize,
    pub hours: Decimal,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
    pub hourly_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyStats {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
    pub hours: Decimal,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
}

#[derive(Default)]
struct Acc {
    count: usize,
    hours: Decimal,
    gross: Decimal,
    tax: Decimal,
}

impl Acc {
    fn add(&mut self, shift: &Shift) {
        self.count += 1;
        self.hours = self.hours.saturating_add(shift.hours_worked);
        self.gross = self.gross.saturating_add(shift.gross_amount);
        self.tax = self.tax.saturating_add(shift.tax_amount);
    }

    fn net(&self) -> Decimal {
        self.gross.saturating_sub(self.tax)
    }

    fn hourly_rate(&self) -> Option<Decimal> {
        ratio(self.gross, self.hours)
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator).map(to_cents)
    }
}

/// Aggregate shifts in one pass
pub fn summarize(shifts: &[Shift]) -> DashboardSummary {
    let mut total = Acc::default();
    let mut status: HashMap<ShiftStatus, (usize, Decimal)> = HashMap::new();
    // normalized name -> (display name, totals)
    let mut locations: HashMap<String, (String, Acc)> = HashMap::new();
    let mut months: BTreeMap<(i32, u32), Acc> = BTreeMap::new();

    for shift in shifts {
        total.add(shift);

        let entry = status.entry(shift.status).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(shift.gross_amount);

        locations
            .entry(normalize(&shift.location))
            .or_insert_with(|| (shift.location.trim().to_string(), Acc::default()))
            .1
            .add(shift);

        months
            .entry((shift.date.year(), shift.date.month()))
            .or_default()
            .add(shift);
    }

    let by_status: Vec<StatusTotals> = ShiftStatus::all()
        .iter()
        .map(|&s| {
            let (count, gross) = status.get(&s).copied().unwrap_or_default();
            StatusTotals {
                status: s,
                count,
                gross,
            }
        })
        .collect();

    let outstanding = |s: ShiftStatus| status.get(&s).map(|(_, g)| *g).unwrap_or_default();
    let late_amount = outstanding(ShiftStatus::Late);
    let receivable_amount = outstanding(ShiftStatus::Receivable).saturating_add(late_amount);

    let mut by_location: Vec<LocationStats> = locations
        .into_values()
        .map(|(location, acc)| LocationStats {
            location,
            count: acc.count,
            hours: acc.hours,
            gross: acc.gross,
            tax: acc.tax,
            net: acc.net(),
            hourly_rate: acc.hourly_rate(),
        })
        .collect();
    by_location.sort_by(|a, b| {
        b.gross
            .cmp(&a.gross)
            .then_with(|| a.location.cmp(&b.location))
    });

    let monthly = months
        .into_iter()
        .map(|((year, month), acc)| MonthlyStats {
            month: format!("{:04}-{:02}", year, month),
            count: acc.count,
            hours: acc.hours,
            gross: acc.gross,
            tax: acc.tax,
            net: acc.net(),
        })
        .collect();

    let totals = Totals {
        shift_count: total.count,
        hours: total.hours,
        gross: total.gross,
        tax: total.tax,
        net: total.net(),
        average_gross_per_shift: ratio(total.gross, Decimal::from(total.count)),
        average_hourly_rate: total.hourly_rate(),
    };

    DashboardSummary {
        totals,
        by_status,
        receivable_amount,
        late_amount,
        by_location,
        monthly,
    }
}
