//! Global Application State
//!
//! Reactive state shared by every page, plus the API types the pages render.
//! Amounts arrive as decimal strings and stay strings until they are shown.

use leptos::*;
use serde::{Deserialize, Serialize};

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Shifts matching the current filter
    pub shifts: RwSignal<Vec<Shift>>,
    /// Current list/dashboard filter
    pub filter: RwSignal<ShiftQuery>,
    /// Subscription and session state for the banner and write gating
    pub subscription: RwSignal<Option<SubscriptionInfo>>,
    /// Whether an access token is stored
    pub signed_in: RwSignal<bool>,
    /// Bumped after every shift change so pages refetch
    pub revision: RwSignal<u32>,
    /// Global loading state
    pub loading: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Paid,
    Receivable,
    Late,
}

impl ShiftStatus {
    pub const ALL: [ShiftStatus; 3] = [ShiftStatus::Paid, ShiftStatus::Receivable, ShiftStatus::Late];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Paid => "paid",
            ShiftStatus::Receivable => "receivable",
            ShiftStatus::Late => "late",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShiftStatus::Paid => "Pago",
            ShiftStatus::Receivable => "A receber",
            ShiftStatus::Late => "Atrasado",
        }
    }

    pub fn badge_class(&self) -> &'static str {
        match self {
            ShiftStatus::Paid => "bg-green-700 text-green-100",
            ShiftStatus::Receivable => "bg-yellow-700 text-yellow-100",
            ShiftStatus::Late => "bg-red-700 text-red-100",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Shift record from the API
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Shift {
    pub id: String,
    pub location: String,
    pub date: chrono::NaiveDate,
    pub hours_worked: String,
    pub gross_amount: String,
    pub tax_amount: String,
    pub status: ShiftStatus,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub facility_type: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

impl Shift {
    pub fn net_amount(&self) -> f64 {
        amount(&self.gross_amount) - amount(&self.tax_amount)
    }
}

/// Filter sent as query parameters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub location: Option<String>,
    pub status: Option<ShiftStatus>,
}

impl ShiftQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(from) = self.from.as_ref().filter(|s| !s.is_empty()) {
            params.push(("from", from.clone()));
        }
        if let Some(to) = self.to.as_ref().filter(|s| !s.is_empty()) {
            params.push(("to", to.clone()));
        }
        if let Some(location) = self.location.as_ref().filter(|s| !s.trim().is_empty()) {
            params.push(("location", location.trim().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Totals {
    pub shift_count: usize,
    pub hours: String,
    pub gross: String,
    pub tax: String,
    pub net: String,
    #[serde(default)]
    pub average_gross_per_shift: Option<String>,
    #[serde(default)]
    pub average_hourly_rate: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LocationStats {
    pub location: String,
    pub count: usize,
    pub hours: String,
    pub gross: String,
    pub net: String,
    #[serde(default)]
    pub hourly_rate: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
    pub gross: String,
    pub net: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DashboardSummary {
    pub totals: Totals,
    pub receivable_amount: String,
    pub late_amount: String,
    pub by_location: Vec<LocationStats>,
    pub monthly: Vec<MonthlyStats>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub city: String,
    pub state: String,
    pub coordinates: Coordinates,
    pub facility_type: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapMarker {
    pub location: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub facility_type: Option<String>,
    pub shift_count: usize,
    pub gross_amount: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SessionFlags {
    #[serde(default)]
    pub demo: bool,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription_status: String,
    #[serde(default)]
    pub plan_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubscriptionInfo {
    pub enforced: bool,
    pub can_write: bool,
    pub session: SessionFlags,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub banner: Option<String>,
}

/// Parse a decimal string from the API; unparsable values count as zero
pub fn amount(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let reais = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        shifts: create_rw_signal(Vec::new()),
        filter: create_rw_signal(ShiftQuery::default()),
        subscription: create_rw_signal(None),
        signed_in: create_rw_signal(crate::api::get_token().is_some()),
        revision: create_rw_signal(0),
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Whether the form and table may change shifts
    pub fn can_write(&self) -> bool {
        self.subscription
            .get()
            .map(|s| s.can_write)
            .unwrap_or(true)
    }

    /// Ask every page to refetch
    pub fn invalidate(&self) {
        self.revision.update(|r| *r += 1);
    }

    /// Reload the subscription banner state
    pub fn refresh_subscription(&self) {
        let subscription = self.subscription;
        spawn_local(async move {
            match crate::api::fetch_subscription_status().await {
                Ok(info) => subscription.set(Some(info)),
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to fetch subscription: {}", e).into());
                }
            }
        });
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(1500.0), "R$ 1.500,00");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(-89.5), "-R$ 89,50");
    }

    #[test]
    fn test_query_params_skip_blank() {
        let query = ShiftQuery {
            from: Some("2024-01-01".to_string()),
            to: Some(String::new()),
            location: Some("  ".to_string()),
            status: Some(ShiftStatus::Late),
        };
        assert_eq!(
            query.params(),
            vec![("from", "2024-01-01".to_string()), ("status", "late".to_string())]
        );
    }

    #[test]
    fn test_shift_from_api_json() {
        let shift: Shift = serde_json::from_str(
            r#"{"id":"a","location":"UPA Santana","date":"2024-03-09","hours_worked":"12",
                "gross_amount":"1500.00","tax_amount":"165.00","status":"receivable",
                "created_at":"2024-03-09T10:00:00Z","updated_at":"2024-03-09T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(shift.status, ShiftStatus::Receivable);
        assert_eq!(shift.net_amount(), 1335.0);
    }
}
