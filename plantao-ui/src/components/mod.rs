//! UI Components
//!
//! Reusable Leptos components for the logbook.

pub mod chart;
pub mod loading;
pub mod nav;
pub mod shift_form;
pub mod shift_table;
pub mod summary_card;
pub mod toast;
pub mod trial_banner;

pub use chart::MonthlyChart;
pub use loading::Loading;
pub use nav::Nav;
pub use shift_form::ShiftForm;
pub use shift_table::ShiftTable;
pub use summary_card::SummaryCard;
pub use toast::Toast;
pub use trial_banner::TrialBanner;
