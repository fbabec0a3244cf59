//! Summary Card Component

use leptos::*;

/// One headline number on the dashboard
#[component]
pub fn SummaryCard(
    /// Card title
    label: &'static str,
    /// Formatted value
    #[prop(into)]
    value: Signal<String>,
    /// Smaller text below the value
    #[prop(optional, into)]
    hint: Option<Signal<String>>,
    /// Tailwind text color for the value
    #[prop(default = "text-white")]
    accent: &'static str,
) -> impl IntoView {
    view! {
        <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
            <span class="text-gray-400 text-sm">{label}</span>
            <div class=format!("text-2xl font-bold mt-2 {}", accent)>{move || value.get()}</div>
            {move || hint.map(|h| view! {
                <div class="text-xs text-gray-500 mt-1">{h.get()}</div>
            })}
        </div>
    }
}
