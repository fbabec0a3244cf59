//! Dashboard Page
//!
//! Earnings overview: headline totals, monthly chart and per-location table.

use leptos::*;

use crate::api;
use crate::components::{Loading, MonthlyChart, SummaryCard};
use crate::state::global::{amount, format_brl, DashboardSummary, GlobalState};

/// Dashboard page component
#[component]
pub fn Dashboard() -> impl IntoView {
    let state_for_effect = use_context::<GlobalState>().expect("GlobalState not found");
    let summary = create_rw_signal(None::<DashboardSummary>);

    create_effect(move |_| {
        let query = state_for_effect.filter.get();
        let _ = state_for_effect.revision.get();

        let state = state_for_effect.clone();
        spawn_local(async move {
            state.loading.set(true);
            match api::fetch_dashboard(&query).await {
                Ok(data) => summary.set(Some(data)),
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to fetch dashboard: {}", e).into());
                    state.show_error(&e);
                }
            }
            state.loading.set(false);
        });
    });

    let money = move |f: fn(&DashboardSummary) -> &str| {
        Signal::derive(move || {
            summary
                .get()
                .map(|s| format_brl(amount(f(&s))))
                .unwrap_or_else(|| "—".to_string())
        })
    };

    let shift_count = Signal::derive(move || {
        summary
            .get()
            .map(|s| format!("{} plantões, {} h", s.totals.shift_count, s.totals.hours))
            .unwrap_or_default()
    });
    let hourly = Signal::derive(move || {
        summary
            .get()
            .and_then(|s| s.totals.average_hourly_rate)
            .map(|rate| format!("{} / hora", format_brl(amount(&rate))))
            .unwrap_or_default()
    });
    let months = Signal::derive(move || summary.get().map(|s| s.monthly).unwrap_or_default());

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Dashboard"</h1>
                <p class="text-gray-400 mt-1">"Quanto você faturou e quanto ainda falta receber"</p>
            </div>

            <section class="grid grid-cols-2 md:grid-cols-4 gap-4">
                <SummaryCard label="Bruto" value=money(|s| s.totals.gross.as_str()) hint=shift_count />
                <SummaryCard label="Líquido" value=money(|s| s.totals.net.as_str()) hint=hourly accent="text-green-400" />
                <SummaryCard label="A receber" value=money(|s| s.receivable_amount.as_str()) accent="text-yellow-400" />
                <SummaryCard label="Atrasado" value=money(|s| s.late_amount.as_str()) accent="text-red-400" />
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Por mês"</h2>
                {move || if summary.get().is_none() {
                    view! { <Loading /> }.into_view()
                } else {
                    view! { <MonthlyChart months=months /> }.into_view()
                }}
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Por local"</h2>
                <table class="w-full text-sm">
                    <thead class="text-gray-400 border-b border-gray-700">
                        <tr>
                            <th class="text-left py-2">"Local"</th>
                            <th class="text-right py-2">"Plantões"</th>
                            <th class="text-right py-2">"Bruto"</th>
                            <th class="text-right py-2">"Líquido"</th>
                            <th class="text-right py-2">"R$/hora"</th>
                        </tr>
                    </thead>
                    <tbody>
                        {move || summary.get().map(|s| s.by_location).unwrap_or_default().into_iter().map(|l| view! {
                            <tr class="border-b border-gray-800">
                                <td class="py-2">{l.location}</td>
                                <td class="py-2 text-right">{l.count}</td>
                                <td class="py-2 text-right">{format_brl(amount(&l.gross))}</td>
                                <td class="py-2 text-right">{format_brl(amount(&l.net))}</td>
                                <td class="py-2 text-right text-gray-400">
                                    {l.hourly_rate.map(|r| format_brl(amount(&r))).unwrap_or_else(|| "—".to_string())}
                                </td>
                            </tr>
                        }).collect_view()}
                    </tbody>
                </table>
            </section>
        </div>
    }
}
