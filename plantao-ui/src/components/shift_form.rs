//! Shift Form Component
//!
//! Form for logging a shift, with hospital autocomplete on the location.

use leptos::*;

use crate::api::{self, NewShift};
use crate::state::global::{GlobalState, Hospital, ShiftStatus};

/// `1.500,00`, `1.500` or `1500,5` -> `1500.00` / `1500` / `1500.5`;
/// `None` when not a number
pub fn normalize_amount(input: &str) -> Option<String> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let canonical = if cleaned.contains(',') || is_grouped_thousands(&cleaned) {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    canonical.parse::<f64>().ok().map(|_| canonical)
}

/// `1.500` or `12.000.000`: dots that only separate groups of three digits
fn is_grouped_thousands(s: &str) -> bool {
    let mut groups = s.split('.');
    let head = groups.next().unwrap_or_default();
    let tail: Vec<&str> = groups.collect();
    let digits = |g: &str| g.chars().all(|c| c.is_ascii_digit());

    !tail.is_empty()
        && (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && digits(head)
        && tail.iter().all(|g| g.len() == 3 && digits(g))
}

#[component]
pub fn ShiftForm() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (location, set_location) = create_signal(String::new());
    let (date, set_date) = create_signal(chrono::Local::now().date_naive().to_string());
    let (hours, set_hours) = create_signal("12".to_string());
    let (gross, set_gross) = create_signal(String::new());
    let (tax, set_tax) = create_signal(String::new());
    let (status, set_status) = create_signal(ShiftStatus::Receivable);
    let (invoice, set_invoice) = create_signal(String::new());
    let (suggestions, set_suggestions) = create_signal(Vec::<Hospital>::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_location_input = move |ev: web_sys::Event| {
        let query = event_target_value(&ev);
        set_location.set(query.clone());

        if query.trim().chars().count() < 2 {
            set_suggestions.set(Vec::new());
            return;
        }

        spawn_local(async move {
            // Stale responses are dropped once the input has moved on
            if let Ok(hospitals) = api::search_hospitals(&query).await {
                if location.get_untracked() == query {
                    set_suggestions.set(hospitals);
                }
            }
        });
    };

    let state_for_submit = state.clone();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let (Some(hours_worked), Some(gross_amount)) = (
            normalize_amount(&hours.get()),
            normalize_amount(&gross.get()),
        ) else {
            state_for_submit.show_error("Horas e valor bruto precisam ser números");
            return;
        };

        let tax_text = tax.get();
        let tax_amount = if tax_text.trim().is_empty() {
            None
        } else {
            match normalize_amount(&tax_text) {
                Some(t) => Some(t),
                None => {
                    state_for_submit.show_error("Imposto precisa ser um número");
                    return;
                }
            }
        };

        let invoice_number = Some(invoice.get()).filter(|i| !i.trim().is_empty());

        let shift = NewShift {
            location: location.get(),
            date: date.get(),
            hours_worked,
            gross_amount,
            tax_amount,
            status: status.get(),
            invoice_number,
        };

        set_submitting.set(true);
        let state = state_for_submit.clone();
        spawn_local(async move {
            match api::create_shift(&shift).await {
                Ok(saved) => {
                    state.show_success(&format!("Plantão em {} registrado", saved.location));
                    state.invalidate();
                    set_location.set(String::new());
                    set_gross.set(String::new());
                    set_tax.set(String::new());
                    set_invoice.set(String::new());
                    set_suggestions.set(Vec::new());
                }
                Err(e) => {
                    state.show_error(&e);
                    state.refresh_subscription();
                }
            }
            set_submitting.set(false);
        });
    };

    let can_write = {
        let state = state.clone();
        create_memo(move |_| state.can_write())
    };

    view! {
        <form on:submit=on_submit class="space-y-4">
            <div class="relative">
                <label class="block text-sm text-gray-400 mb-2">"Local"</label>
                <input
                    type="text"
                    required
                    placeholder="Hospital, UPA, clínica..."
                    prop:value=move || location.get()
                    on:input=on_location_input
                    class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600
                           focus:border-primary-500 focus:outline-none"
                />
                {move || {
                    let list = suggestions.get();
                    (!list.is_empty()).then(|| view! {
                        <ul class="absolute z-10 w-full mt-1 bg-gray-700 rounded-lg shadow-lg border border-gray-600">
                            {list.into_iter().map(|h| {
                                let name = h.name.clone();
                                view! {
                                    <li
                                        on:click=move |_| {
                                            set_location.set(name.clone());
                                            set_suggestions.set(Vec::new());
                                        }
                                        class="px-4 py-2 hover:bg-gray-600 cursor-pointer"
                                    >
                                        <span>{h.name}</span>
                                        <span class="text-gray-400 text-sm ml-2">
                                            {format!("{} - {}", h.city, h.state)}
                                        </span>
                                    </li>
                                }
                            }).collect_view()}
                        </ul>
                    })
                }}
            </div>

            <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
                <Field label="Data">
                    <input
                        type="date"
                        required
                        prop:value=move || date.get()
                        on:input=move |ev| set_date.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    />
                </Field>
                <Field label="Horas">
                    <input
                        type="text"
                        inputmode="decimal"
                        required
                        prop:value=move || hours.get()
                        on:input=move |ev| set_hours.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    />
                </Field>
                <Field label="Valor bruto (R$)">
                    <input
                        type="text"
                        inputmode="decimal"
                        required
                        placeholder="1.500,00"
                        prop:value=move || gross.get()
                        on:input=move |ev| set_gross.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    />
                </Field>
                <Field label="Imposto (R$)">
                    <input
                        type="text"
                        inputmode="decimal"
                        placeholder="Automático"
                        prop:value=move || tax.get()
                        on:input=move |ev| set_tax.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    />
                </Field>
            </div>

            <div class="grid grid-cols-2 gap-4">
                <Field label="Status">
                    <select
                        on:change=move |ev| {
                            if let Some(s) = ShiftStatus::parse(&event_target_value(&ev)) {
                                set_status.set(s);
                            }
                        }
                        prop:value=move || status.get().as_str()
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    >
                        {ShiftStatus::ALL.into_iter().map(|s| view! {
                            <option value=s.as_str()>{s.label()}</option>
                        }).collect_view()}
                    </select>
                </Field>
                <Field label="Nota fiscal">
                    <input
                        type="text"
                        prop:value=move || invoice.get()
                        on:input=move |ev| set_invoice.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-3 py-2 border border-gray-600"
                    />
                </Field>
            </div>

            <button
                type="submit"
                disabled=move || submitting.get() || !can_write.get()
                class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600
                       disabled:cursor-not-allowed rounded-lg py-3 font-semibold transition-colors"
            >
                {move || if submitting.get() {
                    "Salvando..."
                } else if !can_write.get() {
                    "Assinatura necessária"
                } else {
                    "Registrar plantão"
                }}
            </button>
        </form>
    }
}

#[component]
fn Field(label: &'static str, children: Children) -> impl IntoView {
    view! {
        <div>
            <label class="block text-sm text-gray-400 mb-2">{label}</label>
            {children()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1.500,00").as_deref(), Some("1500.00"));
        assert_eq!(normalize_amount("R$ 89,5").as_deref(), Some("89.5"));
        assert_eq!(normalize_amount("12").as_deref(), Some("12"));
        assert_eq!(normalize_amount("1.500").as_deref(), Some("1500"));
        assert_eq!(normalize_amount("R$ 12.000.000").as_deref(), Some("12000000"));
        assert_eq!(normalize_amount("12.5").as_deref(), Some("12.5"));
        assert_eq!(normalize_amount("0.500").as_deref(), Some("0.500"));
        assert_eq!(normalize_amount("1500.00").as_deref(), Some("1500.00"));
        assert_eq!(normalize_amount("doze"), None);
    }
}
