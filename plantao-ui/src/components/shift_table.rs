//! Shift Table Component
//!
//! Filterable list of shifts with inline edits, status change and delete.

use leptos::*;

use crate::api::{self, ShiftEdit};
use crate::components::shift_form::normalize_amount;
use crate::state::global::{amount, format_brl, GlobalState, Shift, ShiftQuery, ShiftStatus};

#[component]
pub fn ShiftTable() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    // Refetch when the filter changes or a shift was saved
    let state_for_effect = state.clone();
    create_effect(move |_| {
        let query = state_for_effect.filter.get();
        let _ = state_for_effect.revision.get();

        let state = state_for_effect.clone();
        spawn_local(async move {
            state.loading.set(true);
            match api::fetch_shifts(&query).await {
                Ok(shifts) => state.shifts.set(shifts),
                Err(e) => state.show_error(&e),
            }
            state.loading.set(false);
        });
    });

    let shifts = state.shifts;
    let loading = state.loading;

    view! {
        <div class="space-y-4">
            <FilterBar />

            <div class="overflow-x-auto">
                <table class="w-full text-sm">
                    <thead class="text-gray-400 border-b border-gray-700">
                        <tr>
                            <th class="text-left py-2">"Data"</th>
                            <th class="text-left py-2">"Local"</th>
                            <th class="text-right py-2">"Horas"</th>
                            <th class="text-right py-2">"Bruto"</th>
                            <th class="text-right py-2">"Imposto"</th>
                            <th class="text-right py-2">"Líquido"</th>
                            <th class="text-left py-2 pl-4">"Status"</th>
                            <th />
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || shifts.get()
                            key=|shift| (shift.id.clone(), shift.updated_at.clone())
                            children=move |shift| view! { <ShiftRow shift=shift /> }
                        />
                    </tbody>
                </table>
            </div>

            {move || (shifts.get().is_empty() && !loading.get()).then(|| view! {
                <p class="text-gray-400 text-sm">"Nenhum plantão encontrado."</p>
            })}
        </div>
    }
}

#[component]
fn ShiftRow(shift: Shift) -> impl IntoView {
    let (editing, set_editing) = create_signal(false);

    move || {
        let shift = shift.clone();
        if editing.get() {
            view! { <ShiftEditRow shift=shift editing=set_editing /> }.into_view()
        } else {
            view! { <ShiftDisplayRow shift=shift editing=set_editing /> }.into_view()
        }
    }
}

#[component]
fn ShiftDisplayRow(shift: Shift, editing: WriteSignal<bool>) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let (confirming, set_confirming) = create_signal(false);

    let id = shift.id.clone();
    let state_for_status = state.clone();
    let on_status = move |ev: web_sys::Event| {
        let Some(status) = ShiftStatus::parse(&event_target_value(&ev)) else {
            return;
        };
        let id = id.clone();
        let state = state_for_status.clone();
        spawn_local(async move {
            match api::change_status(&id, status).await {
                Ok(_) => {
                    state.show_success(&format!("Status alterado para {}", status.label()));
                    state.invalidate();
                }
                Err(e) => {
                    state.show_error(&e);
                    state.refresh_subscription();
                    state.invalidate();
                }
            }
        });
    };

    let id = shift.id.clone();
    let on_delete = move |_: web_sys::MouseEvent| {
        let id = id.clone();
        let state = state.clone();
        spawn_local(async move {
            match api::delete_shift(&id).await {
                Ok(()) => {
                    state.show_success("Plantão excluído");
                    state.invalidate();
                }
                Err(e) => state.show_error(&e),
            }
            set_confirming.set(false);
        });
    };

    let status = shift.status;

    view! {
        <tr class="border-b border-gray-800 hover:bg-gray-800">
            <td class="py-2">{shift.date.format("%d/%m/%Y").to_string()}</td>
            <td class="py-2">
                {shift.location.clone()}
                {shift.invoice_number.clone().map(|nf| view! {
                    <span class="text-gray-500 text-xs ml-2">{format!("NF {}", nf)}</span>
                })}
            </td>
            <td class="py-2 text-right">{shift.hours_worked.clone()}</td>
            <td class="py-2 text-right">{format_brl(amount(&shift.gross_amount))}</td>
            <td class="py-2 text-right text-gray-400">{format_brl(amount(&shift.tax_amount))}</td>
            <td class="py-2 text-right font-semibold">{format_brl(shift.net_amount())}</td>
            <td class="py-2 pl-4">
                <select
                    on:change=on_status
                    class=format!("rounded px-2 py-1 text-xs {}", status.badge_class())
                >
                    {ShiftStatus::ALL.into_iter().map(|s| view! {
                        <option value=s.as_str() selected=s == status>{s.label()}</option>
                    }).collect_view()}
                </select>
            </td>
            <td class="py-2 text-right">
                {move || if confirming.get() {
                    let on_delete = on_delete.clone();
                    view! {
                        <span class="space-x-2">
                            <button on:click=on_delete class="text-red-400 hover:text-red-300">"Confirmar"</button>
                            <button on:click=move |_| set_confirming.set(false) class="text-gray-400">"Cancelar"</button>
                        </span>
                    }.into_view()
                } else {
                    view! {
                        <span class="space-x-2">
                            <button
                                on:click=move |_| editing.set(true)
                                class="text-gray-500 hover:text-white"
                            >
                                "Editar"
                            </button>
                            <button
                                on:click=move |_| set_confirming.set(true)
                                class="text-gray-500 hover:text-red-400"
                            >
                                "Excluir"
                            </button>
                        </span>
                    }.into_view()
                }}
            </td>
        </tr>
    }
}

/// Form values of a row being edited, as typed
#[derive(Clone, Debug, PartialEq)]
pub struct RowDraft {
    pub location: String,
    pub date: String,
    pub hours_worked: String,
    pub gross_amount: String,
    pub tax_amount: String,
    pub invoice_number: String,
}

impl RowDraft {
    pub fn from_shift(shift: &Shift) -> Self {
        Self {
            location: shift.location.clone(),
            date: shift.date.to_string(),
            hours_worked: shift.hours_worked.clone(),
            gross_amount: shift.gross_amount.clone(),
            tax_amount: shift.tax_amount.clone(),
            invoice_number: shift.invoice_number.clone().unwrap_or_default(),
        }
    }

    /// Fields that differ from `original`.
    ///
    /// A new gross with an untouched tax asks the server to recompute the tax.
    pub fn changes(&self, original: &Shift) -> Result<ShiftEdit, String> {
        let mut edit = ShiftEdit::default();

        let location = self.location.trim();
        if location.is_empty() {
            return Err("Local não pode ficar vazio".to_string());
        }
        if location != original.location {
            edit.location = Some(location.to_string());
        }

        if self.date.trim() != original.date.to_string() {
            edit.date = Some(self.date.trim().to_string());
        }

        let number = |text: &str, field: &str| {
            normalize_amount(text).ok_or_else(|| format!("{} precisa ser um número", field))
        };

        let hours = number(&self.hours_worked, "Horas")?;
        if amount(&hours) != amount(&original.hours_worked) {
            edit.hours_worked = Some(hours);
        }

        let gross = number(&self.gross_amount, "Valor bruto")?;
        if amount(&gross) != amount(&original.gross_amount) {
            edit.gross_amount = Some(gross);
        }

        let tax = number(&self.tax_amount, "Imposto")?;
        if amount(&tax) != amount(&original.tax_amount) {
            edit.tax_amount = Some(tax);
        } else if edit.gross_amount.is_some() {
            edit.recompute_tax = true;
        }

        let invoice = self.invoice_number.trim();
        if invoice != original.invoice_number.as_deref().unwrap_or_default() {
            edit.invoice_number = Some(invoice.to_string());
        }

        Ok(edit)
    }
}

#[component]
fn ShiftEditRow(shift: Shift, editing: WriteSignal<bool>) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let draft = create_rw_signal(RowDraft::from_shift(&shift));
    let (saving, set_saving) = create_signal(false);

    let on_save = move |_: web_sys::MouseEvent| {
        let edit = match draft.get().changes(&shift) {
            Ok(edit) if edit.is_empty() => {
                editing.set(false);
                return;
            }
            Ok(edit) => edit,
            Err(e) => {
                state.show_error(&e);
                return;
            }
        };

        set_saving.set(true);
        let id = shift.id.clone();
        let state = state.clone();
        spawn_local(async move {
            match api::update_shift(&id, &edit).await {
                Ok(saved) => {
                    state.show_success(&format!("Plantão em {} atualizado", saved.location));
                    editing.set(false);
                    state.invalidate();
                }
                Err(e) => {
                    state.show_error(&e);
                    state.refresh_subscription();
                }
            }
            set_saving.set(false);
        });
    };

    let field = move |value: fn(&RowDraft) -> String, set: fn(&mut RowDraft, String)| {
        view! {
            <input
                type="text"
                prop:value=move || draft.with(value)
                on:input=move |ev| draft.update(|d| set(d, event_target_value(&ev)))
                class="w-full bg-gray-700 rounded px-2 py-1 text-sm border border-gray-600"
            />
        }
    };

    view! {
        <tr class="border-b border-gray-800 bg-gray-800">
            <td class="py-2 pr-2">
                <input
                    type="date"
                    prop:value=move || draft.with(|d| d.date.clone())
                    on:change=move |ev| draft.update(|d| d.date = event_target_value(&ev))
                    class="bg-gray-700 rounded px-2 py-1 text-sm border border-gray-600"
                />
            </td>
            <td class="py-2 pr-2 space-y-1">
                {field(|d| d.location.clone(), |d, v| d.location = v)}
                {field(|d| d.invoice_number.clone(), |d, v| d.invoice_number = v)}
            </td>
            <td class="py-2 pr-2">{field(|d| d.hours_worked.clone(), |d, v| d.hours_worked = v)}</td>
            <td class="py-2 pr-2">{field(|d| d.gross_amount.clone(), |d, v| d.gross_amount = v)}</td>
            <td class="py-2 pr-2">{field(|d| d.tax_amount.clone(), |d, v| d.tax_amount = v)}</td>
            <td />
            <td />
            <td class="py-2 text-right">
                <span class="space-x-2">
                    <button
                        on:click=on_save
                        disabled=move || saving.get()
                        class="text-green-400 hover:text-green-300 disabled:text-gray-600"
                    >
                        "Salvar"
                    </button>
                    <button on:click=move |_| editing.set(false) class="text-gray-400">"Cancelar"</button>
                </span>
            </td>
        </tr>
    }
}

#[component]
fn FilterBar() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let filter = state.filter;

    let update = move |f: fn(&mut ShiftQuery, String), value: String| {
        filter.update(|q| f(q, value));
    };

    view! {
        <div class="grid grid-cols-2 md:grid-cols-4 gap-2">
            <input
                type="date"
                prop:value=move || filter.get().from.unwrap_or_default()
                on:change=move |ev| update(|q, v| q.from = Some(v), event_target_value(&ev))
                class="bg-gray-700 rounded px-3 py-2 text-sm border border-gray-600"
            />
            <input
                type="date"
                prop:value=move || filter.get().to.unwrap_or_default()
                on:change=move |ev| update(|q, v| q.to = Some(v), event_target_value(&ev))
                class="bg-gray-700 rounded px-3 py-2 text-sm border border-gray-600"
            />
            <input
                type="text"
                placeholder="Local"
                prop:value=move || filter.get().location.unwrap_or_default()
                on:change=move |ev| update(|q, v| q.location = Some(v), event_target_value(&ev))
                class="bg-gray-700 rounded px-3 py-2 text-sm border border-gray-600"
            />
            <select
                on:change=move |ev| update(|q, v| q.status = ShiftStatus::parse(&v), event_target_value(&ev))
                class="bg-gray-700 rounded px-3 py-2 text-sm border border-gray-600"
            >
                <option value="">"Todos"</option>
                {ShiftStatus::ALL.into_iter().map(|s| view! {
                    <option value=s.as_str()>{s.label()}</option>
                }).collect_view()}
            </select>
        </div>
    }
}
