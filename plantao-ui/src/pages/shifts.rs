//! Shifts Page
//!
//! Log a shift and manage the list.

use leptos::*;

use crate::components::{ShiftForm, ShiftTable};

#[component]
pub fn Shifts() -> impl IntoView {
    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Plantões"</h1>
                <p class="text-gray-400 mt-1">"Registre e acompanhe seus pagamentos"</p>
            </div>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Novo plantão"</h2>
                <ShiftForm />
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Histórico"</h2>
                <ShiftTable />
            </section>
        </div>
    }
}
