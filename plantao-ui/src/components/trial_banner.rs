//! Trial Banner
//!
//! Shows the access banner from `/subscription/status` (trial days left,
//! expired trial, lapsed payment) with a link to the account page.

use leptos::*;
use leptos_router::*;

use crate::state::global::GlobalState;

#[component]
pub fn TrialBanner() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        {move || {
            let info = state.subscription.get()?;
            let banner = info.banner?;
            let class = if info.can_write {
                "bg-yellow-800 text-yellow-100"
            } else {
                "bg-red-800 text-red-100"
            };

            Some(view! {
                <div class=format!("{} px-4 py-2 text-sm", class)>
                    <div class="container mx-auto flex items-center justify-between">
                        <span>{banner}</span>
                        <A href="/account" class="underline font-medium">"Assinar"</A>
                    </div>
                </div>
            })
        }}
    }
}
