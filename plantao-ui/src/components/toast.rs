//! Toast notifications
//!
//! Errors stay five seconds, successes three. Clicking a toast dismisses it.
//! Subscription errors (the server's access banner) use the warning style.

use leptos::*;

use crate::state::global::GlobalState;

#[derive(Clone, Copy, PartialEq, Debug)]
enum Tone {
    Success,
    Warning,
    Error,
}

impl Tone {
    fn of_error(message: &str) -> Self {
        let lower = message.to_lowercase();
        if ["subscri", "trial", "payment", "assin"].iter().any(|k| lower.contains(k)) {
            Tone::Warning
        } else {
            Tone::Error
        }
    }

    fn style(self) -> (&'static str, &'static str) {
        match self {
            Tone::Success => ("✓", "bg-green-600"),
            Tone::Warning => ("!", "bg-yellow-600"),
            Tone::Error => ("✕", "bg-red-600"),
        }
    }
}

#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let success = state.success;
    let error = state.error;

    view! {
        <div class="fixed bottom-20 right-4 z-50 space-y-2 max-w-sm" role="status">
            {move || success.get().map(|msg| view! {
                <ToastItem message=msg tone=Tone::Success on_dismiss=move || success.set(None) />
            })}
            {move || error.get().map(|msg| {
                let tone = Tone::of_error(&msg);
                view! { <ToastItem message=msg tone=tone on_dismiss=move || error.set(None) /> }
            })}
        </div>
    }
}

#[component]
fn ToastItem(
    message: String,
    tone: Tone,
    on_dismiss: impl Fn() + 'static,
) -> impl IntoView {
    let (icon, background) = tone.style();

    view! {
        <button
            on:click=move |_| on_dismiss()
            class=format!(
                "w-full text-left flex items-start space-x-3 {} text-white px-4 py-3 \
                 rounded-lg shadow-lg animate-slide-in",
                background
            )
        >
            <span class="font-bold">{icon}</span>
            <span class="text-sm">{message}</span>
        </button>
    }
}
