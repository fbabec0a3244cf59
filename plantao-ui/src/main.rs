//! Plantão Dashboard
//!
//! Shift logbook front-end built with Leptos (WASM).
//!
//! # Features
//!
//! - Earnings dashboard with monthly chart
//! - Shift form with hospital autocomplete
//! - Map of worked locations
//! - Sign in, free trial and subscription checkout
//!
//! # Architecture
//!
//! Client-side rendered (CSR) Leptos application compiled to WebAssembly.
//! All data comes from the Plantão API over HTTP.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
