//! App Root Component
//!
//! Main application component with routing and global providers.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{Nav, Toast, TrialBanner};
use crate::pages::{Account, Dashboard, Map, Shifts};
use crate::state::global::{provide_global_state, GlobalState};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    let state = use_context::<GlobalState>().expect("GlobalState not found");
    state.refresh_subscription();

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white flex flex-col">
                <Nav />
                <TrialBanner />

                <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                    <Routes>
                        <Route path="/" view=Dashboard />
                        <Route path="/shifts" view=Shifts />
                        <Route path="/map" view=Map />
                        <Route path="/account" view=Account />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <Footer />
                <Toast />
            </div>
        </Router>
    }
}

/// Footer with API status and the loading indicator
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let healthy = create_rw_signal(None::<bool>);

    spawn_local(async move {
        healthy.set(Some(api::check_health().await.is_ok()));
    });

    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm">
                <div class="flex items-center space-x-2">
                    {move || match healthy.get() {
                        Some(true) => view! {
                            <span class="flex items-center space-x-1 text-green-400">
                                <span class="w-2 h-2 bg-green-400 rounded-full" />
                                <span>"API online"</span>
                            </span>
                        }.into_view(),
                        Some(false) => view! {
                            <span class="flex items-center space-x-1 text-red-400">
                                <span class="w-2 h-2 bg-red-400 rounded-full" />
                                <span>"API indisponível"</span>
                            </span>
                        }.into_view(),
                        None => view! { <span class="text-gray-400">"Conectando..."</span> }.into_view(),
                    }}
                </div>

                <div class="text-gray-400">{api::get_api_base()}</div>

                {move || state.loading.get().then(|| view! {
                    <div class="flex items-center space-x-2 text-primary-400">
                        <div class="loading-spinner w-4 h-4" />
                        <span>"Carregando..."</span>
                    </div>
                })}
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <div class="text-6xl mb-4">"🔍"</div>
            <h1 class="text-3xl font-bold mb-2">"Página não encontrada"</h1>
            <A
                href="/"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Voltar ao dashboard"
            </A>
        </div>
    }
}
