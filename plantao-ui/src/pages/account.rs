//! Account Page
//!
//! Sign in/up, subscription status and checkout, demo mode and API settings.

use leptos::*;

use crate::api;
use crate::state::global::GlobalState;

#[component]
pub fn Account() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let signed_in = state.signed_in;

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Conta"</h1>
                <p class="text-gray-400 mt-1">"Assinatura, acesso e conexão"</p>
            </div>

            {move || if signed_in.get() {
                view! { <SubscriptionPanel /> }.into_view()
            } else {
                view! { <SignInPanel /> }.into_view()
            }}

            <DemoPanel />
            <ApiSettings />
        </div>
    }
}

#[derive(Clone, Copy, PartialEq)]
enum AuthMode {
    SignIn,
    SignUp,
}

#[component]
fn SignInPanel() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (mode, set_mode) = create_signal(AuthMode::SignIn);
    let (name, set_name) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (busy, set_busy) = create_signal(false);

    let state_for_submit = state.clone();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_busy.set(true);

        let state = state_for_submit.clone();
        let (name, email, password) = (name.get(), email.get(), password.get());
        let mode = mode.get();
        spawn_local(async move {
            let result = match mode {
                AuthMode::SignUp => match api::sign_up(&email, &password, &name).await {
                    Ok(()) => api::sign_in(&email, &password).await,
                    Err(e) => Err(e),
                },
                AuthMode::SignIn => api::sign_in(&email, &password).await,
            };

            match result {
                Ok(signed_in) => {
                    state.signed_in.set(true);
                    state.show_success(&format!("Bem-vindo, {}", signed_in.profile.name));
                    state.refresh_subscription();
                    state.invalidate();
                }
                Err(e) => state.show_error(&e),
            }
            set_busy.set(false);
        });
    };

    let state_for_reset = state.clone();
    let on_reset = move |_| {
        let email = email.get();
        if email.trim().is_empty() {
            state_for_reset.show_error("Informe o email para redefinir a senha");
            return;
        }
        let state = state_for_reset.clone();
        spawn_local(async move {
            match api::reset_password(&email).await {
                Ok(()) => state.show_success("Enviamos um link de redefinição para seu email"),
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 max-w-md">
            <div class="flex space-x-2 mb-4">
                <button
                    on:click=move |_| set_mode.set(AuthMode::SignIn)
                    class=move || tab_class(mode.get() == AuthMode::SignIn)
                >
                    "Entrar"
                </button>
                <button
                    on:click=move |_| set_mode.set(AuthMode::SignUp)
                    class=move || tab_class(mode.get() == AuthMode::SignUp)
                >
                    "Criar conta"
                </button>
            </div>

            <form on:submit=on_submit class="space-y-4">
                {move || (mode.get() == AuthMode::SignUp).then(|| view! {
                    <input
                        type="text"
                        required
                        placeholder="Nome"
                        prop:value=move || name.get()
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                        class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600"
                    />
                })}
                <input
                    type="email"
                    required
                    placeholder="Email"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600"
                />
                <input
                    type="password"
                    required
                    placeholder="Senha"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600"
                />
                <button
                    type="submit"
                    disabled=move || busy.get()
                    class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600 rounded-lg py-3 font-semibold"
                >
                    {move || match (busy.get(), mode.get()) {
                        (true, _) => "Aguarde...",
                        (false, AuthMode::SignIn) => "Entrar",
                        (false, AuthMode::SignUp) => "Começar teste grátis",
                    }}
                </button>
            </form>

            <button on:click=on_reset class="text-sm text-gray-400 hover:text-white mt-4">
                "Esqueci minha senha"
            </button>
        </section>
    }
}

fn tab_class(active: bool) -> &'static str {
    if active {
        "px-4 py-2 rounded-lg text-sm font-medium bg-gray-600 text-white"
    } else {
        "px-4 py-2 rounded-lg text-sm font-medium bg-gray-700 text-gray-400 hover:text-white"
    }
}

#[component]
fn SubscriptionPanel() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let subscription = state.subscription;

    let state_for_checkout = state.clone();
    let checkout = move |plan: &'static str| {
        let state = state_for_checkout.clone();
        spawn_local(async move {
            match api::create_checkout(plan).await {
                Ok(session) if session.stub => {
                    state.show_success(&format!("Checkout de teste criado ({})", session.id));
                }
                Ok(session) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href(&session.url);
                    }
                }
                Err(e) => state.show_error(&e),
            }
        });
    };
    let checkout_annual = checkout.clone();

    let state_for_cancel = state.clone();
    let on_cancel = move |_| {
        let state = state_for_cancel.clone();
        spawn_local(async move {
            match api::cancel_subscription().await {
                Ok(()) => {
                    state.show_success("Assinatura cancelada");
                    state.refresh_subscription();
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    let on_sign_out = move |_| {
        let state = state.clone();
        spawn_local(async move {
            if let Err(e) = api::clear_session().await {
                state.show_error(&e);
            }
            state.signed_in.set(false);
            state.refresh_subscription();
            state.invalidate();
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 space-y-4">
            <h2 class="text-xl font-semibold">"Assinatura"</h2>

            {move || subscription.get().and_then(|s| s.profile).map(|p| view! {
                <div class="space-y-1">
                    <p>{p.name}" ("{p.email}")"</p>
                    <p class="text-gray-400 text-sm">
                        "Status: "{p.subscription_status}
                        {p.plan_type.map(|plan| format!(" - plano {}", plan))}
                    </p>
                </div>
            })}

            {move || subscription.get().and_then(|s| s.banner).map(|b| view! {
                <p class="text-yellow-300 text-sm">{b}</p>
            })}

            <div class="flex flex-wrap gap-2">
                <button
                    on:click=move |_| checkout("monthly")
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium"
                >
                    "Assinar mensal"
                </button>
                <button
                    on:click=move |_| checkout_annual("annual")
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium"
                >
                    "Assinar anual"
                </button>
                <button on:click=on_cancel class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg">
                    "Cancelar assinatura"
                </button>
                <button on:click=on_sign_out class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg">
                    "Sair"
                </button>
            </div>
        </section>
    }
}

#[component]
fn DemoPanel() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let subscription = state.subscription;

    let on_demo = move |_| {
        let state = state.clone();
        spawn_local(async move {
            match api::enter_demo().await {
                Ok(_) => {
                    state.show_success("Modo demonstração ativado");
                    state.refresh_subscription();
                }
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-2">"Demonstração"</h2>
            {move || if subscription.get().map(|s| s.session.demo).unwrap_or(false) {
                view! { <p class="text-green-400">"Você está no modo demonstração."</p> }.into_view()
            } else {
                view! {
                    <button
                        on:click=on_demo.clone()
                        class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg"
                    >
                        "Explorar sem conta"
                    </button>
                }.into_view()
            }}
        </section>
    }
}

/// API connection settings
#[component]
fn ApiSettings() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let (api_url, set_api_url) = create_signal(api::get_api_base());
    let (testing, set_testing) = create_signal(false);

    let state_for_test = state.clone();
    let test_connection = move |_| {
        set_testing.set(true);
        api::set_api_base(&api_url.get());

        let state = state_for_test.clone();
        spawn_local(async move {
            match api::check_health().await {
                Ok(health) => state.show_success(&format!(
                    "Conectado: {} ({} plantões, auth {})",
                    health.status, health.shift_count, health.auth
                )),
                Err(e) => state.show_error(&format!("Falha na conexão: {}", e)),
            }
            set_testing.set(false);
        });
    };

    let save_url = move |_| {
        api::set_api_base(&api_url.get());
        state.show_success("URL da API salva");
        state.refresh_subscription();
        state.invalidate();
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"Conexão com a API"</h2>
            <div class="flex space-x-2">
                <input
                    type="text"
                    prop:value=move || api_url.get()
                    on:input=move |ev| set_api_url.set(event_target_value(&ev))
                    class="flex-1 bg-gray-700 rounded-lg px-4 py-3 border border-gray-600"
                />
                <button
                    on:click=test_connection
                    disabled=move || testing.get()
                    class="px-4 py-3 bg-gray-600 hover:bg-gray-500 disabled:bg-gray-700 rounded-lg font-medium"
                >
                    {move || if testing.get() { "Testando..." } else { "Testar" }}
                </button>
                <button on:click=save_url class="px-4 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium">
                    "Salvar"
                </button>
            </div>
        </section>
    }
}
