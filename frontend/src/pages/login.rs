use shared::session::LoginRequest;
use shared::{AuthResolution, InteractionStatus, LoginRedirectState};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::auth::AuthContext;
use crate::hooks::use_session;
use crate::{Route, VERSION};

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let auth = use_context::<AuthContext>();
    let snapshot = use_session();
    let navigator = use_navigator();
    let error = use_state(|| None::<String>);

    let session_failed = use_location()
        .and_then(|l| l.state::<LoginRedirectState>())
        .map(|s| s.ms_auth_failed)
        .unwrap_or(false);

    // Nothing to do here once signed in
    use_effect_with(snapshot.resolution(), move |resolution| {
        if *resolution == AuthResolution::Authenticated {
            if let Some(navigator) = navigator {
                navigator.replace(&Route::Dashboard);
            }
        }
        || ()
    });

    let on_sign_in = {
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(auth) = &auth else {
                return;
            };
            log::info!("Redirecting to Azure AD sign-in...");
            if let Err(e) = auth.provider.login_redirect(&LoginRequest::default()) {
                log::error!("Sign-in failed: {}", e);
                error.set(Some(e.to_string()));
            }
        })
    };

    let signing_in = snapshot.interaction == InteractionStatus::Login;

    html! {
        <div class="login-container">
            <div class="login-brand">
                <div class="login-logo">
                    <span class="nav-logo">{ "K" }</span>
                    <span class="login-product">{ "KPortal" }</span>
                </div>
                <h1>{ "Orchestrate Your Enterprise Edge" }</h1>
                <p class="tagline">
                    { "Securely manage, scale, and monitor your Azure Container Apps across all environments." }
                </p>
            </div>

            <div class="login-panel">
                <h2>{ "Welcome Back" }</h2>
                <p class="login-subtitle">
                    { "Sign in to the Control Center to manage your environments." }
                </p>

                if session_failed {
                    <div class="login-notice">
                        { "Your session expired or authentication failed. Please sign in again." }
                    </div>
                }
                if let Some(message) = &*error {
                    <div class="login-error">{ message }</div>
                }

                <button class="login-button" onclick={on_sign_in} disabled={signing_in}>
                    if signing_in {
                        <span class="spinner small"></span>
                    } else {
                        <span class="azure-icon">{ "⊞" }</span>
                        { " Sign in with Azure AD" }
                    }
                </button>

                <div class="login-footer">
                    <span class="version">{ format!("v{}", VERSION) }</span>
                </div>
            </div>
        </div>
    }
}
