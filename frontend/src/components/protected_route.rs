//! Wrapper that only renders its children for a signed-in user.

use shared::{GuardView, SessionGuard};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::hooks::use_session;
use crate::Route;

#[derive(Properties, PartialEq)]
pub struct ProtectedRouteProps {
    pub children: Html,
}

/// Shows a neutral placeholder while sign-in is still being resolved, the
/// children once authenticated, and otherwise replaces the current history
/// entry with the login view (once per failed attempt).
#[function_component(ProtectedRoute)]
pub fn protected_route(props: &ProtectedRouteProps) -> Html {
    let snapshot = use_session();
    let guard = use_mut_ref(SessionGuard::new);
    let navigator = use_navigator();

    let decision = guard.borrow_mut().evaluate(&snapshot);

    use_effect_with(decision.redirect, move |redirect| {
        if let Some(redirect) = redirect {
            match navigator {
                Some(navigator) => {
                    log::info!("Not signed in, redirecting to {}", redirect.path);
                    navigator.replace_with_state(&Route::Login, redirect.state);
                }
                None => log::error!("ProtectedRoute rendered outside of a router"),
            }
        }
        || ()
    });

    match decision.view {
        GuardView::Children => props.children.clone(),
        GuardView::Loading => html! {
            <div class="auth-loading">
                <div class="spinner"></div>
                <p>{ "Authenticating session..." }</p>
            </div>
        },
        GuardView::Blank => html! {},
    }
}
