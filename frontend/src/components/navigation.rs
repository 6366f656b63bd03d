use yew::prelude::*;
use yew_router::prelude::*;

use crate::auth::AuthContext;
use crate::Route;

/// Top bar with the product name, the signed-in user and sign-out.
#[function_component(Navigation)]
pub fn navigation() -> Html {
    let auth = use_context::<AuthContext>();
    let navigator = use_navigator();

    let user = auth
        .as_ref()
        .and_then(|a| a.account.as_ref())
        .map(|a| a.display_name().to_string())
        .unwrap_or_default();

    let on_home = Callback::from(move |_: MouseEvent| {
        if let Some(navigator) = &navigator {
            navigator.push(&Route::Dashboard);
        }
    });

    let on_logout = Callback::from(move |_: MouseEvent| {
        if let Some(auth) = &auth {
            auth.provider.logout();
        }
    });

    html! {
        <nav class="top-nav">
            <div class="nav-brand" onclick={on_home}>
                <span class="nav-logo">{ "K" }</span>
                <div>
                    <h1>{ "KPortal" }</h1>
                    <p class="nav-subtitle">{ "Control Center" }</p>
                </div>
            </div>
            <div class="nav-user">
                if !user.is_empty() {
                    <span class="nav-user-name">{ user }</span>
                }
                <button class="nav-logout" onclick={on_logout}>{ "Sign out" }</button>
            </div>
        </nav>
    }
}
