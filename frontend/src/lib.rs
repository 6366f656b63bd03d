mod auth;
mod client;
mod components;
mod config;
mod hooks;
mod pages;
pub mod utils;

use std::rc::Rc;

use auth::{AuthContext, AzureAdSession};
use client::WasmApiClient;
use components::{ProtectedRoute, ToastProvider};
use pages::{dashboard::DashboardPage, login::LoginPage};
use shared::{AuthSessionProvider, CachedDiscovery};
use yew::prelude::*;
use yew_router::prelude::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Root,
    #[at("/dashboard")]
    Dashboard,
    #[at("/login")]
    Login,
    #[not_found]
    #[at("/404")]
    NotFound,
}

/// Backend client shared through the component tree.
#[derive(Clone)]
pub struct ApiContext {
    pub client: Rc<CachedDiscovery<WasmApiClient>>,
}

impl PartialEq for ApiContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.client, &other.client)
    }
}

/// Sends `/` and unknown paths to the dashboard without a history entry.
#[function_component(DashboardRedirect)]
fn dashboard_redirect() -> Html {
    let navigator = use_navigator();
    use_effect_with((), move |_| {
        if let Some(navigator) = navigator {
            navigator.replace(&Route::Dashboard);
        }
        || ()
    });
    html! {}
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Root | Route::NotFound => html! {
            <ProtectedRoute><DashboardRedirect /></ProtectedRoute>
        },
        Route::Dashboard => html! {
            <ProtectedRoute><DashboardPage /></ProtectedRoute>
        },
        Route::Login => html! { <LoginPage /> },
    }
}

#[function_component(App)]
fn app() -> Html {
    let session = use_memo((), |_| AzureAdSession::new(config::authority_config()));
    let api = use_memo((), |_| {
        CachedDiscovery::new(WasmApiClient::new(config::api_client_config()))
    });
    let snapshot = use_state(|| session.snapshot());

    // Track the session here too so the account in context stays current
    {
        let session = session.clone();
        let snapshot = snapshot.clone();
        use_effect_with((), move |_| {
            let setter = snapshot.setter();
            let subscription = session.subscribe(Box::new(move |s| setter.set(s)));
            session.handle_redirect();
            snapshot.set(session.snapshot());
            move || drop(subscription)
        });
    }

    // Drop an expired id token on the next minute boundary
    {
        let session = session.clone();
        use_effect_with((), move |_| {
            let interval = gloo::timers::callback::Interval::new(60_000, move || {
                session.expire_if_stale();
            });
            move || drop(interval)
        });
    }

    let auth_context = AuthContext {
        provider: session.clone(),
        account: snapshot.authenticated.then(|| session.account()).flatten(),
    };
    let api_context = ApiContext { client: api };

    html! {
        <ContextProvider<AuthContext> context={auth_context}>
            <ContextProvider<ApiContext> context={api_context}>
                <ToastProvider>
                    <BrowserRouter>
                        <Switch<Route> render={switch} />
                    </BrowserRouter>
                </ToastProvider>
            </ContextProvider<ApiContext>>
        </ContextProvider<AuthContext>>
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!(
        "KPortal v{} using backend {}",
        VERSION,
        config::api_base_url()
    );
    yew::Renderer::<App>::new().render();
}
