//! Dashboard page - environment overview and management

use shared::{EnvironmentApi, EnvironmentId, EnvironmentRecord, StatusPair};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::types::{BoardAction, BoardState};
use crate::components::{AddEnvironmentDialog, EnvironmentCard, Navigation};
use crate::ApiContext;

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let api = use_context::<ApiContext>();
    let state = use_reducer(BoardState::default);
    let show_add_dialog = use_state(|| false);

    // Load environments once on mount
    {
        let dispatcher = state.dispatcher();
        use_effect_with((), move |_| {
            match api {
                Some(api) => spawn_local(async move {
                    match api.client.list_environments().await {
                        Ok(records) => dispatcher.dispatch(BoardAction::Loaded(records)),
                        Err(e) => {
                            log::error!("Failed to load environments: {}", e);
                            dispatcher.dispatch(BoardAction::LoadFailed(
                                e.user_message().to_string(),
                            ));
                        }
                    }
                }),
                None => dispatcher.dispatch(BoardAction::LoadFailed(
                    "Backend is not configured".to_string(),
                )),
            }
            || ()
        });
    }

    let on_statuses = {
        let dispatcher = state.dispatcher();
        Callback::from(move |(id, statuses): (EnvironmentId, StatusPair)| {
            dispatcher.dispatch(BoardAction::Statuses(id, statuses));
        })
    };

    let on_deleted = {
        let dispatcher = state.dispatcher();
        Callback::from(move |id: EnvironmentId| dispatcher.dispatch(BoardAction::Removed(id)))
    };

    let on_created = {
        let dispatcher = state.dispatcher();
        Callback::from(move |record: EnvironmentRecord| {
            dispatcher.dispatch(BoardAction::Added(record))
        })
    };

    let open_dialog = {
        let show_add_dialog = show_add_dialog.clone();
        Callback::from(move |_: MouseEvent| show_add_dialog.set(true))
    };
    let close_dialog = {
        let show_add_dialog = show_add_dialog.clone();
        Callback::from(move |_: ()| show_add_dialog.set(false))
    };

    let stats = state.board.stats();

    let content = if state.loading {
        html! {
            <div class="dashboard-loading">
                <div class="spinner"></div>
                <p>{ "Loading environments..." }</p>
            </div>
        }
    } else if let Some(error) = &state.error {
        html! { <div class="dashboard-error">{ error }</div> }
    } else if state.board.is_empty() {
        html! {
            <div class="dashboard-empty">
                <p>{ "No environments yet." }</p>
                <p class="hint">{ "Add one to start monitoring its container apps." }</p>
            </div>
        }
    } else {
        html! {
            <div class="environment-grid">
                { for state.board.environments().iter().map(|env| html! {
                    <EnvironmentCard
                        key={env.id.0}
                        environment={env.clone()}
                        on_statuses={on_statuses.clone()}
                        on_deleted={on_deleted.clone()}
                    />
                }) }
            </div>
        }
    };

    html! {
        <div class="dashboard-container">
            <Navigation />
            <main class="dashboard-main">
                <div class="dashboard-header">
                    <div>
                        <h2>{ "Environments" }</h2>
                        <p class="dashboard-subtitle">
                            { "Monitor and operate your Azure Container Apps" }
                        </p>
                    </div>
                    <button class="button-primary" onclick={open_dialog}>
                        { "+ Add Environment" }
                    </button>
                </div>

                <div class="stats-row">
                    <div class="stat-card">
                        <span class="stat-label">{ "Total environments" }</span>
                        <span class="stat-value">{ stats.total }</span>
                    </div>
                    <div class="stat-card healthy">
                        <span class="stat-label">{ "Fully operational" }</span>
                        <span class="stat-value">{ stats.healthy }</span>
                    </div>
                    <div class="stat-card starting">
                        <span class="stat-label">{ "Starting" }</span>
                        <span class="stat-value">{ stats.starting }</span>
                    </div>
                    <div class="stat-card error">
                        <span class="stat-label">{ "Needs attention" }</span>
                        <span class="stat-value">{ stats.errored }</span>
                    </div>
                </div>

                { content }
            </main>

            if *show_add_dialog {
                <AddEnvironmentDialog on_close={close_dialog} {on_created} />
            }
        </div>
    }
}
