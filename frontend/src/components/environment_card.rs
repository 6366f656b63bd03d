//! Card for one environment: type badge, live container statuses, lifecycle
//! actions and the cost tile.

use gloo::timers::callback::Timeout;
use shared::status::{ControlState, OverallHealth, ACTION_FEEDBACK_MS};
use shared::{EnvAction, Environment, EnvironmentApi, EnvironmentId, EnvironmentType, StatusPair};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{ContainerRow, CostTile};
use crate::hooks::{use_live_status, use_toasts, CardAction};
use crate::ApiContext;

#[derive(Properties, PartialEq)]
pub struct EnvironmentCardProps {
    pub environment: Environment,
    /// Reports every status change so the dashboard stats stay current
    pub on_statuses: Callback<(EnvironmentId, StatusPair)>,
    pub on_deleted: Callback<EnvironmentId>,
}

fn type_class(env_type: EnvironmentType) -> &'static str {
    match env_type {
        EnvironmentType::Prod => "type-prod",
        EnvironmentType::Qa => "type-qa",
        EnvironmentType::Dev => "type-dev",
        EnvironmentType::Integration => "type-int",
    }
}

fn health_class(health: OverallHealth) -> &'static str {
    match health {
        OverallHealth::Healthy => "health-ok",
        OverallHealth::Starting => "health-starting",
        OverallHealth::Error => "health-error",
    }
}

#[function_component(EnvironmentCard)]
pub fn environment_card(props: &EnvironmentCardProps) -> Html {
    let env = &props.environment;
    let api = use_context::<ApiContext>();
    let toasts = use_toasts();
    let card = use_live_status(env.id, env.statuses());
    let deleting = use_state(|| false);

    {
        let on_statuses = props.on_statuses.clone();
        let id = env.id;
        use_effect_with(card.0.statuses, move |statuses| {
            on_statuses.emit((id, *statuses));
            || ()
        });
    }

    let on_action = {
        let dispatcher = card.dispatcher();
        let api = api.clone();
        let toasts = toasts.clone();
        let id = env.id;
        let name = env.name.clone();
        Callback::from(move |action: EnvAction| {
            let Some(api) = api.clone() else {
                return;
            };
            let dispatcher = dispatcher.clone();
            let toasts = toasts.clone();
            let name = name.clone();

            dispatcher.dispatch(CardAction::Begin(action));
            spawn_local(async move {
                match api.client.run_action(id, action).await {
                    Ok(_) => {
                        dispatcher.dispatch(CardAction::Complete(action, true));
                        toasts.success(format!("{} requested for {}", action.label(), name));
                        Timeout::new(ACTION_FEEDBACK_MS, move || {
                            dispatcher.dispatch(CardAction::ClearFeedback(action));
                        })
                        .forget();
                    }
                    Err(e) => {
                        log::error!("{} failed for environment {}: {}", action.label(), id, e);
                        dispatcher.dispatch(CardAction::Complete(action, false));
                        toasts.error(format!(
                            "{} failed for {}: {}",
                            action.label(),
                            name,
                            e.user_message()
                        ));
                    }
                }
            });
        })
    };

    let on_delete = {
        let api = api.clone();
        let toasts = toasts.clone();
        let deleting = deleting.clone();
        let on_deleted = props.on_deleted.clone();
        let id = env.id;
        let name = env.name.clone();
        Callback::from(move |_: MouseEvent| {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message(&format!("Delete environment \"{}\"?", name))
                        .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let Some(api) = api.clone() else {
                return;
            };
            let toasts = toasts.clone();
            let deleting = deleting.clone();
            let on_deleted = on_deleted.clone();
            let name = name.clone();

            deleting.set(true);
            spawn_local(async move {
                match api.client.delete_environment(id).await {
                    Ok(()) => {
                        toasts.success(format!("Deleted {}", name));
                        on_deleted.emit(id);
                    }
                    Err(e) => {
                        log::error!("Failed to delete environment {}: {}", id, e);
                        toasts.error(format!("Could not delete {}: {}", name, e.user_message()));
                        deleting.set(false);
                    }
                }
            });
        })
    };

    let controls = card.0.controls();
    let action_button = |action: EnvAction, control: ControlState, class: &'static str| {
        if !control.visible {
            return html! {};
        }
        let label = if card.0.in_flight(action) {
            action.progress_label()
        } else if card.0.succeeded == Some(action) {
            "Done!"
        } else {
            action.label()
        };
        let onclick = {
            let on_action = on_action.clone();
            Callback::from(move |_: MouseEvent| on_action.emit(action))
        };
        html! {
            <button
                class={classes!("action-button", class, card.0.in_flight(action).then_some("busy"))}
                disabled={!control.enabled}
                {onclick}
            >
                { label }
            </button>
        }
    };

    let statuses = card.0.statuses;

    html! {
        <div class={classes!("environment-card", health_class(statuses.overall()))}>
            <div class="card-stripe"></div>
            <div class="card-header">
                <div class="card-title">
                    <h3>{ &env.name }</h3>
                    <span class={classes!("type-badge", type_class(env.env_type))}>
                        { env.env_type.short_label() }
                    </span>
                    <div class="resource-group">{ &env.resource_group }</div>
                </div>
                <div class="card-actions">
                    { action_button(EnvAction::Start, controls.start, "start") }
                    { action_button(EnvAction::Stop, controls.stop, "stop") }
                    { action_button(EnvAction::Restart, controls.restart, "restart") }
                    <button
                        class="action-button delete"
                        title="Delete environment"
                        disabled={*deleting || card.0.is_busy()}
                        onclick={on_delete}
                    >
                        { if *deleting { "Deleting..." } else { "Delete" } }
                    </button>
                </div>
            </div>
            <div class="card-containers">
                <ContainerRow role="Frontend" name={env.frontend.name.clone()} status={statuses.frontend} />
                <ContainerRow role="Backend" name={env.backend.name.clone()} status={statuses.backend} />
            </div>
            <CostTile environment_id={env.id} />
        </div>
    }
}
