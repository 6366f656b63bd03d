use shared::cost::{format_amount, DEFAULT_COST_DAYS};
use shared::{CostSummary, EnvironmentApi, EnvironmentId};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::ApiContext;

#[derive(Properties, PartialEq)]
pub struct CostTileProps {
    pub environment_id: EnvironmentId,
}

#[derive(Clone, PartialEq)]
enum CostState {
    Loading,
    Loaded(CostSummary),
    Unavailable,
}

/// Today / month-to-date spend of an environment with the weekly trend.
#[function_component(CostTile)]
pub fn cost_tile(props: &CostTileProps) -> Html {
    let api = use_context::<ApiContext>();
    let state = use_state(|| CostState::Loading);

    {
        let state = state.clone();
        use_effect_with(props.environment_id, move |id| {
            let id = *id;
            if let Some(api) = api {
                spawn_local(async move {
                    match api.client.environment_cost(id, DEFAULT_COST_DAYS).await {
                        Ok(response) => {
                            state.set(CostState::Loaded(CostSummary::from_response(&response)))
                        }
                        Err(e) => {
                            log::error!("Failed to load cost data for environment {}: {}", id, e);
                            state.set(CostState::Unavailable);
                        }
                    }
                });
            }
            || ()
        });
    }

    let body = match &*state {
        CostState::Loading => html! { <div class="cost-placeholder">{ "Loading costs..." }</div> },
        CostState::Unavailable => {
            html! { <div class="cost-placeholder">{ "Cost data unavailable" }</div> }
        }
        CostState::Loaded(summary) => {
            let trend = match summary.trend_pct {
                Some(pct) => {
                    let (class, arrow) = if pct > 0.0 {
                        ("cost-trend up", "▲")
                    } else {
                        ("cost-trend down", "▼")
                    };
                    html! { <span class={class}>{ format!("{} {:.1}%", arrow, pct.abs()) }</span> }
                }
                None => html! {},
            };
            html! {
                <>
                    <div class="cost-header">
                        <span class="cost-title">{ "Cost Analytics" }</span>
                        { trend }
                    </div>
                    <div class="cost-figures">
                        <div class="cost-figure">
                            <div class="cost-label">{ "Today" }</div>
                            <div class="cost-value">{ format_amount(summary.today, &summary.currency) }</div>
                        </div>
                        <div class="cost-figure">
                            <div class="cost-label">{ "Month to date" }</div>
                            <div class="cost-value">{ format_amount(summary.month_to_date, &summary.currency) }</div>
                        </div>
                    </div>
                    if let Some(updated) = &summary.last_updated {
                        <div class="cost-updated">{ format!("Data through {}", updated) }</div>
                    }
                </>
            }
        }
    };

    html! { <div class="cost-tile">{ body }</div> }
}
