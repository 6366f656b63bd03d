//! Hook driving one environment card: live status polling plus the state of
//! user-triggered actions.

use std::rc::Rc;

use gloo::timers::callback::Interval;
use shared::poller::DEFAULT_POLL_INTERVAL;
use shared::{CardState, EnvAction, EnvironmentId, PollOutcome, StatusPair, StatusPoller};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::utils;
use crate::ApiContext;

pub enum CardAction {
    Poll(StatusPair),
    Begin(EnvAction),
    Complete(EnvAction, bool),
    ClearFeedback(EnvAction),
}

/// Reducer wrapper so async completions always apply to the latest state.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveCard(pub CardState);

impl Reducible for LiveCard {
    type Action = CardAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = self.0.clone();
        match action {
            CardAction::Poll(statuses) => next.apply_poll(statuses),
            CardAction::Begin(a) => next.begin(a),
            CardAction::Complete(a, ok) => next.complete(a, ok),
            CardAction::ClearFeedback(a) => next.clear_feedback(a),
        }
        if next == self.0 {
            self
        } else {
            Rc::new(LiveCard(next))
        }
    }
}

fn page_visible() -> bool {
    !utils::is_page_hidden()
}

/// Poll `id` immediately and then every minute while the card is mounted.
///
/// Ticks are skipped while the tab is hidden or a previous request is still
/// outstanding. Unmounting cancels the timer and drops any late result.
#[hook]
pub fn use_live_status(id: EnvironmentId, initial: StatusPair) -> UseReducerHandle<LiveCard> {
    let api = use_context::<ApiContext>();
    let card = use_reducer(|| LiveCard(CardState::new(initial)));

    {
        let dispatcher = card.dispatcher();
        use_effect_with(id, move |id| {
            let poller = api.map(|api| {
                Rc::new(
                    StatusPoller::with_visibility(*id, api.client.clone(), page_visible)
                        .with_interval(DEFAULT_POLL_INTERVAL),
                )
            });

            let teardown = poller.map(|poller| {
                let handle = poller.handle();
                let tick = move || {
                    let poller = poller.clone();
                    let dispatcher = dispatcher.clone();
                    spawn_local(async move {
                        let outcome = poller.poll_once().await;
                        match &outcome {
                            PollOutcome::Failed(e) => {
                                log::error!(
                                    "Status fetch for environment {} failed: {}",
                                    poller.environment_id(),
                                    e
                                );
                            }
                            PollOutcome::SkippedHidden | PollOutcome::SkippedInFlight => {
                                log::debug!("Skipped status poll: {:?}", outcome);
                            }
                            PollOutcome::Updated(_) | PollOutcome::Cancelled => {}
                        }
                        if let Some(statuses) = outcome.statuses() {
                            dispatcher.dispatch(CardAction::Poll(statuses));
                        }
                    });
                };

                tick();
                let interval = Interval::new(DEFAULT_POLL_INTERVAL.as_millis() as u32, tick);
                (handle, interval)
            });

            move || {
                if let Some((handle, interval)) = teardown {
                    handle.cancel();
                    drop(interval);
                }
            }
        });
    }

    card
}
