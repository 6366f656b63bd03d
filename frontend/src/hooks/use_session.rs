//! Hook exposing the identity provider's session state.

use shared::SessionSnapshot;
use yew::prelude::*;

use crate::auth::AuthContext;

/// Current [`SessionSnapshot`], re-rendering whenever the provider publishes
/// a new one.
///
/// Must be used below the `AuthContext` provider.
#[hook]
pub fn use_session() -> SessionSnapshot {
    let ctx = use_context::<AuthContext>();
    let snapshot = use_state(|| {
        ctx.as_ref()
            .map(|c| c.provider.snapshot())
            .unwrap_or_default()
    });

    {
        let snapshot = snapshot.clone();
        use_effect_with(ctx, move |ctx| {
            let subscription = ctx.as_ref().map(|ctx| {
                let setter = snapshot.setter();
                let sub = ctx.provider.subscribe(Box::new(move |s| setter.set(s)));
                // Catch anything published between render and subscribe
                snapshot.set(ctx.provider.snapshot());
                sub
            });
            if subscription.is_none() {
                log::error!("use_session called outside of the auth provider");
            }
            move || drop(subscription)
        });
    }

    *snapshot
}
