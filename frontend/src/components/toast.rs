//! Toast provider and the stack that renders it.

use gloo::timers::callback::Timeout;
use yew::prelude::*;

use crate::hooks::{Toast, ToastList, Toaster, TOAST_TIMEOUT_MS};

#[derive(Properties, PartialEq)]
pub struct ToastProviderProps {
    pub children: Html,
}

#[function_component(ToastProvider)]
pub fn toast_provider(props: &ToastProviderProps) -> Html {
    let list = use_reducer(ToastList::default);
    let toaster = Toaster::new(list.dispatcher());

    html! {
        <ContextProvider<Toaster> context={toaster.clone()}>
            { props.children.clone() }
            <div class="toast-stack" role="status" aria-live="polite">
                { for list.toasts.iter().map(|toast| html! {
                    <ToastView key={toast.id} toast={toast.clone()} toaster={toaster.clone()} />
                }) }
            </div>
        </ContextProvider<Toaster>>
    }
}

#[derive(Properties, PartialEq)]
struct ToastViewProps {
    toast: Toast,
    toaster: Toaster,
}

#[function_component(ToastView)]
fn toast_view(props: &ToastViewProps) -> Html {
    let id = props.toast.id;

    {
        let toaster = props.toaster.clone();
        use_effect_with(id, move |id| {
            let id = *id;
            let timeout = Timeout::new(TOAST_TIMEOUT_MS, move || toaster.dismiss(id));
            move || drop(timeout)
        });
    }

    let on_close = {
        let toaster = props.toaster.clone();
        Callback::from(move |_: MouseEvent| toaster.dismiss(id))
    };

    html! {
        <div class={classes!("toast", props.toast.kind.css_class())}>
            <span class="toast-message">{ &props.toast.message }</span>
            <button class="toast-close" onclick={on_close} title="Dismiss">{ "×" }</button>
        </div>
    }
}
