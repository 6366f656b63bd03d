use shared::DisplayStatus;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub status: DisplayStatus,
}

#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    let status = props.status;
    html! {
        <span class={classes!("status-badge", status.css_class())}>
            <span class="status-dot"></span>
            { status.as_str() }
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct ContainerRowProps {
    /// "Frontend" or "Backend"
    pub role: &'static str,
    pub name: String,
    pub status: DisplayStatus,
}

/// One container app line inside an environment card.
#[function_component(ContainerRow)]
pub fn container_row(props: &ContainerRowProps) -> Html {
    html! {
        <div class="container-row">
            <div class="container-info">
                <span class="container-role">{ props.role }</span>
                <span class="container-name">{ &props.name }</span>
            </div>
            <StatusBadge status={props.status} />
        </div>
    }
}
