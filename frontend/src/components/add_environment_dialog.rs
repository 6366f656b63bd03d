use shared::{EnvironmentApi, EnvironmentRecord, EnvironmentType, NewEnvironment};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::hooks::Toaster;
use crate::ApiContext;

#[derive(Properties, PartialEq)]
pub struct AddEnvironmentDialogProps {
    pub on_close: Callback<()>,
    pub on_created: Callback<EnvironmentRecord>,
}

pub enum AddEnvironmentMsg {
    GroupsLoaded(Vec<String>),
    AppsLoaded(String, Vec<String>),
    UpdateName(String),
    UpdateType(EnvironmentType),
    UpdateResourceGroup(String),
    UpdateFrontend(String),
    UpdateBackend(String),
    Save,
    Saved(EnvironmentRecord),
    SaveFailed(String),
}

/// Form for registering an environment, with resource group and container
/// app suggestions from Azure discovery.
pub struct AddEnvironmentDialog {
    form: NewEnvironment,
    resource_groups: Vec<String>,
    container_apps: Vec<String>,
    saving: bool,
    api: Option<ApiContext>,
    toaster: Option<Toaster>,
}

impl Component for AddEnvironmentDialog {
    type Message = AddEnvironmentMsg;
    type Properties = AddEnvironmentDialogProps;

    fn create(ctx: &Context<Self>) -> Self {
        let api = ctx
            .link()
            .context::<ApiContext>(Callback::noop())
            .map(|(api, _)| api);
        let toaster = ctx
            .link()
            .context::<Toaster>(Callback::noop())
            .map(|(toaster, _)| toaster);

        if let Some(api) = api.clone() {
            let link = ctx.link().clone();
            spawn_local(async move {
                match api.client.resource_groups().await {
                    Ok(groups) => link.send_message(AddEnvironmentMsg::GroupsLoaded(groups)),
                    Err(e) => log::error!("Failed to load resource groups: {}", e),
                }
            });
        }

        Self {
            form: NewEnvironment::default(),
            resource_groups: Vec::new(),
            container_apps: Vec::new(),
            saving: false,
            api,
            toaster,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AddEnvironmentMsg::GroupsLoaded(groups) => {
                self.resource_groups = groups;
                true
            }
            AddEnvironmentMsg::AppsLoaded(group, apps) => {
                // Ignore answers for a group the user has since moved away from
                if group != self.form.resource_group.trim() {
                    return false;
                }
                self.container_apps = apps;
                true
            }
            AddEnvironmentMsg::UpdateName(name) => {
                self.form.name = name;
                false
            }
            AddEnvironmentMsg::UpdateType(env_type) => {
                self.form.env_type = env_type;
                true
            }
            AddEnvironmentMsg::UpdateResourceGroup(group) => {
                self.form.resource_group = group;
                self.container_apps.clear();
                let group = self.form.resource_group.trim().to_string();
                if self.resource_groups.contains(&group) {
                    self.load_apps(ctx, group);
                }
                true
            }
            AddEnvironmentMsg::UpdateFrontend(name) => {
                self.form.frontend_name = name;
                false
            }
            AddEnvironmentMsg::UpdateBackend(name) => {
                self.form.backend_name = name;
                false
            }
            AddEnvironmentMsg::Save => {
                if self.saving {
                    return false;
                }
                let req = match self.form.validate() {
                    Ok(req) => req,
                    Err(e) => {
                        self.toast_error(e.to_string());
                        return false;
                    }
                };
                let Some(api) = self.api.clone() else {
                    self.toast_error("Backend is not configured".to_string());
                    return false;
                };

                self.saving = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api.client.create_environment(&req).await {
                        Ok(record) => link.send_message(AddEnvironmentMsg::Saved(record)),
                        Err(e) => {
                            log::error!("Failed to create environment: {}", e);
                            link.send_message(AddEnvironmentMsg::SaveFailed(
                                e.user_message().to_string(),
                            ));
                        }
                    }
                });
                true
            }
            AddEnvironmentMsg::Saved(record) => {
                self.saving = false;
                if let Some(toaster) = &self.toaster {
                    toaster.success(format!("Environment {} added", record.name));
                }
                ctx.props().on_created.emit(record);
                ctx.props().on_close.emit(());
                true
            }
            AddEnvironmentMsg::SaveFailed(message) => {
                self.saving = false;
                self.toast_error(message);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_close = ctx.props().on_close.clone();
        let on_overlay_click = {
            let on_close = on_close.clone();
            Callback::from(move |_| on_close.emit(()))
        };
        let on_dialog_click = Callback::from(|e: MouseEvent| {
            e.stop_propagation();
        });

        let on_name_input = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            AddEnvironmentMsg::UpdateName(input.value())
        });
        let on_type_change = ctx.link().callback(|e: Event| {
            let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
            AddEnvironmentMsg::UpdateType(EnvironmentType::from_str_lossy(&select.value()))
        });
        let on_group_input = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            AddEnvironmentMsg::UpdateResourceGroup(input.value())
        });
        let on_frontend_input = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            AddEnvironmentMsg::UpdateFrontend(input.value())
        });
        let on_backend_input = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            AddEnvironmentMsg::UpdateBackend(input.value())
        });
        let on_save = ctx.link().callback(|_: MouseEvent| AddEnvironmentMsg::Save);
        let on_keypress = ctx.link().batch_callback(|e: KeyboardEvent| {
            if e.key() == "Enter" {
                Some(AddEnvironmentMsg::Save)
            } else {
                None
            }
        });

        html! {
            <div class="dialog-overlay" onclick={on_overlay_click}>
                <div class="dialog add-environment-dialog" onclick={on_dialog_click} onkeypress={on_keypress}>
                    <div class="dialog-header">
                        <h2>{ "Add Environment" }</h2>
                        <button class="dialog-close" onclick={move |_| on_close.emit(())}>
                            { "×" }
                        </button>
                    </div>

                    <div class="dialog-body">
                        <label>
                            { "Environment name" }
                            <input
                                type="text"
                                placeholder="e.g. checkout-dev"
                                value={self.form.name.clone()}
                                oninput={on_name_input}
                            />
                        </label>

                        <label>
                            { "Type" }
                            <select onchange={on_type_change}>
                                { for EnvironmentType::ALL.iter().map(|t| html! {
                                    <option value={t.as_str()} selected={*t == self.form.env_type}>
                                        { t.label() }
                                    </option>
                                }) }
                            </select>
                        </label>

                        <label>
                            { "Resource group" }
                            <input
                                type="text"
                                list="resource-group-suggestions"
                                value={self.form.resource_group.clone()}
                                oninput={on_group_input}
                            />
                        </label>
                        <datalist id="resource-group-suggestions">
                            { for self.resource_groups.iter().map(|g| html! { <option value={g.clone()} /> }) }
                        </datalist>

                        <label>
                            { "Frontend app name" }
                            <input
                                type="text"
                                list="container-app-suggestions"
                                value={self.form.frontend_name.clone()}
                                oninput={on_frontend_input}
                            />
                        </label>
                        <label>
                            { "Backend app name" }
                            <input
                                type="text"
                                list="container-app-suggestions"
                                value={self.form.backend_name.clone()}
                                oninput={on_backend_input}
                            />
                        </label>
                        <datalist id="container-app-suggestions">
                            { for self.container_apps.iter().map(|a| html! { <option value={a.clone()} /> }) }
                        </datalist>
                    </div>

                    <div class="dialog-footer">
                        <button class="button-secondary" onclick={ctx.props().on_close.reform(|_| ())}>
                            { "Cancel" }
                        </button>
                        <button class="button-primary" disabled={self.saving} onclick={on_save}>
                            { if self.saving { "Saving..." } else { "Save Environment" } }
                        </button>
                    </div>
                </div>
            </div>
        }
    }
}

impl AddEnvironmentDialog {
    fn load_apps(&self, ctx: &Context<Self>, group: String) {
        let Some(api) = self.api.clone() else {
            return;
        };
        let link = ctx.link().clone();
        spawn_local(async move {
            match api.client.container_apps(&group).await {
                Ok(apps) => link.send_message(AddEnvironmentMsg::AppsLoaded(group, apps)),
                Err(e) => log::error!("Failed to load container apps for {}: {}", group, e),
            }
        });
    }

    fn toast_error(&self, message: String) {
        match &self.toaster {
            Some(toaster) => toaster.error(message),
            None => log::error!("{}", message),
        }
    }
}
