//! Transient notifications shown in the corner of the dashboard.

use std::rc::Rc;

use yew::prelude::*;

/// How long a toast stays up before dismissing itself.
pub const TOAST_TIMEOUT_MS: u32 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast-success",
            ToastKind::Error => "toast-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u32,
    pub kind: ToastKind,
    pub message: String,
}

pub enum ToastAction {
    Push(ToastKind, String),
    Dismiss(u32),
}

/// Toasts currently on screen, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToastList {
    next_id: u32,
    pub toasts: Vec<Toast>,
}

impl Reducible for ToastList {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ToastAction::Push(kind, message) => {
                next.toasts.push(Toast {
                    id: next.next_id,
                    kind,
                    message,
                });
                next.next_id = next.next_id.wrapping_add(1);
            }
            ToastAction::Dismiss(id) => {
                let before = next.toasts.len();
                next.toasts.retain(|t| t.id != id);
                if next.toasts.len() == before {
                    return self;
                }
            }
        }
        Rc::new(next)
    }
}

/// Handle for raising toasts from any component below the toast provider.
#[derive(Clone, PartialEq)]
pub struct Toaster {
    dispatcher: Option<UseReducerDispatcher<ToastList>>,
}

impl Toaster {
    pub fn new(dispatcher: UseReducerDispatcher<ToastList>) -> Self {
        Self {
            dispatcher: Some(dispatcher),
        }
    }

    pub fn show(&self, kind: ToastKind, message: impl Into<String>) {
        let message = message.into();
        match &self.dispatcher {
            Some(d) => d.dispatch(ToastAction::Push(kind, message)),
            None => log::warn!("Toast without provider: {}", message),
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(ToastKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(ToastKind::Error, message);
    }

    pub fn dismiss(&self, id: u32) {
        if let Some(d) = &self.dispatcher {
            d.dispatch(ToastAction::Dismiss(id));
        }
    }
}

#[hook]
pub fn use_toasts() -> Toaster {
    use_context::<Toaster>().unwrap_or(Toaster { dispatcher: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(list: Rc<ToastList>, message: &str) -> Rc<ToastList> {
        list.reduce(ToastAction::Push(ToastKind::Success, message.to_string()))
    }

    #[test]
    fn toasts_get_distinct_ids_and_dismiss_individually() {
        let list = push(push(Rc::new(ToastList::default()), "one"), "two");
        assert_eq!(list.toasts.len(), 2);
        let first = list.toasts[0].id;
        assert_ne!(first, list.toasts[1].id);

        let list = list.reduce(ToastAction::Dismiss(first));
        assert_eq!(list.toasts.len(), 1);
        assert_eq!(list.toasts[0].message, "two");
    }

    #[test]
    fn toast_kinds_map_to_distinct_classes() {
        assert_eq!(ToastKind::Success.css_class(), "toast-success");
        assert_eq!(ToastKind::Error.css_class(), "toast-error");
    }

    #[test]
    fn dismissing_unknown_toast_keeps_state() {
        let list = push(Rc::new(ToastList::default()), "one");
        let same = list.clone().reduce(ToastAction::Dismiss(99));
        assert!(Rc::ptr_eq(&list, &same));
    }
}
