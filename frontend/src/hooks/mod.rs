//! Custom Yew hooks for the frontend application.
//!
//! These hooks encapsulate reusable state logic to keep components clean and focused.

mod use_live_status;
mod use_session;
mod use_toasts;

pub use use_live_status::{use_live_status, CardAction};
pub use use_session::use_session;
pub use use_toasts::{use_toasts, Toast, ToastList, Toaster, TOAST_TIMEOUT_MS};
