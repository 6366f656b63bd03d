//! Azure AD sign-in for the dashboard.
//!
//! Implements the redirect flow: the login view sends the browser to the
//! Microsoft authorize endpoint, which comes back to the page origin with an
//! id token in the URL fragment. [`AzureAdSession::handle_redirect`] consumes
//! that fragment once on startup. The signed-in account lives in
//! sessionStorage, so closing the tab signs the user out.

use std::rc::Rc;

use shared::session::{
    resolve_redirect, Account, AuthError, AuthorityConfig, LoginRequest, PendingLogin,
    RedirectCallback, RedirectOutcome, SessionStore, Subscription,
};
use shared::{AuthSessionProvider, InteractionStatus, SessionSnapshot};

use crate::utils;

const ACCOUNT_KEY: &str = "kportal.account";
const PENDING_LOGIN_KEY: &str = "kportal.pendingLogin";

pub struct AzureAdSession {
    config: AuthorityConfig,
    store: SessionStore,
}

impl AzureAdSession {
    pub fn new(config: AuthorityConfig) -> Self {
        let authenticated = load_account().is_some();
        let fragment = utils::current_fragment();
        let store = SessionStore::new(SessionSnapshot::new(
            authenticated,
            InteractionStatus::None,
            &fragment,
        ));
        Self { config, store }
    }

    pub fn account(&self) -> Option<Account> {
        load_account()
    }

    /// Consume a sign-in callback left in the URL fragment, if there is one.
    pub fn handle_redirect(&self) {
        let fragment = utils::current_fragment();
        let Some(callback) = RedirectCallback::from_fragment(&fragment) else {
            return;
        };

        self.store.update(|s| s.interaction = InteractionStatus::HandleRedirect);

        let pending = utils::load_session::<PendingLogin>(PENDING_LOGIN_KEY);
        utils::remove_session(PENDING_LOGIN_KEY);

        let outcome = resolve_redirect(
            callback,
            pending.as_ref(),
            load_account().as_ref(),
            &self.config.client_id,
            utils::now_secs(),
        );
        match &outcome {
            RedirectOutcome::SignedIn(account) => {
                log::info!("Signed in as {}", account.display_name());
                utils::save_session(ACCOUNT_KEY, account);
            }
            RedirectOutcome::Rejected {
                error,
                keep_existing,
            } => {
                log::warn!("Rejected sign-in redirect: {}", error);
                if !keep_existing {
                    utils::remove_session(ACCOUNT_KEY);
                }
            }
        }
        let authenticated = outcome.is_authenticated();

        utils::clear_fragment();
        self.store.set(SessionSnapshot {
            authenticated,
            interaction: InteractionStatus::None,
            pending_redirect_markers: false,
        });
    }

    /// Sign out locally once the id token has expired.
    pub fn expire_if_stale(&self) {
        let snapshot = self.store.snapshot();
        if snapshot.authenticated && load_account().is_none() {
            log::info!("Session expired");
            utils::remove_session(ACCOUNT_KEY);
            self.store.update(|s| s.authenticated = false);
        }
    }
}

fn load_account() -> Option<Account> {
    utils::load_session::<Account>(ACCOUNT_KEY).filter(|a| a.is_valid_at(utils::now_secs()))
}

impl AuthSessionProvider for AzureAdSession {
    fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    fn subscribe(&self, listener: Box<dyn Fn(SessionSnapshot)>) -> Subscription {
        self.store.subscribe(listener)
    }

    fn login_redirect(&self, request: &LoginRequest) -> Result<(), AuthError> {
        let pending = PendingLogin {
            state: uuid::Uuid::new_v4().to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
        };
        let url = self
            .config
            .authorize_url(request, &pending.state, &pending.nonce)?;

        utils::save_session(PENDING_LOGIN_KEY, &pending);
        self.store.update(|s| s.interaction = InteractionStatus::Login);

        let window = web_sys::window().ok_or_else(|| AuthError::Redirect("no window".into()))?;
        window.location().set_href(&url).map_err(|e| {
            self.store.update(|s| s.interaction = InteractionStatus::None);
            AuthError::Redirect(format!("{:?}", e))
        })
    }

    fn logout(&self) {
        utils::remove_session(ACCOUNT_KEY);
        utils::remove_session(PENDING_LOGIN_KEY);
        self.store.set(SessionSnapshot::default());

        match self.config.logout_url() {
            Ok(url) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href(&url);
                }
            }
            Err(e) => log::error!("Failed to build logout URL: {}", e),
        }
    }
}

/// Identity provider shared through the component tree.
#[derive(Clone)]
pub struct AuthContext {
    pub provider: Rc<dyn AuthSessionProvider>,
    pub account: Option<Account>,
}

impl PartialEq for AuthContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.provider, &other.provider) && self.account == other.account
    }
}
