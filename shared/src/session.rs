//! Session guard and the identity-provider redirect contract.
//!
//! The identity provider owns the session; this module only reads it. A
//! [`SessionSnapshot`] collapses the provider's state into an
//! [`AuthResolution`], [`SessionGuard`] turns that into what a protected view
//! renders and whether it must send the user to the login view.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Route of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Scopes requested when nothing else is asked for.
pub const DEFAULT_SCOPES: &[&str] = &["User.Read"];

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("identity provider returned {code}: {description}")]
    Provider { code: String, description: String },
    #[error("redirect state does not match the pending login")]
    StateMismatch,
    #[error("no login is pending for this redirect")]
    NoPendingLogin,
    #[error("redirect is missing the id token")]
    MissingToken,
    #[error("malformed id token: {0}")]
    MalformedToken(String),
    #[error("id token nonce does not match")]
    NonceMismatch,
    #[error("id token was issued for a different client")]
    AudienceMismatch,
    #[error("id token has expired")]
    Expired,
    #[error("identity provider is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("redirect failed: {0}")]
    Redirect(String),
}

/// What the identity client is busy with, as its library reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionStatus {
    #[default]
    None,
    Login,
    AcquireToken,
    HandleRedirect,
    #[serde(other)]
    Other,
}

impl InteractionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => InteractionStatus::None,
            "login" => InteractionStatus::Login,
            "acquireToken" => InteractionStatus::AcquireToken,
            "handleRedirect" => InteractionStatus::HandleRedirect,
            _ => InteractionStatus::Other,
        }
    }
}

/// True if the URL fragment still carries an unconsumed redirect callback.
pub fn has_redirect_markers(fragment: &str) -> bool {
    fragment.contains("code=") || fragment.contains("state=")
}

/// Single authoritative view of where authentication stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthResolution {
    /// A login or redirect callback is still being processed
    Resolving,
    Unauthenticated,
    Authenticated,
}

/// Point-in-time session state read from the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub interaction: InteractionStatus,
    pub pending_redirect_markers: bool,
}

impl SessionSnapshot {
    pub fn new(authenticated: bool, interaction: InteractionStatus, fragment: &str) -> Self {
        Self {
            authenticated,
            interaction,
            pending_redirect_markers: has_redirect_markers(fragment),
        }
    }

    pub fn is_handling_redirect(&self) -> bool {
        self.interaction != InteractionStatus::None || self.pending_redirect_markers
    }

    pub fn resolution(&self) -> AuthResolution {
        if self.authenticated {
            AuthResolution::Authenticated
        } else if self.is_handling_redirect() {
            AuthResolution::Resolving
        } else {
            AuthResolution::Unauthenticated
        }
    }
}

/// Navigation state handed to the login view when the guard sent the user there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginRedirectState {
    #[serde(rename = "msAuthFailed")]
    pub ms_auth_failed: bool,
}

/// A navigation the guard wants performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginRedirect {
    pub path: &'static str,
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    pub state: LoginRedirectState,
}

impl LoginRedirect {
    fn after_failed_session() -> Self {
        Self {
            path: LOGIN_PATH,
            replace: true,
            state: LoginRedirectState {
                ms_auth_failed: true,
            },
        }
    }
}

/// What a protected view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// The protected children
    Children,
    /// Neutral "authenticating" placeholder
    Loading,
    /// Nothing, while the login navigation commits
    Blank,
}

pub fn guard_view(snapshot: &SessionSnapshot) -> GuardView {
    match snapshot.resolution() {
        AuthResolution::Authenticated => GuardView::Children,
        AuthResolution::Resolving => GuardView::Loading,
        AuthResolution::Unauthenticated => GuardView::Blank,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardDecision {
    pub view: GuardView,
    pub redirect: Option<LoginRedirect>,
}

/// Per-mount guard state.
///
/// Emits the login redirect once each time the session settles as
/// unauthenticated. It re-arms only after the session passes through
/// resolving or authenticated again, so one failed attempt yields one
/// redirect no matter how often the view re-renders.
#[derive(Debug, Default)]
pub struct SessionGuard {
    redirected: bool,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, snapshot: &SessionSnapshot) -> GuardDecision {
        let view = guard_view(snapshot);
        let redirect = match snapshot.resolution() {
            AuthResolution::Unauthenticated if !self.redirected => {
                self.redirected = true;
                Some(LoginRedirect::after_failed_session())
            }
            AuthResolution::Unauthenticated => None,
            AuthResolution::Resolving | AuthResolution::Authenticated => {
                self.redirected = false;
                None
            }
        };
        GuardDecision { view, redirect }
    }
}

type Listener = Rc<dyn Fn(SessionSnapshot)>;

struct StoreInner {
    snapshot: SessionSnapshot,
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Observable holder of a [`SessionSnapshot`] that providers publish into.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionSnapshot::default())
    }
}

impl SessionStore {
    pub fn new(snapshot: SessionSnapshot) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                snapshot,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.borrow().snapshot
    }

    /// Publish a new snapshot; listeners run only if it differs.
    pub fn set(&self, snapshot: SessionSnapshot) {
        let listeners: Vec<Listener> = {
            let mut inner = self.inner.borrow_mut();
            if inner.snapshot == snapshot {
                return;
            }
            inner.snapshot = snapshot;
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            // A listener published something newer, and that nested set has
            // already reached everyone
            if self.inner.borrow().snapshot != snapshot {
                break;
            }
            listener(snapshot);
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        let mut next = self.snapshot();
        f(&mut next);
        self.set(next);
    }

    pub fn subscribe(&self, listener: impl Fn(SessionSnapshot) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
pub struct Subscription {
    store: Weak<RefCell<StoreInner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Identity client as seen by the dashboard.
pub trait AuthSessionProvider {
    fn snapshot(&self) -> SessionSnapshot;

    fn subscribe(&self, listener: Box<dyn Fn(SessionSnapshot)>) -> Subscription;

    /// Leave the app for the provider's sign-in page.
    fn login_redirect(&self, request: &LoginRequest) -> Result<(), AuthError>;

    fn logout(&self);
}

/// Prompt hint passed to the authorize endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prompt {
    #[default]
    SelectAccount,
    Login,
    Consent,
    None,
}

impl Prompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prompt::SelectAccount => "select_account",
            Prompt::Login => "login",
            Prompt::Consent => "consent",
            Prompt::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub scopes: Vec<String>,
    pub prompt: Prompt,
}

impl Default for LoginRequest {
    fn default() -> Self {
        Self {
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            prompt: Prompt::default(),
        }
    }
}

/// Azure AD application registration used for the redirect flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub redirect_uri: String,
}

impl AuthorityConfig {
    pub fn authority(&self) -> String {
        format!("{}/{}", AUTHORITY_HOST, self.tenant_id)
    }

    /// Sign-in URL for an id token returned in the URL fragment.
    pub fn authorize_url(
        &self,
        request: &LoginRequest,
        state: &str,
        nonce: &str,
    ) -> Result<String, AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::NotConfigured("client id"));
        }

        let mut scopes: Vec<&str> = vec!["openid", "profile"];
        for scope in &request.scopes {
            if !scopes.contains(&scope.as_str()) {
                scopes.push(scope);
            }
        }
        let scope = scopes.join(" ");

        let url = url::Url::parse_with_params(
            &format!("{}/oauth2/v2.0/authorize", self.authority()),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "id_token"),
                ("response_mode", "fragment"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
                ("nonce", nonce),
                ("prompt", request.prompt.as_str()),
            ],
        )
        .map_err(|e| AuthError::Redirect(e.to_string()))?;
        Ok(url.into())
    }

    pub fn logout_url(&self) -> Result<String, AuthError> {
        let url = url::Url::parse_with_params(
            &format!("{}/oauth2/v2.0/logout", self.authority()),
            &[("post_logout_redirect_uri", self.redirect_uri.as_str())],
        )
        .map_err(|e| AuthError::Redirect(e.to_string()))?;
        Ok(url.into())
    }
}

/// State and nonce remembered between leaving for sign-in and coming back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    pub nonce: String,
}

/// Parameters found in the fragment of the redirect back from sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectCallback {
    pub id_token: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectCallback {
    /// Parse a fragment (with or without the leading `#`). `None` if it is
    /// not a sign-in callback at all.
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let fragment = fragment.trim_start_matches('#');
        if !has_redirect_markers(fragment) && !fragment.contains("id_token=") {
            return None;
        }

        let mut callback = RedirectCallback::default();
        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "id_token" => callback.id_token = value,
                "state" => callback.state = value,
                "error" => callback.error = value,
                "error_description" => callback.error_description = value,
                _ => {}
            }
        }
        Some(callback)
    }

    /// Check the callback against the login that started it and extract the
    /// signed-in account. `now` is the current Unix time in seconds.
    pub fn into_account(
        self,
        pending: Option<&PendingLogin>,
        client_id: &str,
        now: i64,
    ) -> Result<Account, AuthError> {
        if let Some(code) = self.error {
            return Err(AuthError::Provider {
                code,
                description: self.error_description.unwrap_or_default(),
            });
        }
        let pending = pending.ok_or(AuthError::NoPendingLogin)?;
        if self.state.as_deref() != Some(pending.state.as_str()) {
            return Err(AuthError::StateMismatch);
        }
        let id_token = self.id_token.ok_or(AuthError::MissingToken)?;
        let claims = IdTokenClaims::decode(&id_token)?;

        if claims.nonce.as_deref() != Some(pending.nonce.as_str()) {
            return Err(AuthError::NonceMismatch);
        }
        if !claims.aud.is_empty() && claims.aud != client_id {
            return Err(AuthError::AudienceMismatch);
        }
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(Account {
            name: claims.name,
            username: claims.preferred_username,
            object_id: claims.oid,
            tenant_id: claims.tid,
            expires_at: claims.exp,
            id_token,
        })
    }
}

/// Result of handling a sign-in callback against the account already held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    SignedIn(Account),
    /// The callback was refused. A still-valid earlier account survives it.
    Rejected {
        error: AuthError,
        keep_existing: bool,
    },
}

impl RedirectOutcome {
    pub fn is_authenticated(&self) -> bool {
        match self {
            RedirectOutcome::SignedIn(_) => true,
            RedirectOutcome::Rejected { keep_existing, .. } => *keep_existing,
        }
    }
}

/// Validate `callback` and decide which account the session ends up with.
/// A stray or failed callback never signs out an account that is still valid.
pub fn resolve_redirect(
    callback: RedirectCallback,
    pending: Option<&PendingLogin>,
    existing: Option<&Account>,
    client_id: &str,
    now: i64,
) -> RedirectOutcome {
    match callback.into_account(pending, client_id, now) {
        Ok(account) => RedirectOutcome::SignedIn(account),
        Err(error) => RedirectOutcome::Rejected {
            error,
            keep_existing: existing.is_some_and(|a| a.is_valid_at(now)),
        },
    }
}

/// Claims the dashboard reads from an id token. The signature is not
/// checked here; the backend is the party that trusts tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
}

impl IdTokenClaims {
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::MalformedToken("expected three segments".into()))?;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))
    }
}

/// Signed-in account kept in session storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: Option<String>,
    pub username: Option<String>,
    pub object_id: Option<String>,
    pub tenant_id: Option<String>,
    /// Unix seconds
    pub expires_at: i64,
    pub id_token: String,
}

impl Account {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at > now
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("Signed in")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn snapshot(authenticated: bool, interaction: InteractionStatus, fragment: &str) -> SessionSnapshot {
        SessionSnapshot::new(authenticated, interaction, fragment)
    }

    fn token(claims: serde_json::Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
            engine.encode(claims.to_string())
        )
    }

    fn pending() -> PendingLogin {
        PendingLogin {
            state: "abc".into(),
            nonce: "n-1".into(),
        }
    }

    #[test]
    fn unauthenticated_idle_session_redirects_once_with_replace() {
        let mut guard = SessionGuard::new();
        let idle = snapshot(false, InteractionStatus::None, "");

        let first = guard.evaluate(&idle);
        assert_eq!(first.view, GuardView::Blank);
        let redirect = first.redirect.unwrap();
        assert_eq!(redirect.path, "/login");
        assert!(redirect.replace);
        assert!(redirect.state.ms_auth_failed);

        for _ in 0..3 {
            assert_eq!(guard.evaluate(&idle).redirect, None);
        }
    }

    #[test]
    fn state_marker_shows_loading_without_navigation() {
        let mut guard = SessionGuard::new();
        let decision = guard.evaluate(&snapshot(false, InteractionStatus::None, "#state=abc"));
        assert_eq!(decision.view, GuardView::Loading);
        assert_eq!(decision.redirect, None);

        let decision = guard.evaluate(&snapshot(false, InteractionStatus::None, "#code=xyz"));
        assert_eq!(decision.view, GuardView::Loading);
    }

    #[test]
    fn interaction_in_progress_holds_redirect() {
        let mut guard = SessionGuard::new();
        for interaction in [
            InteractionStatus::Login,
            InteractionStatus::AcquireToken,
            InteractionStatus::HandleRedirect,
            InteractionStatus::Other,
        ] {
            let decision = guard.evaluate(&snapshot(false, interaction, ""));
            assert_eq!(decision.view, GuardView::Loading);
            assert_eq!(decision.redirect, None);
        }
    }

    #[test]
    fn authenticated_always_renders_children() {
        let mut guard = SessionGuard::new();
        for interaction in [InteractionStatus::None, InteractionStatus::AcquireToken] {
            let decision = guard.evaluate(&snapshot(true, interaction, "#state=abc"));
            assert_eq!(decision.view, GuardView::Children);
            assert_eq!(decision.redirect, None);
        }
    }

    #[test]
    fn failed_redirect_redirects_once_when_processing_clears() {
        let mut guard = SessionGuard::new();
        let handling = snapshot(false, InteractionStatus::HandleRedirect, "#state=abc");
        let settled = snapshot(false, InteractionStatus::None, "");

        assert_eq!(guard.evaluate(&handling).redirect, None);
        assert!(guard.evaluate(&settled).redirect.is_some());
        assert!(guard.evaluate(&settled).redirect.is_none());

        // A second failed attempt gets its own redirect
        assert_eq!(guard.evaluate(&handling).redirect, None);
        assert!(guard.evaluate(&settled).redirect.is_some());
    }

    #[test]
    fn resolution_collapses_both_checks() {
        assert_eq!(
            snapshot(false, InteractionStatus::None, "").resolution(),
            AuthResolution::Unauthenticated
        );
        assert_eq!(
            snapshot(false, InteractionStatus::Login, "").resolution(),
            AuthResolution::Resolving
        );
        assert_eq!(
            snapshot(false, InteractionStatus::None, "#id_token=x&state=y").resolution(),
            AuthResolution::Resolving
        );
        assert_eq!(
            snapshot(true, InteractionStatus::Login, "").resolution(),
            AuthResolution::Authenticated
        );
    }

    #[test]
    fn interaction_status_parses_library_names() {
        assert_eq!(InteractionStatus::parse("none"), InteractionStatus::None);
        assert_eq!(
            InteractionStatus::parse("handleRedirect"),
            InteractionStatus::HandleRedirect
        );
        assert_eq!(InteractionStatus::parse("ssoSilent"), InteractionStatus::Other);
        let parsed: InteractionStatus = serde_json::from_str("\"logout\"").unwrap();
        assert_eq!(parsed, InteractionStatus::Other);
    }

    #[test]
    fn login_redirect_state_uses_camel_case_key() {
        let value = serde_json::to_value(LoginRedirectState {
            ms_auth_failed: true,
        })
        .unwrap();
        assert_eq!(value, json!({"msAuthFailed": true}));
    }

    #[test]
    fn store_notifies_until_subscription_dropped() {
        let store = SessionStore::default();
        let calls = Rc::new(Cell::new(0));

        let sub = {
            let calls = calls.clone();
            store.subscribe(move |_| calls.set(calls.get() + 1))
        };
        store.update(|s| s.interaction = InteractionStatus::Login);
        store.update(|s| s.interaction = InteractionStatus::Login);
        assert_eq!(calls.get(), 1);

        drop(sub);
        assert_eq!(store.listener_count(), 0);
        store.update(|s| s.authenticated = true);
        assert_eq!(calls.get(), 1);
        assert!(store.snapshot().authenticated);
    }

    #[test]
    fn listener_may_publish_from_inside_notification() {
        let store = SessionStore::default();
        let inner = store.clone();
        let _sub = store.subscribe(move |s| {
            if s.interaction == InteractionStatus::HandleRedirect {
                inner.update(|s| {
                    s.interaction = InteractionStatus::None;
                    s.authenticated = true;
                });
            }
        });
        store.update(|s| s.interaction = InteractionStatus::HandleRedirect);
        assert_eq!(store.snapshot().resolution(), AuthResolution::Authenticated);
    }

    #[test]
    fn nested_publish_is_not_overwritten_for_later_listeners() {
        let store = SessionStore::default();
        let inner = store.clone();
        let _first = store.subscribe(move |s| {
            if s.interaction == InteractionStatus::HandleRedirect {
                inner.set(SessionSnapshot {
                    authenticated: true,
                    ..SessionSnapshot::default()
                });
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _second = store.subscribe({
            let seen = seen.clone();
            move |s| seen.borrow_mut().push(s)
        });

        store.update(|s| s.interaction = InteractionStatus::HandleRedirect);

        assert_eq!(store.snapshot().resolution(), AuthResolution::Authenticated);
        let last = *seen.borrow().last().unwrap();
        assert_eq!(last, store.snapshot());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn authorize_url_carries_scopes_prompt_and_state() {
        let config = AuthorityConfig {
            client_id: "client-1".into(),
            tenant_id: "tenant-1".into(),
            redirect_uri: "http://localhost:8080".into(),
        };
        let url = config
            .authorize_url(&LoginRequest::default(), "abc", "n-1")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();

        assert!(url.starts_with(
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/authorize?"
        ));
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["scope"], "openid profile User.Read");
        assert_eq!(params["prompt"], "select_account");
        assert_eq!(params["state"], "abc");
        assert_eq!(params["response_mode"], "fragment");
        assert_eq!(params["redirect_uri"], "http://localhost:8080");
    }

    #[test]
    fn authorize_url_requires_client_id() {
        let config = AuthorityConfig {
            client_id: String::new(),
            tenant_id: "common".into(),
            redirect_uri: "http://localhost".into(),
        };
        assert_eq!(
            config.authorize_url(&LoginRequest::default(), "s", "n"),
            Err(AuthError::NotConfigured("client id"))
        );
    }

    #[test]
    fn callback_yields_account() {
        let id_token = token(json!({
            "aud": "client-1",
            "exp": 2_000,
            "nonce": "n-1",
            "name": "Alex Rivera",
            "preferred_username": "alex@example.com"
        }));
        let fragment = format!("#id_token={id_token}&state=abc&session_state=zzz");

        let callback = RedirectCallback::from_fragment(&fragment).unwrap();
        let account = callback
            .into_account(Some(&pending()), "client-1", 1_000)
            .unwrap();
        assert_eq!(account.display_name(), "Alex Rivera");
        assert!(account.is_valid_at(1_999));
        assert!(!account.is_valid_at(2_000));
    }

    #[test]
    fn callback_rejections() {
        let good = |exp: i64, nonce: &str, aud: &str| {
            token(json!({"aud": aud, "exp": exp, "nonce": nonce}))
        };
        let check = |fragment: String| {
            RedirectCallback::from_fragment(&fragment)
                .unwrap()
                .into_account(Some(&pending()), "client-1", 1_000)
                .unwrap_err()
        };

        assert_eq!(
            check(format!("id_token={}&state=other", good(2_000, "n-1", "client-1"))),
            AuthError::StateMismatch
        );
        assert_eq!(
            check(format!("id_token={}&state=abc", good(2_000, "n-2", "client-1"))),
            AuthError::NonceMismatch
        );
        assert_eq!(
            check(format!("id_token={}&state=abc", good(500, "n-1", "client-1"))),
            AuthError::Expired
        );
        assert_eq!(
            check(format!("id_token={}&state=abc", good(2_000, "n-1", "someone-else"))),
            AuthError::AudienceMismatch
        );
        assert_eq!(check("state=abc".to_string()), AuthError::MissingToken);
        assert!(matches!(
            check("error=access_denied&error_description=User+cancelled&state=abc".to_string()),
            AuthError::Provider { code, description }
                if code == "access_denied" && description == "User cancelled"
        ));
        assert!(matches!(
            check("id_token=not-a-jwt&state=abc".to_string()),
            AuthError::MalformedToken(_)
        ));
    }

    #[test]
    fn callback_without_pending_login_is_rejected() {
        let callback = RedirectCallback::from_fragment("#state=abc&id_token=x.y.z").unwrap();
        assert_eq!(
            callback.into_account(None, "client-1", 0),
            Err(AuthError::NoPendingLogin)
        );
    }

    fn stored_account(expires_at: i64) -> Account {
        Account {
            name: Some("Alex Rivera".into()),
            username: None,
            object_id: None,
            tenant_id: None,
            expires_at,
            id_token: "h.p.s".into(),
        }
    }

    #[test]
    fn stray_callback_keeps_valid_account() {
        let callback = RedirectCallback::from_fragment("#state=x").unwrap();
        let outcome = resolve_redirect(callback, None, Some(&stored_account(2_000)), "client-1", 1_000);

        assert!(outcome.is_authenticated());
        assert_eq!(
            outcome,
            RedirectOutcome::Rejected {
                error: AuthError::NoPendingLogin,
                keep_existing: true,
            }
        );
    }

    #[test]
    fn failed_callback_without_valid_account_stays_signed_out() {
        let failed = || RedirectCallback::from_fragment("#error=access_denied&state=abc").unwrap();

        let outcome = resolve_redirect(failed(), Some(&pending()), None, "client-1", 1_000);
        assert!(!outcome.is_authenticated());

        let expired = stored_account(900);
        let outcome = resolve_redirect(failed(), Some(&pending()), Some(&expired), "client-1", 1_000);
        assert!(!outcome.is_authenticated());
    }

    #[test]
    fn accepted_callback_replaces_account() {
        let id_token = token(json!({"aud": "client-1", "exp": 5_000, "nonce": "n-1"}));
        let callback = RedirectCallback::from_fragment(&format!("id_token={id_token}&state=abc")).unwrap();
        let outcome = resolve_redirect(
            callback,
            Some(&pending()),
            Some(&stored_account(2_000)),
            "client-1",
            1_000,
        );
        assert!(matches!(outcome, RedirectOutcome::SignedIn(ref a) if a.expires_at == 5_000));
    }

    #[test]
    fn ordinary_fragment_is_not_a_callback() {
        assert_eq!(RedirectCallback::from_fragment("#section-2"), None);
        assert_eq!(RedirectCallback::from_fragment(""), None);
    }
}
