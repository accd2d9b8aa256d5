//! # Session Authority
//!
//! Owns the authenticated session and the derived admin flag. State lives in a
//! `tokio::sync::watch` channel: [`SessionAuthority::state`] is a synchronous
//! snapshot for the routing gate, [`SessionAuthority::watch`] hands out a
//! receiver for reactive consumers (the UI and the lead synchronizer).
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`initialize`](SessionAuthority::initialize) | Restores a stored session, checks admin status, and returns the standing [`SessionListener`]. Never fails. |
//! | [`login`](SessionAuthority::login) | Signs in and runs the admin check. |
//! | [`register`](SessionAuthority::register) | Creates an account; the caller must still log in. |
//! | [`logout`](SessionAuthority::logout) | Clears local state unconditionally, then reports a failed revocation. |
//! | [`check_admin_status`](SessionAuthority::check_admin_status) | Re-asks the decision point. Any failure means "not admin". |
//! | [`grant_admin_privilege`](SessionAuthority::grant_admin_privilege) | Asks the decision point to elevate the current user, then restores the session again. |
//!
//! The admin flag is only ever set from an answer of the decision point,
//! never from a client-side assumption.
//!
//! Data operations take their [`Caller`] through [`CallerSource`]. The
//! authority's implementation refreshes an expired access token first, so a
//! long-running session keeps working without a restart.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use store::{Caller, UserId};
use tokio::sync::{broadcast, watch};

use crate::auth::{
    AdminAuthority, AuthBackend, AuthEvent, AuthEventKind, AuthUser, Credential, Session,
};
use crate::error::{Error, Result};

/// Coarse authentication phase, as seen by the routing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
    AuthenticatedAdmin,
}

/// The authenticated caller plus its authorization flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
}

impl Identity {
    pub fn display_name(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub is_admin: bool,
    /// An auth operation is in flight.
    pub loading: bool,
    /// Message of the last failed auth operation.
    pub error: Option<String>,
    /// `initialize` has finished its restore attempt.
    pub restored: bool,
}

impl AuthState {
    pub fn phase(&self) -> SessionPhase {
        match (&self.session, self.is_admin) {
            _ if self.loading => SessionPhase::Authenticating,
            (None, _) => SessionPhase::Unauthenticated,
            (Some(_), false) => SessionPhase::Authenticated,
            (Some(_), true) => SessionPhase::AuthenticatedAdmin,
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.as_ref().map(|s| Identity {
            id: s.user.id,
            email: s.user.email.clone(),
            phone: s.user.phone.clone(),
            is_admin: self.is_admin,
        })
    }

    pub fn caller(&self) -> Option<Caller> {
        self.session.as_ref().map(Session::caller)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|s| s.user.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Supplies the caller for owner-scoped data operations.
pub trait CallerSource {
    /// A caller whose access token is usable now. `None` when signed out.
    fn current_caller(&self) -> impl Future<Output = Option<Caller>>;
    /// Receiver observing every session change.
    fn session_changes(&self) -> watch::Receiver<AuthState>;
}

/// A bare state receiver hands out the cached caller as is.
impl CallerSource for watch::Receiver<AuthState> {
    async fn current_caller(&self) -> Option<Caller> {
        self.borrow().caller()
    }

    fn session_changes(&self) -> watch::Receiver<AuthState> {
        self.clone()
    }
}

impl<A: AuthBackend, D: AdminAuthority> CallerSource for SessionAuthority<A, D> {
    async fn current_caller(&self) -> Option<Caller> {
        self.fresh_caller().await
    }

    fn session_changes(&self) -> watch::Receiver<AuthState> {
        self.watch()
    }
}

#[derive(Clone)]
pub struct SessionAuthority<A, D> {
    auth: A,
    admin: D,
    state: Arc<watch::Sender<AuthState>>,
}

impl<A: AuthBackend, D: AdminAuthority> SessionAuthority<A, D> {
    pub fn new(auth: A, admin: D) -> Self {
        Self {
            auth,
            admin,
            state: Arc::new(watch::channel(AuthState::default()).0),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn backend(&self) -> &A {
        &self.auth
    }

    /// Restore any stored session and start listening for session changes.
    ///
    /// The returned listener must be driven (spawned) for the lifetime of the
    /// application; it is returned even when restoration failed.
    pub async fn initialize(&self) -> SessionListener<A, D>
    where
        A: Clone,
        D: Clone,
    {
        let events = self.auth.subscribe();
        self.restore().await;
        self.state.send_modify(|s| s.restored = true);
        SessionListener {
            authority: self.clone(),
            events,
        }
    }

    pub async fn login(&self, credential: Credential, password: &str) -> Result<Identity> {
        self.begin();
        match self.auth.sign_in(&credential, password).await {
            Ok(session) => {
                let is_admin = self.admin_flag(&session).await;
                tracing::info!(user_id = %session.user.id, is_admin, "signed in with {credential}");
                let identity = self.settle(Some(session), is_admin);
                identity.ok_or(Error::NotAuthenticated)
            }
            Err(e) => {
                tracing::warn!("login failed: {e}");
                self.state.send_modify(|s| {
                    s.session = None;
                    s.is_admin = false;
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    pub async fn register(&self, credential: Credential, password: &str) -> Result<AuthUser> {
        self.begin();
        let result = self.auth.sign_up(&credential, password).await;
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = result.as_ref().err().map(Error::to_string);
        });
        match &result {
            Ok(user) => tracing::info!(user_id = %user.id, "registered {credential}"),
            Err(e) => tracing::warn!("registration failed: {e}"),
        }
        result
    }

    pub async fn logout(&self) -> Result<()> {
        self.begin();
        let result = self.auth.sign_out().await;
        self.state.send_modify(|s| {
            s.session = None;
            s.is_admin = false;
            s.loading = false;
            s.error = result.as_ref().err().map(Error::to_string);
        });
        match &result {
            Ok(()) => tracing::info!("signed out"),
            Err(e) => tracing::warn!("remote sign-out failed, local session cleared: {e}"),
        }
        result
    }

    /// Ask the decision point whether the current user is an admin and store
    /// the answer. `false` without a session or on any failure.
    pub async fn check_admin_status(&self) -> bool {
        let Some(session) = self.state.borrow().session.clone() else {
            return false;
        };
        let is_admin = self.admin_flag(&session).await;
        self.state.send_if_modified(|s| {
            let same_user = s.user_id() == Some(session.user.id);
            let changed = same_user && s.is_admin != is_admin;
            if changed {
                s.is_admin = is_admin;
            }
            changed
        });
        is_admin
    }

    /// Request elevation of the current user.
    ///
    /// The request is authenticated with the current session's own bearer
    /// token. Whether the requester may elevate anyone is for the decision
    /// point to verify; the local flag only changes through the restore that
    /// follows.
    pub async fn grant_admin_privilege(&self) -> Result<()> {
        let session = self
            .state
            .borrow()
            .session
            .clone()
            .ok_or(Error::NotAuthenticated)?;
        self.begin();
        if let Err(e) = self
            .admin
            .grant_admin(&session.access_token, session.user.id)
            .await
        {
            tracing::warn!(user_id = %session.user.id, "admin grant refused: {e}");
            self.state.send_modify(|s| {
                s.loading = false;
                s.error = Some(e.to_string());
            });
            return Err(e);
        }
        tracing::info!(user_id = %session.user.id, "admin grant accepted");
        self.restore().await;
        Ok(())
    }

    /// The current caller, refreshing the session first when its access token
    /// has expired. A refresh that yields no session signs the user out.
    pub async fn fresh_caller(&self) -> Option<Caller> {
        let session = self.state.borrow().session.clone()?;
        if !session.is_expired_at(Utc::now()) {
            return Some(session.caller());
        }
        match self.auth.get_session().await {
            Ok(Some(fresh)) if fresh.user.id == session.user.id => {
                tracing::debug!(user_id = %fresh.user.id, "access token refreshed");
                let caller = fresh.caller();
                self.state.send_modify(|s| s.session = Some(fresh));
                Some(caller)
            }
            Ok(Some(other)) => {
                let is_admin = self.admin_flag(&other).await;
                let caller = other.caller();
                self.settle(Some(other), is_admin);
                Some(caller)
            }
            Ok(None) => {
                tracing::info!(user_id = %session.user.id, "session expired");
                self.settle(None, false);
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %session.user.id, "session refresh failed: {e}");
                self.settle(None, false);
                self.state.send_modify(|s| s.error = Some(e.to_string()));
                None
            }
        }
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn settle(&self, session: Option<Session>, is_admin: bool) -> Option<Identity> {
        let mut identity = None;
        self.state.send_modify(|s| {
            s.is_admin = session.is_some() && is_admin;
            s.session = session;
            s.loading = false;
            identity = s.identity();
        });
        identity
    }

    async fn restore(&self) {
        self.begin();
        match self.auth.get_session().await {
            Ok(Some(session)) => {
                let is_admin = self.admin_flag(&session).await;
                tracing::debug!(user_id = %session.user.id, is_admin, "session restored");
                self.settle(Some(session), is_admin);
            }
            Ok(None) => {
                self.settle(None, false);
            }
            Err(e) => {
                tracing::warn!("session restore failed: {e}");
                self.settle(None, false);
                self.state.send_modify(|s| s.error = Some(e.to_string()));
            }
        }
    }

    async fn admin_flag(&self, session: &Session) -> bool {
        match self.admin.check_admin(&session.access_token).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                tracing::warn!(user_id = %session.user.id, "admin check failed: {e}");
                false
            }
        }
    }

    async fn apply(&self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, "auth event");
        match (event.kind, event.session) {
            (AuthEventKind::SignedOut, _) | (_, None) => {
                self.settle(None, false);
            }
            (_, Some(session)) => {
                let current = self.state.borrow().user_id();
                if current == Some(session.user.id) {
                    self.state.send_modify(|s| s.session = Some(session));
                } else {
                    let is_admin = self.admin_flag(&session).await;
                    self.settle(Some(session), is_admin);
                }
            }
        }
    }
}

/// Applies auth-provider events to the authority's state.
pub struct SessionListener<A, D> {
    authority: SessionAuthority<A, D>,
    events: broadcast::Receiver<AuthEvent>,
}

impl<A: AuthBackend, D: AdminAuthority> SessionListener<A, D> {
    /// Apply the next event. Returns `false` once the provider is gone.
    pub async fn next(&mut self) -> bool {
        match self.events.recv().await {
            Ok(event) => {
                self.authority.apply(event).await;
                true
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "auth events dropped, restoring session");
                self.authority.restore().await;
                true
            }
            Err(broadcast::error::RecvError::Closed) => false,
        }
    }

    pub async fn run(mut self) {
        while self.next().await {}
        tracing::debug!("auth event stream closed");
    }
}
