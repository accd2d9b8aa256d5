//! In-process auth provider and admin decision point for tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use store::UserId;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::{
    AdminAuthority, AuthBackend, AuthEvent, AuthEventKind, AuthUser, Credential, Session,
};
use crate::error::{Error, Result};

pub fn token_for(user_id: UserId) -> String {
    format!("token-{user_id}")
}

fn user_of(token: &str) -> Option<UserId> {
    token
        .strip_prefix("token-")
        .and_then(|id| Uuid::parse_str(id).ok())
}

pub fn session_for(user: &AuthUser) -> Session {
    Session {
        access_token: token_for(user.id),
        refresh_token: format!("refresh-{}", user.id),
        expires_at: Utc::now() + Duration::hours(1),
        user: user.clone(),
    }
}

#[derive(Default)]
struct AuthInner {
    accounts: Vec<(Credential, String, AuthUser)>,
    session: Option<Session>,
    fail_get_session: Option<Error>,
    fail_sign_out: Option<Error>,
}

#[derive(Clone)]
pub struct FakeAuth {
    inner: Arc<Mutex<AuthInner>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self {
            inner: Arc::default(),
            events: broadcast::channel(16).0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_account(&self, credential: Credential, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: credential.email().map(str::to_string),
            phone: credential.phone().map(str::to_string),
        };
        self.lock()
            .accounts
            .push((credential, password.to_string(), user.clone()));
        user
    }

    pub fn set_session(&self, session: Option<Session>) {
        self.lock().session = session;
    }

    pub fn fail_get_session(&self, error: Error) {
        self.lock().fail_get_session = Some(error);
    }

    pub fn fail_sign_out(&self, error: Error) {
        self.lock().fail_sign_out = Some(error);
    }

    pub fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        let _ = self.events.send(AuthEvent { kind, session });
    }
}

impl AuthBackend for FakeAuth {
    async fn get_session(&self) -> Result<Option<Session>> {
        let mut inner = self.lock();
        match inner.fail_get_session.take() {
            Some(e) => Err(e),
            None => Ok(inner.session.clone()),
        }
    }

    async fn sign_in(&self, credential: &Credential, password: &str) -> Result<Session> {
        let session = {
            let mut inner = self.lock();
            let user = inner
                .accounts
                .iter()
                .find(|(c, p, _)| c == credential && p == password)
                .map(|(_, _, user)| user.clone())
                .ok_or_else(|| Error::Authentication("Invalid login credentials".to_string()))?;
            let session = session_for(&user);
            inner.session = Some(session.clone());
            session
        };
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credential: &Credential, password: &str) -> Result<AuthUser> {
        if self.lock().accounts.iter().any(|(c, _, _)| c == credential) {
            return Err(Error::Authentication("User already registered".to_string()));
        }
        Ok(self.add_account(credential.clone(), password))
    }

    async fn sign_out(&self) -> Result<()> {
        let failure = {
            let mut inner = self.lock();
            inner.session = None;
            inner.fail_sign_out.take()
        };
        self.emit(AuthEventKind::SignedOut, None);
        failure.map_or(Ok(()), Err)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
struct AdminInner {
    admins: HashSet<UserId>,
    grants: Vec<(String, UserId)>,
    fail_checks: bool,
}

/// Grants are accepted from any valid token, like the hosted function.
#[derive(Clone, Default)]
pub struct FakeAdmin {
    inner: Arc<Mutex<AdminInner>>,
}

impl FakeAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AdminInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn make_admin(&self, user_id: UserId) {
        self.lock().admins.insert(user_id);
    }

    pub fn fail_checks(&self, fail: bool) {
        self.lock().fail_checks = fail;
    }

    pub fn grants(&self) -> Vec<(String, UserId)> {
        self.lock().grants.clone()
    }
}

impl AdminAuthority for FakeAdmin {
    async fn check_admin(&self, access_token: &str) -> Result<bool> {
        let inner = self.lock();
        if inner.fail_checks {
            return Err(Error::Transport("Failed to check admin status".to_string()));
        }
        Ok(user_of(access_token).is_some_and(|id| inner.admins.contains(&id)))
    }

    async fn grant_admin(&self, access_token: &str, user_id: UserId) -> Result<()> {
        let mut inner = self.lock();
        if user_of(access_token).is_none() {
            return Err(Error::Authentication("Unauthorized".to_string()));
        }
        inner.grants.push((access_token.to_string(), user_id));
        inner.admins.insert(user_id);
        Ok(())
    }
}
