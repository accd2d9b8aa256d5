//! HTTP client for the hosted GoTrue auth service.
//!
//! Holds the current session in memory and pushes every change onto a
//! broadcast channel. Persisting the session across restarts is left to the
//! caller: seed it with [`GoTrueClient::with_session`] and read it back with
//! [`GoTrueClient::current_session`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::provider::AuthBackend;
use super::session::{AuthEvent, AuthEventKind, AuthUser, Credential, Session};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::http::{bearer, read_failure};

const EVENT_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
    session: Arc<Mutex<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueClient {
    pub fn new(config: Arc<BackendConfig>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            config,
            session: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Seed the client with a session saved by a previous run.
    pub fn with_session(self, session: Option<Session>) -> Self {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
        self
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent { kind, session });
    }

    async fn token(&self, grant_type: &str, body: &impl Serialize) -> Result<Session> {
        let response = self
            .http
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            return Err(classify(status, message));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session(Utc::now()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        tracing::debug!("refreshing expired session");
        self.token("refresh_token", &RefreshBody { refresh_token })
            .await
    }
}

impl AuthBackend for GoTrueClient {
    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }
        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.store(Some(fresh.clone()));
                self.emit(AuthEventKind::TokenRefreshed, Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(e) => {
                tracing::warn!("session refresh failed: {e}");
                self.store(None);
                self.emit(AuthEventKind::SignedOut, None);
                Err(e)
            }
        }
    }

    async fn sign_in(&self, credential: &Credential, password: &str) -> Result<Session> {
        let session = self
            .token("password", &PasswordBody::new(credential, password))
            .await?;
        self.store(Some(session.clone()));
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credential: &Credential, password: &str) -> Result<AuthUser> {
        let response = self
            .http
            .post(self.config.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&PasswordBody::new(credential, password))
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            return Err(classify(status, message));
        }
        match response.json().await? {
            SignUpResponse::Session(token) => Ok(token.user),
            SignUpResponse::User(user) => Ok(user),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.current_session().map(|s| s.access_token);
        self.store(None);
        self.emit(AuthEventKind::SignedOut, None);

        let Some(token) = token else {
            return Ok(());
        };
        let response = self
            .http
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", bearer(&token))
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            return Err(classify(status, message));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Client errors are the provider refusing us; everything else is transport.
fn classify(status: u16, message: String) -> Error {
    if (400..500).contains(&status) {
        Error::Authentication(message)
    } else {
        Error::Transport(message)
    }
}

#[derive(Debug, Serialize)]
struct PasswordBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    password: &'a str,
}

impl<'a> PasswordBody<'a> {
    fn new(credential: &'a Credential, password: &'a str) -> Self {
        Self {
            email: credential.email(),
            phone: credential.phone(),
            password,
        }
    }
}

#[derive(Debug, Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a full session when confirmation is disabled, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}
