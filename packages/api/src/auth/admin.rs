//! Admin status lookups and grants via the hosted edge functions.
//!
//! Both calls carry the *caller's* access token. The `set-admin` function is
//! responsible for verifying that the caller is itself an administrator; this
//! client never sends the anon key as a bearer token.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use store::UserId;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::http::{bearer, read_failure};

pub trait AdminAuthority {
    fn check_admin(&self, access_token: &str) -> impl std::future::Future<Output = Result<bool>>;
    fn grant_admin(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<()>>;
}

#[derive(Clone)]
pub struct HttpAdminAuthority {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
}

impl HttpAdminAuthority {
    pub fn new(config: Arc<BackendConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckAdminResponse {
    #[serde(rename = "isAdmin", default)]
    is_admin: bool,
}

#[derive(Debug, Serialize)]
struct SetAdminBody {
    user_id: UserId,
}

impl AdminAuthority for HttpAdminAuthority {
    async fn check_admin(&self, access_token: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.config.function_url(&self.config.functions.check_admin))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", bearer(access_token))
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            tracing::warn!(status, "admin check failed: {message}");
            return Err(Error::Transport("Failed to check admin status".to_string()));
        }
        let body: CheckAdminResponse = response.json().await?;
        Ok(body.is_admin)
    }

    async fn grant_admin(&self, access_token: &str, user_id: UserId) -> Result<()> {
        let response = self
            .http
            .post(self.config.function_url(&self.config.functions.set_admin))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", bearer(access_token))
            .json(&SetAdminBody { user_id })
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = read_failure(response).await;
            return Err(match status {
                401 | 403 => Error::Authentication(message),
                _ => Error::Transport(message),
            });
        }
        Ok(())
    }
}
