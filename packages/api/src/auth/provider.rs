//! The auth-provider seam consumed by the session authority.

use tokio::sync::broadcast;

use super::session::{AuthEvent, AuthUser, Credential, Session};
use crate::error::Result;

/// Async interface to a hosted auth provider.
pub trait AuthBackend {
    /// The stored session, refreshed if it has expired. `Ok(None)` when signed out.
    fn get_session(&self) -> impl std::future::Future<Output = Result<Option<Session>>>;
    fn sign_in(
        &self,
        credential: &Credential,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session>>;
    /// Create an account. Does not sign in.
    fn sign_up(
        &self,
        credential: &Credential,
        password: &str,
    ) -> impl std::future::Future<Output = Result<AuthUser>>;
    /// Revoke the remote session. The local copy is dropped even on failure.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<()>>;
    /// Stream of session changes (sign-in, sign-out, token refresh).
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
