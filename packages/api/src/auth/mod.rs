//! Authentication against the hosted auth provider and admin functions.

mod admin;
mod gotrue;
mod provider;
mod session;

pub use admin::{AdminAuthority, HttpAdminAuthority};
pub use gotrue::GoTrueClient;
pub use provider::AuthBackend;
pub use session::{AuthEvent, AuthEventKind, AuthUser, Credential, Session};
