//! # API crate: session authority and lead synchronizer for the lead tracker
//!
//! Everything that talks to the hosted backend lives here, along with the two
//! stateful components the front end is built on.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Session types, the [`AuthBackend`] and [`AdminAuthority`] seams, and their hosted HTTP clients |
//! | [`authority`] | [`SessionAuthority`]: current session, admin flag, login/register/logout, admin grant |
//! | [`config`] | [`BackendConfig`]: project URL, anon key, table and function names |
//! | [`error`] | The [`Error`] taxonomy shared by every operation |
//! | [`leads`] | [`LeadSync`]: owner-scoped CRUD, bulk update and import over a local mirror |
//! | [`rest`] | [`RestTable`]: the hosted PostgREST implementation of [`store::LeadTable`] |
//! | [`routes`] | Navigation targets and the authorization [`gate`] |
//!
//! ## Wiring
//!
//! ```ignore
//! let config = Arc::new(BackendConfig::from_env()?);
//! let authority = SessionAuthority::new(
//!     GoTrueClient::new(config.clone()),
//!     HttpAdminAuthority::new(config.clone()),
//! );
//! let leads = LeadSync::new(RestTable::new(config), authority.watch());
//! spawn(authority.initialize().await.run());
//! spawn(async move { leads.follow_session().await });
//! ```

pub mod auth;
pub mod authority;
pub mod config;
pub mod error;
mod http;
pub mod leads;
pub mod rest;
pub mod routes;

#[cfg(test)]
mod fake;

pub use auth::{
    AdminAuthority, AuthBackend, AuthEvent, AuthEventKind, AuthUser, Credential, GoTrueClient,
    HttpAdminAuthority, Session,
};
pub use authority::{
    AuthState, CallerSource, Identity, SessionAuthority, SessionListener, SessionPhase,
};
pub use config::BackendConfig;
pub use error::{Error, Result};
pub use leads::{ImportReport, LeadSync, LeadsState};
pub use rest::RestTable;
pub use routes::{gate, Access, Gate, Page, LANDING};

/// The session authority wired to the hosted services.
pub type HostedAuthority = SessionAuthority<GoTrueClient, HttpAdminAuthority>;

/// The lead synchronizer wired to the hosted REST table.
pub type HostedLeads = LeadSync<RestTable, HostedAuthority>;
