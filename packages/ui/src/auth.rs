//! Backend context and hooks for the UI.
//!
//! [`AuthProvider`] builds the hosted [`Backend`] once, restores the saved
//! session, and mirrors the session authority and lead synchronizer state into
//! signals so components re-render when either changes.

use std::sync::Arc;

use api::{
    AuthState, BackendConfig, GoTrueClient, HostedAuthority, HostedLeads, HttpAdminAuthority,
    LeadSync, LeadsState, RestTable, SessionAuthority,
};
use dioxus::prelude::*;

use crate::storage;

/// The hosted session authority and lead synchronizer.
#[derive(Clone)]
pub struct Backend {
    pub authority: HostedAuthority,
    pub leads: HostedLeads,
}

impl Backend {
    /// Build from the environment, falling back to the native config file. A
    /// missing configuration is logged and the app keeps running; every remote
    /// call then fails visibly.
    pub fn from_env() -> Self {
        let config = BackendConfig::from_env()
            .or_else(|e| storage::load_config().ok_or(e))
            .unwrap_or_else(|e| {
                tracing::error!("backend configuration unavailable: {e}");
                BackendConfig::default()
            });
        Self::new(Arc::new(config))
    }

    pub fn new(config: Arc<BackendConfig>) -> Self {
        let client = GoTrueClient::new(config.clone()).with_session(storage::load_session());
        let authority = SessionAuthority::new(client, HttpAdminAuthority::new(config.clone()));
        let leads = LeadSync::new(RestTable::new(config), authority.clone());
        Self { authority, leads }
    }
}

pub fn use_backend() -> Backend {
    use_context::<Backend>()
}

/// Session state; updates on login, logout and token refresh.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// Lead mirror plus the loading/error slots of the last operation.
pub fn use_leads() -> Signal<LeadsState> {
    use_context::<Signal<LeadsState>>()
}

/// Wrap the app with this component to enable authentication and leads.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let backend = use_context_provider(Backend::from_env);
    let mut auth_state = use_signal(|| backend.authority.state());
    let mut leads_state = use_signal(|| backend.leads.state());

    use_hook(|| {
        let restore = backend.clone();
        spawn(async move {
            let listener = restore.authority.initialize().await;
            listener.run().await;
        });

        let follow = backend.leads.clone();
        spawn(async move { follow.follow_session().await });

        let mut auth_rx = backend.authority.watch();
        spawn(async move {
            loop {
                let state = auth_rx.borrow_and_update().clone();
                if state.restored {
                    storage::save_session(state.session.as_ref());
                }
                auth_state.set(state);
                if auth_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        let mut leads_rx = backend.leads.watch();
        spawn(async move {
            loop {
                let state = leads_rx.borrow_and_update().clone();
                leads_state.set(state);
                if leads_rx.changed().await.is_err() {
                    break;
                }
            }
        });
    });

    use_context_provider(|| auth_state);
    use_context_provider(|| leads_state);

    rsx! {
        {children}
    }
}

/// Button to log out the current user. The route guard takes care of leaving
/// the protected page once the session is gone.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let backend = use_backend();

    let onclick = move |_| {
        let backend = backend.clone();
        async move {
            if let Err(e) = backend.authority.logout().await {
                tracing::warn!("logout: {e}");
            }
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
