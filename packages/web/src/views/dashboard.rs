//! Landing page: counters, the most recent leads, and an admin-access request.

use dioxus::prelude::*;
use store::LeadId;
use ui::{use_auth, use_backend, use_leads, ErrorNotice, LeadTable, StatsCards};

use crate::Route;

const RECENT: usize = 5;

#[component]
pub fn Dashboard() -> Element {
    let backend = use_backend();
    let auth = use_auth();
    let leads = use_leads();
    let nav = use_navigator();

    let loader = backend.clone();
    let _loader = use_resource(move || {
        let loader = loader.clone();
        async move {
            let _ = loader.leads.fetch_all().await;
        }
    });

    let request_admin = move |_| {
        let backend = backend.clone();
        async move {
            let _ = backend.authority.grant_admin_privilege().await;
        }
    };

    let auth_state = auth();
    let state = leads();
    let recent: Vec<_> = state.mirror.leads().iter().take(RECENT).cloned().collect();

    rsx! {
        div {
            class: "page",
            div {
                class: "page-header",
                h1 { "Dashboard" }
                Link { class: "btn btn-primary", to: Route::NewLead {}, "New lead" }
            }

            ErrorNotice { message: state.error.clone() }
            StatsCards { stats: state.mirror.stats() }

            h2 { "Recent leads" }
            if state.loading && recent.is_empty() {
                p { class: "hint", "Loading..." }
            } else {
                LeadTable {
                    leads: recent,
                    on_open: move |id: LeadId| {
                        nav.push(Route::LeadDetail { id });
                    },
                }
            }

            if !auth_state.is_admin {
                div {
                    class: "card",
                    h2 { "Administrator access" }
                    ErrorNotice { message: auth_state.error.clone() }
                    button {
                        class: "btn",
                        disabled: auth_state.loading,
                        onclick: request_admin,
                        "Request admin access"
                    }
                }
            }
        }
    }
}
