//! Admin-only overview. The route guard keeps everyone else out.

use dioxus::prelude::*;
use ui::{use_auth, use_backend, use_leads, ErrorNotice, StatsCards};

#[component]
pub fn AdminDashboard() -> Element {
    let backend = use_backend();
    let auth = use_auth();
    let leads = use_leads();

    let loader = backend.clone();
    let _loader = use_resource(move || {
        let loader = loader.clone();
        async move {
            let _ = loader.leads.fetch_all().await;
        }
    });

    let recheck = move |_| {
        let backend = backend.clone();
        async move {
            backend.authority.check_admin_status().await;
        }
    };

    let auth_state = auth();
    let state = leads();
    let identity = auth_state.identity();

    rsx! {
        div {
            class: "page",
            h1 { "Admin dashboard" }
            ErrorNotice { message: state.error.clone() }
            if let Some(identity) = identity {
                div {
                    class: "card",
                    h2 { "Signed in as" }
                    dl {
                        dt { "User id" }
                        dd { "{identity.id}" }
                        dt { "Email" }
                        dd { {identity.email.clone().unwrap_or_default()} }
                        dt { "Phone" }
                        dd { {identity.phone.clone().unwrap_or_default()} }
                        dt { "Role" }
                        dd { if identity.is_admin { "administrator" } else { "user" } }
                    }
                    button { class: "btn", onclick: recheck, "Re-check admin status" }
                }
            }
            h2 { "Your leads" }
            StatsCards { stats: state.mirror.stats() }
        }
    }
}
