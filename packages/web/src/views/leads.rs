//! Lead list with selection and bulk actions.

use dioxus::prelude::*;
use store::{LeadId, LeadPatch, LeadStatus, Priority};
use ui::{use_backend, use_leads, ErrorNotice, LeadTable};

use crate::Route;

#[component]
pub fn Leads() -> Element {
    let backend = use_backend();
    let leads = use_leads();
    let nav = use_navigator();

    let loader = backend.clone();
    let _loader = use_resource(move || {
        let loader = loader.clone();
        async move {
            let _ = loader.leads.fetch_all().await;
        }
    });

    let state = leads();
    let selected = state.mirror.selected().to_vec();
    let selected_count = selected.len();

    let bulk = {
        let backend = backend.clone();
        move |patch: LeadPatch| {
            let backend = backend.clone();
            spawn(async move {
                let _ = backend.leads.bulk_update(patch).await;
            });
        }
    };
    let bulk_status = bulk.clone();
    let bulk_priority = bulk;

    let toggle = backend.clone();
    let toggle_all = backend.clone();
    let delete = backend.clone();

    rsx! {
        div {
            class: "page",
            div {
                class: "page-header",
                h1 { "Leads" }
                div {
                    class: "actions",
                    Link { class: "btn", to: Route::UploadCsv {}, "Upload CSV" }
                    Link { class: "btn btn-primary", to: Route::NewLead {}, "New lead" }
                }
            }

            ErrorNotice { message: state.error.clone() }

            if selected_count > 0 {
                div {
                    class: "bulk-bar",
                    span { "{selected_count} selected" }
                    select {
                        onchange: move |evt: FormEvent| {
                            if let Ok(status) = evt.value().parse::<LeadStatus>() {
                                bulk_status(LeadPatch::new().status(status));
                            }
                        },
                        option { value: "", "Set status..." }
                        for s in LeadStatus::ALL {
                            option { value: s.as_str(), "{s}" }
                        }
                    }
                    select {
                        onchange: move |evt: FormEvent| {
                            if let Ok(priority) = evt.value().parse::<Priority>() {
                                bulk_priority(LeadPatch::new().priority(priority));
                            }
                        },
                        option { value: "", "Set priority..." }
                        for p in Priority::ALL {
                            option { value: p.as_str(), "{p}" }
                        }
                    }
                }
            }

            if state.loading && state.mirror.is_empty() {
                p { class: "hint", "Loading..." }
            } else {
                LeadTable {
                    leads: state.mirror.leads().to_vec(),
                    selected,
                    on_toggle: move |id: LeadId| toggle.leads.toggle_selected(id),
                    on_toggle_all: move |all: bool| {
                        if all {
                            toggle_all.leads.select_all();
                        } else {
                            toggle_all.leads.clear_selection();
                        }
                    },
                    on_open: move |id: LeadId| {
                        nav.push(Route::LeadDetail { id });
                    },
                    on_delete: move |id: LeadId| {
                        let backend = delete.clone();
                        spawn(async move {
                            let _ = backend.leads.delete(id).await;
                        });
                    },
                }
            }
        }
    }
}
