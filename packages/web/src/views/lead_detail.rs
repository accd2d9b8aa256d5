//! Single-lead views: detail, create and edit.

use dioxus::prelude::*;
use store::{Lead, LeadFields, LeadId, LeadPatch};
use ui::{use_backend, use_leads, ErrorNotice, LeadForm};

use crate::Route;

#[component]
fn Field(label: &'static str, value: String) -> Element {
    rsx! {
        div {
            class: "field",
            dt { "{label}" }
            dd { if value.is_empty() { "-" } else { "{value}" } }
        }
    }
}

#[component]
fn LeadCard(lead: Lead) -> Element {
    rsx! {
        dl {
            class: "lead-card",
            Field { label: "Email", value: lead.email.clone() }
            Field { label: "Phone", value: lead.phone.clone() }
            Field { label: "Address", value: lead.address.clone() }
            Field { label: "Status", value: lead.status.to_string() }
            Field { label: "Priority", value: lead.priority.to_string() }
            Field { label: "Target", value: lead.target_type.to_string() }
            Field { label: "Active", value: if lead.is_active { "yes".to_string() } else { "no".to_string() } }
            Field { label: "Last follow-up remarks", value: lead.last_followup_remarks.clone().unwrap_or_default() }
            Field { label: "Next steps", value: lead.next_steps.clone().unwrap_or_default() }
            Field { label: "Created", value: lead.created_at.format("%Y-%m-%d %H:%M").to_string() }
        }
    }
}

/// Load `id` into the current slot, again whenever the route param changes.
fn use_current_lead(id: LeadId) -> Resource<Option<Lead>> {
    let backend = use_backend();
    let mut id_signal = use_signal(|| id);
    if *id_signal.peek() != id {
        id_signal.set(id);
    }
    use_resource(move || {
        let backend = backend.clone();
        let id = id_signal();
        async move { backend.leads.fetch_one(id).await.ok().flatten() }
    })
}

#[component]
pub fn LeadDetail(id: LeadId) -> Element {
    let backend = use_backend();
    let leads = use_leads();
    let nav = use_navigator();
    let current = use_current_lead(id);

    let handle_delete = move |_| {
        let backend = backend.clone();
        async move {
            if backend.leads.delete(id).await.is_ok() {
                nav.push(Route::Leads {});
            }
        }
    };

    let error = leads().error;
    rsx! {
        div {
            class: "page",
            ErrorNotice { message: error }
            {match current() {
                None => rsx! { p { class: "hint", "Loading..." } },
                Some(None) => rsx! {
                    h1 { "Lead not found" }
                    Link { to: Route::Leads {}, "Back to leads" }
                },
                Some(Some(lead)) => rsx! {
                    div {
                        class: "page-header",
                        h1 { "{lead.name}" }
                        div {
                            class: "actions",
                            Link { class: "btn", to: Route::EditLead { id: lead.id }, "Edit" }
                            button { class: "btn btn-danger", onclick: handle_delete, "Delete" }
                        }
                    }
                    LeadCard { lead }
                },
            }}
        }
    }
}

#[component]
pub fn NewLead() -> Element {
    let backend = use_backend();
    let leads = use_leads();
    let nav = use_navigator();

    let handle_submit = move |fields: LeadFields| {
        let backend = backend.clone();
        spawn(async move {
            if let Ok(lead) = backend.leads.create(fields).await {
                nav.replace(Route::LeadDetail { id: lead.id });
            }
        });
    };

    let state = leads();
    rsx! {
        div {
            class: "page",
            h1 { "New lead" }
            ErrorNotice { message: state.error.clone() }
            LeadForm {
                initial: LeadFields::default(),
                submit_label: "Create lead",
                busy: state.loading,
                on_submit: handle_submit,
                on_cancel: move |_| {
                    nav.push(Route::Leads {});
                },
            }
        }
    }
}

#[component]
pub fn EditLead(id: LeadId) -> Element {
    let backend = use_backend();
    let leads = use_leads();
    let nav = use_navigator();
    let current = use_current_lead(id);

    let handle_submit = move |fields: LeadFields| {
        let backend = backend.clone();
        spawn(async move {
            let patch = LeadPatch::from_fields(fields);
            if backend.leads.update(id, patch).await.is_ok() {
                nav.replace(Route::LeadDetail { id });
            }
        });
    };

    let state = leads();
    rsx! {
        div {
            class: "page",
            ErrorNotice { message: state.error.clone() }
            {match current() {
                None => rsx! { p { class: "hint", "Loading..." } },
                Some(None) => rsx! {
                    h1 { "Lead not found" }
                    Link { to: Route::Leads {}, "Back to leads" }
                },
                Some(Some(lead)) => rsx! {
                    h1 { "Edit {lead.name}" }
                    LeadForm {
                        key: "{lead.id}",
                        initial: LeadFields::from(&lead),
                        busy: state.loading,
                        on_submit: handle_submit,
                        on_cancel: move |_| {
                            nav.push(Route::LeadDetail { id });
                        },
                    }
                },
            }}
        }
    }
}
