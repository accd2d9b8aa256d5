//! Create / edit form for a single lead.

use dioxus::prelude::*;
use store::{LeadFields, LeadStatus, Priority, TargetType};

fn optional(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[component]
pub fn LeadForm(
    initial: LeadFields,
    #[props(default = "Save".to_string())] submit_label: String,
    #[props(default)] busy: bool,
    on_submit: EventHandler<LeadFields>,
    on_cancel: Option<EventHandler<()>>,
) -> Element {
    let mut name = use_signal(|| initial.name.clone());
    let mut email = use_signal(|| initial.email.clone());
    let mut phone = use_signal(|| initial.phone.clone());
    let mut address = use_signal(|| initial.address.clone());
    let mut is_active = use_signal(|| initial.is_active);
    let mut status = use_signal(|| initial.status);
    let mut priority = use_signal(|| initial.priority);
    let mut target_type = use_signal(|| initial.target_type);
    let mut remarks = use_signal(|| initial.last_followup_remarks.clone().unwrap_or_default());
    let mut next_steps = use_signal(|| initial.next_steps.clone().unwrap_or_default());
    let mut error = use_signal(|| Option::<String>::None);

    let handle_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let trimmed = name().trim().to_string();
        if trimmed.is_empty() {
            error.set(Some("Name is required".to_string()));
            return;
        }
        error.set(None);
        on_submit.call(LeadFields {
            name: trimmed,
            email: email().trim().to_string(),
            phone: phone().trim().to_string(),
            address: address().trim().to_string(),
            is_active: is_active(),
            status: status(),
            priority: priority(),
            target_type: target_type(),
            last_followup_remarks: optional(remarks()),
            next_steps: optional(next_steps()),
        });
    };

    let target_value = target_type().map(|t| t.as_str()).unwrap_or_default();

    rsx! {
        form {
            class: "lead-form",
            onsubmit: handle_submit,

            if let Some(err) = error() {
                div { class: "notice notice-error", "{err}" }
            }

            label { "Name"
                input {
                    required: true,
                    value: name(),
                    oninput: move |evt: FormEvent| name.set(evt.value()),
                }
            }
            label { "Email"
                input {
                    r#type: "email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }
            }
            label { "Phone"
                input {
                    r#type: "tel",
                    value: phone(),
                    oninput: move |evt: FormEvent| phone.set(evt.value()),
                }
            }
            label { "Address"
                textarea {
                    rows: 2,
                    value: address(),
                    oninput: move |evt: FormEvent| address.set(evt.value()),
                }
            }
            div {
                class: "form-row",
                label { "Status"
                    select {
                        value: status().as_str(),
                        onchange: move |evt: FormEvent| status.set(evt.value().parse().unwrap_or_default()),
                        for s in LeadStatus::ALL {
                            option { value: s.as_str(), selected: s == status(), "{s}" }
                        }
                    }
                }
                label { "Priority"
                    select {
                        value: priority().as_str(),
                        onchange: move |evt: FormEvent| priority.set(evt.value().parse().unwrap_or_default()),
                        for p in Priority::ALL {
                            option { value: p.as_str(), selected: p == priority(), "{p}" }
                        }
                    }
                }
                label { "Target"
                    select {
                        value: target_value,
                        onchange: move |evt: FormEvent| target_type.set(evt.value().parse::<TargetType>().ok()),
                        option { value: "", selected: target_type().is_none(), "(default)" }
                        for t in TargetType::ALL {
                            option { value: t.as_str(), selected: Some(t) == target_type(), "{t}" }
                        }
                    }
                }
                label {
                    class: "checkbox",
                    input {
                        r#type: "checkbox",
                        checked: is_active(),
                        onchange: move |_| is_active.toggle(),
                    }
                    "Active"
                }
            }
            label { "Last follow-up remarks"
                textarea {
                    rows: 3,
                    value: remarks(),
                    oninput: move |evt: FormEvent| remarks.set(evt.value()),
                }
            }
            label { "Next steps"
                textarea {
                    rows: 3,
                    value: next_steps(),
                    oninput: move |evt: FormEvent| next_steps.set(evt.value()),
                }
            }

            div {
                class: "form-actions",
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: busy,
                    if busy { "Saving..." } else { "{submit_label}" }
                }
                if let Some(on_cancel) = on_cancel {
                    button {
                        class: "btn",
                        r#type: "button",
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }
                }
            }
        }
    }
}
