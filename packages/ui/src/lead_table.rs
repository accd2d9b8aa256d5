//! Tabular list of leads with per-row selection.

use dioxus::prelude::*;
use store::{Lead, LeadId, LeadStatus, Priority};

use crate::icons::{FaEye, FaTrash};
use crate::Icon;

fn status_class(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::Open => "badge badge-open",
        LeadStatus::Close => "badge badge-closed",
        LeadStatus::Pending => "badge badge-pending",
    }
}

fn priority_class(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "badge badge-high",
        Priority::Normal => "badge",
        Priority::Low => "badge badge-low",
    }
}

#[component]
pub fn LeadTable(
    leads: Vec<Lead>,
    #[props(default)] selected: Vec<LeadId>,
    /// Row checkbox changed. The selection column is only shown when set.
    on_toggle: Option<EventHandler<LeadId>>,
    /// `true` selects every row, `false` clears the selection.
    on_toggle_all: Option<EventHandler<bool>>,
    on_open: EventHandler<LeadId>,
    on_delete: Option<EventHandler<LeadId>>,
) -> Element {
    if leads.is_empty() {
        return rsx! {
            p { class: "empty", "No leads yet." }
        };
    }
    let all_selected = selected.len() == leads.len();
    let selectable = on_toggle.is_some();

    rsx! {
        table {
            class: "lead-table",
            thead {
                tr {
                    if selectable {
                        th {
                            input {
                                r#type: "checkbox",
                                checked: all_selected,
                                onchange: move |_| {
                                    if let Some(handler) = on_toggle_all {
                                        handler.call(!all_selected);
                                    }
                                },
                            }
                        }
                    }
                    th { "Name" }
                    th { "Email" }
                    th { "Phone" }
                    th { "Status" }
                    th { "Priority" }
                    th { "Target" }
                    th { "Created" }
                    th {}
                }
            }
            tbody {
                for lead in leads {
                    tr {
                        key: "{lead.id}",
                        class: if !lead.is_active { "inactive" },
                        if selectable {
                            td {
                                input {
                                    r#type: "checkbox",
                                    checked: selected.contains(&lead.id),
                                    onchange: move |_| {
                                        if let Some(handler) = on_toggle {
                                            handler.call(lead.id);
                                        }
                                    },
                                }
                            }
                        }
                        td { "{lead.name}" }
                        td { "{lead.email}" }
                        td { "{lead.phone}" }
                        td { span { class: status_class(lead.status), "{lead.status}" } }
                        td { span { class: priority_class(lead.priority), "{lead.priority}" } }
                        td { "{lead.target_type}" }
                        td { {lead.created_at.format("%Y-%m-%d").to_string()} }
                        td {
                            class: "row-actions",
                            button {
                                class: "btn btn-icon",
                                title: "View",
                                onclick: move |_| on_open.call(lead.id),
                                Icon { icon: FaEye, width: 14, height: 14 }
                            }
                            if let Some(on_delete) = on_delete {
                                button {
                                    class: "btn btn-icon btn-danger",
                                    title: "Delete",
                                    onclick: move |_| on_delete.call(lead.id),
                                    Icon { icon: FaTrash, width: 14, height: 14 }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
