use dioxus::prelude::*;
use store::LeadStats;

#[component]
pub fn StatsCards(stats: LeadStats) -> Element {
    let cards = [
        ("Total leads", stats.total),
        ("Open", stats.open),
        ("Pending", stats.pending),
        ("Closed", stats.closed),
        ("High priority", stats.high_priority),
    ];
    rsx! {
        div {
            class: "stats",
            for (label, value) in cards {
                div {
                    key: "{label}",
                    class: "stat-card",
                    span { class: "stat-value", "{value}" }
                    span { class: "stat-label", "{label}" }
                }
            }
        }
    }
}
