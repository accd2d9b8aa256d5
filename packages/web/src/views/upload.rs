use dioxus::prelude::*;
use ui::CsvUpload;

use crate::Route;

#[component]
pub fn UploadCsv() -> Element {
    let nav = use_navigator();

    rsx! {
        div {
            class: "page",
            div {
                class: "page-header",
                h1 { "Upload CSV" }
                Link { class: "btn", to: Route::Leads {}, "Back to leads" }
            }
            CsvUpload {
                on_done: move |count: usize| {
                    tracing::info!(count, "csv import finished");
                    if count > 0 {
                        nav.push(Route::Leads {});
                    }
                },
            }
        }
    }
}
