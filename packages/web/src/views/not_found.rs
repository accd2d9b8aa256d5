use dioxus::prelude::*;

use crate::Route;

#[component]
pub fn NotFound(route: Vec<String>) -> Element {
    let path = route.join("/");
    rsx! {
        div {
            class: "page",
            h1 { "Page not found" }
            p { class: "hint", "Nothing lives at /{path}." }
            Link { to: Route::Dashboard {}, "Go to dashboard" }
        }
    }
}
