use dioxus::prelude::*;

use crate::icons::FaRightFromBracket;
use crate::{use_auth, Icon, LogoutButton};

/// Top bar: navigation links passed as children, then the signed-in user.
#[component]
pub fn Navbar(children: Element) -> Element {
    let auth = use_auth();
    let identity = auth().identity();

    rsx! {
        nav {
            class: "navbar",
            div { class: "navbar-links", {children} }
            if let Some(identity) = identity {
                div {
                    class: "navbar-user",
                    span { class: "navbar-name", {identity.display_name()} }
                    if identity.is_admin {
                        span { class: "badge badge-admin", "admin" }
                    }
                    Icon { icon: FaRightFromBracket, width: 12, height: 12 }
                    LogoutButton { class: "btn btn-link" }
                }
            }
        }
    }
}

/// Inline error message, hidden when there is none.
#[component]
pub fn ErrorNotice(message: Option<String>) -> Element {
    rsx! {
        if let Some(message) = message {
            div { class: "notice notice-error", role: "alert", "{message}" }
        }
    }
}
