//! Login page: email or phone plus password.

use api::Credential;
use dioxus::prelude::*;
use ui::{use_auth, use_backend, ErrorNotice};

use crate::Route;

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Method {
    Email,
    Phone,
}

impl Method {
    pub(crate) fn credential(self, value: String) -> Credential {
        match self {
            Method::Email => Credential::Email(value),
            Method::Phone => Credential::Phone(value),
        }
    }
}

#[component]
pub(crate) fn MethodSwitch(method: Signal<Method>) -> Element {
    let mut method = method;
    rsx! {
        div {
            class: "method-switch",
            button {
                r#type: "button",
                class: if method() == Method::Email { "btn btn-tab active" } else { "btn btn-tab" },
                onclick: move |_| method.set(Method::Email),
                "Email"
            }
            button {
                r#type: "button",
                class: if method() == Method::Phone { "btn btn-tab active" } else { "btn btn-tab" },
                onclick: move |_| method.set(Method::Phone),
                "Phone"
            }
        }
    }
}

#[component]
pub fn Login() -> Element {
    let backend = use_backend();
    let auth = use_auth();
    let nav = use_navigator();
    let method = use_signal(|| Method::Email);
    let mut identifier = use_signal(String::new);
    let mut password = use_signal(String::new);

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = backend.clone();
        async move {
            let credential = method().credential(identifier().trim().to_string());
            if backend.authority.login(credential, &password()).await.is_ok() {
                nav.replace(Route::Dashboard {});
            }
        }
    };

    let state = auth();
    rsx! {
        div {
            class: "auth-page",
            h1 { "Lead Tracker" }
            p { class: "hint", "Sign in to manage your leads" }

            form {
                class: "auth-form",
                onsubmit: handle_login,

                ErrorNotice { message: state.error.clone() }
                MethodSwitch { method }

                input {
                    r#type: if method() == Method::Email { "email" } else { "tel" },
                    placeholder: if method() == Method::Email { "Email" } else { "Phone" },
                    required: true,
                    value: identifier(),
                    oninput: move |evt: FormEvent| identifier.set(evt.value()),
                }
                input {
                    r#type: "password",
                    placeholder: "Password",
                    required: true,
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: state.loading,
                    if state.loading { "Signing in..." } else { "Sign in" }
                }
            }

            p {
                class: "hint",
                "No account yet? "
                Link { to: Route::Register {}, "Create one" }
            }
        }
    }
}
