//! Registration page. A successful sign-up sends the user to the login page.

use dioxus::prelude::*;
use ui::{use_auth, use_backend, ErrorNotice};

use super::login::{Method, MethodSwitch};
use crate::Route;

const MIN_PASSWORD_LEN: usize = 6;

fn validate(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters");
    }
    if password != confirm {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[component]
pub fn Register() -> Element {
    let backend = use_backend();
    let auth = use_auth();
    let nav = use_navigator();
    let method = use_signal(|| Method::Email);
    let mut identifier = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm_password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);

    let handle_register = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = backend.clone();
        async move {
            error.set(None);
            if let Err(message) = validate(&password(), &confirm_password()) {
                error.set(Some(message.to_string()));
                return;
            }
            let credential = method().credential(identifier().trim().to_string());
            if backend.authority.register(credential, &password()).await.is_ok() {
                nav.push(Route::Login {});
            }
        }
    };

    let state = auth();
    rsx! {
        div {
            class: "auth-page",
            h1 { "Create Account" }

            form {
                class: "auth-form",
                onsubmit: handle_register,

                ErrorNotice { message: error().or(state.error.clone()) }
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
                input {
                    r#type: "password",
                    placeholder: "Confirm password",
                    required: true,
                    value: confirm_password(),
                    oninput: move |evt: FormEvent| confirm_password.set(evt.value()),
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: state.loading,
                    if state.loading { "Creating account..." } else { "Sign up" }
                }
            }

            p {
                class: "hint",
                "Already have an account? "
                Link { to: Route::Login {}, "Sign in" }
            }
        }
    }
}
