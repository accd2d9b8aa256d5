//! Session persistence across restarts, and the native config file.
//!
//! - **Web** (WASM): `localStorage` key [`SESSION_KEY`]
//! - **Native**: `<data_dir>/lead-tracker/session.json`, plus an optional
//!   `<data_dir>/lead-tracker/config.toml` read by [`load_config`]

use api::{BackendConfig, Session};

pub const SESSION_KEY: &str = "lead-tracker.session";

fn decode(text: &str) -> Option<Session> {
    match serde_json::from_str(text) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("ignoring unreadable saved session: {e}");
            None
        }
    }
}

#[cfg(any(not(target_arch = "wasm32"), test))]
fn decode_config(text: &str) -> Option<BackendConfig> {
    match BackendConfig::from_toml(text) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("ignoring unreadable config file: {e}");
            None
        }
    }
}

fn encode(session: &Session) -> Option<String> {
    serde_json::to_string(session)
        .map_err(|e| tracing::warn!("could not encode session: {e}"))
        .ok()
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(target_arch = "wasm32")]
pub fn load_session() -> Option<Session> {
    let text = local_storage()?.get_item(SESSION_KEY).ok().flatten()?;
    decode(&text)
}

#[cfg(target_arch = "wasm32")]
pub fn save_session(session: Option<&Session>) {
    let Some(storage) = local_storage() else {
        return;
    };
    let result = match session.and_then(encode) {
        Some(text) => storage.set_item(SESSION_KEY, &text),
        None => storage.remove_item(SESSION_KEY),
    };
    if result.is_err() {
        tracing::warn!("could not write session to localStorage");
    }
}

/// There is no config file in the browser.
#[cfg(target_arch = "wasm32")]
pub fn load_config() -> Option<BackendConfig> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn data_path(file: &str) -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("lead-tracker")
        .join(file)
}

#[cfg(not(target_arch = "wasm32"))]
fn session_path() -> std::path::PathBuf {
    data_path("session.json")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_config() -> Option<BackendConfig> {
    let text = std::fs::read_to_string(data_path("config.toml")).ok()?;
    decode_config(&text)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_session() -> Option<Session> {
    let text = std::fs::read_to_string(session_path()).ok()?;
    decode(&text)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_session(session: Option<&Session>) {
    let path = session_path();
    let result = match session.and_then(encode) {
        Some(text) => path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&path, text)),
        None if path.exists() => std::fs::remove_file(&path),
        None => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!("could not write {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::AuthUser;

    #[test]
    fn test_session_text_roundtrip() {
        let session = Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: "2030-01-01T00:00:00Z".parse().unwrap(),
            user: AuthUser {
                id: "7d0c3f7e-2f4e-4a8c-9d51-1f0f4a2e8b11".parse().unwrap(),
                email: Some("rep@example.com".to_string()),
                phone: None,
            },
        };
        let text = encode(&session).unwrap();
        assert_eq!(decode(&text), Some(session));
    }

    #[test]
    fn test_garbage_is_ignored() {
        assert_eq!(decode("{not json"), None);
        assert_eq!(decode_config("url = "), None);
    }

    #[test]
    fn test_config_file_text() {
        let config = decode_config(
            r#"
            url = "https://demo.supabase.co"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.rest_url(), "https://demo.supabase.co/rest/v1/leads");
    }
}
