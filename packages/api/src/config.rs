//! # Hosted backend configuration
//!
//! [`BackendConfig`] names the hosted project every client in this crate talks
//! to: its base URL, the public anon key sent as `apikey` on every request, the
//! leads table, and the two edge functions that answer admin questions.
//!
//! ## Sources
//!
//! | Constructor | Reads |
//! |-------------|-------|
//! | [`from_env`](BackendConfig::from_env) | `.env` (via `dotenvy`), then `SUPABASE_URL`, `SUPABASE_ANON_KEY` and optional `LEADS_TABLE` from the process environment, falling back to the values baked in at compile time (WASM builds have no runtime environment). |
//! | [`from_toml`](BackendConfig::from_toml) | A TOML document; see below. Native builds read one from `<data_dir>/lead-tracker/config.toml` when the environment has no settings. |
//!
//! ```toml
//! url = "https://project.supabase.co"
//! anon_key = "public-anon-key"
//! leads_table = "leads"        # optional
//!
//! [functions]                  # optional
//! check_admin = "check-admin"
//! set_admin = "set-admin"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, without trailing slash.
    pub url: String,
    /// Public anon key, sent as the `apikey` header.
    pub anon_key: String,
    #[serde(default = "default_leads_table")]
    pub leads_table: String,
    #[serde(default)]
    pub functions: FunctionsConfig,
}

/// Names of the admin edge functions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionsConfig {
    #[serde(default = "default_check_admin")]
    pub check_admin: String,
    #[serde(default = "default_set_admin")]
    pub set_admin: String,
}

fn default_leads_table() -> String {
    "leads".to_string()
}

fn default_check_admin() -> String {
    "check-admin".to_string()
}

fn default_set_admin() -> String {
    "set-admin".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            check_admin: default_check_admin(),
            set_admin: default_set_admin(),
        }
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            leads_table: default_leads_table(),
            functions: FunctionsConfig::default(),
        }
    }

    /// Load from the environment (see module docs).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let url = env_or_baked("SUPABASE_URL", option_env!("SUPABASE_URL"))
            .ok_or_else(|| Error::Config("SUPABASE_URL not set".to_string()))?;
        let anon_key = env_or_baked("SUPABASE_ANON_KEY", option_env!("SUPABASE_ANON_KEY"))
            .ok_or_else(|| Error::Config("SUPABASE_ANON_KEY not set".to_string()))?;

        let mut config = Self::new(url, anon_key);
        if let Some(table) = env_or_baked("LEADS_TABLE", option_env!("LEADS_TABLE")) {
            config.leads_table = table;
        }
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.url = config.url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// `<url>/auth/v1/<path>`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// `<url>/rest/v1/<leads_table>`
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.leads_table)
    }

    /// `<url>/functions/v1/<name>`
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.url, name)
    }
}

fn env_or_baked(key: &str, baked: Option<&'static str>) -> Option<String> {
    std::env::var(key)
        .ok()
        .or_else(|| baked.map(str::to_string))
        .filter(|v| !v.trim().is_empty())
}
