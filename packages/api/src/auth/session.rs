//! Session data types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use store::{Caller, UserId};

/// A session is treated as expired this long before its actual expiry.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// The authenticated user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone: Option<String>,
}

impl AuthUser {
    /// Email, phone, or the id, whichever is known first.
    pub fn display_name(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// An active session with the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user.id,
            access_token: self.access_token.clone(),
        }
    }
}

/// Login discriminant: exactly one of email or phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Email(String),
    Phone(String),
}

impl Credential {
    pub fn email(&self) -> Option<&str> {
        match self {
            Credential::Email(e) => Some(e),
            Credential::Phone(_) => None,
        }
    }

    pub fn phone(&self) -> Option<&str> {
        match self {
            Credential::Phone(p) => Some(p),
            Credential::Email(_) => None,
        }
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Email(e) => write!(f, "email {e}"),
            Credential::Phone(p) => write!(f, "phone {p}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Session change pushed by the auth provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
