//! # Domain models for leads
//!
//! Defines the rows stored in the hosted `leads` table and the shapes used to
//! insert and patch them. Every type is `Serialize + Deserialize` and uses the
//! exact wire strings of the hosted schema, so the same structs travel over the
//! REST API and live in the local mirror.
//!
//! ## Types
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Lead`] | A full row as returned by the server, including the server-assigned `id` and `created_at`. |
//! | [`LeadFields`] | The caller-editable fields of a lead, without the owner. This is what forms and CSV import produce. |
//! | [`NewLead`] | [`LeadFields`] stamped with the owning user id, ready to insert. |
//! | [`LeadPatch`] | A partial update. Only `Some` fields are sent; remark fields use `Option<Option<_>>` so they can be cleared. |
//! | [`Caller`] | The bearer identity handed to the remote table for row-level security. |
//! | [`LeadStats`] | Counters derived from a slice of leads (dashboard cards). |
//!
//! The closed sets [`LeadStatus`], [`Priority`] and [`TargetType`] parse only
//! their exact wire spelling; anything else is rejected by `FromStr`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned lead identifier.
pub type LeadId = Uuid;

/// Identifier of an authenticated user (the lead owner).
pub type UserId = Uuid;

/// Error returned when a closed-set value does not match any variant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Pipeline status of a lead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    Open,
    Close,
    Pending,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::Open, LeadStatus::Close, LeadStatus::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Open => "Open",
            LeadStatus::Close => "Close",
            LeadStatus::Pending => "Pending",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Follow-up priority of a lead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// Whether the lead is part of the sales target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "Target")]
    Target,
    #[serde(rename = "Non-Target")]
    NonTarget,
}

impl TargetType {
    pub const ALL: [TargetType; 2] = [TargetType::Target, TargetType::NonTarget];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Target => "Target",
            TargetType::NonTarget => "Non-Target",
        }
    }
}

impl FromStr for TargetType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "target type",
                value: s.to_string(),
            })
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(LeadStatus, Priority, TargetType);

/// A lead row as stored by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Free-text postal address.
    pub address: String,
    pub is_active: bool,
    pub status: LeadStatus,
    pub last_followup_remarks: Option<String>,
    pub next_steps: Option<String>,
    pub priority: Priority,
    pub target_type: TargetType,
    pub user_id: UserId,
}

/// Editable lead fields, without the owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub is_active: bool,
    pub status: LeadStatus,
    pub priority: Priority,
    /// `None` leaves the column to its server-side default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    pub last_followup_remarks: Option<String>,
    pub next_steps: Option<String>,
}

impl Default for LeadFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            is_active: true,
            status: LeadStatus::default(),
            priority: Priority::default(),
            target_type: None,
            last_followup_remarks: None,
            next_steps: None,
        }
    }
}

impl LeadFields {
    /// Stamp the fields with their owner.
    pub fn owned_by(self, user_id: UserId) -> NewLead {
        NewLead {
            fields: self,
            user_id,
        }
    }
}

impl From<&Lead> for LeadFields {
    fn from(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            address: lead.address.clone(),
            is_active: lead.is_active,
            status: lead.status,
            priority: lead.priority,
            target_type: Some(lead.target_type),
            last_followup_remarks: lead.last_followup_remarks.clone(),
            next_steps: lead.next_steps.clone(),
        }
    }
}

/// Insert payload: fields plus the owning user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(flatten)]
    pub fields: LeadFields,
    pub user_id: UserId,
}

/// Partial update of a lead. `None` means "leave unchanged".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    /// `Some(None)` clears the remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_followup_remarks: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Option<String>>,
}

impl LeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn remarks(mut self, remarks: Option<String>) -> Self {
        self.last_followup_remarks = Some(remarks);
        self
    }

    pub fn next_steps(mut self, next_steps: Option<String>) -> Self {
        self.next_steps = Some(next_steps);
        self
    }

    /// A patch that replaces every editable field with `fields`.
    pub fn from_fields(fields: LeadFields) -> Self {
        Self {
            name: Some(fields.name),
            email: Some(fields.email),
            phone: Some(fields.phone),
            address: Some(fields.address),
            is_active: Some(fields.is_active),
            status: Some(fields.status),
            priority: Some(fields.priority),
            target_type: fields.target_type,
            last_followup_remarks: Some(fields.last_followup_remarks),
            next_steps: Some(fields.next_steps),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to a row in place.
    pub fn apply(&self, lead: &mut Lead) {
        if let Some(v) = &self.name {
            lead.name = v.clone();
        }
        if let Some(v) = &self.email {
            lead.email = v.clone();
        }
        if let Some(v) = &self.phone {
            lead.phone = v.clone();
        }
        if let Some(v) = &self.address {
            lead.address = v.clone();
        }
        if let Some(v) = self.is_active {
            lead.is_active = v;
        }
        if let Some(v) = self.status {
            lead.status = v;
        }
        if let Some(v) = self.priority {
            lead.priority = v;
        }
        if let Some(v) = self.target_type {
            lead.target_type = v;
        }
        if let Some(v) = &self.last_followup_remarks {
            lead.last_followup_remarks = v.clone();
        }
        if let Some(v) = &self.next_steps {
            lead.next_steps = v.clone();
        }
    }
}

/// The identity a remote call is made on behalf of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    /// Bearer token the remote store uses for row-level security.
    pub access_token: String,
}

/// Dashboard counters over a set of leads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeadStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub pending: usize,
    pub high_priority: usize,
}

impl LeadStats {
    pub fn from_leads(leads: &[Lead]) -> Self {
        leads.iter().fold(Self::default(), |mut stats, lead| {
            stats.total += 1;
            match lead.status {
                LeadStatus::Open => stats.open += 1,
                LeadStatus::Close => stats.closed += 1,
                LeadStatus::Pending => stats.pending += 1,
            }
            if lead.priority == Priority::High {
                stats.high_priority += 1;
            }
            stats
        })
    }
}
