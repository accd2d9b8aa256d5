//! Row filters and ordering for the remote lead table.
//!
//! A [`Filter`] is a conjunction of equality and set-membership conditions.
//! It is evaluated locally by [`crate::MemoryTable`] and rendered into
//! PostgREST query parameters (`user_id=eq.<uuid>`, `id=in.(a,b)`) by the
//! hosted REST client.

use crate::models::{Lead, LeadId, UserId};

/// Columns that can be filtered or ordered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    UserId,
    CreatedAt,
    Status,
    Priority,
    IsActive,
    TargetType,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::UserId => "user_id",
            Column::CreatedAt => "created_at",
            Column::Status => "status",
            Column::Priority => "priority",
            Column::IsActive => "is_active",
            Column::TargetType => "target_type",
        }
    }

    /// The column's value on `lead`, in the same textual form filters use.
    pub fn value_of(&self, lead: &Lead) -> String {
        match self {
            Column::Id => lead.id.to_string(),
            Column::UserId => lead.user_id.to_string(),
            Column::CreatedAt => lead.created_at.to_rfc3339(),
            Column::Status => lead.status.as_str().to_string(),
            Column::Priority => lead.priority.as_str().to_string(),
            Column::IsActive => lead.is_active.to_string(),
            Column::TargetType => lead.target_type.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Eq(Column, String),
    In(Column, Vec<String>),
}

impl Condition {
    pub fn matches(&self, lead: &Lead) -> bool {
        match self {
            Condition::Eq(column, value) => column.value_of(lead) == *value,
            Condition::In(column, values) => {
                let actual = column.value_of(lead);
                values.iter().any(|v| *v == actual)
            }
        }
    }

    fn to_query_pair(&self) -> (String, String) {
        match self {
            Condition::Eq(column, value) => (column.as_str().to_string(), format!("eq.{value}")),
            Condition::In(column, values) => (
                column.as_str().to_string(),
                format!("in.({})", values.join(",")),
            ),
        }
    }
}

/// Conjunction of conditions. An empty filter matches every row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows owned by `user_id`.
    pub fn owned_by(user_id: UserId) -> Self {
        Self::new().eq(Column::UserId, user_id)
    }

    pub fn eq(mut self, column: Column, value: impl ToString) -> Self {
        self.conditions
            .push(Condition::Eq(column, value.to_string()));
        self
    }

    pub fn is_in<I, V>(mut self, column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.conditions.push(Condition::In(
            column,
            values.into_iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    pub fn with_id(self, id: LeadId) -> Self {
        self.eq(Column::Id, id)
    }

    pub fn with_ids(self, ids: &[LeadId]) -> Self {
        self.is_in(Column::Id, ids)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        self.conditions.iter().all(|c| c.matches(lead))
    }

    /// Render as PostgREST query parameters.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.conditions.iter().map(Condition::to_query_pair).collect()
    }
}

/// Result ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub column: Column,
    pub ascending: bool,
}

impl Order {
    pub fn newest_first() -> Self {
        Self {
            column: Column::CreatedAt,
            ascending: false,
        }
    }

    pub fn to_query_pair(&self) -> (String, String) {
        let dir = if self.ascending { "asc" } else { "desc" };
        ("order".to_string(), format!("{}.{}", self.column.as_str(), dir))
    }
}
