//! Todo records and the request payloads that create or patch them.
//!
//! # Design
//! `CreateTodo` and `TodoPatch` are wire shapes: they accept whatever the
//! client sent and leave judgement to the store. The store turns them into
//! `NewTodo` / `TodoChanges`, which are already trimmed and validated, so the
//! backends never see unchecked input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A persisted todo. `id`, `created_at` and `updated_at` are assigned by the
/// store and never taken from a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/todos`.
///
/// `title` is optional here so that a missing title surfaces as a validation
/// error rather than a deserialization failure.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of `PUT /api/todos/{id}`. Only the fields present in the JSON are
/// applied.
///
/// `description` distinguishes an absent key (`None`) from an explicit
/// `null` (`Some(None)`), which clears the description. An explicit
/// `"title": null` is read as an empty title and rejected by validation,
/// and `"completed": null` as `false`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TodoPatch {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// A validated create request: trimmed, non-empty title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
}

/// A validated, non-empty set of field replacements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Apply the changes to an in-memory record. Timestamps are left to the
    /// caller.
    pub fn apply_to(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| Some(value.unwrap_or_default()))
}

fn null_as_false<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|value| Some(value.unwrap_or(false)))
}
