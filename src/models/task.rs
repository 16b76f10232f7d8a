use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{trim_owned, EntityRef};

pub const DEFAULT_TASK_COLOR: &str = "#FFFFFF";

/// A single actionable item. Belongs to one checklist of the same user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub checklist_id: Uuid,
    pub title: String,
    pub color: String,
    pub pinned: bool,
    pub completed: bool,
    /// Sort key among the tasks of the same checklist.
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A pinned task together with the title of the checklist it lives in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PinnedTask {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub task: Task,
    pub checklist_title: String,
}

fn due_date_in_future(due_date: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *due_date > Utc::now() {
        Ok(())
    } else {
        let mut err = ValidationError::new("due_date_in_past");
        err.message = Some("Due date must be in the future".into());
        Err(err)
    }
}

/// Payload for creating a task.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Trimmed, 1 to 200 characters.
    #[validate(length(min = 1, max = 200, message = "Task title must be 1 to 200 characters"))]
    #[serde(default)]
    pub title: String,
    pub checklist_id: Uuid,
    #[validate(regex(
        path = "crate::models::HEX_COLOR_REGEX",
        message = "Color must be a hex code such as #FFFFFF"
    ))]
    pub color: Option<String>,
    pub pinned: Option<bool>,
    #[validate(custom = "due_date_in_future")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskInput {
    pub fn normalized(self) -> Self {
        Self {
            title: trim_owned(self.title),
            color: self.color.map(trim_owned),
            ..self
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn due_date_update_in_future(update: &TaskUpdate) -> Result<(), ValidationError> {
    match update.due_date {
        Some(Some(due_date)) => due_date_in_future(&due_date),
        _ => Ok(()),
    }
}

/// Payload for `PATCH /api/tasks/{id}`.
///
/// Only these fields can be changed; anything else in the body is ignored.
/// `dueDate: null` clears the due date.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "due_date_update_in_future", skip_on_field_errors = false))]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200, message = "Task title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(regex(
        path = "crate::models::HEX_COLOR_REGEX",
        message = "Color must be a hex code such as #FFFFFF"
    ))]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub pinned: Option<bool>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(trim_owned),
            color: self.color.map(trim_owned),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.color.is_none()
            && self.due_date.is_none()
            && self.pinned.is_none()
            && self.completed.is_none()
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn pinned(pinned: bool) -> Self {
        Self {
            pinned: Some(pinned),
            ..Self::default()
        }
    }

    /// Applies the present fields to `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(color) = &self.color {
            task.color = color.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(pinned) = self.pinned {
            task.pinned = pinned;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Body of `PATCH /api/tasks/{id}/complete`. A non-boolean value fails to deserialize.
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub completed: bool,
}

/// Body of `PATCH /api/tasks/{id}/pin`.
#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pinned: bool,
}

/// Payload for `PATCH /api/tasks/reorder`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTasksRequest {
    pub checklist_id: Uuid,
    pub ordered_tasks: Vec<EntityRef>,
}

impl ReorderTasksRequest {
    pub fn ids(&self) -> Vec<Uuid> {
        self.ordered_tasks.iter().map(|entry| entry.id).collect()
    }
}
