use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{trim_owned, EntityRef};

pub const DEFAULT_CHECKLIST_COLOR: &str = "#80D8FF";

/// A named list of tasks owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: Uuid,
    /// Owner; set at creation and never changed.
    pub user_id: Uuid,
    pub title: String,
    pub color: String,
    /// Sort key among the owner's checklists. Not necessarily contiguous.
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// A checklist as returned by the API, annotated with its number of tasks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistWithCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub checklist: Checklist,
    pub task_count: i64,
}

impl ChecklistWithCount {
    pub fn new(checklist: Checklist, task_count: i64) -> Self {
        Self {
            checklist,
            task_count,
        }
    }
}

/// Payload for creating a checklist.
#[derive(Debug, Deserialize, Validate)]
pub struct ChecklistInput {
    /// Must be non-empty once trimmed.
    #[validate(length(min = 1, message = "Checklist title is required"))]
    #[serde(default)]
    pub title: String,
    #[validate(regex(
        path = "crate::models::HEX_COLOR_REGEX",
        message = "Color must be a hex code such as #80D8FF"
    ))]
    pub color: Option<String>,
}

impl ChecklistInput {
    pub fn normalized(self) -> Self {
        Self {
            title: trim_owned(self.title),
            color: self.color.map(trim_owned),
        }
    }
}

/// Payload for `PATCH /api/checklists/{id}`. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ChecklistUpdate {
    #[validate(length(min = 1, message = "Checklist title cannot be empty"))]
    pub title: Option<String>,
    #[validate(regex(
        path = "crate::models::HEX_COLOR_REGEX",
        message = "Color must be a hex code such as #80D8FF"
    ))]
    pub color: Option<String>,
}

impl ChecklistUpdate {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(trim_owned),
            color: self.color.map(trim_owned),
        }
    }
}

/// Payload for `PATCH /api/checklists/reorder`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderChecklistsRequest {
    pub ordered_checklists: Vec<EntityRef>,
}

impl ReorderChecklistsRequest {
    pub fn ids(&self) -> Vec<Uuid> {
        self.ordered_checklists.iter().map(|entry| entry.id).collect()
    }
}
