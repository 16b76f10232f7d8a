pub mod checklist;
pub mod task;
pub mod user;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use checklist::{
    Checklist, ChecklistInput, ChecklistUpdate, ChecklistWithCount, ReorderChecklistsRequest,
    DEFAULT_CHECKLIST_COLOR,
};
pub use task::{
    CompleteRequest, PinRequest, PinnedTask, ReorderTasksRequest, Task, TaskInput, TaskUpdate,
    DEFAULT_TASK_COLOR,
};
pub use user::{NewUser, User};

lazy_static! {
    // `#RGB` or `#RRGGBB`
    pub(crate) static ref HEX_COLOR_REGEX: regex::Regex =
        regex::Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").unwrap();
}

/// One entry of a reorder request. Older clients send `_id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityRef {
    #[serde(alias = "_id")]
    pub id: Uuid,
}

pub(crate) fn trim_owned(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
