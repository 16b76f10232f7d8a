//! Persistence for users, checklists and tasks.
//!
//! Every checklist and task operation is scoped by the owning user id: an entity
//! belonging to someone else behaves exactly like a missing one. Implementations
//! delegate order assignment to [`crate::ordering`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Checklist, ChecklistInput, ChecklistUpdate, ChecklistWithCount, NewUser, PinnedTask, Task,
    TaskInput, TaskUpdate, User, DEFAULT_CHECKLIST_COLOR, DEFAULT_TASK_COLOR,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, AppError>;

/// A validated checklist ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewChecklist {
    pub title: String,
    pub color: String,
}

impl From<ChecklistInput> for NewChecklist {
    fn from(input: ChecklistInput) -> Self {
        Self {
            title: input.title,
            color: input
                .color
                .unwrap_or_else(|| DEFAULT_CHECKLIST_COLOR.to_string()),
        }
    }
}

/// A validated task ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub checklist_id: Uuid,
    pub title: String,
    pub color: String,
    pub pinned: bool,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<TaskInput> for NewTask {
    fn from(input: TaskInput) -> Self {
        Self {
            checklist_id: input.checklist_id,
            title: input.title,
            color: input.color.unwrap_or_else(|| DEFAULT_TASK_COLOR.to_string()),
            pinned: input.pinned.unwrap_or(false),
            due_date: input.due_date,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Appends the checklist after the user's existing ones.
    async fn create_checklist(&self, user_id: Uuid, new: NewChecklist) -> StoreResult<Checklist>;

    /// The user's checklists in display order, each with its task count.
    async fn list_checklists(&self, user_id: Uuid) -> StoreResult<Vec<ChecklistWithCount>>;

    async fn update_checklist(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        update: ChecklistUpdate,
    ) -> StoreResult<Option<ChecklistWithCount>>;

    /// Sets each listed checklist's order to its position. Ids the user does not
    /// own are skipped. Returns the number of checklists updated.
    async fn reorder_checklists(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    /// Deletes the checklist and all of its tasks as one unit.
    /// Returns the number of tasks removed, or `None` if the checklist was not found.
    async fn delete_checklist(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<u64>>;

    /// Appends the task to its checklist. `None` if the checklist is not the user's.
    async fn create_task(&self, user_id: Uuid, new: NewTask) -> StoreResult<Option<Task>>;

    /// Tasks of one checklist, pinned first. `None` if the checklist is not the user's.
    async fn list_tasks(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<Vec<Task>>>;

    /// Pinned tasks across all of the user's checklists, newest first.
    async fn list_pinned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<PinnedTask>>;

    async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>>;

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> StoreResult<Option<Task>>;

    /// Same as [`Store::reorder_checklists`], restricted to tasks of `checklist_id`.
    /// `None` if the checklist is not the user's.
    async fn reorder_tasks(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        ids: &[Uuid],
    ) -> StoreResult<Option<u64>>;

    /// Returns whether a task was deleted.
    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool>;
}
