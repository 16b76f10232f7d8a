use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{NewChecklist, NewTask, Store, StoreResult};
use crate::error::AppError;
use crate::models::{
    Checklist, ChecklistUpdate, ChecklistWithCount, NewUser, PinnedTask, Task, TaskUpdate, User,
};
use crate::ordering;

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    checklists: HashMap<Uuid, Checklist>,
    tasks: HashMap<Uuid, Task>,
}

impl Collections {
    fn owned_checklist(&self, user_id: Uuid, checklist_id: Uuid) -> Option<&Checklist> {
        self.checklists
            .get(&checklist_id)
            .filter(|c| c.user_id == user_id)
    }

    fn task_count(&self, checklist_id: Uuid) -> i64 {
        self.tasks
            .values()
            .filter(|t| t.checklist_id == checklist_id)
            .count() as i64
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| AppError::InternalServerError("In-memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut db = self.lock()?;
        if db.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        db.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = self.lock()?;
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_checklist(&self, user_id: Uuid, new: NewChecklist) -> StoreResult<Checklist> {
        let mut db = self.lock()?;
        let current_max = db
            .checklists
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.order)
            .max();

        let checklist = Checklist {
            id: Uuid::new_v4(),
            user_id,
            title: new.title,
            color: new.color,
            order: ordering::next_order(current_max),
            created_at: Utc::now(),
        };
        db.checklists.insert(checklist.id, checklist.clone());
        Ok(checklist)
    }

    async fn list_checklists(&self, user_id: Uuid) -> StoreResult<Vec<ChecklistWithCount>> {
        let db = self.lock()?;
        let mut checklists: Vec<&Checklist> = db
            .checklists
            .values()
            .filter(|c| c.user_id == user_id)
            .collect();
        checklists.sort_by(|a, b| ordering::compare_checklists(a, b));

        Ok(checklists
            .into_iter()
            .map(|c| ChecklistWithCount::new(c.clone(), db.task_count(c.id)))
            .collect())
    }

    async fn update_checklist(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        update: ChecklistUpdate,
    ) -> StoreResult<Option<ChecklistWithCount>> {
        let mut db = self.lock()?;
        let checklist = match db.checklists.get_mut(&checklist_id) {
            Some(c) if c.user_id == user_id => c,
            _ => return Ok(None),
        };

        if let Some(title) = update.title {
            checklist.title = title;
        }
        if let Some(color) = update.color {
            checklist.color = color;
        }
        let checklist = checklist.clone();
        let count = db.task_count(checklist_id);
        Ok(Some(ChecklistWithCount::new(checklist, count)))
    }

    async fn reorder_checklists(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let mut db = self.lock()?;
        let mut updated = 0;
        for (id, position) in ordering::positions(ids) {
            if let Some(checklist) = db.checklists.get_mut(&id) {
                if checklist.user_id == user_id {
                    checklist.order = position;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete_checklist(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<u64>> {
        let mut db = self.lock()?;
        if db.owned_checklist(user_id, checklist_id).is_none() {
            return Ok(None);
        }

        let before = db.tasks.len();
        db.tasks
            .retain(|_, t| !(t.checklist_id == checklist_id && t.user_id == user_id));
        let deleted = (before - db.tasks.len()) as u64;
        db.checklists.remove(&checklist_id);
        Ok(Some(deleted))
    }

    async fn create_task(&self, user_id: Uuid, new: NewTask) -> StoreResult<Option<Task>> {
        let mut db = self.lock()?;
        if db.owned_checklist(user_id, new.checklist_id).is_none() {
            return Ok(None);
        }

        let current_max = db
            .tasks
            .values()
            .filter(|t| t.checklist_id == new.checklist_id)
            .map(|t| t.order)
            .max();

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            checklist_id: new.checklist_id,
            title: new.title,
            color: new.color,
            pinned: new.pinned,
            completed: false,
            order: ordering::next_order(current_max),
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };
        db.tasks.insert(task.id, task.clone());
        Ok(Some(task))
    }

    async fn list_tasks(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<Vec<Task>>> {
        let db = self.lock()?;
        if db.owned_checklist(user_id, checklist_id).is_none() {
            return Ok(None);
        }

        let mut tasks: Vec<Task> = db
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.checklist_id == checklist_id)
            .cloned()
            .collect();
        tasks.sort_by(ordering::compare_tasks);
        Ok(Some(tasks))
    }

    async fn list_pinned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<PinnedTask>> {
        let db = self.lock()?;
        let mut tasks: Vec<&Task> = db
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.pinned)
            .collect();
        tasks.sort_by(|a, b| ordering::compare_pinned(a, b));

        Ok(tasks
            .into_iter()
            .filter_map(|t| {
                db.checklists.get(&t.checklist_id).map(|c| PinnedTask {
                    task: t.clone(),
                    checklist_title: c.title.clone(),
                })
            })
            .collect())
    }

    async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let db = self.lock()?;
        Ok(db
            .tasks
            .get(&task_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> StoreResult<Option<Task>> {
        let mut db = self.lock()?;
        match db.tasks.get_mut(&task_id) {
            Some(task) if task.user_id == user_id => {
                update.apply_to(task);
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reorder_tasks(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        ids: &[Uuid],
    ) -> StoreResult<Option<u64>> {
        let mut db = self.lock()?;
        if db.owned_checklist(user_id, checklist_id).is_none() {
            return Ok(None);
        }

        let mut updated = 0;
        for (id, position) in ordering::positions(ids) {
            if let Some(task) = db.tasks.get_mut(&id) {
                if task.user_id == user_id && task.checklist_id == checklist_id {
                    task.order = position;
                    updated += 1;
                }
            }
        }
        Ok(Some(updated))
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let mut db = self.lock()?;
        match db.tasks.get(&task_id) {
            Some(task) if task.user_id == user_id => {
                db.tasks.remove(&task_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
