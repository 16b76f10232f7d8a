use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewChecklist, NewTask, Store, StoreResult};
use crate::models::{
    Checklist, ChecklistUpdate, ChecklistWithCount, NewUser, PinnedTask, Task, TaskUpdate, User,
};
use crate::ordering;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";
const CHECKLIST_COLUMNS: &str = "id, user_id, title, color, sort_order, created_at";
const TASK_COLUMNS: &str = "id, user_id, checklist_id, title, color, pinned, completed, \
                            sort_order, due_date, created_at, updated_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn owns_checklist(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<bool> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM checklists WHERE id = $1 AND user_id = $2",
        )
        .bind(checklist_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn task_count(&self, checklist_id: Uuid) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE checklist_id = $1")
                .bind(checklist_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    fn split_positions(ids: &[Uuid]) -> (Vec<Uuid>, Vec<i32>) {
        ordering::positions(ids).into_iter().unzip()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_checklist(&self, user_id: Uuid, new: NewChecklist) -> StoreResult<Checklist> {
        let current_max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(sort_order) FROM checklists WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let checklist = sqlx::query_as::<_, Checklist>(&format!(
            "INSERT INTO checklists (id, user_id, title, color, sort_order) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CHECKLIST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.title)
        .bind(&new.color)
        .bind(ordering::next_order(current_max))
        .fetch_one(&self.pool)
        .await?;
        Ok(checklist)
    }

    async fn list_checklists(&self, user_id: Uuid) -> StoreResult<Vec<ChecklistWithCount>> {
        let checklists = sqlx::query_as::<_, ChecklistWithCount>(
            "SELECT c.id, c.user_id, c.title, c.color, c.sort_order, c.created_at, \
                    COUNT(t.id) AS task_count \
             FROM checklists c \
             LEFT JOIN tasks t ON t.checklist_id = c.id \
             WHERE c.user_id = $1 \
             GROUP BY c.id \
             ORDER BY c.sort_order ASC, c.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(checklists)
    }

    async fn update_checklist(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        update: ChecklistUpdate,
    ) -> StoreResult<Option<ChecklistWithCount>> {
        let checklist = sqlx::query_as::<_, Checklist>(&format!(
            "UPDATE checklists \
             SET title = COALESCE($3, title), color = COALESCE($4, color) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {CHECKLIST_COLUMNS}"
        ))
        .bind(checklist_id)
        .bind(user_id)
        .bind(update.title)
        .bind(update.color)
        .fetch_optional(&self.pool)
        .await?;

        match checklist {
            Some(checklist) => {
                let count = self.task_count(checklist.id).await?;
                Ok(Some(ChecklistWithCount::new(checklist, count)))
            }
            None => Ok(None),
        }
    }

    async fn reorder_checklists(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let (ids, positions) = Self::split_positions(ids);
        let result = sqlx::query(
            "UPDATE checklists AS c SET sort_order = v.position \
             FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position) \
             WHERE c.id = v.id AND c.user_id = $3",
        )
        .bind(ids)
        .bind(positions)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_checklist(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM checklists WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(checklist_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if found.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let tasks = sqlx::query("DELETE FROM tasks WHERE checklist_id = $1 AND user_id = $2")
            .bind(checklist_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM checklists WHERE id = $1 AND user_id = $2")
            .bind(checklist_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(tasks.rows_affected()))
    }

    async fn create_task(&self, user_id: Uuid, new: NewTask) -> StoreResult<Option<Task>> {
        if !self.owns_checklist(user_id, new.checklist_id).await? {
            return Ok(None);
        }

        let current_max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(sort_order) FROM tasks WHERE checklist_id = $1",
        )
        .bind(new.checklist_id)
        .fetch_one(&self.pool)
        .await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, user_id, checklist_id, title, color, pinned, sort_order, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {TASK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.checklist_id)
        .bind(&new.title)
        .bind(&new.color)
        .bind(new.pinned)
        .bind(ordering::next_order(current_max))
        .bind(new.due_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(Some(task))
    }

    async fn list_tasks(&self, user_id: Uuid, checklist_id: Uuid) -> StoreResult<Option<Vec<Task>>> {
        if !self.owns_checklist(user_id, checklist_id).await? {
            return Ok(None);
        }

        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE user_id = $1 AND checklist_id = $2 \
             ORDER BY pinned DESC, sort_order ASC, created_at DESC"
        ))
        .bind(user_id)
        .bind(checklist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(tasks))
    }

    async fn list_pinned_tasks(&self, user_id: Uuid) -> StoreResult<Vec<PinnedTask>> {
        let tasks = sqlx::query_as::<_, PinnedTask>(
            "SELECT t.id, t.user_id, t.checklist_id, t.title, t.color, t.pinned, t.completed, \
                    t.sort_order, t.due_date, t.created_at, t.updated_at, \
                    c.title AS checklist_title \
             FROM tasks t \
             JOIN checklists c ON c.id = t.checklist_id \
             WHERE t.user_id = $1 AND t.pinned \
             ORDER BY t.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn get_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET \
                title = COALESCE($3, title), \
                color = COALESCE($4, color), \
                due_date = CASE WHEN $5 THEN $6 ELSE due_date END, \
                pinned = COALESCE($7, pinned), \
                completed = COALESCE($8, completed), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(update.title)
        .bind(update.color)
        .bind(update.due_date.is_some())
        .bind(update.due_date.flatten())
        .bind(update.pinned)
        .bind(update.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn reorder_tasks(
        &self,
        user_id: Uuid,
        checklist_id: Uuid,
        ids: &[Uuid],
    ) -> StoreResult<Option<u64>> {
        if !self.owns_checklist(user_id, checklist_id).await? {
            return Ok(None);
        }

        let (ids, positions) = Self::split_positions(ids);
        let result = sqlx::query(
            "UPDATE tasks AS t SET sort_order = v.position, updated_at = NOW() \
             FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position) \
             WHERE t.id = v.id AND t.user_id = $3 AND t.checklist_id = $4",
        )
        .bind(ids)
        .bind(positions)
        .bind(user_id)
        .bind(checklist_id)
        .execute(&self.pool)
        .await?;
        Ok(Some(result.rows_affected()))
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
