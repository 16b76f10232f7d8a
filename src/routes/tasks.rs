use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CompleteRequest, PinRequest, ReorderTasksRequest, TaskInput, TaskUpdate},
    store::Store,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

fn checklist_not_found() -> AppError {
    AppError::NotFound("Checklist not found".into())
}

/// Creates a new task in one of the authenticated user's checklists.
///
/// The task is appended after the checklist's existing tasks.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters once trimmed.
/// - `checklistId`: the checklist the task belongs to.
/// - `color` (optional): hex color, defaults to `#FFFFFF`.
/// - `pinned` (optional): defaults to `false`.
/// - `dueDate` (optional): must be in the future.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: input failed validation.
/// - `404 Not Found`: the checklist does not exist or belongs to someone else.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task_data = task_data.into_inner().normalized();
    task_data.validate()?;

    let task = store
        .create_task(user.user_id(), task_data.into())
        .await?
        .ok_or_else(checklist_not_found)?;

    log::info!(
        "Created task {} in checklist {} at order {}",
        task.id,
        task.checklist_id,
        task.order
    );
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves the tasks of one checklist, pinned first, then by order, then newest first.
#[get("/checklist/{checklist_id}")]
pub async fn get_checklist_tasks(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    checklist_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let tasks = store
        .list_tasks(user.user_id(), checklist_id.into_inner())
        .await?
        .ok_or_else(checklist_not_found)?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves every pinned task of the user across all checklists, newest first.
/// Each entry carries the `checklistTitle` of its checklist.
#[get("/pinned")]
pub async fn get_pinned_tasks(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = store.list_pinned_tasks(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves one of the authenticated user's tasks by its ID.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task for this user.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = store
        .get_task(user.user_id(), task_id.into_inner())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Sets the `completed` flag. The body must be `{"completed": <bool>}`; any other
/// type is rejected before the task is touched.
#[patch("/{id}/complete")]
pub async fn set_task_completed(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    body: web::Json<CompleteRequest>,
) -> Result<impl Responder, AppError> {
    let task = store
        .update_task(
            user.user_id(),
            task_id.into_inner(),
            TaskUpdate::completed(body.completed),
        )
        .await?
        .ok_or_else(task_not_found)?;

    log::debug!("Task {} completed = {}", task.id, task.completed);
    Ok(HttpResponse::Ok().json(task))
}

/// Sets the `pinned` flag. The body must be `{"pinned": <bool>}`.
#[patch("/{id}/pin")]
pub async fn set_task_pinned(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    body: web::Json<PinRequest>,
) -> Result<impl Responder, AppError> {
    let task = store
        .update_task(
            user.user_id(),
            task_id.into_inner(),
            TaskUpdate::pinned(body.pinned),
        )
        .await?
        .ok_or_else(task_not_found)?;

    log::debug!("Task {} pinned = {}", task.id, task.pinned);
    Ok(HttpResponse::Ok().json(task))
}

/// Updates an existing task.
///
/// Only `title`, `color`, `dueDate`, `pinned` and `completed` are taken from the
/// body; at least one of them must be present. The task cannot be moved to
/// another checklist this way.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: no updatable field present, or a field failed validation.
/// - `404 Not Found`: no such task for this user.
#[patch("/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let update = task_data.into_inner().normalized();
    if update.is_empty() {
        return Err(AppError::ValidationError(
            "No valid fields provided for update".into(),
        ));
    }
    update.validate()?;

    let task = store
        .update_task(user.user_id(), task_id.into_inner(), update)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Rewrites the order of the tasks of one checklist.
///
/// Body: `{"checklistId": ..., "orderedTasks": [{"id": ...}, ...]}`. Tasks that are
/// not in that checklist are skipped.
#[patch("/reorder")]
pub async fn reorder_tasks(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    payload: web::Json<ReorderTasksRequest>,
) -> Result<impl Responder, AppError> {
    let ids = payload.ids();
    let updated = store
        .reorder_tasks(user.user_id(), payload.checklist_id, &ids)
        .await?
        .ok_or_else(checklist_not_found)?;

    log::debug!(
        "Reordered {} of {} tasks in checklist {}",
        updated,
        ids.len(),
        payload.checklist_id
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": "Tasks reordered successfully",
        "updated": updated
    })))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{"message", "deletedTaskId"}`.
/// - `404 Not Found`: no such task for this user.
#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();
    if !store.delete_task(user.user_id(), task_id).await? {
        return Err(task_not_found());
    }

    log::info!("Deleted task {}", task_id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deleted successfully",
        "deletedTaskId": task_id
    })))
}
