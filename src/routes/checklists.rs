use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ChecklistInput, ChecklistUpdate, ChecklistWithCount, ReorderChecklistsRequest},
    store::Store,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Creates a checklist for the authenticated user, placed after their existing ones.
///
/// ## Request Body:
/// - `title`: required, non-empty once trimmed.
/// - `color` (optional): `#RGB` or `#RRGGBB`, defaults to `#80D8FF`.
///
/// ## Responses:
/// - `201 Created`: the checklist with `taskCount: 0`.
/// - `400 Bad Request`: missing title or malformed color.
#[post("")]
pub async fn create_checklist(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    payload: web::Json<ChecklistInput>,
) -> Result<impl Responder, AppError> {
    let input = payload.into_inner().normalized();
    input.validate()?;

    let checklist = store.create_checklist(user.user_id(), input.into()).await?;
    log::info!(
        "Created checklist {} for user {} at order {}",
        checklist.id,
        user.user_id(),
        checklist.order
    );
    Ok(HttpResponse::Created().json(ChecklistWithCount::new(checklist, 0)))
}

/// Lists the authenticated user's checklists in display order, each with its task count.
#[get("")]
pub async fn list_checklists(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let checklists = store.list_checklists(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(checklists))
}

/// Rewrites checklist orders to match the submitted list.
///
/// Body: `{"orderedChecklists": [{"id": ...}, ...]}`. Entry `i` gets order `i`;
/// ids the caller does not own are skipped without failing the request.
#[patch("/reorder")]
pub async fn reorder_checklists(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    payload: web::Json<ReorderChecklistsRequest>,
) -> Result<impl Responder, AppError> {
    let ids = payload.ids();
    let updated = store.reorder_checklists(user.user_id(), &ids).await?;
    log::debug!(
        "Reordered {} of {} checklists for user {}",
        updated,
        ids.len(),
        user.user_id()
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": "Checklists reordered successfully",
        "updated": updated
    })))
}

/// Updates the title and/or color of a checklist.
///
/// ## Responses:
/// - `200 OK`: the updated checklist with its task count.
/// - `400 Bad Request`: blank title or malformed color.
/// - `404 Not Found`: no such checklist for this user.
#[patch("/{id}")]
pub async fn update_checklist(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    checklist_id: web::Path<Uuid>,
    payload: web::Json<ChecklistUpdate>,
) -> Result<impl Responder, AppError> {
    let update = payload.into_inner().normalized();
    update.validate()?;

    let checklist_id = checklist_id.into_inner();
    match store
        .update_checklist(user.user_id(), checklist_id, update)
        .await?
    {
        Some(checklist) => Ok(HttpResponse::Ok().json(checklist)),
        None => Err(AppError::NotFound("Checklist not found".into())),
    }
}

/// Deletes a checklist together with all of its tasks.
///
/// ## Responses:
/// - `200 OK`: `{"message", "deletedTasksCount"}`.
/// - `404 Not Found`: no such checklist for this user.
#[delete("/{id}")]
pub async fn delete_checklist(
    store: web::Data<dyn Store>,
    user: AuthenticatedUser,
    checklist_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let checklist_id = checklist_id.into_inner();
    let deleted_tasks = store
        .delete_checklist(user.user_id(), checklist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Checklist not found".into()))?;

    log::info!(
        "Deleted checklist {} and {} tasks",
        checklist_id,
        deleted_tasks
    );
    Ok(HttpResponse::Ok().json(json!({
        "message": "Checklist and its tasks deleted successfully",
        "deletedTasksCount": deleted_tasks
    })))
}
