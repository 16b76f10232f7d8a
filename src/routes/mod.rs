pub mod auth;
pub mod checklists;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::error::{json_error_handler, path_error_handler};

/// Registers every route under the scope this is configured on (normally `/api`).
///
/// Literal segments such as `/reorder` and `/pinned` are registered before the
/// `/{id}` routes that would otherwise capture them.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login),
        )
        .service(
            web::scope("/checklists")
                .service(checklists::reorder_checklists)
                .service(checklists::list_checklists)
                .service(checklists::create_checklist)
                .service(checklists::update_checklist)
                .service(checklists::delete_checklist),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::reorder_tasks)
                .service(tasks::get_pinned_tasks)
                .service(tasks::get_checklist_tasks)
                .service(tasks::create_task)
                .service(tasks::set_task_completed)
                .service(tasks::set_task_pinned)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
