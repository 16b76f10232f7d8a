mod common;

use actix_web::http::{Method, StatusCode};
use common::{create_checklist, create_task, register, send, spawn_app};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("array body")
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_rt::test]
async fn test_checklist_lifecycle() {
    let app = spawn_app().await;
    let (token, user_id) = register(&app, "a@x.com").await;

    let groceries = create_checklist(&app, &token, "Groceries").await;
    assert_eq!(groceries["title"], "Groceries");
    assert_eq!(groceries["color"], "#80D8FF");
    assert_eq!(groceries["order"], 0);
    assert_eq!(groceries["taskCount"], 0);
    assert_eq!(groceries["userId"], user_id.as_str());
    let groceries_id = groceries["id"].as_str().unwrap().to_string();

    create_task(&app, &token, &groceries_id, "Milk").await;

    let (status, list) = send(&app, Method::GET, "/api/checklists", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["taskCount"], 1);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/checklists/{}", groceries_id),
        &token,
        Some(json!({ "title": "  Food  ", "color": "#abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["title"], "Food");
    assert_eq!(updated["color"], "#abc");
    assert_eq!(updated["taskCount"], 1);

    let (status, unchanged) = send(
        &app,
        Method::PATCH,
        &format!("/api/checklists/{}", groceries_id),
        &token,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "an empty update is accepted");
    assert_eq!(unchanged, updated);

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/checklists/{}", groceries_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedTasksCount"], 1);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/tasks/checklist/{}", groceries_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/checklists/{}", groceries_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "deleting twice");
}

#[actix_rt::test]
async fn test_checklist_validation() {
    let app = spawn_app().await;
    let (token, _) = register(&app, "a@x.com").await;
    let work = create_checklist(&app, &token, "Work").await;
    let work_uri = format!("/api/checklists/{}", work["id"].as_str().unwrap());

    let test_cases = vec![
        (Method::POST, "/api/checklists".to_string(), json!({}), "missing title"),
        (Method::POST, "/api/checklists".to_string(), json!({ "title": "   " }), "blank title"),
        (
            Method::POST,
            "/api/checklists".to_string(),
            json!({ "title": "Home", "color": "red" }),
            "named color",
        ),
        (Method::PATCH, work_uri.clone(), json!({ "title": "" }), "empty title on update"),
        (Method::PATCH, work_uri.clone(), json!({ "color": "#12345" }), "five digit color"),
        (
            Method::PATCH,
            "/api/checklists/not-a-uuid".to_string(),
            json!({ "title": "x" }),
            "malformed id",
        ),
    ];

    for (method, uri, payload, description) in test_cases {
        let (status, body) = send(&app, method, &uri, &token, Some(payload)).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {}",
            description,
            body
        );
    }

    let (_, list) = send(&app, Method::GET, "/api/checklists", &token, None).await;
    assert_eq!(list[0]["title"], "Work", "failed updates must not change the checklist");
}

#[actix_rt::test]
async fn test_checklists_are_ordered_and_reorderable() {
    let app = spawn_app().await;
    let (token, _) = register(&app, "a@x.com").await;

    let mut created = Vec::new();
    for title in ["A", "B", "C"] {
        let checklist = create_checklist(&app, &token, title).await;
        created.push(checklist["id"].as_str().unwrap().to_string());
    }

    let (_, list) = send(&app, Method::GET, "/api/checklists", &token, None).await;
    assert_eq!(ids(&list), created);

    let reversed: Vec<Value> = created.iter().rev().map(|id| json!({ "_id": id })).collect();
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/checklists/reorder",
        &token,
        Some(json!({ "orderedChecklists": reversed })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["updated"], 3);

    let (_, list) = send(&app, Method::GET, "/api/checklists", &token, None).await;
    let expected: Vec<String> = created.iter().rev().cloned().collect();
    assert_eq!(ids(&list), expected);
    for (position, checklist) in list.as_array().unwrap().iter().enumerate() {
        assert_eq!(checklist["order"], position);
    }

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/checklists/reorder",
        &token,
        Some(json!({ "orderedChecklists": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_checklists_are_private() {
    let app = spawn_app().await;
    let (owner, _) = register(&app, "owner@x.com").await;
    let (intruder, _) = register(&app, "intruder@x.com").await;

    let private = create_checklist(&app, &owner, "Private").await;
    let id = private["id"].as_str().unwrap().to_string();
    let uri = format!("/api/checklists/{}", id);

    let (_, list) = send(&app, Method::GET, "/api/checklists", &intruder, None).await;
    assert_eq!(list, json!([]));

    let (status, _) = send(&app, Method::PATCH, &uri, &intruder, Some(json!({ "title": "Mine" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, &intruder, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Foreign ids in a reorder are skipped.
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/checklists/reorder",
        &intruder,
        Some(json!({ "orderedChecklists": [{ "id": id }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 0);

    let (_, list) = send(&app, Method::GET, "/api/checklists", &owner, None).await;
    assert_eq!(list[0]["title"], "Private");
}
