mod common;

use axum::http::StatusCode;
use common::{assignment_body, ids, TestApp};
use serde_json::json;
use study_service::config::AssignmentUpdatePolicy;

#[tokio::test]
async fn created_assignment_round_trips_by_id() {
    let app = TestApp::spawn();
    let body = assignment_body("Ownership", "medium");

    let id = app.create_assignment(&body).await;
    let response = app.get(&format!("/assignments/{}", id)).await;

    assert_eq!(response.status, StatusCode::OK);
    let mut expected = body.clone();
    expected["_id"] = json!(id);
    assert_eq!(response.body, expected);
}

#[tokio::test]
async fn pagination_skips_page_times_size() {
    let app = TestApp::spawn();
    let mut created = Vec::new();
    for i in 0..5 {
        created.push(
            app.create_assignment(&assignment_body(&format!("Task {}", i), "easy"))
                .await,
        );
    }

    let first = app.get("/assignments?page=0&size=2").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(ids(&first.body), created[0..2].to_vec());

    let last = app.get("/assignments?page=2&size=2").await;
    assert_eq!(ids(&last.body), created[4..].to_vec());
}

#[tokio::test]
async fn non_numeric_paging_returns_everything() {
    let app = TestApp::spawn();
    for i in 0..3 {
        app.create_assignment(&assignment_body(&format!("Task {}", i), "hard"))
            .await;
    }

    let response = app.get("/assignments?page=first&size=many").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn negative_paging_is_rejected() {
    let app = TestApp::spawn();

    let response = app.get("/assignments?page=-1&size=2").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn count_matches_unpaginated_list_for_level() {
    let app = TestApp::spawn();
    for (title, level) in [
        ("Borrowing", "easy"),
        ("Traits", "medium"),
        ("Async", "hard"),
        ("Macros", "hard"),
        ("Unsafe", "Hard"),
    ] {
        app.create_assignment(&assignment_body(title, level)).await;
    }

    let list = app.get("/assignments?level=hard").await;
    let count = app.get("/assignmentCount?level=hard").await;

    assert_eq!(count.status, StatusCode::OK);
    assert_eq!(count.body["count"], 3);
    assert_eq!(list.body.as_array().unwrap().len(), 3);

    let total = app.get("/assignmentCount").await;
    assert_eq!(total.body["count"], 5);
}

#[tokio::test]
async fn unknown_level_is_a_bad_request() {
    let app = TestApp::spawn();

    let response = app.get("/assignmentCount?level=legendary").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_missing_assignment_reports_zero() {
    let app = TestApp::spawn();

    let response = app.delete("/assignments/65a1f0c2e4b0a1b2c3d4e5f6").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "acknowledged": true, "deletedCount": 0 })
    );
}

#[tokio::test]
async fn deleted_assignment_is_gone() {
    let app = TestApp::spawn();
    let id = app.create_assignment(&assignment_body("Iterators", "easy")).await;

    let response = app.delete(&format!("/assignments/{}", id)).await;
    assert_eq!(response.body["deletedCount"], 1);

    let lookup = app.get(&format!("/assignments/{}", id)).await;
    assert_eq!(lookup.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_id_is_rejected_before_storage() {
    let app = TestApp::spawn();

    let get = app.get("/assignments/not-an-object-id").await;
    let delete = app.delete("/assignments/12345").await;

    assert_eq!(get.status, StatusCode::BAD_REQUEST);
    assert_eq!(get.body["error"], "Invalid identifier");
    assert_eq!(delete.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_body_is_not_stored() {
    let app = TestApp::spawn();
    let mut body = assignment_body("", "easy");
    body["marks"] = json!(-5);

    let response = app.json("POST", "/assignments", &body).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "Validation error");
    let count = app.get("/assignmentCount").await;
    assert_eq!(count.body["count"], 0);
}

#[tokio::test]
async fn update_replaces_editable_fields() {
    let app = TestApp::spawn();
    let id = app.create_assignment(&assignment_body("Generics", "easy")).await;
    let replacement = assignment_body("Generics II", "hard");

    let response = app
        .json("PUT", &format!("/assignments/{}", id), &replacement)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["matchedCount"], 1);
    assert_eq!(response.body["modifiedCount"], 1);
    assert_eq!(response.body["upsertedId"], serde_json::Value::Null);

    let stored = app.get(&format!("/assignments/{}", id)).await;
    assert_eq!(stored.body["title"], "Generics II");
    assert_eq!(stored.body["difficultyLevel"], "hard");
}

#[tokio::test]
async fn update_only_policy_returns_not_found_for_missing_id() {
    let app = TestApp::with_update_policy(AssignmentUpdatePolicy::UpdateOnly);

    let response = app
        .json(
            "PUT",
            "/assignments/65a1f0c2e4b0a1b2c3d4e5f6",
            &assignment_body("Ghost", "easy"),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let count = app.get("/assignmentCount").await;
    assert_eq!(count.body["count"], 0);
}

#[tokio::test]
async fn upsert_policy_creates_under_requested_id() {
    let app = TestApp::with_update_policy(AssignmentUpdatePolicy::Upsert);
    let id = "65a1f0c2e4b0a1b2c3d4e5f6";

    let response = app
        .json("PUT", &format!("/assignments/{}", id), &assignment_body("Fresh", "medium"))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["upsertedCount"], 1);
    assert_eq!(response.body["upsertedId"], id);

    let stored = app.get(&format!("/assignments/{}", id)).await;
    assert_eq!(stored.status, StatusCode::OK);
    assert_eq!(stored.body["title"], "Fresh");
}

#[tokio::test]
async fn difficulty_level_is_case_insensitive_in_bodies_and_filters() {
    let app = TestApp::spawn();
    let id = app.create_assignment(&assignment_body("Generics", "HARD")).await;

    let fetched = app.get(&format!("/assignments/{}", id)).await;
    let filtered = app.get("/assignments?level=Hard").await;

    assert_eq!(fetched.body["difficultyLevel"], "hard");
    assert_eq!(ids(&filtered.body), vec![id]);
}
