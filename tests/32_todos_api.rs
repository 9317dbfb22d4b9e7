mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_applies_defaults() -> Result<()> {
    let app = TestApp::from_tables(common::seeded_todos())?;

    let res = app.send_json(Method::POST, "/api/todos", json!({ "title": "Write tests" })).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    let payload = res.json()?;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["id"], 26);
    assert_eq!(payload["data"]["status"], "pending");
    assert_eq!(payload["data"]["priority"], "medium");

    let fetched = app.get("/api/todos/26").await?.json()?;
    assert_eq!(fetched["data"]["title"], "Write tests");
    Ok(())
}

#[tokio::test]
async fn invalid_body_lists_field_errors() -> Result<()> {
    let app = TestApp::from_yaml("todos: []")?;

    let res = app
        .send_json(
            Method::POST,
            "/api/todos",
            json!({ "title": "", "status": "someday", "due_date": "31/12/2024" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let payload = res.json()?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "VALIDATION_ERROR");
    let fields = payload["field_errors"].as_object().cloned().unwrap_or_default();
    assert!(fields.contains_key("title"), "field_errors: {:?}", fields);
    assert!(fields.contains_key("status"));
    assert!(fields.contains_key("due_date"));

    let res = app.send_json(Method::POST, "/api/todos", json!({ "title": { "text": "nested" } })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = TestApp::from_yaml("todos: []")?;

    let res = app
        .request(
            axum::http::Request::post("/api/todos")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{oops"))?,
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn form_post_from_htmx_returns_success_fragment() -> Result<()> {
    let app = TestApp::from_yaml("todos: []")?;

    let res = app
        .send_form(Method::POST, "/api/todos", "title=Buy+bread&status=in_progress&due_date=", true)
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.is_html());
    assert!(res.body.contains("Todo created"));

    let created = app.get("/api/todos/1").await?.json()?;
    assert_eq!(created["data"]["status"], "in_progress");
    assert!(created["data"].get("due_date").is_none());

    let res = app.send_form(Method::POST, "/api/todos", "description=no+title", true).await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("<code>title</code>"));
    Ok(())
}

#[tokio::test]
async fn update_changes_only_given_fields() -> Result<()> {
    let app = TestApp::from_tables(common::seeded_todos())?;

    let res = app.send_json(Method::PATCH, "/api/todos/1", json!({ "status": "completed" })).await?;
    assert_eq!(res.status, StatusCode::OK);
    let payload = res.json()?;
    assert_eq!(payload["data"]["status"], "completed");
    assert_eq!(payload["data"]["title"], "Buy milk");

    let res = app.send_json(Method::PUT, "/api/todos/999", json!({ "status": "completed" })).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.send_json(Method::PUT, "/api/todos/1", json!({ "priority": "urgent" })).await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn delete_of_missing_record_is_not_found_every_time() -> Result<()> {
    let app = TestApp::from_tables(common::seeded_todos())?;

    for _ in 0..2 {
        let res = app.delete("/api/todos/999").await?;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.json()?["code"], "NOT_FOUND");
    }

    let res = app.delete("/api/todos/1").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()?, json!({ "success": true }));

    let res = app.delete("/api/todos/1").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_validates_status_and_clamps_limit() -> Result<()> {
    let app = TestApp::from_tables(common::seeded_todos())?;

    let res = app.get("/api/todos?status=someday").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let payload = app.get("/api/todos?limit=500&page=abc").await?.json()?;
    let pagination = &payload["data"]["pagination"];
    assert_eq!(pagination["limit"], 100);
    assert_eq!(pagination["current_page"], 1);
    assert_eq!(payload["data"]["rows"].as_array().map(Vec::len), Some(25));
    // newest first
    assert_eq!(payload["data"]["rows"][0]["id"], 25);

    let counts = &payload["data"]["filter_counts"];
    assert_eq!(counts["pending"], 12);
    assert_eq!(counts["in_progress"], 5);
    assert_eq!(counts["completed"], 8);
    assert_eq!(counts["all"], 25);
    Ok(())
}

#[tokio::test]
async fn update_of_missing_record_is_not_found_before_validation() -> Result<()> {
    let app = TestApp::from_tables(common::seeded_todos())?;

    let res = app.send_json(Method::PATCH, "/api/todos/999", json!({ "status": "someday" })).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()?["code"], "NOT_FOUND");

    let res = app.send_json(Method::PATCH, "/api/todos/1", json!({ "status": "someday" })).await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
