mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_reports_ok_with_memory_store() -> Result<()> {
    let app = TestApp::from_yaml("todos: []")?;

    let res = app.get("/health").await?;
    assert_eq!(res.status, StatusCode::OK);
    let payload = res.json()?;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_registered_tables() -> Result<()> {
    let app = TestApp::from_yaml("{}")?;

    let payload = app.get("/").await?.json()?;
    let tables = payload["data"]["tables"].as_array().cloned().unwrap_or_default();
    assert!(tables.iter().any(|t| t == "todos"));
    assert!(tables.iter().any(|t| t == "votes_management"));
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_json_not_found() -> Result<()> {
    let app = TestApp::from_yaml("{}")?;

    let res = app.get("/nowhere").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let payload = res.json()?;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn tables_endpoint_describes_registry() -> Result<()> {
    let app = TestApp::from_yaml("{}")?;

    let payload = app.get("/api/tables").await?.json()?;
    let tables = payload["data"].as_array().cloned().unwrap_or_default();
    let users = tables
        .iter()
        .find(|t| t["table_name"] == "users")
        .cloned()
        .unwrap_or_default();
    assert_eq!(users["href"], "/admin/table-pages/users");
    assert_eq!(users["editable"], true);
    assert!(users["status_options"].as_array().map(|o| o.len()).unwrap_or(0) >= 4);
    Ok(())
}
