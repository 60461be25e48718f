mod common;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode as AxumStatus, routing::post, Json, Router};
use common::TestServer;
use orypto_admin::config::AppConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<Value>>>;

/// Stand-in auth service: reads are open, writes need the "Admin" role
async fn decide(State(seen): State<Seen>, Json(check): Json<Value>) -> Json<Value> {
    let admin = check["roles"].as_array().is_some_and(|roles| roles.iter().any(|r| r == "Admin"));
    let allowed = check["operation"] == "READ" || admin;
    seen.lock().unwrap().push(check);
    Json(json!({ "allowed": allowed }))
}

async fn broken() -> AxumStatus {
    AxumStatus::INTERNAL_SERVER_ERROR
}

async fn spawn_auth(app: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

async fn start_against(auth_url: String) -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.access.auth_url = Some(auth_url);
    TestServer::start_with(config, None).await
}

#[tokio::test]
async fn remote_decisions_gate_each_operation() -> Result<()> {
    let seen: Seen = Arc::default();
    let auth_url = spawn_auth(Router::new().route("/access/check", post(decide)).with_state(seen.clone())).await?;
    let server = start_against(auth_url).await?;
    let client = reqwest::Client::new();

    let admin = server.token("roq-1", "t1", &["Admin"]);
    let guest = server.token("roq-2", "t1", &["Guest"]);

    let created = server.create_startup(&admin, json!({ "name": "Acme", "user_id": "u1" })).await?;
    let path = format!("/api/startups/{}", created["id"].as_str().unwrap());

    let res = client.get(server.url(&path)).bearer_auth(&guest).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.delete(server.url(&path)).bearer_auth(&guest).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let checks = seen.lock().unwrap().clone();
    assert_eq!(checks.len(), 3);
    assert_eq!(checks[0]["operation"], "CREATE");
    assert_eq!(checks[0]["resourceId"], Value::Null);
    assert_eq!(checks[1]["operation"], "READ");
    assert_eq!(checks[2]["roqUserId"], "roq-2");
    assert_eq!(checks[2]["tenantId"], "t1");
    assert_eq!(checks[2]["entity"], "startup");
    assert_eq!(checks[2]["resourceId"], created["id"]);
    assert_eq!(checks[2]["operation"], "DELETE");

    // The denied delete never reached the store
    let res = client.get(server.url(&path)).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn failing_auth_service_is_503() -> Result<()> {
    let auth_url = spawn_auth(Router::new().route("/access/check", post(broken))).await?;
    let server = start_against(auth_url).await?;

    let token = server.token("roq-1", "t1", &["Admin"]);
    let res = reqwest::Client::new().get(server.url("/api/startups")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json::<Value>().await?["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
