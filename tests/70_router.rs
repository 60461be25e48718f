use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use orypto_admin::auth::{issue_token, Claims};
use orypto_admin::config::AppConfig;
use orypto_admin::database::MemoryStore;
use orypto_admin::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: Router,
    config: AppConfig,
}

impl Harness {
    fn new(config: AppConfig) -> Self {
        let state = AppState::from_config(config.clone(), Arc::new(MemoryStore::new()));
        Self { app: router(state), config }
    }

    fn token(&self, tenant: &str) -> String {
        let claims = Claims::new("roq-1", tenant, vec!["Business Owner".to_string()], 1);
        issue_token(&self.config.security, &claims).unwrap()
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, json))
    }
}

#[tokio::test]
async fn every_resource_route_is_mounted() -> Result<()> {
    let harness = Harness::new(AppConfig::development());
    let token = harness.token("t1");

    for route in [
        "startups",
        "customer-support-representatives",
        "data-analysts",
        "delivery-personnels",
        "partner-stores",
        "team-members",
        "users",
    ] {
        let (status, body) = harness.call(Method::GET, &format!("/api/{}", route), Some(&token), None).await?;
        assert_eq!(status, StatusCode::OK, "{route}");
        assert_eq!(body, json!({ "data": [], "totalCount": 0 }), "{route}");
    }

    let (status, _) = harness.call(Method::GET, "/api/end-customers", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn users_are_created_inside_the_session_tenant() -> Result<()> {
    let harness = Harness::new(AppConfig::development());
    let token = harness.token("t1");

    let (status, user) = harness
        .call(
            Method::POST,
            "/api/users",
            Some(&token),
            Some(json!({ "email": "ada@example.com", "firstName": "Ada", "roq_user_id": "roq-9" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["tenant_id"], "t1");
    assert_eq!(user["firstName"], "Ada");

    let (_, page) = harness.call(Method::GET, "/api/users?searchTerm=ADA", Some(&token), None).await?;
    assert_eq!(page["totalCount"], 1);

    let (_, page) = harness.call(Method::GET, "/api/users", Some(&harness.token("t2")), None).await?;
    assert_eq!(page["totalCount"], 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_startup_orphans_its_staff() -> Result<()> {
    let harness = Harness::new(AppConfig::development());
    let token = harness.token("t1");

    let (_, startup) = harness
        .call(
            Method::POST,
            "/api/startups",
            Some(&token),
            Some(json!({ "name": "Acme", "user_id": "u1", "partner_store": [{ "user_id": "p1" }] })),
        )
        .await?;
    let (status, _) = harness
        .call(Method::DELETE, &format!("/api/startups/{}", startup["id"].as_str().unwrap()), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    // The orphan no longer belongs to any tenant, so lists skip it
    let (_, page) = harness.call(Method::GET, "/api/partner-stores", Some(&token), None).await?;
    assert_eq!(page["totalCount"], 0);
    Ok(())
}

#[tokio::test]
async fn oversized_bodies_are_rejected() -> Result<()> {
    let mut config = AppConfig::development();
    config.api.max_request_size_bytes = 64;
    let harness = Harness::new(config);
    let token = harness.token("t1");

    let (status, _) = harness
        .call(Method::POST, "/api/startups", Some(&token), Some(json!({ "name": "x".repeat(200), "user_id": "u1" })))
        .await?;
    assert!(status.is_client_error());
    Ok(())
}

#[tokio::test]
async fn public_routes_need_no_session() -> Result<()> {
    let harness = Harness::new(AppConfig::development());

    let (status, body) = harness.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = harness.call(Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Orypto Admin API");

    let (status, _) = harness.call(Method::GET, "/api/startups", None, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
