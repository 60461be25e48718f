mod common;

use anyhow::Result;
use common::{TestServer, OWNER};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn seeded() -> Result<(TestServer, String)> {
    let server = TestServer::start().await?;
    let token = server.token("roq-1", "t1", &[OWNER]);
    for (name, owner, description) in [
        ("Acme Rockets", "u1", "propulsion"),
        ("Bolt Bikes", "u2", "urban mobility"),
        ("Cobalt Labs", "u1", "ROCKET fuel research"),
    ] {
        server
            .create_startup(
                &token,
                json!({ "name": name, "user_id": owner, "description": description, "team_member": [{ "user_id": "m1" }] }),
            )
            .await?;
    }
    Ok((server, token))
}

async fn list(server: &TestServer, token: &str, query: &str) -> Result<(StatusCode, Value)> {
    let res = reqwest::Client::new()
        .get(server.url(&format!("/api/startups?{}", query)))
        .bearer_auth(token)
        .send()
        .await?;
    Ok((res.status(), res.json().await?))
}

fn names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["name"].as_str()).map(str::to_string).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn equality_and_in_filters() -> Result<()> {
    let (server, token) = seeded().await?;

    let (status, body) = list(&server, &token, "user_id=u1&order=name.asc").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Acme Rockets", "Cobalt Labs"]);
    assert_eq!(body["totalCount"], 2);

    let (_, body) = list(&server, &token, "name=Bolt%20Bikes&name=Cobalt%20Labs&order=name.desc").await?;
    assert_eq!(names(&body), vec!["Cobalt Labs", "Bolt Bikes"]);
    Ok(())
}

#[tokio::test]
async fn json_order_keeps_key_precedence() -> Result<()> {
    let (server, token) = seeded().await?;
    let order = |raw: &str| format!("order={}", url::form_urlencoded::byte_serialize(raw.as_bytes()).collect::<String>());

    let (status, body) = list(&server, &token, &order(r#"{"user_id":"desc","name":"asc"}"#)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Bolt Bikes", "Acme Rockets", "Cobalt Labs"]);

    let (_, body) = list(&server, &token, &order(r#"{"name":"desc","user_id":"asc"}"#)).await?;
    assert_eq!(names(&body), vec!["Cobalt Labs", "Bolt Bikes", "Acme Rockets"]);

    // A plain sort on the id column
    let (status, body) = list(&server, &token, &order(r#"{"id":"desc"}"#)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 3);
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_across_text_fields() -> Result<()> {
    let (server, token) = seeded().await?;

    let (_, body) = list(&server, &token, "searchTerm=rocket&order=name.asc").await?;
    assert_eq!(names(&body), vec!["Acme Rockets", "Cobalt Labs"]);

    let (_, body) = list(&server, &token, "searchTerm=nothing-matches").await?;
    assert_eq!(body["totalCount"], 0);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn relations_and_counts_on_lists() -> Result<()> {
    let (server, token) = seeded().await?;

    let (status, body) = list(&server, &token, "relations=team_member.count&relations=user&limit=1").await?;
    assert_eq!(status, StatusCode::OK);
    let first = &body["data"][0];
    assert_eq!(first["_count"]["team_member"], 1);
    assert!(first.get("team_member").is_none());
    // Users were never created, so the belongs-to relation is empty
    assert_eq!(first["user"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn invalid_queries_are_400() -> Result<()> {
    let (server, token) = seeded().await?;

    let (status, body) = list(&server, &token, "nickname=acme").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["nickname"].is_string());

    let (status, body) = list(&server, &token, "relations=investors").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid query"));

    let (status, _) = list(&server, &token, "order=nickname.asc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = list(&server, &token, "relations=user.count").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn staff_lists_follow_their_startup_tenant() -> Result<()> {
    let (server, token) = seeded().await?;
    let other = server.token("roq-2", "t2", &[OWNER]);
    server
        .create_startup(&other, json!({ "name": "Globex", "user_id": "u9", "team_member": [{ "user_id": "m2" }] }))
        .await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/team-members?relations=startup"))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["totalCount"], 3);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["user_id"] == "m1" && m["startup"]["tenant_id"] == "t1"));
    Ok(())
}
