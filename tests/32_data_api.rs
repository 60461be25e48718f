mod common;

use anyhow::Result;
use common::{TestServer, ANALYST, OWNER};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn nested_create_round_trips_with_counts() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let created = server
        .create_startup(
            &token,
            json!({
                "name": "Acme",
                "user_id": "u1",
                "tenant_id": "t1",
                "customer_support_representative": [{ "user_id": "u2" }]
            }),
        )
        .await?;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["name"], "Acme");
    assert!(created.get("customer_support_representative").is_none());

    let res = client
        .get(server.url(&format!("/api/startups/{}?relations=customer_support_representative.count", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["_count"]["customer_support_representative"], 1);
    // Count-only hints never load the records themselves
    assert!(body.get("customer_support_representative").is_none());

    let res = client
        .get(server.url(&format!("/api/startups/{}?relations=customer_support_representative", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let reps = body["customer_support_representative"].as_array().unwrap();
    assert_eq!(reps.len(), 1);
    assert_eq!(reps[0]["user_id"], "u2");
    assert_eq!(reps[0]["startup_id"], json!(id));
    Ok(())
}

#[tokio::test]
async fn list_paginates_newest_first_within_tenant() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);
    let other = server.token("roq-2", "t2", &[OWNER]);

    for i in 0..12 {
        server.create_startup(&token, json!({ "name": format!("s{:02}", i), "user_id": "u1" })).await?;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    server.create_startup(&other, json!({ "name": "elsewhere", "user_id": "u9" })).await?;

    let res = client
        .get(server.url("/api/startups?limit=5&offset=10&order=created_at.desc"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["totalCount"], 12);
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["s01", "s00"]);

    // Malformed pagination falls back to the defaults
    let res = client.get(server.url("/api/startups?limit=abc&offset=-3")).bearer_auth(&token).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"][0]["name"], "s11");
    Ok(())
}

#[tokio::test]
async fn create_fills_and_guards_the_tenant() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let created = server.create_startup(&token, json!({ "name": "Acme", "user_id": "u1" })).await?;
    assert_eq!(created["tenant_id"], "t1");

    let res = client
        .post(server.url("/api/startups"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Sneaky", "user_id": "u1", "tenant_id": "t2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn wrong_tenant_update_is_forbidden_and_changes_nothing() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let owner = server.token("roq-1", "t1", &[OWNER]);
    let intruder = server.token("roq-2", "t2", &[OWNER]);

    let created = server.create_startup(&owner, json!({ "name": "Acme", "user_id": "u1" })).await?;
    let path = format!("/api/startups/{}", created["id"].as_str().unwrap());

    let res = client.put(server.url(&path)).bearer_auth(&intruder).json(&json!({ "name": "Hijacked" })).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.put(server.url(&path)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = client.get(server.url(&path)).bearer_auth(&owner).send().await?.json().await?;
    assert_eq!(body["name"], "Acme");
    assert_eq!(body["updated_at"], created["updated_at"]);
    Ok(())
}

#[tokio::test]
async fn update_is_partial_and_validated() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let created = server.create_startup(&token, json!({ "name": "Acme", "user_id": "u1" })).await?;
    let path = format!("/api/startups/{}", created["id"].as_str().unwrap());

    let res = client.put(server.url(&path)).bearer_auth(&token).json(&json!({ "description": "Rockets" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["description"], "Rockets");
    assert_eq!(body["name"], "Acme");

    let res = client.put(server.url(&path)).bearer_auth(&token).json(&json!({ "name": null, "id": "x" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["name"], "must not be null");
    assert!(body["field_errors"]["id"].is_string());
    Ok(())
}

#[tokio::test]
async fn create_rejects_invalid_payloads_before_writing() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let res = client
        .post(server.url("/api/startups"))
        .bearer_auth(&token)
        .json(&json!({ "user_id": "u1", "team_member": [{ "user_id": 3 }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["name"], "is required");
    assert_eq!(body["field_errors"]["team_member[0].user_id"], "must be a string");

    let res = client
        .post(server.url("/api/startups"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "BAD_REQUEST");

    let startup = orypto_admin::entity::by_name("startup").unwrap();
    let member = orypto_admin::entity::by_name("team_member").unwrap();
    assert_eq!(server.store.len(startup).await, 0);
    assert_eq!(server.store.len(member).await, 0);
    Ok(())
}

#[tokio::test]
async fn delete_returns_the_record_then_404s() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let created = server.create_startup(&token, json!({ "name": "Acme", "user_id": "u1" })).await?;
    let path = format!("/api/startups/{}", created["id"].as_str().unwrap());

    let res = client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["name"], "Acme");

    let res = client.delete(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert!(body["message"].as_str().unwrap().contains("not found"));

    let res = client.get(server.url(&path)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unsupported_methods_are_405() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let token = server.token("roq-1", "t1", &[OWNER]);

    let res = client.patch(server.url("/api/startups/abc")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.json::<Value>().await?["message"], "Method PATCH not allowed");

    let res = client.put(server.url("/api/startups")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.json::<Value>().await?["message"], "Method PUT not allowed");
    Ok(())
}

#[tokio::test]
async fn tenant_roles_read_but_cannot_write() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let owner = server.token("roq-1", "t1", &[OWNER]);
    let analyst = server.token("roq-3", "t1", &[ANALYST]);

    server.create_startup(&owner, json!({ "name": "Acme", "user_id": "u1" })).await?;

    let res = client.get(server.url("/api/startups")).bearer_auth(&analyst).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["totalCount"], 1);

    let res = client
        .post(server.url("/api/startups"))
        .bearer_auth(&analyst)
        .json(&json!({ "name": "Mine", "user_id": "u3" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn staff_references_must_stay_in_tenant() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let owner = server.token("roq-1", "t1", &[OWNER]);
    let other = server.token("roq-2", "t2", &[OWNER]);

    let mine = server.create_startup(&owner, json!({ "name": "Acme", "user_id": "u1" })).await?;
    let theirs = server.create_startup(&other, json!({ "name": "Globex", "user_id": "u2" })).await?;

    let res = client
        .post(server.url("/api/data-analysts"))
        .bearer_auth(&owner)
        .json(&json!({ "user_id": "u5", "startup_id": mine["id"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/api/data-analysts"))
        .bearer_auth(&owner)
        .json(&json!({ "user_id": "u5", "startup_id": theirs["id"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(server.url("/api/data-analysts"))
        .bearer_auth(&owner)
        .json(&json!({ "startup_id": "missing" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/api/data-analysts?relations=startup")).bearer_auth(&owner).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["data"][0]["startup"]["name"], "Acme");
    Ok(())
}

#[tokio::test]
async fn staff_records_must_name_a_tenant_startup() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let owner = server.token("roq-1", "t1", &[OWNER]);
    let other = server.token("roq-2", "t2", &[OWNER]);

    let res = client
        .post(server.url("/api/team-members"))
        .bearer_auth(&owner)
        .json(&json!({ "user_id": "u1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["startup_id"], "is required");

    let mine = server
        .create_startup(&owner, json!({ "name": "Acme", "user_id": "u1", "team_member": [{ "user_id": "m1" }] }))
        .await?;
    let theirs = server.create_startup(&other, json!({ "name": "Globex", "user_id": "u2" })).await?;

    let res = client.get(server.url("/api/team-members")).bearer_auth(&owner).send().await?;
    let body: Value = res.json().await?;
    let member = format!("/api/team-members/{}", body["data"][0]["id"].as_str().unwrap());

    let res = client.put(server.url(&member)).bearer_auth(&owner).json(&json!({ "startup_id": null })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["startup_id"], "must not be null");

    let res = client
        .put(server.url(&member))
        .bearer_auth(&owner)
        .json(&json!({ "startup_id": theirs["id"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Partial updates that leave the startup alone still pass
    let res = client.put(server.url(&member)).bearer_auth(&owner).json(&json!({ "user_id": "m2" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/api/team-members")).bearer_auth(&owner).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["data"][0]["startup_id"], mine["id"]);
    Ok(())
}

#[tokio::test]
async fn orphaned_staff_is_out_of_reach() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    let owner = server.token("roq-1", "t1", &[OWNER]);
    let other = server.token("roq-2", "t2", &[OWNER]);

    let startup = server
        .create_startup(&owner, json!({ "name": "Acme", "user_id": "u1", "team_member": [{ "user_id": "m1" }] }))
        .await?;
    let res = client.get(server.url("/api/team-members")).bearer_auth(&owner).send().await?;
    let body: Value = res.json().await?;
    let member = format!("/api/team-members/{}", body["data"][0]["id"].as_str().unwrap());

    let res = client
        .delete(server.url(&format!("/api/startups/{}", startup["id"].as_str().unwrap())))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    for token in [&owner, &other] {
        let res = client.get(server.url(&member)).bearer_auth(token).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = client.put(server.url(&member)).bearer_auth(token).json(&json!({ "user_id": "m9" })).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = client.delete(server.url(&member)).bearer_auth(token).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    let member_def = orypto_admin::entity::by_name("team_member").unwrap();
    assert_eq!(server.store.len(member_def).await, 1);
    Ok(())
}
