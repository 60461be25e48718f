#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use orypto_admin::access::AccessChecker;
use orypto_admin::auth::{issue_token, Claims};
use orypto_admin::config::AppConfig;
use orypto_admin::database::MemoryStore;
use orypto_admin::{router, AppState};
use reqwest::StatusCode;
use serde_json::Value;

pub const OWNER: &str = "Business Owner";
pub const ANALYST: &str = "Data Analyst";

/// An in-process server over a fresh in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::development(), None).await
    }

    pub async fn start_with(mut config: AppConfig, access: Option<Arc<dyn AccessChecker>>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        config.api.port = port;
        config.api.enable_request_logging = false;

        let store = Arc::new(MemoryStore::new());
        let state = match access {
            Some(access) => AppState::new(config.clone(), store.clone(), access),
            None => AppState::from_config(config.clone(), store.clone()),
        };

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        let server = Self { port, base_url, config, store };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn token(&self, user: &str, tenant: &str, roles: &[&str]) -> String {
        let claims = Claims::new(user, tenant, roles.iter().map(|r| r.to_string()).collect(), 1);
        issue_token(&self.config.security, &claims).expect("token")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a startup as a tenant owner, returning the created record
    pub async fn create_startup(&self, token: &str, body: Value) -> Result<Value> {
        let res = reqwest::Client::new()
            .post(self.url("/api/startups"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "create failed: {}", res.text().await?);
        Ok(res.json().await?)
    }
}
