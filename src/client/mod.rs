//! Typed HTTP client for the admin API.
//!
//! `ApiClient` speaks the REST surface for any `Resource` model; `ListQuery`
//! builds the query string the server's translator understands.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Paginated, Resource};
use crate::query::QueryParams;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope
    #[error("{status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<String>,
        body: Value,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http(err) => err.status(),
            ClientError::Api { status, .. } => Some(*status),
        }
    }
}

/// Builder for list query strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    params: QueryParams,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.params.set("limit", limit.to_string());
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.params.set("offset", offset.to_string());
        self
    }

    /// Append a sort key; `descending` picks `desc`
    pub fn order(mut self, field: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.params.push("order", format!("{}.{}", field, direction));
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.params.set("searchTerm", term);
        self
    }

    /// Load related records
    pub fn include(mut self, relation: &str) -> Self {
        self.params.push("relations", relation);
        self
    }

    /// Count related records without loading them
    pub fn count(mut self, relation: &str) -> Self {
        self.params.push("relations", format!("{}.count", relation));
        self
    }

    /// Equality filter; repeat for an `in` filter
    pub fn filter(mut self, field: &str, value: impl Into<String>) -> Self {
        self.params.push(field, value);
        self
    }

    pub fn to_query_string(&self) -> String {
        self.params.to_query_string()
    }
}

impl From<QueryParams> for ListQuery {
    fn from(params: QueryParams) -> Self {
        Self { params }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Paginated<R>, ClientError> {
        self.list_raw(R::ROUTE, query).await
    }

    pub async fn create<R: Resource>(&self, record: &R) -> Result<R, ClientError> {
        self.create_raw(R::ROUTE, record).await
    }

    pub async fn get_by_id<R: Resource>(&self, id: &str, query: &ListQuery) -> Result<R, ClientError> {
        self.get_raw(R::ROUTE, id, query).await
    }

    pub async fn update_by_id<R: Resource>(&self, id: &str, changes: &R) -> Result<R, ClientError> {
        self.update_raw(R::ROUTE, id, changes).await
    }

    pub async fn delete_by_id<R: Resource>(&self, id: &str) -> Result<R, ClientError> {
        self.delete_raw(R::ROUTE, id).await
    }

    // Untyped variants keyed by route slug, used by the CLI

    pub async fn list_raw<T: DeserializeOwned>(&self, route: &str, query: &ListQuery) -> Result<Paginated<T>, ClientError> {
        let url = with_query(format!("{}/api/{}", self.base_url, route), query);
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn create_raw<B: Serialize + ?Sized, T: DeserializeOwned>(&self, route: &str, body: &B) -> Result<T, ClientError> {
        let url = format!("{}/api/{}", self.base_url, route);
        self.send(self.request(Method::POST, &url).json(body)).await
    }

    pub async fn get_raw<T: DeserializeOwned>(&self, route: &str, id: &str, query: &ListQuery) -> Result<T, ClientError> {
        let url = with_query(format!("{}/api/{}/{}", self.base_url, route, id), query);
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn update_raw<B: Serialize + ?Sized, T: DeserializeOwned>(&self, route: &str, id: &str, body: &B) -> Result<T, ClientError> {
        let url = format!("{}/api/{}/{}", self.base_url, route, id);
        self.send(self.request(Method::PUT, &url).json(body)).await
    }

    pub async fn delete_raw<T: DeserializeOwned>(&self, route: &str, id: &str) -> Result<T, ClientError> {
        let url = format!("{}/api/{}/{}", self.base_url, route, id);
        self.send(self.request(Method::DELETE, &url)).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
            .to_string();
        let code = body.get("code").and_then(Value::as_str).map(str::to_string);
        Err(ClientError::Api { status, message, code, body })
    }
}

fn with_query(url: String, query: &ListQuery) -> String {
    let qs = query.to_query_string();
    if qs.is_empty() {
        url
    } else {
        format!("{}?{}", url, qs)
    }
}
