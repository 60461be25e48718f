use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{decode_token, Claims, TokenError};
use crate::error::ApiError;

/// Session of the caller, passed explicitly to every handler
#[derive(Clone, Debug, PartialEq)]
pub struct RequestContext {
    /// The auth service's user id (`roqUserId`)
    pub user_id: String,
    pub tenant_id: String,
    pub roles: Vec<String>,
}

impl From<Claims> for RequestContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.roq_user_id,
            tenant_id: claims.tenant_id,
            roles: claims.roles,
        }
    }
}

/// Validates the bearer token and injects the `RequestContext`.
/// Requests without a valid session are refused with 403.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = bearer_token(request.headers())?;
        decode_token(&state.config.security, token)?
    };

    tracing::debug!(user = %claims.roq_user_id, tenant = %claims.tenant_id, "session");
    request.extensions_mut().insert(RequestContext::from(claims));

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers.get(AUTHORIZATION).ok_or(TokenError::MissingHeader)?;
    let value = value.to_str().map_err(|_| TokenError::InvalidHeader)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(TokenError::InvalidHeader),
    }
}
