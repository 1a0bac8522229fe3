//! 令牌认证
//!
//! 请求头 `Authorization: Bearer <token>`，令牌以SHA-256摘要在存储中查找用户。

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use care_core::{utils::hash_token, CareError};
use tracing::{debug, warn};

use crate::handlers::ApiError;
use crate::server::AppState;

/// 认证中间件，成功后将 `User` 放入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CareError::Unauthorized("Missing token".to_string()))?;

    let user = state
        .health_id
        .store()
        .find_user_by_token_hash(&hash_token(&token))
        .await?
        .ok_or_else(|| {
            warn!("Rejected unknown API token");
            CareError::Unauthorized("Invalid token".to_string())
        })?;

    if !user.is_active {
        warn!("Rejected token of inactive user {}", user.username);
        return Err(CareError::Unauthorized("Account is disabled".to_string()).into());
    }

    debug!("Authenticated user {}", user.username);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
